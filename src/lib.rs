pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod ical;
pub mod models;
pub mod notices;
pub mod onboarding;
pub mod optimistic;
pub mod preferences;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod store;
pub mod validation;

use clap::Parser;
use tracing::debug;

use crate::cli::Cli;
use crate::settings::Settings;

pub use crate::client::ApiClient;
pub use crate::error::ApiError;
pub use crate::session::Session;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    debug!(api = %settings.api_base_url, store = %settings.store_path.display(), "starting zerotime");
    cli::execute(cli, &settings).await
}
