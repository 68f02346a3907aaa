use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub api_base_url: Url,
    pub debug: bool,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub store_path: PathBuf,
    pub timezone: String,
    pub access_token: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_API_BASE_URL, APP_DEBUG, APP_ACCESS_TOKEN, ...
            .add_source(Environment::with_prefix("APP").try_parsing(true))
            .set_default("api_base_url", "http://localhost:8080")?
            .set_default("debug", false)?
            .set_default("request_timeout_secs", 5)?
            .set_default("upload_timeout_secs", 120)?
            .set_default("store_path", ".zerotime/state.json")?
            .set_default("timezone", "Asia/Seoul")?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.tz().map_err(ConfigError::Message)?;
        Ok(settings)
    }

    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| format!("invalid timezone '{}': {err}", self.timezone))
    }

    /// Today's date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        let tz = self.tz().unwrap_or(chrono_tz::Asia::Seoul);
        Utc::now().with_timezone(&tz).date_naive()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}
