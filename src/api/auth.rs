use http::Method;
use tracing::warn;

use crate::client::ApiClient;
use crate::error::ApiError;

impl ApiClient {
    /// Ends the session server-side. The local session is cleared even
    /// when the backend call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result: Result<serde_json::Value, ApiError> = self.send_empty(Method::POST, "/auth/logout", &[]).await;
        self.session().clear();
        if let Err(err) = &result {
            warn!(error = %err, "logout request failed, local session cleared anyway");
        }
        result.map(|_| ())
    }
}
