use std::sync::Arc;
use std::time::Duration;

use http::{Method, header};
use reqwest::RequestBuilder;
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::session::Session;
use crate::settings::Settings;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// JSON client for the ZeroTime backend.
///
/// Every request carries the session's bearer token (when signed in) and
/// no-cache headers. A 401 clears the session before the error is returned.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
    session: Session,
    timeout: Duration,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: Url, session: Session) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::new(base_url),
            session,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let session = Session::new();
        session.set_access_token(settings.access_token.clone());
        Self::new(settings.api_base_url.clone(), session)
            .with_timeouts(settings.request_timeout(), settings.upload_timeout())
    }

    pub fn with_timeouts(mut self, request: Duration, upload: Duration) -> Self {
        self.timeout = request;
        self.upload_timeout = upload;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let url = if params.is_empty() {
            Url::parse(&raw)?
        } else {
            Url::parse_with_params(&raw, params)?
        };
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, timeout: Duration) -> RequestBuilder {
        debug!(%method, %url, "api request");
        let builder = self
            .client
            .request(method, url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .timeout(timeout);
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, "api response");

        if !status.is_success() {
            let err = ApiError::from_status(status, &body);
            if matches!(err, ApiError::Unauthorized) && self.session.is_logged_in() {
                warn!("access token rejected, signing out");
                self.session.clear();
            }
            return Err(err);
        }

        // 204s and empty acknowledgements decode as `null`.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, params)?;
        self.execute(self.request(Method::GET, url, self.timeout)).await
    }

    pub(crate) async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json_with(method, path, &[], body).await
    }

    pub(crate) async fn send_json_with<B, T>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path, params)?;
        self.execute(self.request(method, url, self.timeout).json(body)).await
    }

    pub(crate) async fn send_empty<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path, params)?;
        self.execute(self.request(method, url, self.timeout)).await
    }

    /// Multipart upload under the longer upload timeout.
    pub(crate) async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T, ApiError> {
        let url = self.url(path, &[])?;
        self.execute(self.request(Method::POST, url, self.upload_timeout).multipart(form))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_path_and_params() {
        let client = ApiClient::new(Url::parse("https://api.example.com/v1/").unwrap(), Session::new());
        let url = client
            .url("/notices", &[("board_codes", "a,b".to_string()), ("limit", "20".to_string())])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/notices?board_codes=a%2Cb&limit=20");

        let bare = client.url("/users/me", &[]).unwrap();
        assert_eq!(bare.as_str(), "https://api.example.com/v1/users/me");
    }
}
