use http::Method;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{AddKeywordRequest, DeleteKeywordResponse, Keyword, Notice};
use crate::validation::validate_keyword;

impl ApiClient {
    pub async fn my_keywords(&self) -> Result<Vec<Keyword>, ApiError> {
        self.get("/users/me/keywords", &[]).await
    }

    pub async fn add_keyword(&self, keyword: &str) -> Result<Keyword, ApiError> {
        let request = AddKeywordRequest {
            keyword: validate_keyword(keyword)?,
        };
        self.send_json(Method::POST, "/users/me/keywords", &request).await
    }

    pub async fn delete_keyword(&self, keyword_id: i64) -> Result<DeleteKeywordResponse, ApiError> {
        self.send_empty(Method::DELETE, &format!("/users/me/keywords/{keyword_id}"), &[])
            .await
    }

    /// Notices matching any of the user's keywords, offset-paginated.
    pub async fn keyword_notices(&self, page: u32, limit: u32, include_read: bool) -> Result<Vec<Notice>, ApiError> {
        let params = [
            ("skip", (page * limit).to_string()),
            ("limit", limit.to_string()),
            ("include_read", include_read.to_string()),
        ];
        self.get("/users/me/keyword-notices", &params).await
    }
}
