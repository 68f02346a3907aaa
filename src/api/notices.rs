use http::Method;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    IncrementViewResponse, MarkAsReadResponse, Notice, NoticePage, NoticeQuery, ToggleFavoriteResponse,
};

impl ApiClient {
    /// One cursor page of the notice feed.
    pub async fn fetch_notices(&self, query: &NoticeQuery) -> Result<NoticePage, ApiError> {
        self.get("/notices", &query.to_params()).await
    }

    /// Offset mode: page `page` of `limit` notices, as a bare list.
    pub async fn fetch_notices_page(&self, page: u32, limit: u32, include_read: bool) -> Result<Vec<Notice>, ApiError> {
        let params = [
            ("skip", (page * limit).to_string()),
            ("limit", limit.to_string()),
            ("include_read", include_read.to_string()),
        ];
        self.get("/notices", &params).await
    }

    pub async fn mark_notice_read(&self, notice_id: i64) -> Result<MarkAsReadResponse, ApiError> {
        self.send_empty(Method::POST, &format!("/notices/{notice_id}/read"), &[])
            .await
    }

    pub async fn toggle_notice_favorite(&self, notice_id: i64) -> Result<ToggleFavoriteResponse, ApiError> {
        self.send_empty(Method::POST, &format!("/notices/{notice_id}/favorite"), &[])
            .await
    }

    pub async fn increment_notice_view(&self, notice_id: i64) -> Result<IncrementViewResponse, ApiError> {
        self.send_empty(Method::POST, &format!("/notices/{notice_id}/increment-view"), &[])
            .await
    }
}
