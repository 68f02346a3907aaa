use http::Method;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{BoardGroup, DeleteBoardGroupResponse, UpsertBoardGroup};

impl ApiClient {
    pub async fn my_board_groups(&self) -> Result<Vec<BoardGroup>, ApiError> {
        self.get("/users/me/board-groups", &[]).await
    }

    /// Creates the group, or replaces the boards of an existing group with the same name.
    pub async fn upsert_board_group(&self, group: &UpsertBoardGroup) -> Result<BoardGroup, ApiError> {
        self.send_json(Method::POST, "/users/me/board-groups", group).await
    }

    pub async fn delete_board_group(&self, group_id: i64) -> Result<DeleteBoardGroupResponse, ApiError> {
        self.send_empty(Method::DELETE, &format!("/users/me/board-groups/{group_id}"), &[])
            .await
    }
}
