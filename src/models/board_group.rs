use serde::{Deserialize, Serialize};

/// A named set of boards the user can switch the feed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardGroup {
    pub id: i64,
    pub name: String,
    pub board_codes: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpsertBoardGroup {
    pub name: String,
    pub board_codes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteBoardGroupResponse {
    pub message: String,
    pub group_id: i64,
}
