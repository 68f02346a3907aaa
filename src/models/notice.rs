use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub date: String,
    pub board_code: String,
    pub created_at: String,
    pub is_read: bool,
    pub view: u64,
    pub is_favorite: bool,
    #[serde(default)]
    pub favorite_created_at: Option<String>,
    #[serde(default)]
    pub matched_keywords: Option<Vec<String>>,
}

impl Notice {
    /// Posting date; the backend sends either a date or a datetime.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }

    /// When the notice was collected, falling back to its posting date.
    pub fn collected_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at).or_else(|| self.posted_at())
    }

    pub fn favorited_at(&self) -> Option<DateTime<Utc>> {
        self.favorite_created_at.as_deref().and_then(parse_timestamp)
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// One page of the cursor-paginated notice feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NoticePage {
    pub items: Vec<Notice>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkAsReadResponse {
    pub message: String,
    pub notice_id: i64,
    pub is_read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToggleFavoriteResponse {
    pub message: String,
    pub notice_id: i64,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncrementViewResponse {
    pub notice_id: i64,
    pub view: u64,
    pub user_view_count: u64,
    pub message: String,
}

/// Query for `GET /notices` in cursor mode.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeQuery {
    pub cursor: Option<String>,
    pub limit: u32,
    pub include_read: bool,
    pub board_codes: Vec<String>,
    pub only_favorite: bool,
}

impl Default for NoticeQuery {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: 20,
            include_read: true,
            board_codes: Vec::new(),
            only_favorite: false,
        }
    }
}

impl NoticeQuery {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("include_read", self.include_read.to_string()),
        ];
        if let Some(cursor) = &self.cursor {
            params.push(("cursor", cursor.clone()));
        }
        if !self.board_codes.is_empty() {
            params.push(("board_codes", self.board_codes.join(",")));
        }
        if self.only_favorite {
            params.push(("only_favorite", "true".to_string()));
        }
        params
    }
}
