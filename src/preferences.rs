use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::BoardGroup;
use crate::notices::NoticeFilter;
use crate::onboarding::PendingOnboarding;
use crate::schedule::{SlotKey, SlotSelection};
use crate::store::{KeyValueStore, StoreError};

pub const GUEST_FIXED_BOARD: &str = "home_campus";

const SUBSCRIBED_BOARDS_KEY: &str = "my_subscribed_categories";
const GUEST_BOARDS_KEY: &str = "JB_ALARM_GUEST_FILTER";
const CURRENT_FILTER_KEY: &str = "current_filter";
const KEYWORD_SEEN_KEY: &str = "keyword_notice_seen_at";
const PENDING_ONBOARDING_KEY: &str = "pending_onboarding_submission_v1";
const CREATE_DRAFT_KEY: &str = "chinba_create_draft";
const SCHEDULE_DRAFT_PREFIX: &str = "chinba_schedule_draft";
const BOARD_GROUPS_PREFIX: &str = "JB_ALARM_BOARD_GROUPS_CACHE_V1";
const SIDEBAR_COLLAPSED_KEY: &str = "sidebar_collapsed";

/// Unsaved "create event" form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CreateEventDraft {
    pub title: String,
    pub dates: Vec<NaiveDate>,
}

/// Unsaved slot selection for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDraft {
    pub slots: Vec<SlotKey>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoardGroupsCache {
    groups: Vec<BoardGroup>,
    /// Milliseconds since the epoch.
    cached_at: i64,
}

/// Typed access to the local side store.
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

/// Guests always see the main campus board.
pub fn normalize_guest_boards(boards: &[String]) -> Vec<String> {
    let mut normalized = boards.to_vec();
    if !normalized.iter().any(|b| b == GUEST_FIXED_BOARD) {
        normalized.push(GUEST_FIXED_BOARD.to_string());
    }
    normalized
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Unreadable entries are treated as absent.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed store entry");
                Ok(None)
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, &serde_json::to_string(value)?)
    }

    /// Guest board selection, reset to the fixed board when missing or unreadable.
    pub fn guest_boards(&self) -> Result<Vec<String>, StoreError> {
        let stored: Vec<String> = self.read_json(GUEST_BOARDS_KEY)?.unwrap_or_default();
        let normalized = normalize_guest_boards(&stored);
        self.write_json(GUEST_BOARDS_KEY, &normalized)?;
        Ok(normalized)
    }

    pub fn set_guest_boards(&self, boards: &[String]) -> Result<Vec<String>, StoreError> {
        let normalized = normalize_guest_boards(boards);
        self.write_json(GUEST_BOARDS_KEY, &normalized)?;
        Ok(normalized)
    }

    pub fn cached_subscriptions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read_json(SUBSCRIBED_BOARDS_KEY)?.unwrap_or_default())
    }

    pub fn cache_subscriptions(&self, boards: &[String]) -> Result<(), StoreError> {
        self.write_json(SUBSCRIBED_BOARDS_KEY, boards)
    }

    pub fn clear_subscriptions(&self) -> Result<(), StoreError> {
        self.store.remove(SUBSCRIBED_BOARDS_KEY)
    }

    /// The stored filter, or `ALL` when a guest had a sign-in-only filter.
    pub fn current_filter(&self, logged_in: bool) -> Result<NoticeFilter, StoreError> {
        let stored = self
            .store
            .get(CURRENT_FILTER_KEY)?
            .and_then(|raw| raw.parse::<NoticeFilter>().ok())
            .unwrap_or_default();
        if stored.requires_login() && !logged_in {
            self.set_current_filter(NoticeFilter::All)?;
            return Ok(NoticeFilter::All);
        }
        Ok(stored)
    }

    pub fn set_current_filter(&self, filter: NoticeFilter) -> Result<(), StoreError> {
        self.store.set(CURRENT_FILTER_KEY, filter.as_str())
    }

    pub fn keyword_seen_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .store
            .get(KEYWORD_SEEN_KEY)?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn set_keyword_seen_at(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.store.set(KEYWORD_SEEN_KEY, &at.to_rfc3339())
    }

    pub fn pending_onboarding(&self) -> Result<Option<PendingOnboarding>, StoreError> {
        self.read_json(PENDING_ONBOARDING_KEY)
    }

    pub fn save_pending_onboarding(&self, pending: &PendingOnboarding) -> Result<(), StoreError> {
        self.write_json(PENDING_ONBOARDING_KEY, pending)
    }

    pub fn clear_pending_onboarding(&self) -> Result<(), StoreError> {
        self.store.remove(PENDING_ONBOARDING_KEY)
    }

    pub fn create_draft(&self) -> Result<Option<CreateEventDraft>, StoreError> {
        self.read_json(CREATE_DRAFT_KEY)
    }

    pub fn save_create_draft(&self, draft: &CreateEventDraft) -> Result<(), StoreError> {
        self.write_json(CREATE_DRAFT_KEY, draft)
    }

    pub fn clear_create_draft(&self) -> Result<(), StoreError> {
        self.store.remove(CREATE_DRAFT_KEY)
    }

    pub fn schedule_draft(&self, event_id: &str) -> Result<Option<ScheduleDraft>, StoreError> {
        self.read_json(&format!("{SCHEDULE_DRAFT_PREFIX}:{event_id}"))
    }

    pub fn save_schedule_draft(&self, event_id: &str, selection: &SlotSelection) -> Result<(), StoreError> {
        let draft = ScheduleDraft {
            slots: selection.to_vec(),
            updated_at: Utc::now(),
        };
        self.write_json(&format!("{SCHEDULE_DRAFT_PREFIX}:{event_id}"), &draft)
    }

    pub fn clear_schedule_draft(&self, event_id: &str) -> Result<(), StoreError> {
        self.store.remove(&format!("{SCHEDULE_DRAFT_PREFIX}:{event_id}"))
    }

    pub fn cached_board_groups(&self, email: &str) -> Result<Vec<BoardGroup>, StoreError> {
        let cache: Option<BoardGroupsCache> = self.read_json(&format!("{BOARD_GROUPS_PREFIX}:{email}"))?;
        Ok(cache.map(|c| c.groups).unwrap_or_default())
    }

    pub fn cache_board_groups(&self, email: &str, groups: &[BoardGroup]) -> Result<(), StoreError> {
        let cache = BoardGroupsCache {
            groups: groups.to_vec(),
            cached_at: Utc::now().timestamp_millis(),
        };
        self.write_json(&format!("{BOARD_GROUPS_PREFIX}:{email}"), &cache)
    }

    pub fn sidebar_collapsed(&self) -> Result<bool, StoreError> {
        Ok(self.read_json(SIDEBAR_COLLAPSED_KEY)?.unwrap_or(false))
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<(), StoreError> {
        self.write_json(SIDEBAR_COLLAPSED_KEY, &collapsed)
    }
}

/// Boards the feed is narrowed to.
///
/// Signed-in users read their subscriptions from the backend and cache them;
/// when that fails the list is empty. Guests only use the side store.
pub async fn load_selected_boards(api: &ApiClient, prefs: &Preferences) -> Result<Vec<String>, StoreError> {
    if !api.session().is_logged_in() {
        return prefs.guest_boards();
    }
    match api.my_subscriptions().await {
        Ok(subscriptions) => {
            let boards: Vec<String> = subscriptions.into_iter().map(|s| s.board_code).collect();
            prefs.cache_subscriptions(&boards)?;
            Ok(boards)
        }
        Err(err) => {
            warn!(error = %err, "failed to load subscriptions");
            Ok(Vec::new())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persists a new board selection. The cache only changes once the backend
/// has accepted it.
pub async fn save_selected_boards(
    api: &ApiClient,
    prefs: &Preferences,
    boards: &[String],
) -> Result<Vec<String>, SelectionError> {
    if !api.session().is_logged_in() {
        return Ok(prefs.set_guest_boards(boards)?);
    }
    api.update_subscriptions(boards).await?;
    prefs.cache_subscriptions(boards)?;
    Ok(boards.to_vec())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    fn prefs() -> (Arc<MemoryStore>, Preferences) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Preferences::new(store))
    }

    #[test]
    fn test_guest_boards_always_include_campus() {
        let (store, prefs) = prefs();
        assert_eq!(prefs.guest_boards().unwrap(), vec![GUEST_FIXED_BOARD.to_string()]);

        let saved = prefs.set_guest_boards(&["dept_csai".to_string()]).unwrap();
        assert_eq!(saved, vec!["dept_csai".to_string(), GUEST_FIXED_BOARD.to_string()]);

        store.set(GUEST_BOARDS_KEY, "{not json").unwrap();
        assert_eq!(prefs.guest_boards().unwrap(), vec![GUEST_FIXED_BOARD.to_string()]);
    }

    #[test]
    fn test_login_only_filter_resets_for_guests() {
        let (store, prefs) = prefs();
        prefs.set_current_filter(NoticeFilter::Favorite).unwrap();
        assert_eq!(prefs.current_filter(true).unwrap(), NoticeFilter::Favorite);
        assert_eq!(prefs.current_filter(false).unwrap(), NoticeFilter::All);
        assert_eq!(store.get(CURRENT_FILTER_KEY).unwrap().as_deref(), Some("ALL"));
    }

    #[test]
    fn test_schedule_draft_per_event() {
        let (_, prefs) = prefs();
        let selection: SlotSelection = [SlotKey::parse("2024-05-20T09:00:00").unwrap()]
            .into_iter()
            .collect();
        prefs.save_schedule_draft("evt1", &selection).unwrap();

        let draft = prefs.schedule_draft("evt1").unwrap().unwrap();
        assert_eq!(draft.slots, selection.to_vec());
        assert!(prefs.schedule_draft("evt2").unwrap().is_none());

        prefs.clear_schedule_draft("evt1").unwrap();
        assert!(prefs.schedule_draft("evt1").unwrap().is_none());
    }

    #[test]
    fn test_keyword_seen_round_trip_and_board_groups_cache() {
        let (_, prefs) = prefs();
        let at = Utc.with_ymd_and_hms(2024, 5, 20, 9, 30, 0).unwrap();
        prefs.set_keyword_seen_at(at).unwrap();
        assert_eq!(prefs.keyword_seen_at().unwrap(), Some(at));

        let group = BoardGroup {
            id: 1,
            name: "학과".into(),
            board_codes: vec!["dept_csai".into()],
            created_at: "2024-05-01T00:00:00".into(),
            updated_at: "2024-05-01T00:00:00".into(),
        };
        prefs.cache_board_groups("a@jbnu.ac.kr", &[group.clone()]).unwrap();
        assert_eq!(prefs.cached_board_groups("a@jbnu.ac.kr").unwrap(), vec![group]);
        assert!(prefs.cached_board_groups("b@jbnu.ac.kr").unwrap().is_empty());
        assert!(!prefs.sidebar_collapsed().unwrap());
    }
}
