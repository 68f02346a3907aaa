use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{IncrementViewResponse, Notice, NoticePage, NoticeQuery};
use crate::optimistic::OptimisticMutation;
use crate::preferences::Preferences;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeFilter {
    #[default]
    All,
    Unread,
    Favorite,
    Keyword,
}

impl NoticeFilter {
    pub fn requires_login(self) -> bool {
        !matches!(self, NoticeFilter::All)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoticeFilter::All => "ALL",
            NoticeFilter::Unread => "UNREAD",
            NoticeFilter::Favorite => "FAVORITE",
            NoticeFilter::Keyword => "KEYWORD",
        }
    }
}

impl fmt::Display for NoticeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoticeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALL" => Ok(NoticeFilter::All),
            "UNREAD" => Ok(NoticeFilter::Unread),
            "FAVORITE" => Ok(NoticeFilter::Favorite),
            "KEYWORD" => Ok(NoticeFilter::Keyword),
            other => Err(format!("unknown notice filter '{other}'")),
        }
    }
}

/// Where one cached copy of a notice sits in a [`NoticeFeed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyLocation {
    Page { page: usize, index: usize },
    Keyword(usize),
}

/// Locally cached notices: the cursor pages fetched so far plus the
/// keyword-matched list. The same notice can sit in both.
#[derive(Debug, Clone, Default)]
pub struct NoticeFeed {
    pages: Vec<NoticePage>,
    keyword_notices: Vec<Notice>,
}

impl NoticeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&mut self, page: NoticePage) {
        self.pages.push(page);
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.pages.last().and_then(|p| p.next_cursor.as_deref())
    }

    /// True before the first page has been fetched.
    pub fn has_next(&self) -> bool {
        self.pages.last().is_none_or(|p| p.has_next)
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.pages.iter().flat_map(|p| p.items.iter().cloned()).collect()
    }

    pub fn keyword_notices(&self) -> &[Notice] {
        &self.keyword_notices
    }

    pub fn set_keyword_notices(&mut self, notices: Vec<Notice>) {
        self.keyword_notices = notices;
    }

    pub fn find(&self, notice_id: i64) -> Option<&Notice> {
        self.pages
            .iter()
            .flat_map(|p| p.items.iter())
            .chain(self.keyword_notices.iter())
            .find(|n| n.id == notice_id)
    }

    /// Applies `change` to every cached copy of the notice.
    pub fn update_notice(&mut self, notice_id: i64, change: impl Fn(&mut Notice)) -> bool {
        let mut found = false;
        let copies = self
            .pages
            .iter_mut()
            .flat_map(|p| p.items.iter_mut())
            .chain(self.keyword_notices.iter_mut());
        for notice in copies.filter(|n| n.id == notice_id) {
            change(notice);
            found = true;
        }
        found
    }

    /// Positions of the cached copies of a notice that satisfy `matches`.
    pub fn locate(&self, notice_id: i64, matches: impl Fn(&Notice) -> bool) -> Vec<CopyLocation> {
        let pages = self.pages.iter().enumerate().flat_map(|(page, p)| {
            p.items
                .iter()
                .enumerate()
                .map(move |(index, n)| (CopyLocation::Page { page, index }, n))
        });
        let keyword = self
            .keyword_notices
            .iter()
            .enumerate()
            .map(|(index, n)| (CopyLocation::Keyword(index), n));
        pages
            .chain(keyword)
            .filter(|(_, n)| n.id == notice_id && matches(n))
            .map(|(location, _)| location)
            .collect()
    }

    /// Applies `change` to the copies at `locations` that still hold `notice_id`.
    pub fn update_at(&mut self, notice_id: i64, locations: &[CopyLocation], change: impl Fn(&mut Notice)) {
        for location in locations {
            let notice = match *location {
                CopyLocation::Page { page, index } => self.pages.get_mut(page).and_then(|p| p.items.get_mut(index)),
                CopyLocation::Keyword(index) => self.keyword_notices.get_mut(index),
            };
            if let Some(notice) = notice.filter(|n| n.id == notice_id) {
                change(notice);
            }
        }
    }

    pub fn reset(&mut self) {
        self.pages.clear();
    }
}

/// Newest first by posting date, then by id.
pub fn sort_by_date(notices: &mut [Notice]) {
    notices.sort_by_key(|n| Reverse((n.posted_at(), n.id)));
}

/// Union of both lists without duplicates, the primary copy winning.
pub fn merge_for_all(primary: Vec<Notice>, extra: &[Notice]) -> Vec<Notice> {
    let mut seen: HashSet<i64> = primary.iter().map(|n| n.id).collect();
    let mut merged = primary;
    merged.extend(extra.iter().filter(|n| seen.insert(n.id)).cloned());
    sort_by_date(&mut merged);
    merged
}

/// What the feed shows for `filter`.
///
/// Signed-in feeds are already narrowed to the user's subscriptions by the
/// backend; guests get every board and are filtered here.
pub fn filter_notices(
    feed: &NoticeFeed,
    selected_boards: &[String],
    logged_in: bool,
    filter: NoticeFilter,
) -> Vec<Notice> {
    let mut notices = feed.notices();
    if !logged_in {
        notices.retain(|n| selected_boards.contains(&n.board_code));
    }

    match filter {
        NoticeFilter::All => merge_for_all(notices, feed.keyword_notices()),
        NoticeFilter::Keyword => feed.keyword_notices().to_vec(),
        NoticeFilter::Unread => {
            notices.retain(|n| !n.is_read);
            notices
        }
        NoticeFilter::Favorite => {
            notices.retain(|n| n.is_favorite);
            notices.sort_by_key(|n| Reverse(n.favorited_at()));
            notices
        }
    }
}

pub fn latest_keyword_notice_at(items: &[Notice]) -> Option<DateTime<Utc>> {
    items.iter().filter_map(Notice::collected_at).max()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeywordBadge {
    pub has_new: bool,
    pub new_count: usize,
}

/// Compares keyword notices against the stored "seen" mark.
///
/// With no mark yet, the newest notice becomes the mark and nothing is
/// reported as new.
pub fn keyword_badge(items: &[Notice], prefs: &Preferences) -> Result<KeywordBadge, StoreError> {
    let Some(latest) = latest_keyword_notice_at(items) else {
        return Ok(KeywordBadge::default());
    };
    let Some(seen) = prefs.keyword_seen_at()? else {
        prefs.set_keyword_seen_at(latest)?;
        return Ok(KeywordBadge::default());
    };
    let new_count = items
        .iter()
        .filter(|n| n.collected_at().is_some_and(|at| at > seen))
        .count();
    Ok(KeywordBadge {
        has_new: latest > seen,
        new_count,
    })
}

/// Moves the "seen" mark up to the newest keyword notice.
pub fn mark_keyword_notices_seen(items: &[Notice], prefs: &Preferences) -> Result<(), StoreError> {
    match latest_keyword_notice_at(items) {
        Some(latest) => prefs.set_keyword_seen_at(latest),
        None => Ok(()),
    }
}

/// Read/favorite/view actions with optimistic feed updates.
#[derive(Clone)]
pub struct NoticeActions {
    api: ApiClient,
    feed: Arc<Mutex<NoticeFeed>>,
}

impl NoticeActions {
    pub fn new(api: ApiClient, feed: Arc<Mutex<NoticeFeed>>) -> Self {
        Self { api, feed }
    }

    pub fn feed(&self) -> &Arc<Mutex<NoticeFeed>> {
        &self.feed
    }

    /// Fetches the next cursor page into the feed. Returns how many notices arrived.
    pub async fn load_next_page(&self, board_codes: &[String], only_favorite: bool) -> Result<usize, ApiError> {
        let cursor = {
            let feed = self.feed.lock().await;
            if !feed.has_next() {
                return Ok(0);
            }
            feed.next_cursor().map(str::to_string)
        };
        let query = NoticeQuery {
            cursor,
            board_codes: board_codes.to_vec(),
            only_favorite,
            ..NoticeQuery::default()
        };
        let page = self.api.fetch_notices(&query).await?;
        let count = page.items.len();
        debug!(count, has_next = page.has_next, "notice page loaded");
        self.feed.lock().await.push_page(page);
        Ok(count)
    }

    /// Guests are a silent no-op.
    pub async fn mark_as_read(&self, notice_id: i64) -> Result<(), ApiError> {
        if !self.api.session().is_logged_in() {
            return Ok(());
        }
        // only copies that were unread get flipped, and only those flip back
        let unread = self.feed.lock().await.locate(notice_id, |n| !n.is_read);
        let restore = unread.clone();
        OptimisticMutation::new(
            move |feed: &mut NoticeFeed| feed.update_at(notice_id, &unread, |n| n.is_read = true),
            move |feed: &mut NoticeFeed| feed.update_at(notice_id, &restore, |n| n.is_read = false),
        )
        .run(&*self.feed, self.api.mark_notice_read(notice_id))
        .await
        .map(|_| ())
    }

    /// Guests get `LoginRequired` and the feed is left untouched.
    pub async fn toggle_favorite(&self, notice_id: i64) -> Result<(), ApiError> {
        if !self.api.session().is_logged_in() {
            return Err(ApiError::LoginRequired);
        }
        let toggle = move |feed: &mut NoticeFeed| {
            feed.update_notice(notice_id, |n| n.is_favorite = !n.is_favorite);
        };
        OptimisticMutation::involution(toggle)
            .run(&*self.feed, self.api.toggle_notice_favorite(notice_id))
            .await
            .map(|_| ())
    }

    /// Bumps the view counter and writes the server's count into the feed.
    pub async fn increment_view(&self, notice_id: i64) -> Result<IncrementViewResponse, ApiError> {
        let response = self.api.increment_notice_view(notice_id).await?;
        let view = response.view;
        self.feed
            .lock()
            .await
            .update_notice(notice_id, |n| n.view = view);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn notice(id: i64, board: &str, date: &str) -> Notice {
        Notice {
            id,
            title: format!("notice {id}"),
            link: format!("https://example.com/{id}"),
            date: date.to_string(),
            board_code: board.to_string(),
            created_at: format!("{date}T09:00:00"),
            is_read: false,
            view: 0,
            is_favorite: false,
            favorite_created_at: None,
            matched_keywords: None,
        }
    }

    fn feed_with(items: Vec<Notice>, keyword: Vec<Notice>) -> NoticeFeed {
        let mut feed = NoticeFeed::new();
        feed.push_page(NoticePage {
            items,
            next_cursor: Some("c1".into()),
            has_next: true,
        });
        feed.set_keyword_notices(keyword);
        feed
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("unread".parse::<NoticeFilter>().unwrap(), NoticeFilter::Unread);
        assert_eq!(NoticeFilter::Keyword.to_string(), "KEYWORD");
        assert!("LATEST".parse::<NoticeFilter>().is_err());
        assert!(!NoticeFilter::All.requires_login());
        assert!(NoticeFilter::Favorite.requires_login());
    }

    #[test]
    fn test_all_merges_keyword_notices_without_duplicates() {
        let mut primary = notice(1, "home_campus", "2024-05-01");
        primary.is_read = true;
        let mut keyword_copy = notice(1, "home_campus", "2024-05-01");
        keyword_copy.matched_keywords = Some(vec!["장학".into()]);
        let feed = feed_with(
            vec![primary, notice(2, "home_campus", "2024-05-03")],
            vec![keyword_copy, notice(3, "dept_csai", "2024-05-02")],
        );

        let all = filter_notices(&feed, &[], true, NoticeFilter::All);
        let ids: Vec<i64> = all.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert!(all[2].is_read);
    }

    #[test]
    fn test_same_date_sorts_by_id_desc() {
        let mut items = vec![notice(4, "a", "2024-05-01"), notice(9, "a", "2024-05-01")];
        sort_by_date(&mut items);
        assert_eq!(items[0].id, 9);
    }

    #[test]
    fn test_guest_board_filtering() {
        let feed = feed_with(
            vec![notice(1, "home_campus", "2024-05-01"), notice(2, "dept_csai", "2024-05-02")],
            Vec::new(),
        );
        let shown = filter_notices(&feed, &["home_campus".to_string()], false, NoticeFilter::All);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].board_code, "home_campus");
    }

    #[test]
    fn test_update_at_touches_only_located_copies() {
        let mut read_copy = notice(1, "home_campus", "2024-05-01");
        read_copy.is_read = true;
        let mut feed = feed_with(vec![notice(1, "home_campus", "2024-05-01")], vec![read_copy]);

        let unread = feed.locate(1, |n| !n.is_read);
        assert_eq!(unread, vec![CopyLocation::Page { page: 0, index: 0 }]);

        feed.update_at(1, &unread, |n| n.is_read = true);
        feed.update_at(1, &unread, |n| n.is_read = false);
        assert!(!feed.notices()[0].is_read);
        assert!(feed.keyword_notices()[0].is_read);

        // stale locations are skipped once the slot holds another notice
        feed.reset();
        feed.push_page(NoticePage {
            items: vec![notice(2, "home_campus", "2024-05-02")],
            next_cursor: None,
            has_next: false,
        });
        feed.update_at(1, &unread, |n| n.is_read = true);
        assert!(!feed.notices()[0].is_read);
    }

    #[test]
    fn test_favorite_sorts_by_favorited_time() {
        let mut a = notice(1, "x", "2024-05-01");
        a.is_favorite = true;
        a.favorite_created_at = Some("2024-05-10T00:00:00".into());
        let mut b = notice(2, "x", "2024-05-02");
        b.is_favorite = true;
        b.favorite_created_at = Some("2024-05-11T00:00:00".into());
        let feed = feed_with(vec![a, b, notice(3, "x", "2024-05-03")], Vec::new());

        let favorites = filter_notices(&feed, &[], true, NoticeFilter::Favorite);
        assert_eq!(favorites.iter().map(|n| n.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(filter_notices(&feed, &[], true, NoticeFilter::Unread).len(), 3);
    }

    #[test]
    fn test_update_notice_touches_both_lists() {
        let mut feed = feed_with(vec![notice(1, "x", "2024-05-01")], vec![notice(1, "x", "2024-05-01")]);
        assert!(feed.update_notice(1, |n| n.is_favorite = true));
        assert!(feed.notices()[0].is_favorite);
        assert!(feed.keyword_notices()[0].is_favorite);
        assert!(!feed.update_notice(42, |n| n.is_favorite = true));
        assert_eq!(feed.next_cursor(), Some("c1"));
    }

    #[test]
    fn test_keyword_badge_first_run_sets_mark() {
        let prefs = Preferences::new(Arc::new(MemoryStore::new()));
        let items = vec![notice(1, "x", "2024-05-01"), notice(2, "x", "2024-05-03")];

        assert_eq!(keyword_badge(&items, &prefs).unwrap(), KeywordBadge::default());
        assert!(prefs.keyword_seen_at().unwrap().is_some());

        let mut newer = items.clone();
        newer.push(notice(3, "x", "2024-05-05"));
        let badge = keyword_badge(&newer, &prefs).unwrap();
        assert!(badge.has_new);
        assert_eq!(badge.new_count, 1);

        mark_keyword_notices_seen(&newer, &prefs).unwrap();
        assert!(!keyword_badge(&newer, &prefs).unwrap().has_new);
    }
}
