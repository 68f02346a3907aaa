use chrono::{Duration, NaiveDate, NaiveTime, Weekday};

use crate::models::RecommendedTime;

use super::grid::GridLayout;
use super::heatmap::Heatmap;
use super::slot::{SLOT_MINUTES, SlotKey};

/// Default number of recommendations surfaced to the user.
pub const DEFAULT_RECOMMENDATIONS: usize = 3;

/// A contiguous run of slots on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeWindow {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Exclusive: the end of the last slot in the run.
    pub end_time: NaiveTime,
    pub slots: u32,
}

impl FreeWindow {
    /// Key of the first slot, used to jump to the window in the grid.
    pub fn dt(&self) -> Option<SlotKey> {
        SlotKey::new(self.date, self.start_time).ok()
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(SLOT_MINUTES * i64::from(self.slots))
    }
}

/// Walks each date's slots in order and emits every maximal run for which
/// `matches` holds. The last run of a day is flushed at end of day.
pub fn runs_where(layout: &GridLayout, matches: impl Fn(&SlotKey) -> bool) -> Vec<FreeWindow> {
    let mut windows = Vec::new();
    for &date in layout.dates() {
        let mut open: Option<(SlotKey, u32)> = None;
        for key in layout.slots_on(date) {
            if matches(&key) {
                if let Some((_, len)) = open.as_mut() {
                    *len += 1;
                } else {
                    open = Some((key, 1));
                }
            } else if let Some((start, len)) = open.take() {
                windows.push(window(start, len));
            }
        }
        if let Some((start, len)) = open.take() {
            windows.push(window(start, len));
        }
    }
    windows
}

fn window(start: SlotKey, slots: u32) -> FreeWindow {
    FreeWindow {
        weekday: start.weekday(),
        date: start.date(),
        start_time: start.time(),
        end_time: start.time() + Duration::minutes(SLOT_MINUTES * i64::from(slots)),
        slots,
    }
}

/// Windows in which nobody is unavailable.
pub fn free_windows(heatmap: &Heatmap, layout: &GridLayout) -> Vec<FreeWindow> {
    runs_where(layout, |key| heatmap.count(key) == 0)
}

/// Longest windows at the lowest unavailability level across the grid.
///
/// Zero-conflict windows come back with `all_available`; when there are
/// none, windows at the minimal conflict count are returned instead.
pub fn recommend(heatmap: &Heatmap, layout: &GridLayout, limit: usize) -> Vec<RecommendedTime> {
    let total = heatmap.total_participants();
    if total == 0 {
        return Vec::new();
    }
    let Some(min) = layout.slot_keys().iter().map(|k| heatmap.count(k)).min() else {
        return Vec::new();
    };
    if min >= total {
        return Vec::new();
    }

    let mut windows = runs_where(layout, |key| heatmap.count(key) == min);
    windows.sort_by(|a, b| {
        b.slots
            .cmp(&a.slots)
            .then(a.date.cmp(&b.date))
            .then(a.start_time.cmp(&b.start_time))
    });
    windows
        .into_iter()
        .take(limit)
        .map(|w| RecommendedTime {
            date: w.date,
            start_time: w.start_time,
            end_time: w.end_time,
            available_count: total - min,
            all_available: min == 0,
        })
        .collect()
}
