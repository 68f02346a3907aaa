use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::schedule::grid::GridLayout;
use crate::schedule::heatmap::Heatmap;
use crate::schedule::slot::SlotKey;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Active,
    Completed,
    Expired,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventStatus::Active => "active",
            EventStatus::Completed => "completed",
            EventStatus::Expired => "expired",
        })
    }
}

/// Lifecycle as seen on `today`: an active event whose last date has
/// passed counts as expired even before the backend flips it.
pub fn effective_status(status: EventStatus, dates: &[NaiveDate], today: NaiveDate) -> EventStatus {
    match (status, dates.iter().max()) {
        (EventStatus::Active, Some(last)) if *last < today => EventStatus::Expired,
        (status, _) => status,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantInfo {
    pub user_id: i64,
    pub nickname: Option<String>,
    pub has_submitted: bool,
}

impl ParticipantInfo {
    pub fn display_name(&self) -> String {
        self.nickname
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("유저{}", self.user_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatmapSlot {
    pub dt: SlotKey,
    pub unavailable_count: u32,
    #[serde(default)]
    pub unavailable_members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedTime {
    pub date: NaiveDate,
    #[serde(with = "super::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "super::hhmm")]
    pub end_time: NaiveTime,
    pub available_count: u32,
    pub all_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChinbaEventDetail {
    pub event_id: String,
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub start_hour: u32,
    pub end_hour: u32,
    pub status: EventStatus,
    pub creator_id: i64,
    pub creator_nickname: Option<String>,
    #[serde(default)]
    pub participants: Vec<ParticipantInfo>,
    #[serde(default)]
    pub heatmap: Vec<HeatmapSlot>,
    #[serde(default)]
    pub recommended_times: Vec<RecommendedTime>,
    pub created_at: String,
}

impl ChinbaEventDetail {
    pub fn layout(&self) -> GridLayout {
        GridLayout::new(self.dates.clone(), self.start_hour, self.end_hour)
    }

    pub fn submitted_count(&self) -> u32 {
        self.participants.iter().filter(|p| p.has_submitted).count() as u32
    }

    /// Server heatmap scaled against the submitted participants.
    pub fn heatmap(&self) -> Heatmap {
        Heatmap::from_slots(self.heatmap.clone(), self.submitted_count())
    }

    pub fn effective_status(&self, today: NaiveDate) -> EventStatus {
        effective_status(self.status, &self.dates, today)
    }

    pub fn is_editable(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == EventStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MyParticipation {
    pub has_submitted: bool,
    #[serde(default)]
    pub unavailable_slots: Vec<SlotKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChinbaEventListItem {
    pub event_id: String,
    pub title: String,
    pub dates: Vec<NaiveDate>,
    pub status: EventStatus,
    pub creator_id: i64,
    pub creator_nickname: Option<String>,
    pub participant_count: u32,
    pub submitted_count: u32,
    pub my_submitted: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateEventRequest {
    pub title: String,
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateEventResponse {
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnavailabilityUpdate {
    pub unavailable_slots: Vec<SlotKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportTimetableResponse {
    pub message: String,
    pub imported_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_detail_deserialize() {
        let raw = r#"{
            "event_id": "abc",
            "title": "Study",
            "dates": ["2024-05-20", "2024-05-21"],
            "start_hour": 9,
            "end_hour": 22,
            "status": "active",
            "creator_id": 1,
            "creator_nickname": null,
            "participants": [
                {"user_id": 1, "nickname": "A", "has_submitted": true},
                {"user_id": 2, "nickname": null, "has_submitted": false}
            ],
            "heatmap": [
                {"dt": "2024-05-20T09:00:00", "unavailable_count": 1, "unavailable_members": ["A"]}
            ],
            "recommended_times": [
                {"date": "2024-05-20", "start_time": "10:00", "end_time": "12:00",
                 "available_count": 1, "all_available": true}
            ],
            "created_at": "2024-05-01T00:00:00"
        }"#;
        let event: ChinbaEventDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(event.submitted_count(), 1);
        assert_eq!(event.participants[1].display_name(), "유저2");
        assert_eq!(event.recommended_times[0].end_time, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(event.layout().slot_keys().len(), 2 * 26);
    }

    #[test]
    fn test_effective_status_expires_after_last_date() {
        let dates = vec![NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()];
        let same_day = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2024, 5, 21).unwrap();
        assert_eq!(effective_status(EventStatus::Active, &dates, same_day), EventStatus::Active);
        assert_eq!(effective_status(EventStatus::Active, &dates, next_day), EventStatus::Expired);
        assert_eq!(
            effective_status(EventStatus::Completed, &dates, next_day),
            EventStatus::Completed
        );
    }
}
