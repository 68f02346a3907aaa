use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{CreateEventRequest, NewTimetableClass};
use crate::schedule::grid::GridLayout;
use crate::schedule::slot::{SlotError, SlotKey};

pub const MAX_TITLE_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("slot {0} is outside the event's dates or hours")]
    SlotOutOfRange(SlotKey),
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title must be at most 100 characters")]
    TitleTooLong,
    #[error("at least one date is required")]
    NoDates,
    #[error("hours must satisfy start < end <= 24 (got {start}..{end})")]
    InvalidHours { start: u32, end: u32 },
    #[error("keyword must not be empty")]
    EmptyKeyword,
    #[error("day must be between 0 and 6 (got {0})")]
    InvalidDay(u8),
    #[error("class must end after it starts")]
    InvalidClassTime,
}

/// Rejects any slot outside the event's dates or `[start_hour, end_hour)`.
pub fn validate_slots<'a>(
    layout: &GridLayout,
    slots: impl IntoIterator<Item = &'a SlotKey>,
) -> Result<(), ValidationError> {
    match slots.into_iter().find(|slot| !layout.contains(slot)) {
        Some(slot) => Err(ValidationError::SlotOutOfRange(slot.clone())),
        None => Ok(()),
    }
}

pub fn validate_hours(start: u32, end: u32) -> Result<(), ValidationError> {
    if start < end && end <= 24 {
        Ok(())
    } else {
        Err(ValidationError::InvalidHours { start, end })
    }
}

/// Trims the title and sorts/dedups the dates.
pub fn validate_event_request(title: &str, dates: &[NaiveDate]) -> Result<CreateEventRequest, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong);
    }
    if dates.is_empty() {
        return Err(ValidationError::NoDates);
    }
    let mut dates = dates.to_vec();
    dates.sort();
    dates.dedup();
    Ok(CreateEventRequest {
        title: title.to_string(),
        dates,
    })
}

pub fn validate_keyword(keyword: &str) -> Result<String, ValidationError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        Err(ValidationError::EmptyKeyword)
    } else {
        Ok(keyword.to_string())
    }
}

pub fn validate_new_class(class: &NewTimetableClass) -> Result<(), ValidationError> {
    if class.day > 6 {
        return Err(ValidationError::InvalidDay(class.day));
    }
    if class.end_time <= class.start_time {
        return Err(ValidationError::InvalidClassTime);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_validate_slots() {
        let layout = GridLayout::new(vec![day(20)], 9, 11);
        let inside = SlotKey::parse("2024-05-20T10:30:00").unwrap();
        let late = SlotKey::parse("2024-05-20T11:00:00").unwrap();
        let other_day = SlotKey::parse("2024-05-21T09:00:00").unwrap();
        assert!(validate_slots(&layout, [&inside]).is_ok());
        assert_eq!(
            validate_slots(&layout, [&inside, &late]),
            Err(ValidationError::SlotOutOfRange(late.clone()))
        );
        assert!(validate_slots(&layout, [&other_day]).is_err());
    }

    #[test]
    fn test_validate_event_request() {
        let req = validate_event_request("  Team sync ", &[day(21), day(20), day(21)]).unwrap();
        assert_eq!(req.title, "Team sync");
        assert_eq!(req.dates, vec![day(20), day(21)]);
        assert_eq!(validate_event_request("   ", &[day(20)]), Err(ValidationError::EmptyTitle));
        assert_eq!(validate_event_request("x", &[]), Err(ValidationError::NoDates));
        let long = "가".repeat(MAX_TITLE_CHARS + 1);
        assert_eq!(validate_event_request(&long, &[day(20)]), Err(ValidationError::TitleTooLong));
    }

    #[test]
    fn test_validate_hours() {
        assert!(validate_hours(9, 22).is_ok());
        assert!(validate_hours(0, 24).is_ok());
        assert!(validate_hours(10, 10).is_err());
        assert!(validate_hours(9, 25).is_err());
    }

    #[test]
    fn test_validate_new_class() {
        let mut class = NewTimetableClass {
            name: "OS".into(),
            professor: None,
            location: None,
            day: 2,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        };
        assert!(validate_new_class(&class).is_ok());
        class.day = 7;
        assert_eq!(validate_new_class(&class), Err(ValidationError::InvalidDay(7)));
        class.day = 1;
        class.end_time = class.start_time;
        assert_eq!(validate_new_class(&class), Err(ValidationError::InvalidClassTime));
        assert_eq!(validate_keyword("  "), Err(ValidationError::EmptyKeyword));
    }
}
