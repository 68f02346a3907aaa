use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of one slot in minutes.
pub const SLOT_MINUTES: i64 = 30;

static SLOT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})T(\d{2}):(00|30):00$").expect("slot key regex compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("'{0}' is not a slot key (expected YYYY-MM-DDTHH:MM:00)")]
    InvalidFormat(String),
    #[error("{0} is not aligned to a 30-minute boundary")]
    Misaligned(NaiveTime),
    #[error("range must end after it starts (got {start}..{end})")]
    EmptyRange { start: NaiveTime, end: NaiveTime },
}

/// One half-hour interval, keyed as `YYYY-MM-DDTHH:MM:00`.
///
/// The key is zero padded, so the derived string ordering is also the
/// chronological ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotKey(String);

impl SlotKey {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Result<Self, SlotError> {
        if !is_aligned(time) {
            return Err(SlotError::Misaligned(time));
        }
        Ok(Self(format!(
            "{}T{}:00",
            date.format("%Y-%m-%d"),
            time.format("%H:%M")
        )))
    }

    pub fn parse(raw: &str) -> Result<Self, SlotError> {
        let invalid = || SlotError::InvalidFormat(raw.to_string());
        let caps = SLOT_KEY_RE.captures(raw).ok_or_else(invalid)?;
        NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|_| invalid())?;
        let hour: u32 = caps[2].parse().map_err(|_| invalid())?;
        if hour > 23 {
            return Err(invalid());
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn date(&self) -> NaiveDate {
        // The constructors only admit keys that parse.
        NaiveDate::parse_from_str(&self.0[..10], "%Y-%m-%d").unwrap_or_default()
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::parse_from_str(&self.0[11..16], "%H:%M").unwrap_or_default()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        NaiveDateTime::new(self.date(), self.time())
    }

    /// Wall-clock time at which this slot ends.
    pub fn end_time(&self) -> NaiveTime {
        self.time() + Duration::minutes(SLOT_MINUTES)
    }

    pub fn next(&self) -> SlotKey {
        let next = self.datetime() + Duration::minutes(SLOT_MINUTES);
        Self(next.format("%Y-%m-%dT%H:%M:00").to_string())
    }

    pub fn weekday(&self) -> Weekday {
        self.date().weekday()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SlotKey {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SlotKey {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SlotKey> for String {
    fn from(value: SlotKey) -> Self {
        value.0
    }
}

pub fn is_aligned(time: NaiveTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0 && time.minute() % SLOT_MINUTES as u32 == 0
}

/// Start times of every slot in `[start_hour, end_hour)`.
pub fn time_slots(start_hour: u32, end_hour: u32) -> Vec<NaiveTime> {
    (start_hour..end_hour.min(24))
        .flat_map(|h| [(h, 0), (h, 30)])
        .filter_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
        .collect()
}

/// Every slot key between `start` (inclusive) and `end` (exclusive) on one date.
/// An `end` of 00:00 means midnight at the end of `date`.
pub fn slot_range(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Vec<SlotKey>, SlotError> {
    let mut current = SlotKey::new(date, start)?;
    if !is_aligned(end) {
        return Err(SlotError::Misaligned(end));
    }
    let until = if end == NaiveTime::MIN {
        NaiveDateTime::new(date, end) + Duration::days(1)
    } else {
        NaiveDateTime::new(date, end)
    };
    if until <= current.datetime() {
        return Err(SlotError::EmptyRange { start, end });
    }
    let mut slots = Vec::new();
    while current.datetime() < until && current.date() == date {
        let next = current.next();
        slots.push(current);
        current = next;
    }
    Ok(slots)
}

/// Short Korean weekday label used in list output.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
        Weekday::Sun => "일",
    }
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
