pub mod board_group;
pub mod career;
pub mod chinba;
pub mod keyword;
pub mod notice;
pub mod timetable;
pub mod user;

pub use board_group::*;
pub use career::*;
pub use chinba::*;
pub use keyword::*;
pub use notice::*;
pub use timetable::*;
pub use user::*;

/// `HH:MM` wall-clock times as the backend writes them.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid time '{raw}'")))
    }

    pub(crate) fn parse(raw: &str) -> Option<NaiveTime> {
        // A window that runs to the end of the day is written as 24:00.
        if raw == "24:00" || raw == "24:00:00" {
            return NaiveTime::from_hms_opt(0, 0, 0);
        }
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer, de::Error};

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid time '{raw}'"))),
                None => Ok(None),
            }
        }
    }
}
