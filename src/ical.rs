use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::{ChinbaEventDetail, RecommendedTime, TimetableClass};
use crate::schedule::FreeWindow;

#[derive(Clone, Default)]
pub struct ScheduleExporter;

fn at(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}

/// `end` of 00:00 means midnight at the end of `date`.
fn until(date: NaiveDate, end: NaiveTime) -> NaiveDateTime {
    if end == NaiveTime::MIN {
        at(date, end) + Duration::days(1)
    } else {
        at(date, end)
    }
}

impl ScheduleExporter {
    pub fn new() -> Self {
        Self
    }

    /// One VEVENT per recommended meeting time of `event`.
    pub fn export_recommendations(&self, event: &ChinbaEventDetail, times: &[RecommendedTime]) -> Vec<u8> {
        if times.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(&format!("Chinba: {}", event.title));

        for time in times {
            let mut ev = Event::new();
            ev.summary(&event.title);
            ev.starts(at(time.date, time.start_time));
            ev.ends(until(time.date, time.end_time));
            let availability = if time.all_available {
                "Everyone is available".to_string()
            } else {
                format!("{} available", time.available_count)
            };
            ev.description(&format!("Chinba recommendation\n{availability}"));
            ev.uid(&format!(
                "{}-{}-chinba",
                event.event_id,
                at(time.date, time.start_time).format("%Y%m%dT%H%M%S")
            ));
            calendar.push(ev);
        }

        calendar.to_string().into_bytes()
    }

    pub fn export_free_windows(&self, title: &str, windows: &[FreeWindow]) -> Vec<u8> {
        if windows.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(title);
        for window in windows {
            let mut ev = Event::new();
            ev.summary(&format!("{title} (free)"));
            ev.starts(at(window.date, window.start_time));
            ev.ends(until(window.date, window.end_time));
            ev.uid(&format!(
                "{}-{}-free",
                title.replace(' ', "-"),
                at(window.date, window.start_time).format("%Y%m%dT%H%M%S")
            ));
            calendar.push(ev);
        }
        calendar.to_string().into_bytes()
    }

    /// Places the weekly classes on the week containing `week_of`.
    pub fn export_timetable(&self, classes: &[TimetableClass], week_of: NaiveDate) -> Vec<u8> {
        if classes.is_empty() {
            return Vec::new();
        }

        let monday = week_of - Duration::days(i64::from(week_of.weekday().num_days_from_monday()));
        let mut calendar = Calendar::new();
        calendar.name("Timetable");

        for class in classes {
            let Some(weekday) = class.weekday() else {
                continue;
            };
            let date = monday + Duration::days(i64::from(weekday.num_days_from_monday()));
            let mut ev = Event::new();
            ev.summary(&class.name);
            ev.starts(at(date, class.start_time));
            ev.ends(until(date, class.end_time));
            if let Some(location) = &class.location {
                ev.location(location);
            }
            if let Some(professor) = &class.professor {
                ev.description(&format!("Professor: {professor}"));
            }
            ev.uid(&format!("{}-{}-timetable", class.id, date.format("%Y%m%d")));
            calendar.push(ev);
        }

        calendar.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn event() -> ChinbaEventDetail {
        ChinbaEventDetail {
            event_id: "evt1".into(),
            title: "Study group".into(),
            dates: vec![NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()],
            start_hour: 9,
            end_hour: 11,
            status: EventStatus::Active,
            creator_id: 1,
            creator_nickname: None,
            participants: Vec::new(),
            heatmap: Vec::new(),
            recommended_times: Vec::new(),
            created_at: "2024-05-01T00:00:00".into(),
        }
    }

    #[test]
    fn test_export_recommendations() {
        let time = RecommendedTime {
            date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            start_time: t(10, 0),
            end_time: t(11, 0),
            available_count: 3,
            all_available: true,
        };
        let body = String::from_utf8(ScheduleExporter::new().export_recommendations(&event(), &[time])).unwrap();
        assert!(body.contains("BEGIN:VEVENT"));
        assert!(body.contains("Study group"));
        assert!(body.contains("20240520T100000"));
        assert!(body.contains("evt1-20240520T100000-chinba"));
    }

    #[test]
    fn test_export_timetable_places_classes_on_week() {
        let class = TimetableClass {
            id: 7,
            name: "Operating Systems".into(),
            professor: Some("Kim".into()),
            location: Some("공대 7호관".into()),
            day: 2,
            start_time: t(9, 0),
            end_time: t(10, 30),
        };
        // a Friday; Wednesday of the same week is 2024-05-22
        let friday = NaiveDate::from_ymd_opt(2024, 5, 24).unwrap();
        let body = String::from_utf8(ScheduleExporter::new().export_timetable(&[class], friday)).unwrap();
        assert!(body.contains("20240522T090000"));
        assert!(body.contains("7-20240522-timetable"));
    }

    #[test]
    fn test_export_empty() {
        let exporter = ScheduleExporter::new();
        assert!(exporter.export_recommendations(&event(), &[]).is_empty());
        assert!(exporter.export_free_windows("x", &[]).is_empty());
        assert!(exporter.export_timetable(&[], NaiveDate::MIN).is_empty());
    }
}
