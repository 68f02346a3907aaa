use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One lecture or personal block in the weekly timetable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimetableClass {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub professor: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// 0 = Monday .. 6 = Sunday.
    pub day: u8,
    #[serde(with = "super::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "super::hhmm")]
    pub end_time: NaiveTime,
}

impl TimetableClass {
    pub fn weekday(&self) -> Option<Weekday> {
        weekday_from_index(self.day)
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub(crate) fn weekday_from_index(day: u8) -> Option<Weekday> {
    WEEK.get(usize::from(day)).copied()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimetableData {
    pub id: i64,
    pub user_id: i64,
    pub semester: String,
    #[serde(default)]
    pub classes: Vec<TimetableClass>,
    pub created_at: String,
    pub updated_at: String,
}

/// A class the image analysis could not match; the user fills it in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnmatchedClass {
    pub name: String,
    pub day: Option<u8>,
    #[serde(default, with = "super::hhmm::option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "super::hhmm::option")]
    pub end_time: Option<NaiveTime>,
    pub professor: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimetableAnalysis {
    pub timetable: TimetableData,
    /// Share of classes matched automatically, 0.0 to 1.0.
    pub confidence: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub unmatched_classes: Vec<UnmatchedClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTimetableClass {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub day: u8,
    #[serde(with = "super::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "super::hhmm")]
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteTimetableClassResponse {
    pub message: String,
    pub class_id: i64,
    #[serde(default)]
    pub deleted_class_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassDetail {
    pub class_id: i64,
    pub name: String,
    pub professor: Option<String>,
    pub location: Option<String>,
    pub day: u8,
    #[serde(with = "super::hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "super::hhmm")]
    pub end_time: NaiveTime,
    pub credits: Option<f64>,
    pub course_type: Option<String>,
    pub class_div: Option<String>,
    pub grade_type: Option<String>,
    pub dept_name: Option<String>,
    pub subject_code: Option<String>,
    pub lecture_type: Option<String>,
    pub language: Option<String>,
    pub capacity: Option<u32>,
    pub enrolled: Option<u32>,
    pub hours: Option<f64>,
    pub target: Option<String>,
    pub field_area: Option<String>,
    pub field_detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_with_unmatched_classes() {
        let raw = r#"{
            "timetable": {
                "id": 1, "user_id": 7, "semester": "2025-1",
                "classes": [{"id": 3, "name": "OS", "day": 0, "start_time": "09:00", "end_time": "10:30"}],
                "created_at": "2025-03-01T00:00:00", "updated_at": "2025-03-01T00:00:00"
            },
            "confidence": 0.5,
            "warnings": ["low contrast"],
            "unmatched_classes": [
                {"name": "Seminar", "day": null, "start_time": null, "end_time": null,
                 "professor": null, "location": null}
            ]
        }"#;
        let analysis: TimetableAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(analysis.timetable.classes[0].weekday(), Some(Weekday::Mon));
        assert_eq!(analysis.unmatched_classes[0].start_time, None);
        assert_eq!(weekday_from_index(7), None);
    }
}
