use http::Method;
use reqwest::multipart::{Form, Part};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{ClassDetail, DeleteTimetableClassResponse, NewTimetableClass, TimetableAnalysis, TimetableClass, TimetableData};
use crate::validation::validate_new_class;

/// A timetable screenshot to be analysed server-side.
#[derive(Debug, Clone)]
pub struct TimetableImage {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

fn semester_param(semester: Option<&str>) -> Vec<(&'static str, String)> {
    semester.map(|s| vec![("semester", s.to_string())]).unwrap_or_default()
}

impl ApiClient {
    /// `None` when the user has no timetable for the semester yet.
    pub async fn user_timetable(&self, semester: Option<&str>) -> Result<Option<TimetableData>, ApiError> {
        match self.get("/timetable", &semester_param(semester)).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn analyze_timetable(
        &self,
        image: TimetableImage,
        semester: Option<&str>,
    ) -> Result<TimetableAnalysis, ApiError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)?;
        let mut form = Form::new().part("file", part);
        if let Some(semester) = semester {
            form = form.text("semester", semester.to_string());
        }
        self.upload("/timetable/analyze", form).await
    }

    pub async fn add_timetable_class(
        &self,
        class: &NewTimetableClass,
        semester: Option<&str>,
    ) -> Result<TimetableClass, ApiError> {
        validate_new_class(class)?;
        self.send_json_with(Method::POST, "/timetable/classes", &semester_param(semester), class)
            .await
    }

    pub async fn delete_timetable_class(&self, class_id: i64) -> Result<DeleteTimetableClassResponse, ApiError> {
        self.send_empty(Method::DELETE, &format!("/timetable/classes/{class_id}"), &[])
            .await
    }

    pub async fn delete_timetable(&self, semester: Option<&str>) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, "/timetable", &semester_param(semester))
            .await?;
        Ok(())
    }

    pub async fn class_detail(&self, class_id: i64, semester: Option<&str>) -> Result<ClassDetail, ApiError> {
        self.get(&format!("/timetable/classes/{class_id}/detail"), &semester_param(semester))
            .await
    }
}
