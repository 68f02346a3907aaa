use chrono::NaiveDate;
use http::Method;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    ChinbaEventDetail, ChinbaEventListItem, CreateEventResponse, ImportTimetableResponse, MyParticipation,
    UnavailabilityUpdate,
};
use crate::schedule::SlotSelection;
use crate::validation::{validate_event_request, validate_hours, validate_slots};

/// An event together with the caller's own submission.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedEvent {
    pub detail: ChinbaEventDetail,
    pub participation: MyParticipation,
}

impl LoadedEvent {
    /// The caller's saved slots, ready to seed the selection grid.
    pub fn selection(&self) -> SlotSelection {
        self.participation.unavailable_slots.iter().cloned().collect()
    }
}

impl ApiClient {
    pub async fn create_event(&self, title: &str, dates: &[NaiveDate]) -> Result<CreateEventResponse, ApiError> {
        let request = validate_event_request(title, dates)?;
        let created: CreateEventResponse = self.send_json(Method::POST, "/chinba/events", &request).await?;
        info!(event_id = %created.event_id, "chinba event created");
        Ok(created)
    }

    pub async fn event_detail(&self, event_id: &str) -> Result<ChinbaEventDetail, ApiError> {
        self.get(&format!("/chinba/events/{event_id}"), &[]).await
    }

    pub async fn my_participation(&self, event_id: &str) -> Result<MyParticipation, ApiError> {
        self.get(&format!("/chinba/events/{event_id}/my-participation"), &[])
            .await
    }

    /// Fetches the event and the caller's participation concurrently.
    pub async fn load_event(&self, event_id: &str) -> Result<LoadedEvent, ApiError> {
        let (detail, participation) =
            futures::try_join!(self.event_detail(event_id), self.my_participation(event_id))?;
        Ok(LoadedEvent { detail, participation })
    }

    /// Replaces the caller's unavailable slots. Closed events and slots
    /// outside the event grid are rejected before anything is sent.
    pub async fn save_unavailability(
        &self,
        event: &ChinbaEventDetail,
        selection: &SlotSelection,
        today: NaiveDate,
    ) -> Result<(), ApiError> {
        let status = event.effective_status(today);
        if !event.is_editable(today) {
            return Err(ApiError::EventClosed(status));
        }
        validate_hours(event.start_hour, event.end_hour)?;
        validate_slots(&event.layout(), selection.iter())?;

        let update = UnavailabilityUpdate {
            unavailable_slots: selection.to_vec(),
        };
        let _: serde_json::Value = self
            .send_json(
                Method::PUT,
                &format!("/chinba/events/{}/my-unavailability", event.event_id),
                &update,
            )
            .await?;
        Ok(())
    }

    /// Copies the caller's timetable classes into their unavailable slots.
    pub async fn import_timetable_into_event(&self, event_id: &str) -> Result<ImportTimetableResponse, ApiError> {
        self.send_empty(Method::POST, &format!("/chinba/events/{event_id}/import-timetable"), &[])
            .await
    }

    pub async fn my_events(&self) -> Result<Vec<ChinbaEventListItem>, ApiError> {
        self.get("/chinba/my-events", &[]).await
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::DELETE, &format!("/chinba/events/{event_id}"), &[])
            .await?;
        Ok(())
    }

    pub async fn complete_event(&self, event_id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .send_empty(Method::PATCH, &format!("/chinba/events/{event_id}/complete"), &[])
            .await?;
        Ok(())
    }
}
