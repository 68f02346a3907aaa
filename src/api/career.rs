use http::Method;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    CareerActivitiesUpdate, CareerCertificationsUpdate, CareerContactUpdate, CareerEducationsUpdate,
    CareerMentorQnAUpdate, CareerProfile, CareerSkillsUpdate, CareerWorksUpdate,
};

impl ApiClient {
    pub async fn my_career(&self) -> Result<CareerProfile, ApiError> {
        self.get("/users/me/career", &[]).await
    }

    pub async fn user_career(&self, user_id: i64) -> Result<CareerProfile, ApiError> {
        self.get(&format!("/users/{user_id}/career"), &[]).await
    }

    pub async fn save_career_contact(&self, update: &CareerContactUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/contact", update).await
    }

    pub async fn save_career_educations(&self, update: &CareerEducationsUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/educations", update).await
    }

    pub async fn save_career_works(&self, update: &CareerWorksUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/works", update).await
    }

    pub async fn save_career_skills(&self, update: &CareerSkillsUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/skills", update).await
    }

    pub async fn save_career_certifications(
        &self,
        update: &CareerCertificationsUpdate,
    ) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/certifications", update)
            .await
    }

    pub async fn save_career_activities(&self, update: &CareerActivitiesUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/activities", update).await
    }

    pub async fn save_career_mentor_qna(&self, update: &CareerMentorQnAUpdate) -> Result<CareerProfile, ApiError> {
        self.send_json(Method::PUT, "/users/me/career/mentor-qna", update).await
    }
}
