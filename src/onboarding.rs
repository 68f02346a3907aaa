use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    CareerContactUpdate, CareerEducationsUpdate, CareerMentorQnAUpdate, CareerSkillsUpdate, CareerWorksUpdate,
    OnboardingRequest, OnboardingResponse, UserType,
};
use crate::preferences::{Preferences, SelectionError};

/// Career sections a mentor fills in during sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMentorCareer {
    pub contact: CareerContactUpdate,
    pub skills: CareerSkillsUpdate,
    pub works: CareerWorksUpdate,
    pub educations: CareerEducationsUpdate,
    pub mentor_qna: CareerMentorQnAUpdate,
}

/// An onboarding form saved before sign-in, submitted once a session exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingOnboarding {
    pub onboarding: OnboardingRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_career: Option<PendingMentorCareer>,
}

/// Completes onboarding, then saves mentor career sections one by one.
/// Stops at the first failure.
pub async fn submit_pending(api: &ApiClient, pending: &PendingOnboarding) -> Result<OnboardingResponse, ApiError> {
    let response = api.complete_onboarding(&pending.onboarding).await?;

    if let (UserType::Mentor, Some(career)) = (pending.onboarding.user_type, &pending.mentor_career) {
        api.save_career_contact(&career.contact).await?;
        api.save_career_skills(&career.skills).await?;
        api.save_career_works(&career.works).await?;
        api.save_career_educations(&career.educations).await?;
        api.save_career_mentor_qna(&career.mentor_qna).await?;
    }
    Ok(response)
}

/// Submits a stored pending onboarding, if any, and clears it on success.
/// The subscribed boards become the cached selection.
pub async fn resume_pending(
    api: &ApiClient,
    prefs: &Preferences,
) -> Result<Option<OnboardingResponse>, SelectionError> {
    if !api.session().is_logged_in() {
        return Ok(None);
    }
    let Some(pending) = prefs.pending_onboarding()? else {
        return Ok(None);
    };
    let response = submit_pending(api, &pending).await?;
    prefs.clear_pending_onboarding()?;
    prefs.cache_subscriptions(&response.subscribed_boards)?;
    info!(boards = response.subscribed_boards.len(), "pending onboarding submitted");
    Ok(Some(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_onboarding_shape() {
        let raw = r#"{
            "onboarding": {"user_type": "student", "school": "전북대학교", "board_codes": ["home_campus"]}
        }"#;
        let pending: PendingOnboarding = serde_json::from_str(raw).unwrap();
        assert!(pending.mentor_career.is_none());
        assert_eq!(pending.onboarding.user_type, UserType::Student);

        let value = serde_json::to_value(&pending).unwrap();
        assert!(value.get("mentorCareer").is_none());
    }
}
