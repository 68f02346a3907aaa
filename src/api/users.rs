use http::Method;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{
    OnboardingRequest, OnboardingResponse, UpdateSubscriptionsRequest, UpdateSubscriptionsResponse, UserProfile,
    UserProfileUpdate, UserSubscription,
};

impl ApiClient {
    /// Fetches the profile and caches it on the session.
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.get("/users/me", &[]).await?;
        self.session().set_user(Some(profile.clone()));
        Ok(profile)
    }

    pub async fn update_me(&self, update: &UserProfileUpdate) -> Result<UserProfile, ApiError> {
        let profile: UserProfile = self.send_json(Method::PATCH, "/users/me", update).await?;
        self.session().set_user(Some(profile.clone()));
        Ok(profile)
    }

    pub async fn my_subscriptions(&self) -> Result<Vec<UserSubscription>, ApiError> {
        self.get("/users/me/subscriptions", &[]).await
    }

    /// Replaces the whole subscription set.
    pub async fn update_subscriptions(&self, board_codes: &[String]) -> Result<UpdateSubscriptionsResponse, ApiError> {
        let request = UpdateSubscriptionsRequest {
            board_codes: board_codes.to_vec(),
        };
        self.send_json(Method::PUT, "/users/me/subscriptions", &request).await
    }

    pub async fn complete_onboarding(&self, request: &OnboardingRequest) -> Result<OnboardingResponse, ApiError> {
        let response: OnboardingResponse = self.send_json(Method::POST, "/users/me/onboarding", request).await?;
        self.session().set_user(Some(response.user.clone()));
        Ok(response)
    }
}
