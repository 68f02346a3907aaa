use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::models::UserProfile;

#[derive(Debug, Default)]
struct SessionState {
    access_token: Option<String>,
    user: Option<UserProfile>,
}

/// Signed-in state shared by the API client and the feature services.
///
/// Created once at startup and handed to whatever needs it. Cleared on
/// logout and whenever the backend rejects the access token, which drops
/// the caller back to guest mode.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_access_token(Some(token.into()));
        session
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        self.write().access_token = token.filter(|t| !t.is_empty());
    }

    pub fn is_logged_in(&self) -> bool {
        self.read().access_token.is_some()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().user.clone()
    }

    pub fn set_user(&self, user: Option<UserProfile>) {
        self.write().user = user;
    }

    pub fn clear(&self) {
        let mut state = self.write();
        if state.access_token.is_some() {
            info!("session cleared, continuing as guest");
        }
        *state = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let session = Session::new();
        assert!(!session.is_logged_in());

        let shared = session.clone();
        session.set_access_token(Some("abc".into()));
        assert!(shared.is_logged_in());
        assert_eq!(shared.access_token().as_deref(), Some("abc"));

        shared.clear();
        assert!(!session.is_logged_in());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_empty_token_is_guest() {
        let session = Session::with_token("");
        assert!(!session.is_logged_in());
    }
}
