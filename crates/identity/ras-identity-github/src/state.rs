//! Login state tracking for CSRF protection.
//!
//! [`GitHubTeamAuth::auth_code_url`](crate::GitHubTeamAuth::auth_code_url)
//! accepts any state string. These helpers issue unguessable ones and check
//! that the callback brings back a state this server handed out.

use crate::error::{GitHubAuthError, GitHubAuthResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A login in progress, keyed by the `state` sent to GitHub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginState {
    pub state: String,
    /// Where to send the user once the login completes
    pub return_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LoginState {
    /// A TTL too large to represent never expires.
    pub fn new(return_to: Option<String>, ttl_seconds: u64) -> Self {
        let created_at = Utc::now();
        let expires_at = i64::try_from(ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            state: Uuid::new_v4().to_string(),
            return_to,
            created_at,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn store(&self, state: LoginState) -> GitHubAuthResult<()>;

    /// Remove and return a state. Each state can be taken once.
    async fn take(&self, state: &str) -> GitHubAuthResult<LoginState>;

    /// Drop expired states, returning how many were removed.
    async fn cleanup_expired(&self) -> GitHubAuthResult<usize>;
}

#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    states: Arc<RwLock<HashMap<String, LoginState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn store(&self, state: LoginState) -> GitHubAuthResult<()> {
        let mut states = self.states.write().await;
        states.insert(state.state.clone(), state);
        Ok(())
    }

    async fn take(&self, state: &str) -> GitHubAuthResult<LoginState> {
        let mut states = self.states.write().await;

        let login_state = states.remove(state).ok_or(GitHubAuthError::StateNotFound)?;

        if login_state.is_expired() {
            return Err(GitHubAuthError::StateNotFound);
        }

        Ok(login_state)
    }

    async fn cleanup_expired(&self) -> GitHubAuthResult<usize> {
        let mut states = self.states.write().await;
        let now = Utc::now();

        let before = states.len();
        states.retain(|_, state| state.expires_at >= now);

        Ok(before - states.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_can_be_taken_once() {
        let store = InMemoryStateStore::new();

        let state = LoginState::new(Some("/dashboard".to_string()), 300);
        let state_param = state.state.clone();

        store.store(state).await.unwrap();

        let taken = store.take(&state_param).await.unwrap();
        assert_eq!(taken.return_to.as_deref(), Some("/dashboard"));

        let result = store.take(&state_param).await;
        assert!(matches!(result, Err(GitHubAuthError::StateNotFound)));
    }

    #[tokio::test]
    async fn test_unknown_state_is_rejected() {
        let store = InMemoryStateStore::new();

        let result = store.take("never-issued").await;
        assert!(matches!(result, Err(GitHubAuthError::StateNotFound)));
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected_and_cleaned_up() {
        let store = InMemoryStateStore::new();

        let mut expired = LoginState::new(None, 300);
        expired.expires_at = Utc::now() - Duration::minutes(1);
        let expired_param = expired.state.clone();

        let fresh = LoginState::new(None, 300);
        let fresh_param = fresh.state.clone();

        store.store(expired.clone()).await.unwrap();
        store.store(fresh).await.unwrap();

        let result = store.take(&expired_param).await;
        assert!(matches!(result, Err(GitHubAuthError::StateNotFound)));

        store.store(expired).await.unwrap();
        let cleaned = store.cleanup_expired().await.unwrap();
        assert_eq!(cleaned, 1);

        assert!(store.take(&fresh_param).await.is_ok());
    }

    #[test]
    fn test_huge_ttl_is_clamped() {
        for ttl in [u64::MAX, u64::MAX / 2, i64::MAX as u64] {
            let state = LoginState::new(None, ttl);

            assert!(!state.is_expired());
            assert!(state.expires_at > state.created_at);
        }
    }

    #[test]
    fn test_zero_ttl_expires_at_creation() {
        let state = LoginState::new(None, 0);
        assert_eq!(state.expires_at, state.created_at);
    }

    #[test]
    fn test_states_are_unique_uuids() {
        let a = LoginState::new(None, 60);
        let b = LoginState::new(None, 60);

        assert_ne!(a.state, b.state);
        assert_eq!(a.state.len(), 36);
        assert!(!a.is_expired());
    }
}
