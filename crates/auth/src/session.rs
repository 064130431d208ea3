//! Session state machine.
//!
//! ```text
//! anonymous ──login / stored token──▶ authenticated
//! authenticated ──401──▶ refreshing
//! refreshing ──refresh ok──▶ authenticated
//! refreshing ──refresh failed / no refresh token──▶ anonymous (+ redirect)
//! any ──logout──▶ anonymous (+ redirect)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::navigator::Navigator;
use crate::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, StorageError, TokenStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Anonymous,
    Authenticated,
    Refreshing,
}

/// Tokens held by this client plus the storage they persist to.
#[derive(Debug)]
pub struct Session<S> {
    access_token: Option<String>,
    refresh_token: Option<String>,
    state: SessionState,
    authenticated_at: Option<DateTime<Utc>>,
    storage: S,
}

impl<S: TokenStorage> Session<S> {
    /// Anonymous session; call [`Session::init_from_storage`] to pick up
    /// tokens from a previous run.
    pub fn new(storage: S) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            state: SessionState::Anonymous,
            authenticated_at: None,
            storage,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ─────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────

    /// Load persisted tokens. A stored access token makes the session
    /// authenticated; a lone refresh token keeps it anonymous but refreshable.
    pub fn init_from_storage(&mut self) -> Result<SessionState, StorageError> {
        self.access_token = self.storage.get(ACCESS_TOKEN_KEY)?;
        self.refresh_token = self.storage.get(REFRESH_TOKEN_KEY)?;

        if self.access_token.is_some() {
            self.mark_authenticated();
        } else {
            self.state = SessionState::Anonymous;
            self.authenticated_at = None;
        }

        tracing::debug!(
            state = ?self.state,
            has_refresh_token = self.refresh_token.is_some(),
            "session initialised from storage"
        );
        Ok(self.state)
    }

    /// Store a fresh token pair (successful login).
    pub fn set_tokens(&mut self, access: &str, refresh: &str) -> Result<(), StorageError> {
        self.access_token = Some(access.to_string());
        self.refresh_token = Some(refresh.to_string());
        self.mark_authenticated();

        self.storage.set(ACCESS_TOKEN_KEY, access)?;
        self.storage.set(REFRESH_TOKEN_KEY, refresh)?;
        tracing::info!("session authenticated");
        Ok(())
    }

    /// Enter `Refreshing` and hand out the refresh token to use. Returns
    /// `None` (state unchanged) when no refresh token is held.
    pub fn begin_refresh(&mut self) -> Option<String> {
        let token = self.refresh_token.clone()?;
        self.state = SessionState::Refreshing;
        Some(token)
    }

    /// Adopt the access token returned by a successful refresh. The refresh
    /// token is kept as is.
    pub fn complete_refresh(&mut self, access: &str) -> Result<(), StorageError> {
        self.access_token = Some(access.to_string());
        self.mark_authenticated();
        self.storage.set(ACCESS_TOKEN_KEY, access)?;
        tracing::info!("session refreshed");
        Ok(())
    }

    /// Drop all tokens, in memory and in storage.
    ///
    /// In-memory state is cleared even if storage fails. Both keys are always
    /// attempted; the first storage error is returned.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.access_token = None;
        self.refresh_token = None;
        self.state = SessionState::Anonymous;
        self.authenticated_at = None;

        let access = self.storage.remove(ACCESS_TOKEN_KEY);
        let refresh = self.storage.remove(REFRESH_TOKEN_KEY);
        access.and(refresh)
    }

    /// Clear the session and send the user to `login_route`.
    ///
    /// The redirect happens even when storage cannot be cleared; that error is
    /// logged and returned.
    pub fn logout<N>(&mut self, navigator: &N, login_route: &str) -> Result<(), StorageError>
    where
        N: Navigator + ?Sized,
    {
        let cleared = self.clear();
        if let Err(err) = &cleared {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        tracing::info!("session logged out");
        navigator.redirect(login_route);
        cleared
    }

    fn mark_authenticated(&mut self) {
        self.state = SessionState::Authenticated;
        self.authenticated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::storage::MemoryTokenStorage;

    #[derive(Default)]
    struct RecordingNavigator {
        routes: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn redirect(&self, route: &str) {
            self.routes.lock().unwrap().push(route.to_string());
        }
    }

    #[test]
    fn new_session_is_anonymous() {
        let session = Session::new(MemoryTokenStorage::new());
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.access_token().is_none());
        assert!(session.authenticated_at().is_none());
    }

    #[test]
    fn init_from_storage_with_token_authenticates() {
        let mut session = Session::new(MemoryTokenStorage::with_tokens("acc", Some("ref")));
        assert_eq!(session.init_from_storage().unwrap(), SessionState::Authenticated);
        assert_eq!(session.access_token(), Some("acc"));
        assert_eq!(session.refresh_token(), Some("ref"));
        assert!(session.authenticated_at().is_some());
    }

    #[test]
    fn init_from_empty_storage_stays_anonymous() {
        let mut session = Session::new(MemoryTokenStorage::new());
        assert_eq!(session.init_from_storage().unwrap(), SessionState::Anonymous);
    }

    #[test]
    fn set_tokens_persists_both_keys() {
        let mut session = Session::new(MemoryTokenStorage::new());
        session.set_tokens("acc", "ref").unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        let storage = session.storage();
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("acc"));
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("ref"));
    }

    #[test]
    fn refresh_cycle_replaces_only_the_access_token() {
        let mut session = Session::new(MemoryTokenStorage::new());
        session.set_tokens("old", "ref").unwrap();

        assert_eq!(session.begin_refresh().as_deref(), Some("ref"));
        assert_eq!(session.state(), SessionState::Refreshing);

        session.complete_refresh("new").unwrap();
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.access_token(), Some("new"));
        assert_eq!(session.refresh_token(), Some("ref"));
        assert_eq!(
            session.storage().get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
            Some("new")
        );
    }

    #[test]
    fn begin_refresh_without_refresh_token_is_none() {
        let mut session = Session::new(MemoryTokenStorage::with_tokens("acc", None));
        session.init_from_storage().unwrap();
        assert!(session.begin_refresh().is_none());
        assert_eq!(session.state(), SessionState::Authenticated);
    }

    #[test]
    fn logout_clears_everything_and_redirects() {
        let navigator = RecordingNavigator::default();
        let mut session = Session::new(MemoryTokenStorage::new());
        session.set_tokens("acc", "ref").unwrap();

        session.logout(&navigator, "/login").unwrap();

        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.access_token().is_none());
        assert!(session.refresh_token().is_none());
        assert!(session.storage().is_empty());
        assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
    }

    /// Storage that refuses to remove one key.
    struct StuckKeyStorage {
        inner: MemoryTokenStorage,
        stuck: &'static str,
    }

    impl TokenStorage for StuckKeyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            if key == self.stuck {
                return Err(StorageError::Io {
                    path: "session.json".into(),
                    source: std::io::Error::other("read-only"),
                });
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn clear_removes_refresh_token_even_when_access_removal_fails() {
        let storage = StuckKeyStorage {
            inner: MemoryTokenStorage::with_tokens("acc", Some("ref")),
            stuck: ACCESS_TOKEN_KEY,
        };
        let mut session = Session::new(storage);
        session.init_from_storage().unwrap();

        let err = session.clear().unwrap_err();

        assert!(matches!(err, StorageError::Io { .. }));
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.access_token().is_none());
        assert!(session.storage().get(REFRESH_TOKEN_KEY).unwrap().is_none());
        assert_eq!(session.storage().get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("acc"));
    }

    #[test]
    fn logout_from_anonymous_still_redirects() {
        let navigator = RecordingNavigator::default();
        let mut session = Session::new(MemoryTokenStorage::new());
        session.logout(&navigator, "/login").unwrap();
        assert_eq!(navigator.routes.lock().unwrap().len(), 1);
    }
}
