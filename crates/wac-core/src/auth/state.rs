//! Authentication state.
//!
//! The state only changes through [`AuthMutation`]s applied by the store, so
//! every transition is visible in one place.

use crate::session::SessionRecord;

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    /// No session
    #[default]
    LoggedOut,
    /// A login request is in flight
    LoggingIn,
    /// A session is established
    LoggedIn,
    /// The last register/login attempt failed
    Error,
}

/// Authentication state.
///
/// `is_logged_in` is derived from `user`, so the two never disagree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub status: AuthStatus,
    /// The logged-in user, mirrored from the session store.
    pub user: Option<SessionRecord>,
    /// Latest message for the user (error or server notice).
    pub message: Option<String>,
}

/// A single transition of [`AuthState`].
#[derive(Debug, Clone)]
pub enum AuthMutation {
    LoginStarted,
    LoginFulfilled(SessionRecord),
    LoginRejected(String),
    /// Carries the server's notice, if it sent one
    RegisterFulfilled(Option<String>),
    RegisterRejected(String),
    LoggedOut,
    ClearMessage,
}

impl AuthState {
    /// Builds the startup state from whatever the session store holds.
    pub fn from_session(user: Option<SessionRecord>) -> Self {
        let status = if user.is_some() {
            AuthStatus::LoggedIn
        } else {
            AuthStatus::LoggedOut
        };
        Self {
            status,
            user,
            message: None,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Status to return to when an action settles without changing the session.
    fn resting_status(&self) -> AuthStatus {
        if self.is_logged_in() {
            AuthStatus::LoggedIn
        } else {
            AuthStatus::LoggedOut
        }
    }

    pub fn apply(&mut self, mutation: AuthMutation) {
        match mutation {
            AuthMutation::LoginStarted => self.status = AuthStatus::LoggingIn,
            AuthMutation::LoginFulfilled(user) => {
                self.status = AuthStatus::LoggedIn;
                self.user = Some(user);
                self.message = None;
            }
            AuthMutation::LoginRejected(message) | AuthMutation::RegisterRejected(message) => {
                self.status = AuthStatus::Error;
                self.message = Some(message);
            }
            AuthMutation::RegisterFulfilled(notice) => {
                self.status = self.resting_status();
                self.message = notice;
            }
            AuthMutation::LoggedOut => *self = Self::default(),
            AuthMutation::ClearMessage => self.message = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user() -> SessionRecord {
        SessionRecord::from_response(&json!({"accessToken": "tok", "name": "Ana"})).unwrap()
    }

    #[test]
    fn test_from_session() {
        let state = AuthState::from_session(Some(user()));
        assert_eq!(state.status, AuthStatus::LoggedIn);
        assert!(state.is_logged_in());

        let state = AuthState::from_session(None);
        assert_eq!(state, AuthState::default());
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_login_transitions() {
        let mut state = AuthState::default();
        state.apply(AuthMutation::LoginStarted);
        assert_eq!(state.status, AuthStatus::LoggingIn);

        state.apply(AuthMutation::LoginRejected("bad password".into()));
        assert_eq!(state.status, AuthStatus::Error);
        assert_eq!(state.message.as_deref(), Some("bad password"));
        assert!(state.user.is_none());

        state.apply(AuthMutation::LoginStarted);
        state.apply(AuthMutation::LoginFulfilled(user()));
        assert_eq!(state.status, AuthStatus::LoggedIn);
        assert_eq!(state.message, None);
        assert!(state.is_logged_in());
    }

    #[test]
    fn test_register_does_not_log_in() {
        let mut state = AuthState::default();
        state.apply(AuthMutation::RegisterFulfilled(Some("User registered".into())));
        assert_eq!(state.status, AuthStatus::LoggedOut);
        assert!(!state.is_logged_in());
        assert_eq!(state.message.as_deref(), Some("User registered"));

        state.apply(AuthMutation::RegisterRejected("Email taken".into()));
        assert_eq!(state.status, AuthStatus::Error);
        assert_eq!(state.message.as_deref(), Some("Email taken"));
    }

    #[test]
    fn test_logout_resets_everything() {
        let mut state = AuthState::from_session(Some(user()));
        state.message = Some("stale".into());
        state.apply(AuthMutation::LoggedOut);
        assert_eq!(state, AuthState::default());
    }

    #[test]
    fn test_clear_message_keeps_status() {
        let mut state = AuthState::default();
        state.apply(AuthMutation::LoginRejected("nope".into()));

        state.apply(AuthMutation::ClearMessage);
        assert_eq!(state.status, AuthStatus::Error);
        assert_eq!(state.message, None);

        state.apply(AuthMutation::ClearMessage);
        assert_eq!(state.message, None);
    }
}
