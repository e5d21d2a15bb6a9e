//! The authentication state container.
//!
//! [`AuthStore`] is explicitly constructed and cloned into whoever needs it.
//! State lives in a `watch` channel: each mutation is applied in one
//! `send_modify`, so subscribers only ever see whole states.
//!
//! The network actions never return errors. Failures are turned into the
//! state's message and reported as [`Settled::Rejected`]. Logout is local and
//! returns the storage error, if any, after resetting the state.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::{AuthMutation, AuthState};
use crate::session::{LoginResponse, SessionRecord, SessionService};

const MISSING_TOKEN_MESSAGE: &str = "Login response did not include an access token.";

/// How an action ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    Fulfilled(T),
    /// The message that was stored in the state
    Rejected(String),
}

impl<T> Settled<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Settled::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&str> {
        match self {
            Settled::Fulfilled(_) => None,
            Settled::Rejected(message) => Some(message),
        }
    }
}

/// State container for the authentication slice.
#[derive(Clone)]
pub struct AuthStore {
    state: Arc<watch::Sender<AuthState>>,
    service: SessionService,
}

impl AuthStore {
    /// Creates the container, seeding it from the session store.
    pub fn new(service: SessionService) -> Self {
        let initial = AuthState::from_session(service.current());
        tracing::debug!(logged_in = initial.is_logged_in(), "auth state initialized");
        let (state, _) = watch::channel(initial);
        Self {
            state: Arc::new(state),
            service,
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    fn apply(&self, mutation: AuthMutation) {
        tracing::trace!(?mutation, "auth mutation");
        self.state.send_modify(|state| state.apply(mutation));
    }

    /// Registers an account. Success does not log the user in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Settled<Value> {
        match self
            .service
            .register(name, email, password, password_confirmation)
            .await
        {
            Ok(body) => {
                let notice = body
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                self.apply(AuthMutation::RegisterFulfilled(notice));
                Settled::Fulfilled(body)
            }
            Err(err) => {
                let message = err.to_string();
                self.apply(AuthMutation::RegisterRejected(message.clone()));
                Settled::Rejected(message)
            }
        }
    }

    /// Logs in. Concurrent calls are not deduplicated; the last to settle wins.
    pub async fn login(&self, email: &str, password: &str) -> Settled<SessionRecord> {
        self.apply(AuthMutation::LoginStarted);

        let outcome = match self.service.login(email, password).await {
            Ok(LoginResponse {
                session: Some(user),
                ..
            }) => Settled::Fulfilled(user),
            Ok(_) => Settled::Rejected(MISSING_TOKEN_MESSAGE.to_string()),
            Err(err) => Settled::Rejected(err.to_string()),
        };

        match &outcome {
            Settled::Fulfilled(user) => self.apply(AuthMutation::LoginFulfilled(user.clone())),
            Settled::Rejected(message) => {
                self.apply(AuthMutation::LoginRejected(message.clone()));
            }
        }
        outcome
    }

    /// Ends the session locally. Silent: no message is left behind.
    ///
    /// The state is reset even when the stored record cannot be removed.
    ///
    /// # Errors
    /// Returns the storage error; the record may then still load on restart.
    pub fn logout(&self) -> anyhow::Result<()> {
        let cleared = self.service.logout();
        self.apply(AuthMutation::LoggedOut);
        cleared.map(|_| ())
    }

    pub fn clear_message(&self) {
        self.apply(AuthMutation::ClearMessage);
    }
}
