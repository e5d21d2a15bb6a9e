//! Register, login and logout against the remote API.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::{SessionRecord, SessionStore};
use crate::api::{ApiClient, ApiError, ApiResult};

const SIGNUP_PATH: &str = "signup";
const LOGIN_PATH: &str = "auth/login";

#[derive(Serialize)]
struct SignupRequest<'a> {
    user: SignupUser<'a>,
}

#[derive(Serialize)]
struct SignupUser<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    password_confirmation: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    user: LoginUser<'a>,
}

#[derive(Serialize)]
struct LoginUser<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful `auth/login` exchange.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// The raw response body
    pub body: Value,
    /// The persisted record, when the body carried an access token
    pub session: Option<SessionRecord>,
}

/// Failure of a session operation.
#[derive(Debug)]
pub enum SessionError {
    /// The API call failed (transport or non-2xx)
    Api(ApiError),
    /// The session could not be written to the store
    Storage(anyhow::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Api(e) => write!(f, "{e}"),
            SessionError::Storage(e) => write!(f, "Failed to save session: {e:#}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Api(e) => Some(e),
            SessionError::Storage(e) => Some(&**e),
        }
    }
}

impl From<ApiError> for SessionError {
    fn from(err: ApiError) -> Self {
        SessionError::Api(err)
    }
}

/// Performs the session lifecycle calls and keeps the store in step.
#[derive(Clone)]
pub struct SessionService {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self { api, store }
    }

    /// The currently persisted session, if any.
    pub fn current(&self) -> Option<SessionRecord> {
        self.store.load()
    }

    /// Creates an account. Does not log in and leaves the store untouched.
    ///
    /// # Errors
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> ApiResult<Value> {
        let request = SignupRequest {
            user: SignupUser {
                name,
                email,
                password,
                password_confirmation,
            },
        };
        let body = self.api.post_json(SIGNUP_PATH, &request, None).await?;
        tracing::info!(email, "registration accepted");
        Ok(body)
    }

    /// Exchanges credentials for a session.
    ///
    /// When the response carries an access token the whole body is persisted
    /// as the session record; otherwise the store is left as it was.
    ///
    /// # Errors
    /// Returns [`SessionError::Api`] when the call fails and
    /// [`SessionError::Storage`] when the record cannot be persisted.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, SessionError> {
        let request = LoginRequest {
            user: LoginUser { email, password },
        };
        let body = self.api.post_json(LOGIN_PATH, &request, None).await?;

        let session = SessionRecord::from_response(&body);
        match &session {
            Some(record) => {
                self.store.save(record).map_err(SessionError::Storage)?;
                tracing::info!(email, token = %record.masked_token(), "logged in");
            }
            None => tracing::warn!(email, "login response carried no access token"),
        }

        Ok(LoginResponse { body, session })
    }

    /// Drops the local session. No network call is made.
    ///
    /// # Errors
    /// Returns an error if the store cannot be cleared.
    pub fn logout(&self) -> anyhow::Result<bool> {
        let had_session = self.store.clear()?;
        tracing::info!(had_session, "logged out");
        Ok(had_session)
    }
}
