//! Authenticated reminder calls.
//!
//! Every request carries the stored access token as a bearer token. A 401
//! means the token is stale: the service reports it through its
//! [`SessionInvalidationListener`] and hands back the error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};
use crate::events::SessionInvalidationListener;
use crate::session::SessionStore;

const REMINDERS_PATH: &str = "reminders";

/// A reminder as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: u64,
    pub description: String,
    pub datetime: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "locationCoordinates")]
    pub location_coordinates: String,
}

/// Payload for creating a reminder. `datetime` is `YYYY-MM-DD HH:MM:00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReminder {
    pub description: String,
    pub datetime: String,
    pub city: String,
    pub location_coordinates: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    reminder: &'a NewReminder,
}

#[derive(Clone)]
pub struct RemindersService {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
    invalidation: Arc<dyn SessionInvalidationListener>,
}

impl RemindersService {
    pub fn new(
        api: ApiClient,
        store: Arc<dyn SessionStore>,
        invalidation: Arc<dyn SessionInvalidationListener>,
    ) -> Self {
        Self {
            api,
            store,
            invalidation,
        }
    }

    /// # Errors
    /// Returns `Unauthorized` without a session or on 401, otherwise any
    /// transport or status failure.
    pub async fn list(&self) -> ApiResult<Vec<Reminder>> {
        let token = self.token()?;
        let body = self.checked(self.api.get_json(REMINDERS_PATH, Some(&token)).await)?;
        parse_list(body)
    }

    /// # Errors
    /// Same as [`RemindersService::list`].
    pub async fn create(&self, reminder: &NewReminder) -> ApiResult<Value> {
        let token = self.token()?;
        let request = CreateRequest { reminder };
        let body = self.checked(
            self.api
                .post_json(REMINDERS_PATH, &request, Some(&token))
                .await,
        )?;
        tracing::info!(datetime = %reminder.datetime, "reminder created");
        Ok(body)
    }

    /// # Errors
    /// Same as [`RemindersService::list`].
    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        let token = self.token()?;
        let path = format!("{REMINDERS_PATH}/{id}");
        self.checked(self.api.delete(&path, Some(&token)).await)?;
        tracing::info!(id, "reminder deleted");
        Ok(())
    }

    fn token(&self) -> ApiResult<String> {
        match self.store.load() {
            Some(record) => Ok(record.access_token),
            None => Err(ApiError::not_logged_in()),
        }
    }

    fn checked(&self, result: ApiResult<Value>) -> ApiResult<Value> {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            tracing::warn!(message = %err.message, "session rejected by server");
            self.invalidation.session_invalidated();
        }
        result
    }
}

/// Accepts a bare array or an object wrapping one under `reminders`/`data`.
fn parse_list(body: Value) -> ApiResult<Vec<Reminder>> {
    let items = match body {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("reminders")
            .or_else(|| map.remove("data"))
            .unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    serde_json::from_value(items)
        .map_err(|e| ApiError::new(ApiErrorKind::Parse, format!("Unexpected reminders payload: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::app::RootController;
    use crate::auth::AuthStore;
    use crate::config::Config;
    use crate::events::SessionEventBus;
    use crate::session::{MemorySessionStore, SessionRecord, SessionService};

    struct Fixture {
        service: RemindersService,
        store: Arc<MemorySessionStore>,
        bus: SessionEventBus,
        api: ApiClient,
    }

    fn fixture(uri: &str, logged_in: bool) -> Fixture {
        let config = Config::default().with_api_url(Some(uri.to_string()));
        let api = ApiClient::new(&config).unwrap();
        let store = Arc::new(MemorySessionStore::new());
        if logged_in {
            store
                .save(
                    &SessionRecord::from_response(&json!({"accessToken": "tok-1", "name": "Ana"}))
                        .unwrap(),
                )
                .unwrap();
        }
        let bus = SessionEventBus::new();
        let shared: Arc<dyn SessionStore> = Arc::clone(&store) as Arc<dyn SessionStore>;
        let service = RemindersService::new(api.clone(), shared, Arc::new(bus.clone()));
        Fixture {
            service,
            store,
            bus,
            api,
        }
    }

    fn new_reminder() -> NewReminder {
        NewReminder {
            description: "Dentist".into(),
            datetime: "2030-01-02 09:30:00".into(),
            city: "Guadalajara".into(),
            location_coordinates: "20.67,-103.35".into(),
        }
    }

    #[tokio::test]
    async fn test_list_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reminders"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "description": "Dentist", "datetime": "2030-01-02 09:30:00",
                 "city": "Guadalajara", "location_coordinates": "20.67,-103.35"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), true);
        let reminders = f.service.list().await.unwrap();

        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].id, 1);
        assert_eq!(reminders[0].city, "Guadalajara");
    }

    #[tokio::test]
    async fn test_create_wraps_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reminders"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_json(json!({"reminder": {
                "description": "Dentist",
                "datetime": "2030-01-02 09:30:00",
                "city": "Guadalajara",
                "location_coordinates": "20.67,-103.35"
            }})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), true);
        let body = f.service.create(&new_reminder()).await.unwrap();
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn test_delete_targets_id() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/reminders/7"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), true);
        f.service.delete(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_without_session_no_request_is_made() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), false);
        let err = f.service.list().await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(err.message, "You are not logged in.");
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout_through_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reminders"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Token expired"})),
            )
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), true);
        let shared: Arc<dyn SessionStore> = Arc::clone(&f.store) as Arc<dyn SessionStore>;
        let auth = AuthStore::new(SessionService::new(f.api.clone(), shared));
        let root = RootController::mount(auth, &f.bus);
        let mut changes = root.auth().subscribe();
        assert!(root.auth().is_logged_in());

        let err = f.service.list().await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.message, "Token expired");
        assert!(changes.has_changed().unwrap());
        assert!(!root.auth().is_logged_in());
        assert_eq!(f.store.load(), None);
        assert_eq!(root.navigation().labels(), vec!["WAC"]);
    }

    #[tokio::test]
    async fn test_other_failures_keep_session() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not found"})))
            .mount(&server)
            .await;

        let f = fixture(&server.uri(), true);
        let err = f.service.delete(99).await.unwrap_err();

        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.status, Some(404));
        assert!(f.store.load().is_some());
    }

    #[test]
    fn test_parse_list_shapes() {
        let item = json!({"id": 2, "description": "Gym", "datetime": "2030-01-01 07:00:00",
                          "city": "GDL", "locationCoordinates": "1,2"});
        assert_eq!(parse_list(json!([item.clone()])).unwrap().len(), 1);
        let wrapped = parse_list(json!({"reminders": [item]})).unwrap();
        assert_eq!(wrapped[0].location_coordinates, "1,2");
        assert!(parse_list(Value::Null).unwrap().is_empty());
        assert_eq!(
            parse_list(json!("nope")).unwrap_err().kind,
            ApiErrorKind::Parse
        );
    }
}
