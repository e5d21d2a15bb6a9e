//! Root controller: navigation, client routes and logout wiring.
//!
//! The controller is the single place a session ends. The logout control
//! and a `Logout` notification from the event bus both go through
//! [`AuthStore::logout`].

use std::fmt;

use crate::auth::AuthStore;
use crate::events::{SessionEvent, SessionEventBus, Subscription};

pub const BRAND: &str = "WAC";

/// Client-side routes (hash based: `#/reminders/3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` (the login page)
    Login,
    Register,
    Profile,
    /// `/reminders` and anything beneath it; holds the remainder
    Reminders(Option<String>),
    NotFound(String),
}

impl Route {
    pub fn parse(raw: &str) -> Self {
        let path = raw.trim().trim_start_matches('#');
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Login,
            "/register" => Route::Register,
            "/profile" => Route::Profile,
            "/reminders" => Route::Reminders(None),
            _ => match trimmed.strip_prefix("/reminders/") {
                Some(rest) => Route::Reminders(Some(rest.to_string())),
                None => Route::NotFound(path.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::Register => "/register".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Reminders(None) => "/reminders".to_string(),
            Route::Reminders(Some(rest)) => format!("/reminders/{rest}"),
            Route::NotFound(path) => path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    Brand,
    Link,
    /// The control that ends the session
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    pub label: String,
    pub href: String,
    pub kind: NavKind,
}

impl NavLink {
    fn new(label: impl Into<String>, href: &str, kind: NavKind) -> Self {
        Self {
            label: label.into(),
            href: href.to_string(),
            kind,
        }
    }
}

/// The navigation bar for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub links: Vec<NavLink>,
}

impl Navigation {
    pub fn labels(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.label.as_str()).collect()
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .links
            .iter()
            .map(|link| format!("{} ({})", link.label, link.href))
            .collect();
        write!(f, "{}", parts.join(" | "))
    }
}

/// Root view controller.
///
/// Mounting registers the bus listener; unmounting (or dropping) releases it.
pub struct RootController {
    auth: AuthStore,
    subscription: Option<Subscription>,
}

impl RootController {
    pub fn mount(auth: AuthStore, bus: &SessionEventBus) -> Self {
        let listener = auth.clone();
        let subscription = bus.on(SessionEvent::Logout, move |_| {
            tracing::info!("forced logout requested");
            if let Err(e) = listener.logout() {
                tracing::error!(error = %format!("{e:#}"), "failed to clear stored session");
            }
        });
        Self {
            auth,
            subscription: Some(subscription),
        }
    }

    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// Builds the navigation for the current auth state.
    pub fn navigation(&self) -> Navigation {
        let state = self.auth.snapshot();
        let mut links = vec![NavLink::new(BRAND, "/", NavKind::Brand)];

        if let Some(user) = &state.user {
            links.push(NavLink::new("Home", "/home", NavKind::Link));
            links.push(NavLink::new("Reminders", "/reminders", NavKind::Link));
            links.push(NavLink::new(user.display_name(), "/profile", NavKind::Link));
            links.push(NavLink::new("LogOut", "/login", NavKind::Logout));
        }

        Navigation { links }
    }

    /// The logout control.
    ///
    /// # Errors
    /// Returns an error if the stored session could not be removed.
    pub fn log_out(&self) -> anyhow::Result<()> {
        self.auth.logout()
    }
}

impl Drop for RootController {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::ApiClient;
    use crate::config::Config;
    use crate::session::{MemorySessionStore, SessionRecord, SessionService, SessionStore};

    fn logged_in_store() -> (AuthStore, Arc<MemorySessionStore>) {
        let memory = Arc::new(MemorySessionStore::new());
        memory
            .save(
                &SessionRecord::from_response(&json!({"accessToken": "tok", "name": "Ana"}))
                    .unwrap(),
            )
            .unwrap();
        let shared: Arc<dyn SessionStore> = Arc::clone(&memory) as Arc<dyn SessionStore>;
        let api = ApiClient::new(&Config::default()).unwrap();
        (AuthStore::new(SessionService::new(api, shared)), memory)
    }

    struct UnremovableStore;

    impl SessionStore for UnremovableStore {
        fn save(&self, _record: &SessionRecord) -> anyhow::Result<()> {
            Ok(())
        }

        fn load(&self) -> Option<SessionRecord> {
            SessionRecord::from_response(&json!({"accessToken": "tok", "name": "Ana"}))
        }

        fn clear(&self) -> anyhow::Result<bool> {
            anyhow::bail!("session storage is read-only")
        }
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Route::Login);
        assert_eq!(Route::parse("#/"), Route::Login);
        assert_eq!(Route::parse("#/register"), Route::Register);
        assert_eq!(Route::parse("/profile/"), Route::Profile);
        assert_eq!(Route::parse("/reminders"), Route::Reminders(None));
        assert_eq!(
            Route::parse("#/reminders/12?tab=map"),
            Route::Reminders(Some("12".into()))
        );
        assert_eq!(Route::parse("/home"), Route::NotFound("/home".into()));
        assert_eq!(Route::parse("/reminders-old"), Route::NotFound("/reminders-old".into()));
        assert_eq!(Route::Reminders(Some("12".into())).path(), "/reminders/12");
    }

    #[test]
    fn test_navigation_follows_session() {
        let (auth, _memory) = logged_in_store();
        let bus = SessionEventBus::new();
        let root = RootController::mount(auth, &bus);

        assert_eq!(
            root.navigation().labels(),
            vec!["WAC", "Home", "Reminders", "Ana", "LogOut"]
        );

        root.log_out().unwrap();
        assert_eq!(root.navigation().labels(), vec!["WAC"]);
    }

    #[test]
    fn test_bus_logout_runs_same_path() {
        let (auth, memory) = logged_in_store();
        let bus = SessionEventBus::new();
        let root = RootController::mount(auth, &bus);

        assert!(bus.dispatch(SessionEvent::Logout));

        assert!(!root.auth().is_logged_in());
        assert_eq!(memory.load(), None);
        assert_eq!(root.auth().snapshot().message, None);
    }

    #[test]
    fn test_unmount_releases_listener() {
        let (auth, memory) = logged_in_store();
        let bus = SessionEventBus::new();
        let mut root = RootController::mount(auth, &bus);
        assert!(bus.has_listener(SessionEvent::Logout));

        root.unmount();
        assert!(!root.is_mounted());
        assert!(!bus.dispatch(SessionEvent::Logout));
        assert!(memory.load().is_some());
    }

    #[test]
    fn test_remount_keeps_single_listener() {
        let (auth, _memory) = logged_in_store();
        let bus = SessionEventBus::new();

        let first = RootController::mount(auth.clone(), &bus);
        let second = RootController::mount(auth, &bus);
        drop(first);

        assert!(bus.has_listener(SessionEvent::Logout));
        assert!(bus.dispatch(SessionEvent::Logout));
        assert!(!second.auth().is_logged_in());
    }

    #[test]
    fn test_log_out_surfaces_storage_failure() {
        let api = ApiClient::new(&Config::default()).unwrap();
        let store: Arc<dyn SessionStore> = Arc::new(UnremovableStore);
        let auth = AuthStore::new(SessionService::new(api, store));
        let bus = SessionEventBus::new();
        let root = RootController::mount(auth, &bus);

        assert!(root.log_out().is_err());
        assert_eq!(root.navigation().labels(), vec!["WAC"]);

        // The bus path logs the failure instead of propagating it.
        assert!(bus.dispatch(SessionEvent::Logout));
        assert!(!root.auth().is_logged_in());
    }
}
