//! CLI command handlers.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use wac_core::api::ApiClient;
use wac_core::app::RootController;
use wac_core::auth::AuthStore;
use wac_core::config::Config;
use wac_core::events::SessionEventBus;
use wac_core::reminders::RemindersService;
use wac_core::session::{FileSessionStore, SessionService, SessionStore};

pub mod auth;
pub mod config;
pub mod reminders;

/// Everything a session-aware command needs, wired once per invocation.
pub struct App {
    pub config: Config,
    pub root: RootController,
    pub reminders: RemindersService,
}

impl App {
    pub fn build(config: Config) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::open_default());
        let bus = SessionEventBus::new();

        let auth = AuthStore::new(SessionService::new(api.clone(), Arc::clone(&store)));
        let root = RootController::mount(auth, &bus);
        let reminders = RemindersService::new(api, store, Arc::new(bus));

        Ok(Self {
            config,
            root,
            reminders,
        })
    }

    pub fn auth(&self) -> &AuthStore {
        self.root.auth()
    }
}

/// Uses the given secret or reads one line from stdin.
pub fn secret_or_stdin(value: Option<String>, prompt: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    print!("{prompt}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
