//! Core WAC client library (session, auth state, event bus, reminders, config).

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod events;
pub mod reminders;
pub mod session;
pub mod validation;
