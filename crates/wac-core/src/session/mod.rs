//! Session persistence and the remote session lifecycle.
//!
//! - `record.rs`: `SessionRecord` - the authenticated user as returned by login
//! - `store.rs`: `SessionStore` and its file/memory implementations
//! - `service.rs`: `SessionService` - register/login/logout against the API

mod record;
mod service;
mod store;

pub use record::{SessionRecord, mask_token};
pub use service::{LoginResponse, SessionError, SessionService};
pub use store::{FileSessionStore, MemorySessionStore, SESSION_KEY, SessionStore};
