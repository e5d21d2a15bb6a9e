//! Authentication slice.
//!
//! Owns the in-memory authentication state and the actions that move it.
//!
//! ## Module Structure
//!
//! - `state.rs`: `AuthStatus`, `AuthState`, `AuthMutation` - state and its transitions
//! - `store.rs`: `AuthStore` - the state container and its async actions

mod state;
mod store;

pub use state::{AuthMutation, AuthState, AuthStatus};
pub use store::{AuthStore, Settled};
