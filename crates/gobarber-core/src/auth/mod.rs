//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `Session`, `AuthState`: The bearer token and user, and the store's lifecycle states
//! - `SessionStore`: The single authority for who is logged in, mirrored to durable storage
//!
//! Sessions are restored from storage on start and cleared on sign-out.

pub mod session;
pub mod store;

pub use session::{AuthState, NavigationStack, RestoreOutcome, Session};
pub use store::{SessionError, SessionStore};
