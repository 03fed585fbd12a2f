//! GoBarber client core.
//!
//! The session store, its durable storage backends, the API client and the
//! wire models shared by every GoBarber front end.
//!
//! A front end builds one `SessionStore` at start-up, calls
//! `initialize()` to restore the persisted session, and reads
//! `navigation()` to decide whether to show the sign-in screens or the app.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, NavigationStack, RestoreOutcome, Session, SessionError, SessionStore};
pub use config::{Config, StorageBackend};
pub use models::User;
