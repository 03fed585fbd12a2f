//! REST API client module for the GoBarber backend.
//!
//! This module provides the `ApiClient` for signing in, managing the
//! profile, and booking appointments. Authenticated requests carry a
//! bearer token obtained per request from a `TokenSource`.

pub mod client;
pub mod error;

pub use client::{ApiClient, SessionResponse, TokenSource, DEFAULT_API_URL};
pub use error::ApiError;
