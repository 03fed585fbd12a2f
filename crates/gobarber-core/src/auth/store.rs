//! The session store: single authority for who is logged in.
//!
//! The store owns the in-memory session, mirrors it to a `KeyValueStorage`,
//! and lends its token to the `ApiClient` through a `TokenSource`. Every
//! mutation runs under one FIFO writer lock held across its I/O, so
//! overlapping calls apply in the order they were made and the last one to
//! complete decides the final state. In-memory state is committed only
//! after the I/O it depends on has succeeded.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, TokenSource};
use crate::models::{ProfileUpdate, User};
use crate::storage::{KeyValueStorage, StorageError, StorageKeys};

use super::{AuthState, NavigationStack, RestoreOutcome, Session};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("No active session: {0}")]
    InvalidState(&'static str),

    #[error("User {found} does not match the signed-in user {expected}")]
    IdentityMismatch { expected: String, found: String },

    #[error(transparent)]
    Api(anyhow::Error),

    #[error("Session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// The API error behind this failure, if the request reached the API layer
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => e.downcast_ref::<ApiError>(),
            _ => None,
        }
    }

    /// Generic message suitable for showing to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::MissingCredentials => "Email and password are required.",
            SessionError::InvalidState(_) => "Please sign in first.",
            SessionError::IdentityMismatch { .. } => "That profile belongs to another account.",
            SessionError::Api(_) => self
                .api_error()
                .map(ApiError::user_message)
                .unwrap_or("Something went wrong. Please try again."),
            SessionError::Storage(_) => "Could not save your session on this device.",
        }
    }
}

/// Hands the current token to the API client on every request.
struct StateTokens(watch::Receiver<AuthState>);

impl TokenSource for StateTokens {
    fn bearer_token(&self) -> Option<String> {
        self.0.borrow().token().map(str::to_string)
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
    api: ApiClient,
    state: watch::Sender<AuthState>,
    writer: Mutex<()>,
}

impl SessionStore {
    /// Create a store in the `Loading` state. Call `initialize` next.
    pub fn new(storage: Arc<dyn KeyValueStorage>, api: ApiClient) -> Self {
        Self::with_keys(storage, api, StorageKeys::default())
    }

    pub fn with_keys(storage: Arc<dyn KeyValueStorage>, api: ApiClient, keys: StorageKeys) -> Self {
        let (state, tokens) = watch::channel(AuthState::Loading);
        let api = api.with_token_source(Arc::new(StateTokens(tokens)));
        Self {
            storage,
            keys,
            api,
            state,
            writer: Mutex::new(()),
        }
    }

    // ===== Read access =====

    /// The API client bound to this store's token
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn navigation(&self) -> NavigationStack {
        self.state.borrow().navigation()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    // ===== Mutations =====

    /// Restore a persisted session.
    ///
    /// Always leaves the store out of `Loading`. Read failures and corrupt
    /// records are reported as `RestoreFailed` and leave it unauthenticated.
    pub async fn initialize(&self) -> RestoreOutcome {
        let _writer = self.writer.lock().await;

        let (next, outcome) = match self
            .storage
            .multi_get(&[self.keys.user.as_str(), self.keys.token.as_str()])
            .await
        {
            Ok(values) => Self::restore(values),
            Err(e) => (AuthState::Unauthenticated, RestoreOutcome::RestoreFailed(e.to_string())),
        };

        match (&next, &outcome) {
            (AuthState::Authenticated(session), _) => {
                info!(user_id = %session.user.id, "Session restored");
            }
            (_, RestoreOutcome::RestoreFailed(reason)) => {
                warn!(reason = %reason, "Failed to restore session, continuing signed out");
            }
            _ => debug!("No persisted session"),
        }

        self.state.send_replace(next);
        outcome
    }

    fn restore(values: Vec<Option<String>>) -> (AuthState, RestoreOutcome) {
        let mut values = values.into_iter();
        let user = values.next().flatten().filter(|v| !v.is_empty());
        let token = values.next().flatten().filter(|v| !v.is_empty());

        let (Some(user), Some(token)) = (user, token) else {
            return (AuthState::Unauthenticated, RestoreOutcome::NoSession);
        };

        let user: User = match serde_json::from_str(&user) {
            Ok(user) => user,
            Err(e) => {
                return (
                    AuthState::Unauthenticated,
                    RestoreOutcome::RestoreFailed(format!("Corrupt user record: {}", e)),
                )
            }
        };

        match Session::new(token, user) {
            Some(session) => (AuthState::Authenticated(session), RestoreOutcome::Restored),
            None => (
                AuthState::Unauthenticated,
                RestoreOutcome::RestoreFailed("Persisted user has no identifier".to_string()),
            ),
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure the previous state is kept and the error is returned
    /// unchanged; nothing is retried.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let _writer = self.writer.lock().await;

        let response = self
            .api
            .create_session(email, password)
            .await
            .map_err(SessionError::Api)?;
        let session = Session::new(response.token, response.user).ok_or_else(|| {
            SessionError::Api(
                ApiError::InvalidResponse("Session response is missing the token or user".to_string())
                    .into(),
            )
        })?;

        let user_json = serde_json::to_string(&session.user).map_err(StorageError::from)?;
        self.storage
            .multi_set(&[
                (self.keys.user.as_str(), user_json.as_str()),
                (self.keys.token.as_str(), session.token.as_str()),
            ])
            .await?;

        self.state.send_replace(AuthState::Authenticated(session.clone()));
        info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Forget the session here and in storage. Safe to call when signed out.
    ///
    /// The in-memory session is cleared even if the storage delete fails;
    /// that failure is still returned.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let _writer = self.writer.lock().await;

        let removed = self
            .storage
            .multi_remove(&[self.keys.user.as_str(), self.keys.token.as_str()])
            .await;

        let previous = self.state.send_replace(AuthState::Unauthenticated);
        if let Some(user) = previous.user() {
            info!(user_id = %user.id, "Signed out");
        }

        removed.map_err(|e| {
            warn!(error = %e, "Failed to remove persisted session");
            e.into()
        })
    }

    /// Replace the signed-in user's record, keeping the token.
    pub async fn update_user(&self, user: User) -> Result<(), SessionError> {
        let _writer = self.writer.lock().await;

        let current = self
            .state
            .borrow()
            .session()
            .cloned()
            .ok_or(SessionError::InvalidState("cannot update the user while signed out"))?;

        if current.user.id != user.id {
            return Err(SessionError::IdentityMismatch {
                expected: current.user.id,
                found: user.id,
            });
        }

        let user_json = serde_json::to_string(&user).map_err(StorageError::from)?;
        self.storage.set(&self.keys.user, &user_json).await?;

        debug!(user_id = %user.id, "User record updated");
        self.state.send_replace(AuthState::Authenticated(Session {
            token: current.token,
            user,
        }));
        Ok(())
    }

    // ===== Profile =====

    /// Send a profile change to the API and store the returned user
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        self.require_session()?;
        let user = self.api.update_profile(update).await.map_err(SessionError::Api)?;
        self.update_user(user.clone()).await?;
        Ok(user)
    }

    /// Upload a JPEG avatar and store the returned user
    pub async fn update_avatar(&self, image: Vec<u8>) -> Result<User, SessionError> {
        let current = self.require_session()?;
        let user = self
            .api
            .update_avatar(&current.user.id, image)
            .await
            .map_err(SessionError::Api)?;
        self.update_user(user.clone()).await?;
        Ok(user)
    }

    fn require_session(&self) -> Result<Session, SessionError> {
        self.state
            .borrow()
            .session()
            .cloned()
            .ok_or(SessionError::InvalidState("sign in first"))
    }
}
