use serde::{Deserialize, Serialize};

use crate::models::User;

/// An authenticated session: the bearer token and the user it authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    /// Build a session, refusing an empty token or user record.
    pub fn new(token: String, user: User) -> Option<Self> {
        if token.is_empty() || user.is_empty() {
            return None;
        }
        Some(Self { token, user })
    }
}

/// Lifecycle of the session store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Restore from storage has not finished yet
    #[default]
    Loading,
    Unauthenticated,
    Authenticated(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// Which set of screens the UI should show
    pub fn navigation(&self) -> NavigationStack {
        match self {
            AuthState::Loading => NavigationStack::Splash,
            AuthState::Unauthenticated => NavigationStack::Auth,
            AuthState::Authenticated(_) => NavigationStack::App,
        }
    }
}

/// Screen stacks of the client, chosen from the auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStack {
    /// Neutral state while the persisted session is being restored
    Splash,
    /// Sign-in and sign-up
    Auth,
    /// Dashboard, booking and profile
    App,
}

/// Result of restoring a persisted session at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    Restored,
    NoSession,
    /// Storage could not be read or held a corrupt record.
    /// The store is unauthenticated afterwards.
    RestoreFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "1".to_string(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn test_session_requires_token_and_user() {
        assert!(Session::new("tok123".to_string(), user()).is_some());
        assert!(Session::new(String::new(), user()).is_none());

        let mut anonymous = user();
        anonymous.id.clear();
        assert!(Session::new("tok123".to_string(), anonymous).is_none());
    }

    #[test]
    fn test_navigation_follows_state() {
        assert_eq!(AuthState::Loading.navigation(), NavigationStack::Splash);
        assert_eq!(AuthState::Unauthenticated.navigation(), NavigationStack::Auth);

        let session = Session::new("tok123".to_string(), user()).unwrap();
        let state = AuthState::Authenticated(session);
        assert_eq!(state.navigation(), NavigationStack::App);
        assert_eq!(state.token(), Some("tok123"));
        assert_eq!(state.user().map(|u| u.id.as_str()), Some("1"));
    }
}
