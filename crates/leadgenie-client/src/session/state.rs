//! In-memory session value.

use leadgenie_core::types::{AccessToken, UserProfile};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// A login, registration or startup check is in flight.
    Authenticating,
    /// A user is signed in with a token the backend accepted.
    Authenticated,
    /// The last operation failed.
    ///
    /// Counts as anonymous everywhere: [`Session::is_authenticated`] is
    /// `false`, authentication events leave it alone and a saved profile
    /// is not restored over it. [`Session::last_error`] holds the message
    /// until it is cleared.
    Error,
}

/// Snapshot of who is signed in.
///
/// Only the session manager moves a session between states, so the
/// authenticated flag can never disagree with the user and token fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    state: SessionState,
    user: Option<UserProfile>,
    token: Option<AccessToken>,
    is_loading: bool,
    last_error: Option<String>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message of the last failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `true` if a user is signed in with a live token.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated && self.user.is_some() && self.token.is_some()
    }

    pub(crate) fn authenticated(user: UserProfile, token: AccessToken) -> Self {
        Self {
            state: SessionState::Authenticated,
            user: Some(user),
            token: Some(token),
            is_loading: false,
            last_error: None,
        }
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            state: SessionState::Error,
            last_error: Some(message),
            ..Self::default()
        }
    }

    /// Swaps the token of a signed-in session after a refresh.
    pub(crate) fn replace_token(&mut self, token: AccessToken) {
        if self.is_authenticated() {
            self.token = Some(token);
        }
    }

    /// Anonymous session that still shows a remembered profile.
    pub(crate) fn remembered(user: Option<UserProfile>) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    /// Marks an operation as started. A signed-in session stays signed in.
    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
        self.last_error = None;
        if self.state != SessionState::Authenticated {
            self.state = SessionState::Authenticating;
        }
    }

    /// Marks an operation that does not sign anyone in as finished.
    pub(crate) fn finish(&mut self, error: Option<String>) {
        self.is_loading = false;
        if self.state == SessionState::Authenticated {
            self.last_error = error;
            return;
        }
        self.state = match error {
            Some(_) => SessionState::Error,
            None => SessionState::Anonymous,
        };
        self.last_error = error;
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
        if self.state == SessionState::Error {
            self.state = SessionState::Anonymous;
        }
    }
}
