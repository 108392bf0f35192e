//! Boundary between the live session and what survives a restart.

use leadgenie_core::types::UserProfile;
use serde::{Deserialize, Serialize};

use super::Session;

/// The part of a session written to storage.
///
/// The bearer token is kept under its own key and never appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Last known profile.
    #[serde(default)]
    pub user: Option<UserProfile>,
    /// Whether the session was signed in when it was saved.
    #[serde(default, alias = "isAuthenticated")]
    pub is_authenticated: bool,
}

/// Projects a session onto its persisted form.
pub fn to_persisted(session: &Session) -> PersistedSession {
    PersistedSession {
        user: session.user().cloned(),
        is_authenticated: session.is_authenticated(),
    }
}

/// Rebuilds a session from its persisted form.
///
/// The result is never authenticated: a persisted flag is a claim that
/// only a successful identity check can confirm.
pub fn from_persisted(persisted: PersistedSession) -> Session {
    Session::remembered(persisted.user)
}
