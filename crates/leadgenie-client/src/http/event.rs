//! Authentication events broadcast by the API client.

use leadgenie_core::types::AccessToken;
use strum::{AsRefStr, Display};

/// Change of the stored credential observed by the API client.
///
/// Events name the token they concern, so a listener can tell a rejection
/// of its own token from one of a token it has already replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthEvent {
    /// The stored token was exchanged for `current`.
    Refreshed {
        previous: Option<AccessToken>,
        current: AccessToken,
    },
    /// `token` was rejected and could not be refreshed. The token store has
    /// already been cleared when this is received.
    Unauthorized { token: Option<AccessToken> },
}

impl AuthEvent {
    /// Returns `true` if this event reports a rejected credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
