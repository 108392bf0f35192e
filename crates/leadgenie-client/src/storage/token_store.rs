//! Well-known keys for the bearer token and the persisted session.

use std::sync::Arc;

use leadgenie_core::types::{AccessToken, RefreshToken};

use super::{KeyValueStore, MemoryStore, TRACING_TARGET};
use crate::Result;
use crate::session::PersistedSession;

/// Key holding the raw bearer token.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Key holding the refresh credential.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key holding the persisted session blob.
pub const SESSION_KEY: &str = "auth-storage";

/// Durable holder of the bearer token across restarts.
///
/// Cheap to clone; every clone shares the same backend.
#[derive(Debug, Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    /// Creates a token store over the given backend.
    pub fn new<S>(backend: S) -> Self
    where
        S: KeyValueStore + 'static,
    {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Creates a token store that only lives as long as the process.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Persists the bearer token, replacing any previous one.
    pub fn save(&self, token: &AccessToken) -> Result<()> {
        self.backend.set(AUTH_TOKEN_KEY, token.as_str())
    }

    /// Returns the persisted bearer token.
    pub fn load(&self) -> Result<Option<AccessToken>> {
        Ok(self
            .backend
            .get(AUTH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty())
            .map(AccessToken::new))
    }

    /// Removes the persisted bearer token.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(AUTH_TOKEN_KEY)
    }

    /// Persists the refresh credential.
    pub fn save_refresh(&self, token: &RefreshToken) -> Result<()> {
        self.backend.set(REFRESH_TOKEN_KEY, token.as_str())
    }

    /// Returns the persisted refresh credential.
    pub fn load_refresh(&self) -> Result<Option<RefreshToken>> {
        Ok(self
            .backend
            .get(REFRESH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty())
            .map(RefreshToken::new))
    }

    /// Removes both the bearer token and the refresh credential.
    pub fn clear_credentials(&self) -> Result<()> {
        self.backend.remove(AUTH_TOKEN_KEY)?;
        self.backend.remove(REFRESH_TOKEN_KEY)
    }

    /// Returns the bearer token, treating storage failures as "no token".
    pub(crate) fn load_or_none(&self) -> Option<AccessToken> {
        self.load().unwrap_or_else(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Failed to read bearer token"
            );
            None
        })
    }

    /// Persists the session blob.
    pub fn save_session(&self, session: &PersistedSession) -> Result<()> {
        let blob = serde_json::to_string(session)?;
        self.backend.set(SESSION_KEY, &blob)
    }

    /// Returns the persisted session blob.
    ///
    /// A blob that no longer decodes is discarded.
    pub fn load_session(&self) -> Result<Option<PersistedSession>> {
        let Some(blob) = self.backend.get(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str(&blob) {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Discarding undecodable session blob"
                );
                self.backend.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    /// Removes the session blob.
    pub fn clear_session(&self) -> Result<()> {
        self.backend.remove(SESSION_KEY)
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
