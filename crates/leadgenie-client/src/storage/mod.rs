//! Durable client-side state.
//!
//! [`KeyValueStore`] is the string-to-string contract the rest of the crate
//! persists through, with an in-memory and a JSON-file backend.
//! [`TokenStore`] owns the well-known keys on top of it.

mod file;
mod memory;
mod token_store;

use std::fmt;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use token_store::{AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEY, TokenStore};

use crate::Result;

/// Tracing target for storage operations.
pub const TRACING_TARGET: &str = "leadgenie_client::storage";

/// Persistent string key-value storage.
///
/// Writes overwrite, removing a missing key is not an error, and no
/// validation is performed on values.
pub trait KeyValueStore: fmt::Debug + Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`.
    fn remove(&self, key: &str) -> Result<()>;
}
