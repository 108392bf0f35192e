//! Local credential storage configuration.

use std::path::PathBuf;

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use leadgenie_client::{FileStore, TokenStore};

/// Default location of the state file, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = ".leadgenie/session.json";

/// Where the CLI keeps the access token, refresh token and session snapshot.
///
/// The file is plain JSON. Anyone who can read it can act as the signed-in
/// user until the token expires.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Path of the JSON file holding tokens and the session snapshot.
    #[arg(long = "state-file", env = "LEADGENIE_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    pub state_file: PathBuf,
}

impl StorageConfig {
    /// Validates the configured path.
    pub fn validate(&self) -> AnyhowResult<()> {
        if self.state_file.as_os_str().is_empty() {
            return Err(anyhow!("state file path cannot be empty"));
        }
        if self.state_file.is_dir() {
            return Err(anyhow!(
                "state file path '{}' is a directory",
                self.state_file.display()
            ));
        }
        Ok(())
    }

    /// Opens the token store backed by the state file.
    pub fn open(&self) -> AnyhowResult<TokenStore> {
        let store = FileStore::open(&self.state_file)?;
        Ok(TokenStore::new(store))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}
