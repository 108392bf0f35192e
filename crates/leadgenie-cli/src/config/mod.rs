//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── api: ApiConfig        # Base URL, timeouts, refresh endpoint
//! ├── storage: StorageConfig # Where tokens and the session snapshot live
//! └── command: Command      # What to do
//! ```
//!
//! All options can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! leadgenie --api-url http://localhost:8000 login --email a@b.com
//!
//! # Or via environment variables
//! LEADGENIE_API_URL=http://localhost:8000 leadgenie whoami
//! ```

mod storage;

use std::process;

use anyhow::Context;
use clap::Parser;
use leadgenie_client::session::NoopNavigator;
use leadgenie_client::{ApiClient, ApiConfig, SessionManager};
pub use storage::StorageConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::{Command, Context as CommandContext};
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "leadgenie")]
#[command(about = "Sign in to LeadGenie and work your leads from the terminal")]
#[command(version)]
pub struct Cli {
    /// Backend connection configuration.
    #[clap(flatten)]
    pub api: ApiConfig,

    /// Local credential storage.
    #[clap(flatten)]
    pub storage: StorageConfig,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so its values
    /// can serve as defaults for the `env` options.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so command output stays clean on stdout. Without
    /// `RUST_LOG` only warnings and errors are shown.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.api
            .base_url()
            .context("invalid API configuration")?;
        self.storage
            .validate()
            .context("invalid storage configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            api_url = %self.api.api_url,
            timeout_secs = self.api.http_timeout,
            refresh = ?self.api.refresh_endpoint(),
            state_file = %self.storage.state_file.display(),
            "Client configuration"
        );
    }

    /// Opens the token store and wires the client and session manager.
    pub fn connect(&self) -> anyhow::Result<CommandContext> {
        let tokens = self
            .storage
            .open()
            .context("failed to open the credential store")?;
        let client = ApiClient::new(self.api.clone(), tokens)
            .context("failed to create the API client")?;
        let session = SessionManager::from_client(&client, NoopNavigator);

        Ok(CommandContext { client, session })
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
