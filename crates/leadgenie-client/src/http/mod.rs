//! Authorizing HTTP client for the LeadGenie backend.
//!
//! # Example
//!
//! ```rust,ignore
//! use leadgenie_client::http::{ApiClient, ApiConfig, ApiRequest};
//! use leadgenie_client::storage::TokenStore;
//!
//! let client = ApiClient::new(ApiConfig::default(), TokenStore::in_memory())?;
//! let profile: UserProfile = client.send(ApiRequest::get("/api/v1/auth/users/me")).await?;
//! ```

mod auth;
mod client;
mod config;
mod error;
mod event;
mod request;
pub mod routes;

pub use client::ApiClient;
pub use config::{ApiConfig, DEFAULT_API_URL, DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT_SECS};
pub use event::AuthEvent;
pub use request::{ApiRequest, AuthMode, RequestBody};

/// Tracing target for HTTP client operations.
pub const TRACING_TARGET: &str = "leadgenie_client::http";
