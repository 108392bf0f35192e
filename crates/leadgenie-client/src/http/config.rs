//! API client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default token refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Configuration for the LeadGenie API client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ApiConfig {
    /// Base URL of the LeadGenie backend
    #[cfg_attr(
        feature = "config",
        arg(long = "api-url", env = "LEADGENIE_API_URL", default_value = DEFAULT_API_URL)
    )]
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "LEADGENIE_HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "LEADGENIE_HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Path of the token refresh endpoint
    #[cfg_attr(
        feature = "config",
        arg(long = "refresh-path", env = "LEADGENIE_REFRESH_PATH", default_value = DEFAULT_REFRESH_PATH)
    )]
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Never attempt a token refresh after a 401
    #[cfg_attr(
        feature = "config",
        arg(long = "no-refresh", env = "LEADGENIE_NO_REFRESH")
    )]
    #[serde(default)]
    pub disable_refresh: bool,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_owned()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
            refresh_path: default_refresh_path(),
            disable_refresh: false,
        }
    }
}

impl ApiConfig {
    /// Creates a configuration pointing at the given backend.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// Parses and validates the base URL.
    ///
    /// Only `http` and `https` URLs are accepted. A trailing slash is
    /// stripped so paths can be appended verbatim.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.api_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| {
            Error::configuration()
                .with_message(format!("invalid API URL '{trimmed}'"))
                .with_source(e)
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration()
                .with_message(format!("unsupported API URL scheme '{}'", url.scheme())));
        }

        Ok(url)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("leadgenie/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Returns the refresh endpoint, or `None` when refresh is disabled.
    pub fn refresh_endpoint(&self) -> Option<&str> {
        let path = self.refresh_path.trim();
        (!self.disable_refresh && !path.is_empty()).then_some(path)
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Disable token refresh.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.disable_refresh = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use leadgenie_core::ErrorKind;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.effective_timeout(), Duration::from_secs(30));
        assert_eq!(config.refresh_endpoint(), Some("/api/v1/auth/refresh"));
    }

    #[test]
    fn test_base_url_strips_trailing_slash() {
        let config = ApiConfig::new("http://api.example.com/");
        let url = config.base_url().unwrap();
        assert_eq!(url.as_str().trim_end_matches('/'), "http://api.example.com");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let error = ApiConfig::new("ftp://example.com").base_url().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);

        let error = ApiConfig::new("not a url").base_url().unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_effective_timeout_uses_default_when_zero() {
        let config = ApiConfig::default().with_timeout(0);
        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_refresh_can_be_disabled() {
        assert!(ApiConfig::default().without_refresh().refresh_endpoint().is_none());

        let mut config = ApiConfig::default();
        config.refresh_path = "  ".to_owned();
        assert!(config.refresh_endpoint().is_none());
    }

    #[test]
    fn test_effective_user_agent() {
        assert!(ApiConfig::default().effective_user_agent().starts_with("leadgenie/"));
        let config = ApiConfig::default().with_user_agent("custom/1.0");
        assert_eq!(config.effective_user_agent(), "custom/1.0");
    }
}
