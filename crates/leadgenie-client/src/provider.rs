//! Authentication backend seam.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use leadgenie_core::OtpCode;
use leadgenie_core::types::{
    LoginCredentials, OtpDispatch, OtpReceipt, PendingRegistration, TokenGrant, UserProfile,
};

use crate::Result;

/// Tracing target for authentication calls.
pub const TRACING_TARGET: &str = "leadgenie_client::auth";

/// Authentication endpoints of the backend.
///
/// [`ApiClient`](crate::http::ApiClient) is the production implementation.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges credentials for a token grant.
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant>;

    /// Returns the profile of the holder of the stored token.
    async fn current_user(&self) -> Result<UserProfile>;

    /// Creates an account without email verification.
    async fn register(&self, draft: &PendingRegistration) -> Result<UserProfile>;

    /// Sends a verification code to the draft's email address.
    async fn send_otp(&self, draft: &PendingRegistration) -> Result<OtpDispatch>;

    /// Checks a verification code without creating the account.
    async fn verify_otp(&self, email: &str, code: &OtpCode) -> Result<OtpReceipt>;

    /// Creates the account if the verification code is accepted.
    async fn register_with_otp(
        &self,
        draft: &PendingRegistration,
        code: &OtpCode,
    ) -> Result<UserProfile>;
}

/// Authentication service wrapper with observability.
///
/// Adds structured logging to any [`AuthProvider`]. The inner provider is
/// wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct AuthService {
    inner: Arc<dyn AuthProvider>,
}

impl fmt::Debug for AuthService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create a new authentication service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: AuthProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Wraps an already shared provider.
    pub fn from_arc(provider: Arc<dyn AuthProvider>) -> Self {
        Self { inner: provider }
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant> {
        let started_at = Instant::now();
        let result = self.inner.login(credentials).await;
        log_outcome("login", started_at, &result);
        result
    }

    pub async fn current_user(&self) -> Result<UserProfile> {
        let started_at = Instant::now();
        let result = self.inner.current_user().await;
        log_outcome("current_user", started_at, &result);
        result
    }

    pub async fn register(&self, draft: &PendingRegistration) -> Result<UserProfile> {
        let started_at = Instant::now();
        let result = self.inner.register(draft).await;
        log_outcome("register", started_at, &result);
        result
    }

    pub async fn send_otp(&self, draft: &PendingRegistration) -> Result<OtpDispatch> {
        let started_at = Instant::now();
        let result = self.inner.send_otp(draft).await;
        log_outcome("send_otp", started_at, &result);
        result
    }

    pub async fn verify_otp(&self, email: &str, code: &OtpCode) -> Result<OtpReceipt> {
        let started_at = Instant::now();
        let result = self.inner.verify_otp(email, code).await;
        log_outcome("verify_otp", started_at, &result);
        result
    }

    pub async fn register_with_otp(
        &self,
        draft: &PendingRegistration,
        code: &OtpCode,
    ) -> Result<UserProfile> {
        let started_at = Instant::now();
        let result = self.inner.register_with_otp(draft, code).await;
        log_outcome("register_with_otp", started_at, &result);
        result
    }
}

fn log_outcome<T>(operation: &'static str, started_at: Instant, result: &Result<T>) {
    let elapsed = started_at.elapsed();
    match result {
        Ok(_) => {
            tracing::debug!(
                target: TRACING_TARGET,
                operation,
                elapsed_ms = elapsed.as_millis(),
                "Auth call succeeded"
            );
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                operation,
                kind = %error.kind,
                status = ?error.status,
                elapsed_ms = elapsed.as_millis(),
                "Auth call failed"
            );
        }
    }
}
