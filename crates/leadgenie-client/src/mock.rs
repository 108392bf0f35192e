//! In-memory test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use leadgenie_core::OtpCode;
use leadgenie_core::types::{
    AccessToken, LoginCredentials, OtpDispatch, OtpReceipt, PendingRegistration, TokenGrant,
    UserId, UserProfile,
};

use crate::provider::AuthProvider;
use crate::session::{NavigationTarget, Navigator};
use crate::storage::TokenStore;
use crate::{Error, Result};

/// Code accepted by [`MockAuthProvider`] unless configured otherwise.
pub const MOCK_OTP_CODE: &str = "123456";

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    profile: UserProfile,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: HashMap<String, MockAccount>,
    sessions: HashMap<String, String>,
    issued: usize,
}

#[derive(Debug, Default)]
struct MockCalls {
    login: AtomicUsize,
    current_user: AtomicUsize,
    register: AtomicUsize,
    send_otp: AtomicUsize,
    verify_otp: AtomicUsize,
    register_with_otp: AtomicUsize,
}

/// [`AuthProvider`] backed by an in-memory account table.
///
/// Tokens are issued as `tok1`, `tok2`, ... and the current user is looked
/// up through the shared [`TokenStore`], the same way the HTTP client
/// attaches the stored token. Every call is counted.
#[derive(Debug, Clone)]
pub struct MockAuthProvider {
    tokens: TokenStore,
    state: Arc<Mutex<MockState>>,
    calls: Arc<MockCalls>,
    latency: Option<Duration>,
    fail_current_user: bool,
    otp_code: String,
}

impl Default for MockAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthProvider {
    /// Creates a provider with no accounts and an in-memory token store.
    pub fn new() -> Self {
        Self::with_tokens(TokenStore::in_memory())
    }

    /// Creates a provider reading tokens from `tokens`.
    pub fn with_tokens(tokens: TokenStore) -> Self {
        Self {
            tokens,
            state: Arc::default(),
            calls: Arc::default(),
            latency: None,
            fail_current_user: false,
            otp_code: MOCK_OTP_CODE.to_owned(),
        }
    }

    /// Adds an account.
    #[must_use]
    pub fn with_account(self, id: i64, email: &str, password: &str) -> Self {
        self.state().accounts.insert(
            email.to_owned(),
            MockAccount {
                password: password.to_owned(),
                profile: UserProfile::new(id, email),
            },
        );
        self
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every profile lookup fail with a server error.
    #[must_use]
    pub fn failing_current_user(mut self) -> Self {
        self.fail_current_user = true;
        self
    }

    /// Sets the verification code that is accepted.
    #[must_use]
    pub fn with_otp_code(mut self, code: impl Into<String>) -> Self {
        self.otp_code = code.into();
        self
    }

    /// Token store the provider reads the current token from.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Issues a token for an existing account without a login call.
    pub fn issue_token(&self, email: &str) -> AccessToken {
        let mut state = self.state();
        state.issued += 1;
        let token = format!("tok{}", state.issued);
        state.sessions.insert(token.clone(), email.to_owned());
        AccessToken::new(token)
    }

    /// Forgets every issued token.
    pub fn revoke_all(&self) {
        self.state().sessions.clear();
    }

    pub fn login_calls(&self) -> usize {
        self.calls.login.load(Ordering::SeqCst)
    }

    pub fn current_user_calls(&self) -> usize {
        self.calls.current_user.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.calls.register.load(Ordering::SeqCst)
    }

    pub fn send_otp_calls(&self) -> usize {
        self.calls.send_otp.load(Ordering::SeqCst)
    }

    pub fn verify_otp_calls(&self) -> usize {
        self.calls.verify_otp.load(Ordering::SeqCst)
    }

    pub fn register_with_otp_calls(&self) -> usize {
        self.calls.register_with_otp.load(Ordering::SeqCst)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn create_account(&self, draft: &PendingRegistration) -> Result<UserProfile> {
        let mut state = self.state();
        if state.accounts.contains_key(&draft.email) {
            return Err(already_registered());
        }

        let id = UserId::from(state.accounts.len() as i64 + 1);
        let profile = UserProfile::new(id, draft.email.clone())
            .with_display_name(draft.display_name.clone())
            .with_role(draft.role);
        state.accounts.insert(
            draft.email.clone(),
            MockAccount {
                password: draft.password.clone(),
                profile: profile.clone(),
            },
        );
        Ok(profile)
    }

    fn check_code(&self, code: &OtpCode) -> Result<()> {
        if code.as_str() == self.otp_code {
            Ok(())
        } else {
            Err(Error::from_status(400).with_message("Invalid or expired OTP"))
        }
    }
}

fn already_registered() -> Error {
    Error::from_status(400).with_message("Email already registered")
}

#[async_trait::async_trait]
impl AuthProvider for MockAuthProvider {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenGrant> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        let accepted = self
            .state()
            .accounts
            .get(&credentials.email)
            .is_some_and(|account| account.password == credentials.password);
        if !accepted {
            return Err(Error::from_status(401).with_message("Incorrect email or password"));
        }

        Ok(TokenGrant::new(self.issue_token(&credentials.email)))
    }

    async fn current_user(&self) -> Result<UserProfile> {
        self.calls.current_user.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.fail_current_user {
            return Err(Error::from_status(500));
        }

        let token = self.tokens.load()?.ok_or_else(|| {
            Error::from_status(401).with_message("Not authenticated")
        })?;

        let state = self.state();
        state
            .sessions
            .get(token.as_str())
            .and_then(|email| state.accounts.get(email))
            .map(|account| account.profile.clone())
            .ok_or_else(|| Error::from_status(401).with_message("Could not validate credentials"))
    }

    async fn register(&self, draft: &PendingRegistration) -> Result<UserProfile> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.create_account(draft)
    }

    async fn send_otp(&self, draft: &PendingRegistration) -> Result<OtpDispatch> {
        self.calls.send_otp.fetch_add(1, Ordering::SeqCst);
        self.delay().await;

        if self.state().accounts.contains_key(&draft.email) {
            return Err(already_registered());
        }

        Ok(OtpDispatch {
            message: Some("OTP sent successfully".to_owned()),
            email: Some(draft.email.clone()),
            expires_in_minutes: Some(10),
        })
    }

    async fn verify_otp(&self, _email: &str, code: &OtpCode) -> Result<OtpReceipt> {
        self.calls.verify_otp.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check_code(code)?;
        Ok(OtpReceipt::default())
    }

    async fn register_with_otp(
        &self,
        draft: &PendingRegistration,
        code: &OtpCode,
    ) -> Result<UserProfile> {
        self.calls.register_with_otp.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        self.check_code(code)?;
        self.create_account(draft)
    }
}

/// [`Navigator`] that remembers every request.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    targets: Arc<Mutex<Vec<NavigationTarget>>>,
}

impl RecordingNavigator {
    /// Navigation requests received so far, oldest first.
    pub fn targets(&self) -> Vec<NavigationTarget> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: NavigationTarget) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
    }
}
