//! Registration with an emailed verification code.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use leadgenie_core::types::{OtpDispatch, PendingRegistration, UserProfile};
use leadgenie_core::{OtpCode, OtpInput};
use serde::Serialize;
use strum::{AsRefStr, Display};
use validator::Validate;

use super::TRACING_TARGET;
use crate::provider::AuthService;
use crate::{Error, Result};

/// Seconds before another code may be requested.
pub const DEFAULT_COOLDOWN_SECS: u32 = 60;

const SEND_FAILED_MESSAGE: &str = "Failed to send verification code";
const RESEND_FAILED_MESSAGE: &str = "Failed to resend verification code";
const VERIFY_FAILED_MESSAGE: &str = "Invalid verification code";

/// Step of the registration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OtpStage {
    /// The user is filling in the profile form.
    #[default]
    CollectingProfile,
    /// A code was emailed and the flow waits for it.
    CodeSent,
    /// The entered code is being checked.
    Verifying,
    /// The account was created.
    Verified,
}

/// Read-only view of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpSnapshot {
    pub stage: OtpStage,
    /// Address the code was sent to.
    pub email: Option<String>,
    /// Seconds left before [`OtpFlow::resend`] is allowed.
    pub cooldown: u32,
    pub in_flight: bool,
    pub input: OtpInput,
    pub last_error: Option<String>,
    /// Minutes the last code stays valid, when the backend said so.
    pub expires_in_minutes: Option<u32>,
    /// The created account, once verified.
    pub registered: Option<UserProfile>,
}

#[derive(Debug, Default)]
struct FlowState {
    stage: OtpStage,
    pending: Option<PendingRegistration>,
    cooldown: u32,
    in_flight: bool,
    input: OtpInput,
    last_error: Option<String>,
    expires_in_minutes: Option<u32>,
    registered: Option<UserProfile>,
}

struct OtpFlowInner {
    auth: AuthService,
    cooldown_secs: u32,
    state: Mutex<FlowState>,
}

/// Verification-code registration flow.
///
/// Holds the pending registration between sending the code and confirming
/// it, a resend cooldown counted down by [`tick`](Self::tick), and the
/// six-slot code input. At most one backend call runs at a time; a second
/// `send_code` or `verify` while one is outstanding is refused with
/// [`ErrorKind::Conflict`](crate::ErrorKind::Conflict).
#[derive(Clone)]
pub struct OtpFlow {
    inner: Arc<OtpFlowInner>,
}

impl std::fmt::Debug for OtpFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpFlow")
            .field("cooldown_secs", &self.inner.cooldown_secs)
            .finish_non_exhaustive()
    }
}

/// Clears the in-flight flag even if the call is cancelled.
struct FlightGuard<'a> {
    flow: &'a OtpFlow,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.flow.state();
        state.in_flight = false;
        if state.stage == OtpStage::Verifying {
            state.stage = OtpStage::CodeSent;
        }
    }
}

impl OtpFlow {
    /// Creates a flow with the default resend cooldown.
    pub fn new(auth: AuthService) -> Self {
        Self::with_cooldown(auth, DEFAULT_COOLDOWN_SECS)
    }

    /// Creates a flow with a custom resend cooldown in seconds.
    pub fn with_cooldown(auth: AuthService, cooldown_secs: u32) -> Self {
        let inner = OtpFlowInner {
            auth,
            cooldown_secs,
            state: Mutex::new(FlowState::default()),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Validates the profile and emails a verification code.
    ///
    /// On success the profile is kept as the pending registration and the
    /// resend cooldown starts. On failure the stage is unchanged.
    pub async fn send_code(&self, draft: PendingRegistration) -> Result<OtpDispatch> {
        draft.validate()?;
        let _guard = self.start(|stage| {
            matches!(stage, OtpStage::CollectingProfile | OtpStage::CodeSent)
        })?;

        let result = self.inner.auth.send_otp(&draft).await;

        let mut state = self.state();
        match &result {
            Ok(dispatch) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    expires_in_minutes = ?dispatch.expires_in_minutes,
                    "Verification code sent"
                );
                state.stage = OtpStage::CodeSent;
                state.pending = Some(draft);
                state.cooldown = self.inner.cooldown_secs;
                state.input.clear();
                state.expires_in_minutes = dispatch.expires_in_minutes;
            }
            Err(e) => state.last_error = Some(e.user_message(SEND_FAILED_MESSAGE)),
        }
        result
    }

    /// Checks `code` and creates the account.
    ///
    /// Anything but six ASCII digits is rejected without a request. A
    /// rejected code returns the flow to [`OtpStage::CodeSent`] with the
    /// input left as typed.
    pub async fn verify(&self, code: &str) -> Result<UserProfile> {
        let code = match OtpCode::parse(code) {
            Ok(code) => code,
            Err(e) => {
                self.state().last_error = e.message.clone();
                return Err(e);
            }
        };

        let guard = self.start(|stage| stage == OtpStage::CodeSent)?;
        let pending = {
            let mut state = self.state();
            let Some(pending) = state.pending.clone() else {
                return Err(Error::invalid_input().with_message("Request a verification code first"));
            };
            state.stage = OtpStage::Verifying;
            pending
        };

        let result = self.inner.auth.register_with_otp(&pending, &code).await;
        drop(guard);

        let mut state = self.state();
        match &result {
            Ok(user) => {
                tracing::info!(target: TRACING_TARGET, user_id = %user.id, "Registration verified");
                state.stage = OtpStage::Verified;
                state.pending = None;
                state.cooldown = 0;
                state.registered = Some(user.clone());
            }
            Err(e) => {
                state.stage = OtpStage::CodeSent;
                state.last_error = Some(e.user_message(VERIFY_FAILED_MESSAGE));
            }
        }
        result
    }

    /// Verifies whatever is currently typed into the input.
    pub async fn verify_input(&self) -> Result<UserProfile> {
        let digits = self.state().input.digits();
        self.verify(&digits).await
    }

    /// Requests a new code.
    ///
    /// Returns `Ok(false)` without doing anything while the cooldown runs,
    /// while another call is outstanding, or when no code was sent yet.
    pub async fn resend(&self) -> Result<bool> {
        let pending = {
            let state = self.state();
            if state.stage != OtpStage::CodeSent || state.in_flight || state.cooldown > 0 {
                return Ok(false);
            }
            match state.pending.clone() {
                Some(pending) => pending,
                None => return Ok(false),
            }
        };

        let _guard = self.start(|stage| stage == OtpStage::CodeSent)?;
        let result = self.inner.auth.send_otp(&pending).await;

        let mut state = self.state();
        match result {
            Ok(dispatch) => {
                tracing::info!(target: TRACING_TARGET, "Verification code resent");
                state.cooldown = self.inner.cooldown_secs;
                state.input.clear();
                state.expires_in_minutes = dispatch.expires_in_minutes;
                Ok(true)
            }
            Err(e) => {
                state.last_error = Some(e.user_message(RESEND_FAILED_MESSAGE));
                Err(e)
            }
        }
    }

    /// Returns to the profile form, dropping the pending registration.
    ///
    /// Returns `false` while a call is outstanding.
    pub fn back(&self) -> bool {
        let mut state = self.state();
        if state.in_flight {
            return false;
        }

        state.stage = OtpStage::CollectingProfile;
        state.pending = None;
        state.cooldown = 0;
        state.input.clear();
        state.last_error = None;
        state.expires_in_minutes = None;
        true
    }

    /// Counts the resend cooldown down by `seconds`.
    pub fn tick(&self, seconds: u32) -> u32 {
        let mut state = self.state();
        state.cooldown = state.cooldown.saturating_sub(seconds);
        state.cooldown
    }

    /// Types `ch` into slot `index` of the code input.
    pub fn type_char(&self, index: usize, ch: char) {
        self.state().input.type_char(index, ch);
    }

    /// Handles backspace in slot `index` of the code input.
    pub fn backspace(&self, index: usize) {
        self.state().input.backspace(index);
    }

    /// Pastes `text` into the code input.
    pub fn paste(&self, text: &str) {
        self.state().input.paste(text);
    }

    /// Dismisses the last error.
    pub fn clear_error(&self) {
        self.state().last_error = None;
    }

    /// Returns the current state of the flow.
    pub fn snapshot(&self) -> OtpSnapshot {
        let state = self.state();
        OtpSnapshot {
            stage: state.stage,
            email: state.pending.as_ref().map(|pending| pending.email.clone()),
            cooldown: state.cooldown,
            in_flight: state.in_flight,
            input: state.input.clone(),
            last_error: state.last_error.clone(),
            expires_in_minutes: state.expires_in_minutes,
            registered: state.registered.clone(),
        }
    }

    /// Marks a call as started if the stage allows it.
    fn start(&self, allowed: impl FnOnce(OtpStage) -> bool) -> Result<FlightGuard<'_>> {
        let mut state = self.state();
        if state.in_flight {
            return Err(Error::conflict().with_message("A verification request is already running"));
        }
        if !allowed(state.stage) {
            return Err(Error::conflict()
                .with_message(format!("Not allowed while the flow is {}", state.stage)));
        }

        state.in_flight = true;
        state.last_error = None;
        Ok(FlightGuard { flow: self })
    }

    fn state(&self) -> MutexGuard<'_, FlowState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use leadgenie_core::ErrorKind;

    use super::*;
    use crate::mock::{MOCK_OTP_CODE, MockAuthProvider};

    fn flow() -> (OtpFlow, MockAuthProvider) {
        let provider = MockAuthProvider::new();
        (OtpFlow::new(AuthService::new(provider.clone())), provider)
    }

    fn draft() -> PendingRegistration {
        PendingRegistration::new("new@b.com", "pw123456", "Nia")
    }

    #[tokio::test]
    async fn test_send_code_starts_cooldown() {
        let (flow, provider) = flow();
        flow.send_code(draft()).await.unwrap();

        let snapshot = flow.snapshot();
        assert_eq!(snapshot.stage, OtpStage::CodeSent);
        assert_eq!(snapshot.cooldown, DEFAULT_COOLDOWN_SECS);
        assert_eq!(snapshot.email.as_deref(), Some("new@b.com"));
        assert_eq!(provider.send_otp_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_profile_is_not_sent() {
        let (flow, provider) = flow();
        let error = flow
            .send_code(PendingRegistration::new("new@b.com", "short", "Nia"))
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        assert_eq!(provider.send_otp_calls(), 0);
        assert_eq!(flow.snapshot().stage, OtpStage::CollectingProfile);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_stage() {
        let provider = MockAuthProvider::new().with_account(1, "new@b.com", "pw123456");
        let flow = OtpFlow::new(AuthService::new(provider));

        let error = flow.send_code(draft()).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);

        let snapshot = flow.snapshot();
        assert_eq!(snapshot.stage, OtpStage::CollectingProfile);
        assert_eq!(snapshot.last_error.as_deref(), Some("Email already registered"));
        assert!(!snapshot.in_flight);
    }

    #[tokio::test]
    async fn test_malformed_codes_never_reach_the_backend() {
        let (flow, provider) = flow();
        flow.send_code(draft()).await.unwrap();

        for code in ["12345", "1234567", "12a456", "", "١٢٣٤٥٦"] {
            let error = flow.verify(code).await.unwrap_err();
            assert_eq!(error.kind, ErrorKind::InvalidInput, "code {code:?}");
        }

        assert_eq!(provider.register_with_otp_calls(), 0);
        assert_eq!(flow.snapshot().stage, OtpStage::CodeSent);
    }

    #[tokio::test]
    async fn test_wrong_code_returns_to_code_sent() {
        let (flow, _) = flow();
        flow.send_code(draft()).await.unwrap();
        flow.paste("654321");

        let error = flow.verify_input().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Validation);

        let snapshot = flow.snapshot();
        assert_eq!(snapshot.stage, OtpStage::CodeSent);
        assert_eq!(snapshot.input.digits(), "654321");
        assert_eq!(snapshot.last_error.as_deref(), Some("Invalid or expired OTP"));
        assert_eq!(snapshot.email.as_deref(), Some("new@b.com"));
    }

    #[tokio::test]
    async fn test_correct_code_creates_account() {
        let (flow, provider) = flow();
        flow.send_code(draft()).await.unwrap();

        let user = flow.verify(MOCK_OTP_CODE).await.unwrap();
        assert_eq!(user.email, "new@b.com");

        let snapshot = flow.snapshot();
        assert_eq!(snapshot.stage, OtpStage::Verified);
        assert!(snapshot.email.is_none());
        assert_eq!(snapshot.registered, Some(user));
        assert_eq!(provider.register_with_otp_calls(), 1);
    }

    #[tokio::test]
    async fn test_resend_respects_cooldown() {
        let (flow, provider) = flow();
        flow.send_code(draft()).await.unwrap();

        assert!(!flow.resend().await.unwrap());
        assert_eq!(flow.snapshot().cooldown, DEFAULT_COOLDOWN_SECS);
        assert_eq!(provider.send_otp_calls(), 1);

        assert_eq!(flow.tick(45), 15);
        assert_eq!(flow.tick(45), 0);

        flow.paste("111111");
        assert!(flow.resend().await.unwrap());
        let snapshot = flow.snapshot();
        assert_eq!(snapshot.cooldown, DEFAULT_COOLDOWN_SECS);
        assert_eq!(snapshot.input.digits(), "");
        assert_eq!(provider.send_otp_calls(), 2);
    }

    #[tokio::test]
    async fn test_resend_before_send_is_a_no_op() {
        let (flow, provider) = flow();
        assert!(!flow.resend().await.unwrap());
        assert_eq!(provider.send_otp_calls(), 0);
    }

    #[tokio::test]
    async fn test_back_discards_pending_registration() {
        let (flow, _) = flow();
        flow.send_code(draft()).await.unwrap();

        assert!(flow.back());
        let snapshot = flow.snapshot();
        assert_eq!(snapshot.stage, OtpStage::CollectingProfile);
        assert!(snapshot.email.is_none());
        assert_eq!(snapshot.cooldown, 0);

        let error = flow.verify(MOCK_OTP_CODE).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Conflict);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_call_at_a_time() {
        let provider = MockAuthProvider::new().with_latency(Duration::from_millis(100));
        let flow = OtpFlow::with_cooldown(AuthService::new(provider.clone()), 0);
        flow.send_code(draft()).await.unwrap();

        let (verify, resend) = tokio::join!(flow.verify(MOCK_OTP_CODE), async {
            tokio::task::yield_now().await;
            let resent = flow.resend().await;
            let back = flow.back();
            (resent, back)
        });

        assert!(verify.is_ok());
        assert!(!resend.0.unwrap());
        assert!(!resend.1);
        assert_eq!(provider.send_otp_calls(), 1);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(OtpStage::CodeSent.as_ref(), "code_sent");
        assert_eq!(OtpStage::CollectingProfile.to_string(), "collecting_profile");
    }
}
