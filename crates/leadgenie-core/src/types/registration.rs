//! Account registration and OTP request bodies.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserRole;
use crate::otp::OtpCode;

/// Profile collected before an account is created.
///
/// Held between "send verification code" and "confirm code" and dropped
/// once registration completes or the user goes back to the profile step.
#[must_use]
#[derive(Clone, PartialEq, Eq, Validate)]
pub struct PendingRegistration {
    /// Email address of the new account.
    #[validate(email)]
    #[validate(length(min = 5, max = 254))]
    pub email: String,

    /// Password of the new account.
    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// Name shown in the UI.
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,

    /// Role requested for the account.
    pub role: UserRole,
}

impl PendingRegistration {
    /// Creates a new registration draft with the default role.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into().trim().to_owned(),
            password: password.into(),
            display_name: display_name.into().trim().to_owned(),
            role: UserRole::default(),
        }
    }

    /// Sets the requested role.
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Body for `POST /auth/register`.
    pub fn registration_body(&self) -> RegistrationBody<'_> {
        RegistrationBody {
            email: &self.email,
            password: &self.password,
            full_name: &self.display_name,
            role: self.role,
        }
    }

    /// Body for `POST /auth/send-otp`.
    pub fn send_otp_body(&self) -> SendOtpBody<'_> {
        SendOtpBody {
            email: &self.email,
            full_name: &self.display_name,
        }
    }

    /// Body for `POST /auth/register-with-otp`.
    pub fn register_with_otp_body<'a>(&'a self, code: &'a OtpCode) -> RegisterWithOtpBody<'a> {
        RegisterWithOtpBody {
            registration: self.registration_body(),
            otp_code: code.as_str(),
        }
    }
}

impl fmt::Debug for PendingRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistration")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /auth/register`.
#[derive(Serialize)]
pub struct RegistrationBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: &'a str,
    pub role: UserRole,
}

/// Body of `POST /auth/send-otp`.
#[derive(Debug, Serialize)]
pub struct SendOtpBody<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
}

/// Body of `POST /auth/verify-otp`.
#[derive(Debug, Serialize)]
pub struct VerifyOtpBody<'a> {
    pub email: &'a str,
    pub otp_code: &'a str,
}

/// Body of `POST /auth/register-with-otp`.
#[derive(Serialize)]
pub struct RegisterWithOtpBody<'a> {
    #[serde(flatten)]
    pub registration: RegistrationBody<'a>,
    pub otp_code: &'a str,
}

/// Response of `POST /auth/send-otp`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OtpDispatch {
    /// Human-readable confirmation.
    #[serde(default)]
    pub message: Option<String>,
    /// Address the code was sent to.
    #[serde(default)]
    pub email: Option<String>,
    /// How long the code stays valid.
    #[serde(default)]
    pub expires_in_minutes: Option<u32>,
}

/// Response of `POST /auth/verify-otp`.
///
/// A 2xx status means the code was accepted; the body is informational.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OtpReceipt {
    /// Human-readable confirmation.
    #[serde(default)]
    pub message: Option<String>,
}
