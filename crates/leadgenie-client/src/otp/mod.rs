//! Email verification during registration.
//!
//! The code input itself ([`OtpInput`](leadgenie_core::OtpInput)) lives in
//! the core crate; this module drives it against the backend.

mod flow;

pub use flow::{DEFAULT_COOLDOWN_SECS, OtpFlow, OtpSnapshot, OtpStage};

/// Tracing target for the registration flow.
pub const TRACING_TARGET: &str = "leadgenie_client::otp";
