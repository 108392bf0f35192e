//! Wire types exchanged with the LeadGenie backend.
//!
//! # Overview
//!
//! - **Users**: [`UserProfile`], [`UserId`] and [`UserRole`]
//! - **Tokens**: [`AccessToken`], [`RefreshToken`] and the [`TokenGrant`]
//!   returned by the login endpoint
//! - **Credentials & registration**: [`LoginCredentials`] and the
//!   [`PendingRegistration`] held between the OTP steps
//! - **Leads**: [`Lead`], [`LeadSubmission`], [`LeadUpdate`], [`LeadQuery`]
//!   and [`LeadStats`]
//!
//! Request types validate themselves with [`validator::Validate`] so the
//! client can reject malformed input without a network round trip.

mod credentials;
mod lead;
mod registration;
mod timestamp;
mod token;
mod user;

pub use credentials::LoginCredentials;
pub use lead::{
    Lead, LeadCategory, LeadQuery, LeadSort, LeadStats, LeadStatus, LeadSubmission, LeadUpdate,
};
pub use registration::{
    OtpDispatch, OtpReceipt, PendingRegistration, RegisterWithOtpBody, RegistrationBody,
    SendOtpBody, VerifyOtpBody,
};
pub use token::{AccessToken, RefreshRequest, RefreshToken, TokenGrant};
pub use user::{UserId, UserProfile, UserRole};
