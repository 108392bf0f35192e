//! Backend endpoint paths.

pub const LOGIN: &str = "/api/v1/auth/login";
pub const CURRENT_USER: &str = "/api/v1/auth/users/me";
pub const REGISTER: &str = "/api/v1/auth/register";
pub const SEND_OTP: &str = "/api/v1/auth/send-otp";
pub const VERIFY_OTP: &str = "/api/v1/auth/verify-otp";
pub const REGISTER_WITH_OTP: &str = "/api/v1/auth/register-with-otp";

pub const LEADS: &str = "/api/v1/leads";
pub const LEAD_STATS: &str = "/api/v1/leads/stats";
pub const LEAD_QUALIFY: &str = "/api/v1/leads/qualify";

/// Path of a single lead.
pub fn lead(id: &uuid::Uuid) -> String {
    format!("{LEADS}/{id}")
}
