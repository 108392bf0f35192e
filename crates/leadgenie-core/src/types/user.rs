//! User profile types.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Identifier of a user account.
///
/// Opaque to the client: the backend has issued both integer and UUID ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier (usually a UUID).
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_owned())
    }
}

/// Role of a user within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    /// Organization administrator.
    Admin,
    /// Manages a team of sales representatives.
    SalesManager,
    /// Works leads directly.
    #[default]
    SalesRep,
    /// A role this client does not know about.
    #[serde(other)]
    Unknown,
}

/// Profile of the authenticated user, as returned by `GET /auth/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account identifier.
    pub id: UserId,
    /// Email address the account was registered with.
    pub email: String,
    /// Name shown in the UI.
    #[serde(default, rename = "full_name", alias = "display_name")]
    pub display_name: Option<String>,
    /// Role of the account.
    #[serde(default)]
    pub role: UserRole,
    /// Whether the account is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// When the account was created.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::timestamp::deserialize_optional"
    )]
    pub created_at: Option<Timestamp>,
}

impl UserProfile {
    /// Creates a profile with the given id and email and default fields.
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: None,
            role: UserRole::default(),
            is_active: None,
            created_at: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    /// Returns the display name, or the email when the account has none.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_minimal_profile() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id":1,"email":"a@b.com"}"#).unwrap();

        assert_eq!(profile.id, UserId::Number(1));
        assert_eq!(profile.email, "a@b.com");
        assert_eq!(profile.role, UserRole::SalesRep);
        assert_eq!(profile.label(), "a@b.com");
    }

    #[test]
    fn test_full_profile() {
        let profile: UserProfile = serde_json::from_str(
            r#"{
                "id": "6f1c2a8e-7d1b-4c55-9a7e-0c2f1b1d9e11",
                "email": "ana@acme.io",
                "full_name": "Ana Ruiz",
                "role": "sales_manager",
                "is_active": true,
                "is_superuser": false,
                "created_at": "2025-08-16T10:00:00"
            }"#,
        )
        .unwrap();

        assert!(matches!(profile.id, UserId::Text(_)));
        assert_eq!(profile.label(), "Ana Ruiz");
        assert_eq!(profile.role, UserRole::SalesManager);
        assert!(profile.created_at.is_some());
    }

    #[test]
    fn test_unknown_role() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id":7,"email":"x@y.z","role":"auditor"}"#).unwrap();
        assert_eq!(profile.role, UserRole::Unknown);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::SalesRep.as_ref(), "sales_rep");
        assert!(UserRole::from_str("auditor").is_err());
    }
}
