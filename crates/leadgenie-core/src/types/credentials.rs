//! Login credentials.

use std::fmt;

use serde::Deserialize;
use validator::Validate;

/// Email and password submitted to `POST /auth/login`.
#[must_use]
#[derive(Clone, Deserialize, Validate)]
pub struct LoginCredentials {
    /// Email address of the account.
    #[validate(email)]
    #[validate(length(min = 5, max = 254))]
    pub email: String,

    /// Password of the account.
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl LoginCredentials {
    /// Creates a new set of credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_owned(),
            password: password.into(),
        }
    }

    /// Returns the form fields the login endpoint expects.
    ///
    /// The backend is an OAuth2 password form, so the email goes in `username`.
    pub fn form_fields(&self) -> [(&'static str, &str); 2] {
        [("username", self.email.as_str()), ("password", self.password.as_str())]
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_credentials() {
        let credentials = LoginCredentials::new(" a@b.com ", "pw123456");
        assert!(credentials.validate().is_ok());
        assert_eq!(credentials.email, "a@b.com");
    }

    #[test]
    fn test_invalid_credentials() {
        assert!(LoginCredentials::new("not-an-email", "pw").validate().is_err());
        assert!(LoginCredentials::new("a@b.com", "").validate().is_err());
    }

    #[test]
    fn test_form_fields() {
        let credentials = LoginCredentials::new("a@b.com", "pw123456");
        assert_eq!(
            credentials.form_fields(),
            [("username", "a@b.com"), ("password", "pw123456")]
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = LoginCredentials::new("a@b.com", "hunter22");
        assert!(!format!("{credentials:?}").contains("hunter22"));
    }
}
