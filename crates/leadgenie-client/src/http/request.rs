//! Outbound request description.

use std::fmt;

use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::Result;

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Attach the stored bearer token, refreshing once after a 401.
    Bearer,
    /// Send without credentials; a 401 is returned as-is.
    Public,
}

/// Encoded request body.
#[derive(Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// `application/json` bytes.
    Json(Vec<u8>),
    /// `application/x-www-form-urlencoded` text.
    Form(String),
}

impl RequestBody {
    /// Content type header value for this body.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json"),
            Self::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }
}

// Bodies carry passwords and OTP codes.
impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Json(bytes) => write!(f, "Json({} bytes)", bytes.len()),
            Self::Form(text) => write!(f, "Form({} bytes)", text.len()),
        }
    }
}

/// A request to the LeadGenie backend.
///
/// Requests are immutable values. The attempt counter only grows through
/// [`ApiRequest::retried`], which returns a new request; a request whose
/// attempt is non-zero is never retried again.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: RequestBody,
    auth: AuthMode,
    attempt: u8,
    request_id: Uuid,
}

impl ApiRequest {
    /// Creates a bearer-authenticated request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            auth: AuthMode::Bearer,
            attempt: 0,
            request_id: Uuid::now_v7(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Sets a form-encoded body.
    #[must_use]
    pub fn form<'a>(mut self, fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.body = RequestBody::Form(encoded);
        self
    }

    /// Appends query parameters.
    #[must_use]
    pub fn with_query(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Sends the request without credentials.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.auth = AuthMode::Public;
        self
    }

    /// Returns the replay of this request, one attempt later.
    #[must_use]
    pub fn retried(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(&'static str, String)] {
        &self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    /// Number of times this request has already been sent.
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 0
    }

    /// Correlation id shared by every attempt of this request.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns `true` if a 401 on this request may trigger a refresh.
    pub fn can_refresh(&self) -> bool {
        self.auth == AuthMode::Bearer && !self.is_retry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retried_is_a_new_value() {
        let request = ApiRequest::get("/api/v1/auth/users/me");
        let replay = request.retried();

        assert_eq!(request.attempt(), 0);
        assert!(request.can_refresh());
        assert_eq!(replay.attempt(), 1);
        assert!(!replay.can_refresh());
        assert_eq!(replay.request_id(), request.request_id());
        assert_eq!(replay.path(), request.path());
    }

    #[test]
    fn test_public_requests_never_refresh() {
        let request = ApiRequest::post("/api/v1/auth/login").public();
        assert_eq!(request.auth(), AuthMode::Public);
        assert!(!request.can_refresh());
    }

    #[test]
    fn test_form_body_is_url_encoded() {
        let request = ApiRequest::post("/login").form([("username", "a@b.com"), ("password", "p w&")]);
        assert_eq!(
            request.body(),
            &RequestBody::Form("username=a%40b.com&password=p+w%26".to_owned())
        );
        assert_eq!(
            request.body().content_type(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_body_debug_hides_content() {
        let request = ApiRequest::post("/x")
            .json(&serde_json::json!({ "password": "hunter2" }))
            .unwrap();
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
