//! In-process fake of the LeadGenie backend.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use leadgenie_client::session::{NavigationTarget, Navigator};
use serde_json::{Value, json};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "pw123456";
pub const OTP_CODE: &str = "123456";
pub const LEAD_ID: &str = "0b8f6f7c-8f1e-4bb6-9a64-8c1f1f0a0d2e";

#[derive(Debug, Default)]
pub struct BackendState {
    pub issued: usize,
    pub valid_tokens: HashSet<String>,
    pub refresh_tokens: HashMap<String, String>,
    pub refresh_disabled: bool,
    pub reject_all: bool,
    pub login_calls: usize,
    pub me_calls: usize,
    pub refresh_calls: usize,
    pub leads_calls: usize,
    /// Every request to a lead endpoint, listings included.
    pub lead_requests: usize,
    pub last_lead_body: Option<Value>,
    pub deleted: Vec<String>,
    pub last_login_form: Option<String>,
    pub last_leads_query: Option<String>,
    pub registered: Vec<String>,
}

/// Shared handle on the fake backend's state.
#[derive(Debug, Clone, Default)]
pub struct Backend {
    state: Arc<Mutex<BackendState>>,
}

impl Backend {
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invalidates every access token; refresh tokens stay valid.
    pub fn expire_tokens(&self) {
        self.state().valid_tokens.clear();
    }

    /// Makes every refresh attempt fail.
    pub fn disable_refresh(&self) {
        self.state().refresh_disabled = true;
    }

    /// Rejects every bearer token, including freshly refreshed ones.
    pub fn reject_all(&self) {
        self.state().reject_all = true;
    }

    fn issue(&self) -> (String, String) {
        let mut state = self.state();
        state.issued += 1;
        let access = format!("tok{}", state.issued);
        let refresh = format!("ref{}", state.issued);
        state.valid_tokens.insert(access.clone());
        state.refresh_tokens.insert(refresh.clone(), access.clone());
        (access, refresh)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let state = self.state();
        if state.reject_all {
            return false;
        }
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|token| state.valid_tokens.contains(token))
    }

    /// Serves the backend on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/v1/auth/login", post(login))
            .route("/api/v1/auth/users/me", get(me))
            .route("/api/v1/auth/refresh", post(refresh))
            .route("/api/v1/auth/send-otp", post(send_otp))
            .route("/api/v1/auth/register-with-otp", post(register_with_otp))
            .route("/api/v1/leads", get(list_leads).post(create_lead))
            .route("/api/v1/leads/stats", get(lead_stats))
            .route("/api/v1/leads/qualify", post(qualify_lead))
            .route(
                "/api/v1/leads/{id}",
                get(get_lead).put(update_lead).delete(delete_lead),
            )
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
        .into_response()
}

async fn login(State(backend): State<Backend>, body: String) -> Response {
    let fields: HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect();
    {
        let mut state = backend.state();
        state.login_calls += 1;
        state.last_login_form = Some(body.clone());
    }

    let accepted = fields.get("username").map(String::as_str) == Some(EMAIL)
        && fields.get("password").map(String::as_str) == Some(PASSWORD);
    if !accepted {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        )
            .into_response();
    }

    let (access, refresh) = backend.issue();
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    }))
    .into_response()
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend.state().me_calls += 1;
    if !backend.authorized(&headers) {
        return unauthorized();
    }

    Json(json!({
        "id": 1,
        "email": EMAIL,
        "full_name": "Ana",
        "role": "sales_rep",
        "is_active": true,
        "created_at": "2025-08-16T10:00:00",
    }))
    .into_response()
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let known = {
        let mut state = backend.state();
        state.refresh_calls += 1;
        let token = body.get("refresh_token").and_then(Value::as_str);
        !state.refresh_disabled && token.is_some_and(|t| state.refresh_tokens.contains_key(t))
    };
    if !known {
        return unauthorized();
    }

    let (access, _) = backend.issue();
    Json(json!({ "token": access })).into_response()
}

async fn send_otp(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    if backend.state().registered.iter().any(|known| known == email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email already registered" })),
        )
            .into_response();
    }

    Json(json!({
        "message": "OTP sent successfully",
        "email": email,
        "expires_in_minutes": 10,
    }))
    .into_response()
}

async fn register_with_otp(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    if body.get("otp_code").and_then(Value::as_str) != Some(OTP_CODE) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Invalid or expired OTP" })),
        )
            .into_response();
    }

    let email = body.get("email").and_then(Value::as_str).unwrap_or_default().to_owned();
    let mut state = backend.state();
    state.registered.push(email.clone());
    Json(json!({
        "id": 100 + state.registered.len(),
        "email": email,
        "full_name": body.get("full_name"),
        "role": body.get("role"),
    }))
    .into_response()
}

async fn list_leads(
    State(backend): State<Backend>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    {
        let mut state = backend.state();
        state.leads_calls += 1;
        state.lead_requests += 1;
        state.last_leads_query = query;
    }
    if !backend.authorized(&headers) {
        return unauthorized();
    }

    Json(json!([stored_lead()])).into_response()
}

fn stored_lead() -> Value {
    json!({
        "id": LEAD_ID,
        "name": "Jo",
        "email": "jo@acme.io",
        "company": "Acme",
        "category": "hot",
        "score": 87,
        "status": "QUALIFIED",
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Lead not found" }))).into_response()
}

/// Counts a lead request and checks its bearer token.
fn admit(backend: &Backend, headers: &HeaderMap, body: Option<&Value>) -> bool {
    {
        let mut state = backend.state();
        state.lead_requests += 1;
        if let Some(body) = body {
            state.last_lead_body = Some(body.clone());
        }
    }
    backend.authorized(headers)
}

async fn get_lead(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !admit(&backend, &headers, None) {
        return unauthorized();
    }
    if id != LEAD_ID {
        return not_found();
    }

    Json(stored_lead()).into_response()
}

async fn lead_stats(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if !admit(&backend, &headers, None) {
        return unauthorized();
    }

    Json(json!({
        "total_leads": 12,
        "hot_leads": 3,
        "warm_leads": 5,
        "cold_leads": 4,
        "average_score": 61.5,
        "conversion_rate": 0.25,
    }))
    .into_response()
}

async fn create_lead(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !admit(&backend, &headers, Some(&body)) {
        return unauthorized();
    }

    let lead = json!({
        "id": "5d1c9b0e-3f4a-4c7d-9e2b-7a6f1e0c8d31",
        "name": body.get("name"),
        "email": body.get("email"),
        "company": body.get("company"),
        "message": body.get("message"),
        "status": "NEW",
    });
    (StatusCode::CREATED, Json(lead)).into_response()
}

async fn qualify_lead(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !admit(&backend, &headers, Some(&body)) {
        return unauthorized();
    }

    Json(json!({
        "id": "9a3e7c21-6b5d-4f08-8c1a-2d4e6f8a0b13",
        "name": body.get("name"),
        "email": body.get("email"),
        "company": body.get("company"),
        "message": body.get("message"),
        "category": "warm",
        "score": 64,
        "status": "QUALIFIED",
        "reason": "Clear need, no timeline",
        "buying_signals": ["pricing request"],
        "next_actions": ["Book a demo"],
    }))
    .into_response()
}

async fn update_lead(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !admit(&backend, &headers, Some(&body)) {
        return unauthorized();
    }
    if id != LEAD_ID {
        return not_found();
    }

    let mut lead = stored_lead();
    if let (Some(lead), Some(patch)) = (lead.as_object_mut(), body.as_object()) {
        for (field, value) in patch {
            lead.insert(field.clone(), value.clone());
        }
    }
    Json(lead).into_response()
}

async fn delete_lead(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !admit(&backend, &headers, None) {
        return unauthorized();
    }
    if id != LEAD_ID {
        return not_found();
    }

    backend.state().deleted.push(id);
    StatusCode::NO_CONTENT.into_response()
}

/// Navigator that remembers every request.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    targets: Arc<Mutex<Vec<NavigationTarget>>>,
}

impl Recorder {
    pub fn targets(&self) -> Vec<NavigationTarget> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for Recorder {
    fn navigate(&self, target: NavigationTarget) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
    }
}
