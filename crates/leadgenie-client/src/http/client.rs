//! Reqwest-based client for the LeadGenie backend.

use std::sync::Arc;

use leadgenie_core::types::{AccessToken, RefreshRequest, TokenGrant};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, broadcast};
use url::Url;

use super::request::{AuthMode, RequestBody};
use super::{ApiConfig, ApiRequest, AuthEvent, TRACING_TARGET, error};
use crate::storage::TokenStore;
use crate::{Error, Result};

/// Capacity of the auth event channel.
const EVENT_CAPACITY: usize = 16;

/// Inner client that holds the HTTP client and shared state.
struct ApiClientInner {
    http: Client,
    config: ApiConfig,
    base_url: String,
    tokens: TokenStore,
    events: broadcast::Sender<AuthEvent>,
    refresh_lock: Mutex<()>,
}

/// Authorizing HTTP client for the LeadGenie backend.
///
/// Every bearer request carries `Authorization: Bearer <token>` when the
/// [`TokenStore`] holds a token. A 401 on a first attempt triggers at most
/// one token refresh followed by one replay of the request. When the
/// credential cannot be recovered the token store is cleared and
/// [`AuthEvent::Unauthorized`] is broadcast to every subscriber. Successful
/// refreshes are broadcast as [`AuthEvent::Refreshed`].
///
/// Concurrent 401s are serialized on a single refresh: a request that waited
/// while another one refreshed replays with the new token instead of
/// refreshing again.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a new client with the given configuration and token store.
    pub fn new(config: ApiConfig, tokens: TokenStore) -> Result<Self> {
        let base_url = config.base_url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating API client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                Error::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(e)
            })?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = ApiClientInner {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            config,
            tokens,
            events,
            refresh_lock: Mutex::new(()),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Gets the token store this client authorizes with.
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Subscribes to authentication events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Sends a request and decodes the JSON response.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let body = self.execute(request).await?;
        decode(&body)
    }

    /// Sends a request and decodes the JSON response, or returns the
    /// default value when the response has no body.
    pub async fn send_or_default<T: DeserializeOwned + Default>(
        &self,
        request: ApiRequest,
    ) -> Result<T> {
        let body = self.execute(request).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        decode(&body)
    }

    /// Sends a request and discards the response body.
    pub async fn send_unit(&self, request: ApiRequest) -> Result<()> {
        self.execute(request).await.map(drop)
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// The new token, and the rotated refresh token when one is returned,
    /// are saved before this returns.
    pub async fn refresh(&self) -> Result<AccessToken> {
        let Some(path) = self.inner.config.refresh_endpoint() else {
            return Err(Error::unauthorized().with_message("Token refresh is disabled"));
        };
        let Some(refresh_token) = self.inner.tokens.load_refresh()? else {
            return Err(Error::unauthorized().with_message("No refresh token is stored"));
        };

        let previous = self.inner.tokens.load_or_none();
        let request = ApiRequest::post(path).public().json(&RefreshRequest {
            refresh_token: &refresh_token,
        })?;
        let grant: TokenGrant = decode(&self.dispatch(&request, None).await?)?;
        if grant.access_token.is_empty() {
            return Err(Error::unauthorized().with_message("Refresh returned an empty token"));
        }

        self.inner.tokens.save(&grant.access_token)?;
        if let Some(rotated) = &grant.refresh_token {
            self.inner.tokens.save_refresh(rotated)?;
        }

        tracing::debug!(target: TRACING_TARGET, "Access token refreshed");
        self.broadcast(AuthEvent::Refreshed {
            previous,
            current: grant.access_token.clone(),
        });
        Ok(grant.access_token)
    }

    async fn execute(&self, request: ApiRequest) -> Result<Vec<u8>> {
        let token = match request.auth() {
            AuthMode::Bearer => self.inner.tokens.load_or_none(),
            AuthMode::Public => None,
        };

        let rejected = match self.dispatch(&request, token.as_ref()).await {
            Err(e) if e.is_unauthorized() && request.auth() == AuthMode::Bearer => e,
            result => return result,
        };

        if !request.can_refresh() {
            self.invalidate(&request, token);
            return Err(rejected);
        }

        let Some(fresh) = self.recover(&request, token.as_ref()).await else {
            self.invalidate(&request, token);
            return Err(rejected);
        };

        let replay = request.retried();
        match self.dispatch(&replay, Some(&fresh)).await {
            Err(e) if e.is_unauthorized() => {
                self.invalidate(&replay, Some(fresh));
                Err(e)
            }
            result => result,
        }
    }

    /// Returns a token worth replaying with, refreshing if needed.
    async fn recover(
        &self,
        request: &ApiRequest,
        rejected: Option<&AccessToken>,
    ) -> Option<AccessToken> {
        let _guard = self.inner.refresh_lock.lock().await;

        if let Some(current) = self.inner.tokens.load_or_none()
            && Some(&current) != rejected
        {
            tracing::debug!(
                target: TRACING_TARGET,
                request_id = %request.request_id(),
                "Token changed while waiting, replaying"
            );
            return Some(current);
        }

        match self.refresh().await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request.request_id(),
                    error = %e,
                    "Token refresh failed"
                );
                None
            }
        }
    }

    fn invalidate(&self, request: &ApiRequest, token: Option<AccessToken>) {
        if let Err(e) = self.inner.tokens.clear_credentials() {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %e,
                "Failed to clear rejected credentials"
            );
        }

        let receivers = self.broadcast(AuthEvent::Unauthorized { token });
        tracing::info!(
            target: TRACING_TARGET,
            request_id = %request.request_id(),
            path = request.path(),
            receivers,
            "Credential rejected, session invalidated"
        );
    }

    /// Sends `event` to every subscriber and returns how many there were.
    fn broadcast(&self, event: AuthEvent) -> usize {
        self.inner.events.send(event).unwrap_or(0)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<Vec<u8>> {
        let url = self.url(request)?;

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id(),
            method = %request.method(),
            path = request.path(),
            attempt = request.attempt(),
            authorized = token.is_some(),
            "Sending request"
        );

        let mut builder = self.inner.http.request(request.method().clone(), url);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, token.bearer());
        }
        if let Some(content_type) = request.body().content_type() {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.body(bytes.clone()),
            RequestBody::Form(text) => builder.body(text.clone()),
        };

        let response = builder.send().await.map_err(error::from_reqwest)?;
        let status = response.status();
        let body = response.bytes().await.map_err(error::from_reqwest)?;

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id(),
            status = status.as_u16(),
            "Response received"
        );

        if status.is_success() {
            Ok(body.to_vec())
        } else {
            Err(error::from_response(status.as_u16(), &body))
        }
    }

    fn url(&self, request: &ApiRequest) -> Result<Url> {
        let path = request.path();
        let separator = if path.starts_with('/') { "" } else { "/" };
        let mut url = Url::parse(&format!("{}{separator}{path}", self.inner.base_url))
            .map_err(|e| {
                Error::invalid_input()
                    .with_message(format!("invalid request path '{path}'"))
                    .with_source(e)
            })?;

        if !request.query().is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query()
                    .iter()
                    .map(|(key, value)| (*key, value.as_str())),
            );
        }

        Ok(url)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| Error::from(e).with_message("Unexpected response from the server"))
}

#[cfg(test)]
mod tests {
    use leadgenie_core::ErrorKind;

    use super::*;

    fn client(api_url: &str) -> ApiClient {
        ApiClient::new(ApiConfig::new(api_url), TokenStore::in_memory()).unwrap()
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let error = ApiClient::new(ApiConfig::new("localhost"), TokenStore::in_memory())
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_url_joins_base_path_and_query() {
        let client = client("http://api.example.com/prefix/");
        let request = ApiRequest::get("/api/v1/leads")
            .with_query([("category", "hot".to_owned()), ("search", "a b".to_owned())]);

        let url = client.url(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.example.com/prefix/api/v1/leads?category=hot&search=a+b"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        let client = client("http://127.0.0.1:9");
        let error = client
            .send_unit(ApiRequest::get("/api/v1/auth/users/me"))
            .await
            .unwrap_err();
        assert!(matches!(
            error.kind,
            ErrorKind::NetworkError | ErrorKind::Timeout
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_unauthorized() {
        let client = client("http://127.0.0.1:9");
        let error = client.refresh().await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Unauthorized);
    }
}
