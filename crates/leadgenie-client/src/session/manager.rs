//! Session lifecycle orchestration.

use std::sync::Arc;

use leadgenie_core::types::{AccessToken, LoginCredentials, PendingRegistration, UserProfile};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{Mutex, OnceCell, RwLock, broadcast};
use validator::Validate;

use super::inflight::InFlight;
use super::{
    NavigationTarget, Navigator, NoopNavigator, PersistedSession, Session, TRACING_TARGET,
    from_persisted, to_persisted,
};
use crate::http::{ApiClient, AuthEvent};
use crate::provider::AuthService;
use crate::storage::TokenStore;
use crate::{Error, Result};

/// Message shown when a login fails without a server message.
pub const LOGIN_FAILED_MESSAGE: &str = "Failed to login";

/// Message shown when a registration fails without a server message.
pub const REGISTER_FAILED_MESSAGE: &str = "Failed to register";

/// Session value plus the generation it belongs to.
#[derive(Debug, Default)]
struct Slot {
    session: Session,
    epoch: u64,
}

struct SessionManagerInner {
    auth: AuthService,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    slot: RwLock<Slot>,
    initialized: OnceCell<()>,
    login: InFlight<UserProfile>,
    register: InFlight<UserProfile>,
    events: Mutex<Option<broadcast::Receiver<AuthEvent>>>,
}

/// Owns the signed-in session and every transition of it.
///
/// All operations take `&self`; clones share the same session. Concurrent
/// logins (and concurrent registrations) join the attempt already in
/// flight instead of issuing a second request.
///
/// Every transition that discards a session bumps an epoch. A login or
/// startup check that finishes after such a transition drops its result
/// and reports [`ErrorKind::Stale`](crate::ErrorKind::Stale); the next
/// login starts a fresh attempt instead of joining it.
///
/// Authentication events only ever act on the token the session holds, so
/// a late rejection of an older token cannot end a newer session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Creates a manager over an authentication service and token store.
    pub fn new(auth: AuthService, tokens: TokenStore) -> Self {
        Self::with_navigator(auth, tokens, NoopNavigator)
    }

    /// Creates a manager that reports navigation requests to `navigator`.
    pub fn with_navigator<N>(auth: AuthService, tokens: TokenStore, navigator: N) -> Self
    where
        N: Navigator + 'static,
    {
        let inner = SessionManagerInner {
            auth,
            tokens,
            navigator: Arc::new(navigator),
            slot: RwLock::new(Slot::default()),
            initialized: OnceCell::new(),
            login: InFlight::default(),
            register: InFlight::default(),
            events: Mutex::new(None),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Creates a manager wired to an [`ApiClient`], listening to its
    /// authentication events.
    pub fn from_client<N>(client: &ApiClient, navigator: N) -> Self
    where
        N: Navigator + 'static,
    {
        let manager = Self::with_navigator(
            AuthService::new(client.clone()),
            client.tokens().clone(),
            navigator,
        );
        manager.listen(client.subscribe());
        manager
    }

    /// Starts reacting to `events`, replacing any previous subscription.
    pub fn listen(&self, events: broadcast::Receiver<AuthEvent>) {
        // Only contended while events are being drained.
        if let Ok(mut slot) = self.inner.events.try_lock() {
            *slot = Some(events);
        } else {
            tracing::warn!(
                target: TRACING_TARGET,
                "Event subscription is busy, keeping the previous one"
            );
        }
    }

    /// Confirms the stored token with the backend.
    ///
    /// Runs once per manager; later calls return the current session
    /// without network traffic. Never fails: any problem leaves an
    /// anonymous session and an empty token store.
    pub async fn initialize(&self) -> Session {
        self.drain_events().await;
        self.inner
            .initialized
            .get_or_init(|| self.bootstrap())
            .await;
        self.snapshot_unchecked().await
    }

    async fn bootstrap(&self) {
        let token = match self.inner.tokens.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!(target: TRACING_TARGET, "No stored token, starting anonymous");
                return;
            }
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Failed to read stored token, starting anonymous"
                );
                return;
            }
        };

        let epoch = self.begin().await;
        let result = self.inner.auth.current_user().await;

        let mut slot = self.inner.slot.write().await;
        if slot.epoch != epoch {
            tracing::debug!(target: TRACING_TARGET, "Discarding stale startup check");
            return;
        }

        slot.session = match result {
            Ok(user) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    user_id = %user.id,
                    "Session restored"
                );
                Session::authenticated(user, token)
            }
            Err(e) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Stored token rejected, starting anonymous"
                );
                self.clear_credentials();
                Session::default()
            }
        };
        self.persist(&slot.session);
    }

    /// Signs in with email and password.
    ///
    /// Credentials are checked locally first. The backend is then asked for
    /// a token and for the profile behind it; both must succeed.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<UserProfile> {
        self.drain_events().await;

        let credentials = LoginCredentials::new(email, password);
        if let Err(errors) = credentials.validate() {
            let error = Error::from(errors);
            tracing::debug!(target: TRACING_TARGET, error = %error, "Rejected login input");
            self.clear_credentials();

            let mut slot = self.inner.slot.write().await;
            slot.session = Session::failed(error.user_message(LOGIN_FAILED_MESSAGE));
            self.persist(&slot.session);
            return Err(error);
        }

        self.inner
            .login
            .run(|| self.login_once(credentials))
            .await
    }

    async fn login_once(&self, credentials: LoginCredentials) -> Result<UserProfile> {
        let epoch = self.begin().await;
        let result = self.authenticate(&credentials).await;

        let mut slot = self.inner.slot.write().await;
        if slot.epoch != epoch {
            drop(slot);
            tracing::debug!(target: TRACING_TARGET, "Discarding stale login");
            // A newer login may already have replaced the token saved here.
            if let Ok((_, token)) = &result
                && self.inner.tokens.load_or_none().as_ref() == Some(token)
            {
                self.clear_credentials();
            }
            return Err(Error::stale().with_message("The session changed during login"));
        }

        match result {
            Ok((user, token)) => {
                tracing::info!(target: TRACING_TARGET, user_id = %user.id, "Logged in");
                slot.session = Session::authenticated(user.clone(), token);
                self.persist(&slot.session);
                Ok(user)
            }
            Err(e) => {
                tracing::info!(target: TRACING_TARGET, error = %e, "Login failed");
                self.clear_credentials();
                slot.session = Session::failed(e.user_message(LOGIN_FAILED_MESSAGE));
                self.persist(&slot.session);
                Err(e)
            }
        }
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<(UserProfile, AccessToken)> {
        let grant = self.inner.auth.login(credentials).await?;
        if grant.access_token.is_empty() {
            return Err(Error::unauthorized().with_message("The server returned an empty token"));
        }

        self.inner.tokens.save(&grant.access_token)?;
        if let Some(refresh_token) = &grant.refresh_token {
            self.inner.tokens.save_refresh(refresh_token)?;
        }

        let user = self.inner.auth.current_user().await?;
        Ok((user, grant.access_token))
    }

    /// Creates an account without signing in.
    pub async fn register(&self, draft: PendingRegistration) -> Result<UserProfile> {
        self.drain_events().await;
        if let Err(errors) = draft.validate() {
            let error = Error::from(errors);
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "Rejected registration input"
            );

            let mut slot = self.inner.slot.write().await;
            slot.session.finish(Some(error.user_message(REGISTER_FAILED_MESSAGE)));
            self.persist(&slot.session);
            return Err(error);
        }

        self.inner
            .register
            .run(|| self.register_once(draft))
            .await
    }

    async fn register_once(&self, draft: PendingRegistration) -> Result<UserProfile> {
        let epoch = self.begin().await;
        let result = self.inner.auth.register(&draft).await;

        let mut slot = self.inner.slot.write().await;
        if slot.epoch == epoch {
            let error = result
                .as_ref()
                .err()
                .map(|e| e.user_message(REGISTER_FAILED_MESSAGE));
            slot.session.finish(error);
            self.persist(&slot.session);
        }

        if let Ok(user) = &result {
            tracing::info!(target: TRACING_TARGET, user_id = %user.id, "Account registered");
        }
        result
    }

    /// Signs out from any state and requests the landing page.
    pub async fn logout(&self) {
        self.clear_credentials();
        if let Err(e) = self.inner.tokens.clear_session() {
            tracing::warn!(target: TRACING_TARGET, error = %e, "Failed to clear saved session");
        }

        {
            let mut slot = self.inner.slot.write().await;
            self.discard(&mut slot).await;
        }

        tracing::info!(target: TRACING_TARGET, "Logged out");
        self.inner.navigator.navigate(NavigationTarget::Landing);
    }

    /// Dismisses the last error.
    pub async fn clear_error(&self) {
        let mut slot = self.inner.slot.write().await;
        slot.session.clear_error();
        self.persist(&slot.session);
    }

    /// Returns the current session.
    pub async fn snapshot(&self) -> Session {
        self.drain_events().await;
        self.snapshot_unchecked().await
    }

    /// Returns `true` if a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.snapshot().await.is_authenticated()
    }

    /// Returns the persisted form of the current session.
    pub async fn persisted(&self) -> PersistedSession {
        to_persisted(&self.snapshot().await)
    }

    /// Shows the last saved profile until [`initialize`](Self::initialize)
    /// confirms or discards it.
    ///
    /// Has no effect once a session is signed in or an operation is running.
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        let Some(persisted) = self.inner.tokens.load_session()? else {
            return Ok(None);
        };

        let mut slot = self.inner.slot.write().await;
        if slot.session != Session::default() {
            return Ok(slot.session.user().cloned());
        }

        slot.session = from_persisted(persisted);
        Ok(slot.session.user().cloned())
    }

    /// Drops the in-memory session and stops listening to events.
    ///
    /// Storage is left untouched, so a new manager picks up where this one
    /// stopped.
    pub async fn dispose(&self) {
        self.inner.events.lock().await.take();
        let mut slot = self.inner.slot.write().await;
        self.discard(&mut slot).await;
        tracing::debug!(target: TRACING_TARGET, "Session manager disposed");
    }

    async fn begin(&self) -> u64 {
        let mut slot = self.inner.slot.write().await;
        slot.session.begin();
        slot.epoch
    }

    async fn snapshot_unchecked(&self) -> Session {
        self.inner.slot.read().await.session.clone()
    }

    /// Drops the session and detaches running logins and registrations.
    ///
    /// Their results are discarded when they finish, and the next call
    /// starts a fresh attempt instead of joining the abandoned one.
    async fn discard(&self, slot: &mut Slot) {
        slot.epoch += 1;
        slot.session = Session::default();
        self.inner.login.reset().await;
        self.inner.register.reset().await;
    }

    /// Applies authentication events received since the last call.
    async fn drain_events(&self) {
        let mut pending = Vec::new();
        {
            let mut events = self.inner.events.lock().await;
            let Some(receiver) = events.as_mut() else {
                return;
            };

            let mut closed = false;
            loop {
                match receiver.try_recv() {
                    Ok(event) => pending.push(Some(event)),
                    // Missed events, the token store tells the outcome.
                    Err(TryRecvError::Lagged(_)) => pending.push(None),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Closed) => {
                        closed = true;
                        break;
                    }
                }
            }

            if closed {
                *events = None;
            }
        }

        if pending.is_empty() {
            return;
        }

        let expired = {
            let mut slot = self.inner.slot.write().await;
            let mut expired = false;
            for event in pending {
                expired |= self.apply(&mut slot, event).await;
            }
            expired
        };

        if expired {
            tracing::info!(target: TRACING_TARGET, "Session expired");
            self.inner.navigator.navigate(NavigationTarget::Login);
        }
    }

    /// Applies one event to a signed-in session. `None` stands for events
    /// lost to lag.
    ///
    /// Events about any token other than the session's own are ignored.
    /// Returns `true` if the session was ended.
    async fn apply(&self, slot: &mut Slot, event: Option<AuthEvent>) -> bool {
        let Some(own) = slot.session.token().cloned() else {
            return false;
        };
        if !slot.session.is_authenticated() {
            return false;
        }

        match event {
            Some(AuthEvent::Refreshed { previous, current }) => {
                if previous.as_ref() == Some(&own) {
                    tracing::debug!(target: TRACING_TARGET, "Adopted refreshed token");
                    slot.session.replace_token(current);
                    self.persist(&slot.session);
                }
                false
            }
            Some(AuthEvent::Unauthorized { token }) => {
                if token.as_ref() != Some(&own) {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        "Ignoring rejection of a replaced token"
                    );
                    return false;
                }
                self.expire(slot).await;
                true
            }
            None => match self.inner.tokens.load_or_none() {
                Some(stored) => {
                    if stored != own {
                        slot.session.replace_token(stored);
                        self.persist(&slot.session);
                    }
                    false
                }
                None => {
                    self.expire(slot).await;
                    true
                }
            },
        }
    }

    /// Ends a signed-in session whose token the backend rejected.
    async fn expire(&self, slot: &mut Slot) {
        self.clear_credentials();
        self.discard(slot).await;
        self.persist(&slot.session);
    }

    fn clear_credentials(&self) {
        if let Err(e) = self.inner.tokens.clear_credentials() {
            tracing::warn!(target: TRACING_TARGET, error = %e, "Failed to clear credentials");
        }
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.inner.tokens.save_session(&to_persisted(session)) {
            tracing::warn!(target: TRACING_TARGET, error = %e, "Failed to save session");
        }
    }
}
