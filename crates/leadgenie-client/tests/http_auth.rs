//! Bearer, refresh and invalidation behavior against a live HTTP server.

mod common;

use common::{Backend, EMAIL, PASSWORD, Recorder};
use leadgenie_client::session::NavigationTarget;
use leadgenie_client::{
    ApiClient, ApiConfig, AuthEvent, ErrorKind, LeadsClient, SessionManager, TokenStore,
};
use leadgenie_core::types::{LeadCategory, LeadQuery};
use tokio::sync::broadcast::error::TryRecvError;

async fn connect(backend: &Backend) -> (ApiClient, SessionManager, Recorder) {
    let url = backend.spawn().await;
    let client = ApiClient::new(ApiConfig::new(url), TokenStore::in_memory()).unwrap();
    let recorder = Recorder::default();
    let session = SessionManager::from_client(&client, recorder.clone());
    (client, session, recorder)
}

#[tokio::test]
async fn test_login_sends_form_and_fetches_profile() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;

    let user = session.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(user.id.to_string(), "1");
    assert_eq!(user.label(), "Ana");

    assert_eq!(
        client.tokens().load().unwrap().map(|t| t.as_str().to_owned()),
        Some("tok1".to_owned())
    );
    let state = backend.state();
    assert_eq!(
        state.last_login_form.as_deref(),
        Some("username=a%40b.com&password=pw123456")
    );
    assert_eq!(state.me_calls, 1);
}

#[tokio::test]
async fn test_rejected_login_does_not_refresh_or_broadcast() {
    let backend = Backend::default();
    let (client, session, recorder) = connect(&backend).await;
    let mut events = client.subscribe();

    let error = session.login(EMAIL, "wrong-password").await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Unauthorized);
    assert_eq!(error.message.as_deref(), Some("Incorrect email or password"));
    assert_eq!(
        session.snapshot().await.last_error(),
        Some("Incorrect email or password")
    );

    assert_eq!(backend.state().refresh_calls, 0);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert!(recorder.targets().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once_and_replayed() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;
    session.login(EMAIL, PASSWORD).await.unwrap();
    backend.expire_tokens();

    let leads = LeadsClient::new(client.clone());
    let listed = leads.list(&LeadQuery::default()).await.unwrap();
    assert_eq!(listed.len(), 1);

    let state = backend.state();
    assert_eq!(state.refresh_calls, 1);
    assert_eq!(state.leads_calls, 2);
    drop(state);

    assert_eq!(
        client.tokens().load().unwrap().map(|t| t.as_str().to_owned()),
        Some("tok2".to_owned())
    );
    let current = session.snapshot().await;
    assert!(current.is_authenticated());
    assert_eq!(current.token().map(|t| t.as_str()), Some("tok2"));
}

#[tokio::test]
async fn test_refresh_is_broadcast_with_both_tokens() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;
    let mut events = client.subscribe();
    session.login(EMAIL, PASSWORD).await.unwrap();
    backend.expire_tokens();

    LeadsClient::new(client.clone())
        .list(&LeadQuery::default())
        .await
        .unwrap();

    assert_eq!(
        events.try_recv(),
        Ok(AuthEvent::Refreshed {
            previous: Some("tok1".into()),
            current: "tok2".into(),
        })
    );
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_failed_refresh_clears_tokens_and_ends_session() {
    let backend = Backend::default();
    let (client, session, recorder) = connect(&backend).await;
    let mut events = client.subscribe();
    session.login(EMAIL, PASSWORD).await.unwrap();
    backend.expire_tokens();
    backend.disable_refresh();

    let error = LeadsClient::new(client.clone())
        .list(&LeadQuery::default())
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Unauthorized);

    assert!(client.tokens().load().unwrap().is_none());
    assert!(client.tokens().load_refresh().unwrap().is_none());
    assert_eq!(
        events.try_recv(),
        Ok(AuthEvent::Unauthorized { token: Some("tok1".into()) })
    );

    assert!(!session.snapshot().await.is_authenticated());
    assert_eq!(recorder.targets(), vec![NavigationTarget::Login]);
}

#[tokio::test]
async fn test_replayed_request_is_never_retried_again() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;
    session.login(EMAIL, PASSWORD).await.unwrap();
    backend.reject_all();

    let error = LeadsClient::new(client.clone())
        .list(&LeadQuery::default())
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Unauthorized);

    let state = backend.state();
    assert_eq!(state.leads_calls, 2);
    assert_eq!(state.refresh_calls, 1);
    drop(state);

    assert!(client.tokens().load().unwrap().is_none());
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_concurrent_rejections_share_one_refresh() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;
    session.login(EMAIL, PASSWORD).await.unwrap();
    backend.expire_tokens();

    let leads = LeadsClient::new(client.clone());
    let query = LeadQuery::default();
    let (a, b, c) = tokio::join!(leads.list(&query), leads.list(&query), leads.list(&query));
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    assert_eq!(backend.state().refresh_calls, 1);
    assert!(session.is_authenticated().await);
}

#[tokio::test]
async fn test_lead_filters_are_sent_as_query() {
    let backend = Backend::default();
    let (client, session, _) = connect(&backend).await;
    session.login(EMAIL, PASSWORD).await.unwrap();

    let query = LeadQuery {
        category: Some(LeadCategory::Hot),
        search: Some("acme corp".to_owned()),
        limit: Some(20),
        ..LeadQuery::default()
    };
    LeadsClient::new(client).list(&query).await.unwrap();

    assert_eq!(
        backend.state().last_leads_query.as_deref(),
        Some("sort_by=score&category=hot&search=acme+corp&limit=20")
    );
}
