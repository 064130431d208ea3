use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use rwportal_auth::{MemoryTokenStorage, Navigator, Session, SessionState};
use rwportal_client::{ApiClient, ApiError, ClientConfig, RequestOptions, RouteDecision};

const FRESH: &str = "fresh-token";
const REFRESH: &str = "refresh-1";

#[derive(Clone)]
struct Backend {
    /// Authorization header of every `/members` hit, in order.
    member_auth: Arc<Mutex<Vec<Option<String>>>>,
    member_accept: Arc<Mutex<Vec<Option<String>>>>,
    refresh_calls: Arc<AtomicUsize>,
    refresh_ok: bool,
    refresh_delay: Duration,
}

impl Backend {
    fn new(refresh_ok: bool) -> Self {
        Self {
            member_auth: Arc::default(),
            member_accept: Arc::default(),
            refresh_calls: Arc::default(),
            refresh_ok,
            refresh_delay: Duration::ZERO,
        }
    }

    fn member_hits(&self) -> Vec<Option<String>> {
        self.member_auth.lock().unwrap().clone()
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn members(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    let auth = header(&headers, "authorization");
    backend.member_auth.lock().unwrap().push(auth.clone());
    backend
        .member_accept
        .lock()
        .unwrap()
        .push(header(&headers, "accept"));

    if auth.as_deref() == Some(format!("Bearer {FRESH}").as_str()) {
        Json(json!({ "members": ["Budi Santoso", "Siti Rahmawati"] })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn always_unauthorized(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    backend
        .member_auth
        .lock()
        .unwrap()
        .push(header(&headers, "authorization"));
    StatusCode::UNAUTHORIZED.into_response()
}

async fn refresh(State(backend): State<Backend>, Json(body): Json<Value>) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(backend.refresh_delay).await;

    if backend.refresh_ok && body["refresh_token"] == REFRESH {
        Json(json!({ "access_token": FRESH })).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(backend: Backend) -> Self {
        let app = Router::new()
            .route("/members", get(members))
            .route("/locked", get(always_unauthorized))
            .route("/auth/refresh", post(refresh))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Default)]
struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

fn connect(
    srv: &TestServer,
    storage: MemoryTokenStorage,
) -> (ApiClient<MemoryTokenStorage>, Arc<RecordingNavigator>) {
    let mut session = Session::new(storage);
    session.init_from_storage().unwrap();
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::new(
        ClientConfig::new(srv.base_url.clone()),
        session,
        navigator.clone(),
    );
    (client, navigator)
}

#[tokio::test]
async fn valid_token_is_attached_with_json_accept() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::with_tokens(FRESH, Some(REFRESH)));

    let body: Value = client.get("/members").await.unwrap();

    assert_eq!(body["members"][0], "Budi Santoso");
    assert_eq!(backend.member_hits(), vec![Some(format!("Bearer {FRESH}"))]);
    assert_eq!(
        backend.member_accept.lock().unwrap()[0].as_deref(),
        Some("application/json")
    );
    assert_eq!(backend.refreshes(), 0);
    assert!(navigator.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn anonymous_requests_carry_no_authorization() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::new());

    let err = client.get::<Value>("/members").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(backend.member_hits(), vec![None]);
    assert_eq!(backend.refreshes(), 0, "no refresh token, no refresh call");
    assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn unauthorized_then_refresh_retries_exactly_once_with_new_token() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let body: Value = client.get("/members").await.unwrap();

    assert_eq!(body["members"][1], "Siti Rahmawati");
    assert_eq!(
        backend.member_hits(),
        vec![Some("Bearer stale".to_string()), Some(format!("Bearer {FRESH}"))]
    );
    assert_eq!(backend.refreshes(), 1);
    assert_eq!(client.session_state().await, SessionState::Authenticated);
    assert_eq!(client.access_token().await.as_deref(), Some(FRESH));
    assert!(navigator.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_refresh_clears_session_redirects_and_never_retries() {
    let backend = Backend::new(false);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let err = client.get::<Value>("/members").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(backend.member_hits().len(), 1, "zero retries");
    assert_eq!(backend.refreshes(), 1);
    assert_eq!(client.session_state().await, SessionState::Anonymous);
    assert!(client.access_token().await.is_none());
    assert!(!client.has_refresh_token().await);
    assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn second_unauthorized_after_refresh_is_not_retried_again() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, _navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let err = client.get::<Value>("/locked").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(backend.member_hits().len(), 2, "original + exactly one retry");
    assert_eq!(backend.refreshes(), 1);
}

#[tokio::test]
async fn interceptors_run_on_first_attempt_only() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, _navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let on_request = Arc::new(AtomicUsize::new(0));
    let on_error = Arc::new(AtomicUsize::new(0));
    let (req_count, err_count) = (on_request.clone(), on_error.clone());
    let options = RequestOptions::get()
        .on_request(move |_| {
            req_count.fetch_add(1, Ordering::SeqCst);
        })
        .on_response_error(move |status| {
            assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
            err_count.fetch_add(1, Ordering::SeqCst);
        });

    let _: Value = client.request("/members", options).await.unwrap();

    assert_eq!(backend.member_hits().len(), 2);
    assert_eq!(on_request.load(Ordering::SeqCst), 1);
    assert_eq!(on_error.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_share_one_refresh() {
    let mut backend = Backend::new(true);
    backend.refresh_delay = Duration::from_millis(50);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, _navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let (a, b) = tokio::join!(client.get::<Value>("/members"), client.get::<Value>("/members"));

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(backend.refreshes(), 1);
}

#[tokio::test]
async fn failed_refresh_session_ends_anonymous_and_redirects() {
    let backend = Backend::new(false);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    assert!(client.refresh_session().await.is_none());

    assert_eq!(backend.refreshes(), 1);
    assert_eq!(client.session_state().await, SessionState::Anonymous);
    assert!(client.access_token().await.is_none());
    assert!(!client.has_refresh_token().await);
    assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn concurrent_unauthorized_requests_with_failed_refresh_redirect_once() {
    let mut backend = Backend::new(false);
    backend.refresh_delay = Duration::from_millis(50);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::with_tokens("stale", Some(REFRESH)));

    let (a, b) = tokio::join!(client.get::<Value>("/members"), client.get::<Value>("/members"));

    assert!(matches!(a, Err(ApiError::Unauthorized)));
    assert!(matches!(b, Err(ApiError::Unauthorized)));
    assert_eq!(backend.refreshes(), 1);
    assert_eq!(backend.member_hits().len(), 2, "no retries");
    assert_eq!(client.session_state().await, SessionState::Anonymous);
    assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn route_guard_with_failed_refresh_redirects_once() {
    let backend = Backend::new(false);
    let srv = TestServer::spawn(backend.clone()).await;

    let mut storage = MemoryTokenStorage::new();
    rwportal_auth::TokenStorage::set(&mut storage, rwportal_auth::REFRESH_TOKEN_KEY, REFRESH)
        .unwrap();
    let (client, navigator) = connect(&srv, storage);

    assert_eq!(
        client.guard_route().await,
        RouteDecision::Redirect("/login".to_string())
    );
    assert_eq!(backend.refreshes(), 1);
    assert!(!client.has_refresh_token().await);
    assert_eq!(navigator.routes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn route_guard_recovers_session_from_refresh_token() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;

    let mut storage = MemoryTokenStorage::new();
    rwportal_auth::TokenStorage::set(&mut storage, rwportal_auth::REFRESH_TOKEN_KEY, REFRESH)
        .unwrap();
    let (client, navigator) = connect(&srv, storage);
    assert_eq!(client.session_state().await, SessionState::Anonymous);

    assert_eq!(client.guard_route().await, RouteDecision::Allow);
    assert_eq!(client.access_token().await.as_deref(), Some(FRESH));
    assert!(navigator.routes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn route_guard_redirects_without_a_session() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend.clone()).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::new());

    assert_eq!(
        client.guard_route().await,
        RouteDecision::Redirect("/login".to_string())
    );
    assert_eq!(backend.refreshes(), 0);
    assert_eq!(navigator.routes.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn explicit_logout_clears_and_redirects() {
    let backend = Backend::new(true);
    let srv = TestServer::spawn(backend).await;
    let (client, navigator) = connect(&srv, MemoryTokenStorage::new());

    client.login("acc", "ref").await.unwrap();
    assert_eq!(client.session_state().await, SessionState::Authenticated);

    client.logout().await.unwrap();
    assert_eq!(client.session_state().await, SessionState::Anonymous);
    assert_eq!(*navigator.routes.lock().unwrap(), vec!["/login".to_string()]);
}
