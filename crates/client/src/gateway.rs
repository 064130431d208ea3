//! Authenticated API gateway.
//!
//! Every request goes through [`ApiClient::request`]:
//! 1. send with the held bearer token (if any)
//! 2. on `401`, refresh the session once (single flight across callers)
//! 3. on a successful refresh, resend exactly once with the new token and
//!    without the caller's interceptors
//! 4. otherwise the refresh has already logged out and redirected; the
//!    caller gets `ApiError::Unauthorized`

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use rwportal_auth::{Navigator, Session, SessionState, TokenStorage};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::request::RequestOptions;

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Outcome of [`ApiClient::guard_route`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

pub struct ApiClient<S> {
    http: reqwest::Client,
    config: ClientConfig,
    session: Mutex<Session<S>>,
    /// Serializes refreshes so concurrent `401`s share one refresh call.
    refresh_gate: Mutex<()>,
    navigator: Arc<dyn Navigator>,
}

impl<S: TokenStorage> ApiClient<S> {
    pub fn new(config: ClientConfig, session: Session<S>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: Mutex::new(session),
            refresh_gate: Mutex::new(()),
            navigator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn session_state(&self) -> SessionState {
        self.session.lock().await.state()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.lock().await.access_token().map(str::to_string)
    }

    pub async fn has_refresh_token(&self) -> bool {
        self.session.lock().await.refresh_token().is_some()
    }

    /// Store tokens obtained from a successful login.
    pub async fn login(&self, access: &str, refresh: &str) -> Result<(), ApiError> {
        self.session.lock().await.set_tokens(access, refresh)?;
        Ok(())
    }

    /// Clear the session and redirect to the login route.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session
            .lock()
            .await
            .logout(self.navigator.as_ref(), &self.config.login_route)?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.request(path, RequestOptions::post(body)?).await
    }

    /// Send a request, refreshing the session and retrying once on `401`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let token = self.access_token().await;
        let response = self.send(path, &options, token.as_deref()).await?;
        let status = response.status();

        if !status.is_success() {
            if let Some(hook) = &options.interceptors.on_response_error {
                hook(status);
            }
        }
        if status != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        tracing::debug!(%path, "request unauthorized; refreshing session");
        match self.refresh_after(token.as_deref()).await {
            Some(new_token) => {
                let retry = options.without_interceptors();
                let response = self.send(path, &retry, Some(&new_token)).await?;
                tracing::debug!(%path, status = %response.status(), "retried after refresh");
                decode(response).await
            }
            None => Err(ApiError::Unauthorized),
        }
    }

    /// Refresh the access token. When no refresh token is held or the refresh
    /// call fails, the session is cleared, the client is redirected to the
    /// login route and `None` is returned.
    pub async fn refresh_session(&self) -> Option<String> {
        self.refresh_after(None).await
    }

    /// Allow the route if a session exists or can be recovered; otherwise
    /// redirect to login.
    pub async fn guard_route(&self) -> RouteDecision {
        if self.access_token().await.is_some() {
            return RouteDecision::Allow;
        }

        if self.has_refresh_token().await {
            if self.refresh_session().await.is_some() {
                return RouteDecision::Allow;
            }
        } else {
            self.navigator.redirect(&self.config.login_route);
        }

        RouteDecision::Redirect(self.config.login_route.clone())
    }

    /// Single-flight refresh. `stale` is the access token the caller was
    /// rejected with. If another caller replaced it while this one waited at
    /// the gate, the new token is reused; if another caller already ended the
    /// session, `None` is returned without a second logout.
    async fn refresh_after(&self, stale: Option<&str>) -> Option<String> {
        let _gate = self.refresh_gate.lock().await;

        let refresh_token = {
            let mut session = self.session.lock().await;
            match (stale, session.access_token()) {
                (Some(stale), Some(current)) if current != stale => {
                    return Some(current.to_string());
                }
                (Some(_), None) => {
                    tracing::debug!("session already ended while waiting to refresh");
                    return None;
                }
                _ => {}
            }
            let Some(token) = session.begin_refresh() else {
                tracing::debug!("no refresh token held");
                self.end_session(&mut session);
                return None;
            };
            token
        };

        match self.call_refresh(&refresh_token).await {
            Ok(access) => {
                if let Err(err) = self.session.lock().await.complete_refresh(&access) {
                    tracing::warn!(error = %err, "refreshed token could not be persisted");
                }
                Some(access)
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed");
                self.end_session(&mut *self.session.lock().await);
                None
            }
        }
    }

    fn end_session(&self, session: &mut Session<S>) {
        if let Err(err) = session.logout(self.navigator.as_ref(), &self.config.login_route) {
            tracing::warn!(error = %err, "logout after failed refresh could not clear storage");
        }
    }

    async fn call_refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .post(self.config.url(REFRESH_PATH))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::RefreshFailed(format!(
                "refresh endpoint returned {}",
                response.status()
            )));
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("malformed refresh response: {e}")))?;
        Ok(body.access_token)
    }

    async fn send(
        &self,
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut headers: HeaderMap = options.headers.clone();
        if let Some(token) = token {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidRequest(format!("unusable access token: {e}")))?;
            headers.insert(AUTHORIZATION, bearer);
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        if let Some(hook) = &options.interceptors.on_request {
            hook(&mut headers);
        }

        let mut req = self
            .http
            .request(options.method.clone(), self.config.url(path))
            .headers(headers);
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        req.send().await.map_err(|e| ApiError::Network(e.to_string()))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        return Err(ApiError::Api(
            status.as_u16(),
            response.text().await.unwrap_or_default(),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}
