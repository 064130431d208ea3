//! Per-request options and interceptor callbacks.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

pub type RequestHook = Arc<dyn Fn(&mut HeaderMap) + Send + Sync>;
pub type ResponseErrorHook = Arc<dyn Fn(StatusCode) + Send + Sync>;

/// Caller-supplied callbacks. They run on the first attempt only; the retry
/// after a refresh is sent without them.
#[derive(Clone, Default)]
pub struct Interceptors {
    /// Runs after the auth headers are attached, just before sending.
    pub on_request: Option<RequestHook>,
    /// Runs when the response status is not a success.
    pub on_response_error: Option<ResponseErrorHook>,
}

impl Interceptors {
    pub fn is_empty(&self) -> bool {
        self.on_request.is_none() && self.on_response_error.is_none()
    }
}

impl core::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Interceptors")
            .field("on_request", &self.on_request.is_some())
            .field("on_response_error", &self.on_response_error.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub interceptors: Interceptors,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            interceptors: Interceptors::default(),
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post<B: Serialize>(body: &B) -> Result<Self, ApiError> {
        Self::with_body(Method::POST, body)
    }

    pub fn with_body<B: Serialize>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("failed to serialize body: {e}")))?;
        Ok(Self {
            method,
            body: Some(body),
            ..Self::default()
        })
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn on_request(mut self, hook: impl Fn(&mut HeaderMap) + Send + Sync + 'static) -> Self {
        self.interceptors.on_request = Some(Arc::new(hook));
        self
    }

    pub fn on_response_error(mut self, hook: impl Fn(StatusCode) + Send + Sync + 'static) -> Self {
        self.interceptors.on_response_error = Some(Arc::new(hook));
        self
    }

    /// Same request, minus the interceptors (used for the post-refresh retry).
    pub fn without_interceptors(&self) -> Self {
        Self {
            interceptors: Interceptors::default(),
            ..self.clone()
        }
    }
}
