//! `rwportal-client`
//!
//! **Responsibility:** authenticated access to the portal API.
//!
//! This crate provides:
//! - Bearer-token attachment on every outbound request
//! - Single-flight session refresh on `401`, with exactly one retry
//! - Logout + redirect when the session cannot be refreshed
//! - A route guard for screens that require a session

pub mod config;
pub mod error;
pub mod gateway;
pub mod request;

pub use config::ClientConfig;
pub use error::ApiError;
pub use gateway::{ApiClient, REFRESH_PATH, RouteDecision};
pub use request::{Interceptors, RequestOptions};
