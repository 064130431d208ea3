//! `rwportal-auth` — client-side session state (tokens, lifecycle, logout).
//!
//! This crate is intentionally decoupled from HTTP: the refresh call itself
//! lives in `rwportal-client`, which drives the transitions defined here.

pub mod navigator;
pub mod session;
pub mod storage;

pub use navigator::{DEFAULT_LOGIN_ROUTE, Navigator, TracingNavigator};
pub use session::{Session, SessionState};
pub use storage::{
    ACCESS_TOKEN_KEY, FileTokenStorage, MemoryTokenStorage, REFRESH_TOKEN_KEY, StorageError,
    TokenStorage,
};
