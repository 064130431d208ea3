//! Client configuration (environment first, CLI flags override).

use std::path::PathBuf;

use rwportal_auth::DEFAULT_LOGIN_ROUTE;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto.
    pub api_base: String,
    /// Where the navigator is sent on forced logout.
    pub login_route: String,
    /// Token file for persisted sessions; `None` means the platform default.
    pub token_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            token_file: None,
        }
    }

    /// Read `RWPORTAL_API_BASE`, `RWPORTAL_LOGIN_ROUTE` and
    /// `RWPORTAL_TOKEN_FILE`.
    pub fn from_env() -> Self {
        let api_base = std::env::var("RWPORTAL_API_BASE").unwrap_or_else(|_| {
            tracing::warn!("RWPORTAL_API_BASE not set; using {DEFAULT_API_BASE}");
            DEFAULT_API_BASE.to_string()
        });

        Self {
            api_base,
            login_route: std::env::var("RWPORTAL_LOGIN_ROUTE")
                .unwrap_or_else(|_| DEFAULT_LOGIN_ROUTE.to_string()),
            token_file: std::env::var_os("RWPORTAL_TOKEN_FILE").map(PathBuf::from),
        }
    }

    /// Join `path` onto the base URL with exactly one slash between them.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Configured token file, else `<data dir>/rwportal/session.json`.
    pub fn token_file(&self) -> Option<PathBuf> {
        self.token_file
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("rwportal").join("session.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_with_a_single_slash() {
        let config = ClientConfig::new("http://api.local/");
        assert_eq!(config.url("/auth/refresh"), "http://api.local/auth/refresh");
        assert_eq!(config.url("members"), "http://api.local/members");

        let config = ClientConfig::new("http://api.local/v1");
        assert_eq!(config.url("/members"), "http://api.local/v1/members");
    }

    #[test]
    fn explicit_token_file_wins() {
        let mut config = ClientConfig::new(DEFAULT_API_BASE);
        config.token_file = Some(PathBuf::from("/tmp/session.json"));
        assert_eq!(config.token_file(), Some(PathBuf::from("/tmp/session.json")));
        assert_eq!(config.login_route, "/login");
    }
}
