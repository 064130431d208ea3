//! Navigation side effects (redirect to the login surface).

pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Whatever owns routing: a browser history, a TUI screen stack, a CLI.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Logs redirects instead of performing them (headless use).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, route: &str) {
        tracing::info!(%route, "redirect requested");
    }
}
