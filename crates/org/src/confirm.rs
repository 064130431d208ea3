//! Confirmation dialog and toast collaborators.
//!
//! The store never renders anything itself; whoever drives it supplies these.

use std::future::Future;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmColor {
    Error,
    #[default]
    Primary,
    Neutral,
}

/// Options shown in a confirmation dialog. Unset options fall back to the
/// defaults below on every reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmOptions {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub color: ConfirmColor,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            title: "Confirm".to_string(),
            description: String::new(),
            confirm_label: "OK".to_string(),
            cancel_label: "Cancel".to_string(),
            color: ConfirmColor::Primary,
        }
    }
}

impl ConfirmOptions {
    /// Options for an irreversible action.
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confirm_label: "Delete".to_string(),
            color: ConfirmColor::Error,
            ..Self::default()
        }
    }
}

/// Asynchronous yes/no confirmation, distinct from the edit modal.
pub trait Confirm {
    fn reveal(&self, options: ConfirmOptions) -> impl Future<Output = bool>;
}

/// Answers every confirmation with a fixed value (headless use).
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    async fn reveal(&self, options: ConfirmOptions) -> bool {
        tracing::debug!(title = %options.title, answer = self.0, "auto-answered confirmation");
        self.0
    }
}

/// User-visible warnings (toasts).
pub trait Notifier {
    fn warn(&self, title: &str, description: &str);
}

/// Routes warnings into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, title: &str, description: &str) {
        tracing::warn!(%title, %description, "user warning");
    }
}
