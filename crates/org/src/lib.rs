//! Organization structure module (RW board + per-RT boards).
//!
//! Trees live in memory only; the store is an explicit object the UI layer
//! holds and passes by `&mut` into its handlers. Dialogs and toasts are
//! reached through the [`Confirm`] and [`Notifier`] traits.

pub mod confirm;
pub mod form;
pub mod node;
pub mod rt;
pub mod seed;
pub mod structure;

pub use confirm::{AutoConfirm, Confirm, ConfirmColor, ConfirmOptions, Notifier, TracingNotifier};
pub use form::{Level, Mode, OrgForm, Scope, ValidatedOrgForm};
pub use node::OrgNode;
pub use rt::{RtAdded, RtKey, RtRegistry};
pub use structure::{DeleteOutcome, OrgStructure, PendingEdit, SaveOutcome};
