//! The organization-structure store: one RW tree, an RT registry and at most
//! one pending modal edit.

use rwportal_core::{DomainError, DomainResult, Entity, NodeId};

use crate::confirm::{Confirm, ConfirmOptions, Notifier};
use crate::form::{Level, Mode, OrgForm, Scope, ValidatedOrgForm};
use crate::node::OrgNode;
use crate::rt::{RtAdded, RtKey, RtRegistry};

/// State of the open modal.
///
/// `rt` is pinned when the modal opens so that changing the selected RT while
/// the modal is open does not redirect the save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub scope: Scope,
    pub mode: Mode,
    pub target: Option<NodeId>,
    pub rt: Option<RtKey>,
    pub form: OrgForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Added(NodeId),
    Updated(NodeId),
    /// Edit target or RT tree missing; nothing changed and the modal stays open.
    NotFound,
    /// No modal was open.
    NoPendingEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed(OrgNode),
    /// The user declined the confirmation.
    Cancelled,
    NotFound,
    NoPendingEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgStructure {
    rw: OrgNode,
    rts: RtRegistry,
    pending: Option<PendingEdit>,
}

impl OrgStructure {
    pub fn new(rw: OrgNode, rts: RtRegistry) -> Self {
        Self {
            rw,
            rts,
            pending: None,
        }
    }

    pub fn rw(&self) -> &OrgNode {
        &self.rw
    }

    pub fn rts(&self) -> &RtRegistry {
        &self.rts
    }

    /// Tree of the currently selected RT.
    pub fn current_rt(&self) -> Option<&OrgNode> {
        self.rts.selected().and_then(|key| self.rts.get(key))
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// Form buffer of the open modal, for the UI to bind to.
    pub fn form_mut(&mut self) -> Option<&mut OrgForm> {
        self.pending.as_mut().map(|p| &mut p.form)
    }

    pub fn open_add_modal(&mut self, scope: Scope) {
        let rt = self.pin_rt(scope);
        self.pending = Some(PendingEdit {
            scope,
            mode: Mode::Add,
            target: None,
            form: OrgForm {
                rt: rt.as_ref().map(ToString::to_string),
                ..OrgForm::default()
            },
            rt,
        });
    }

    pub fn open_edit_modal(&mut self, scope: Scope, node: &OrgNode) {
        let rt = self.pin_rt(scope);
        self.pending = Some(PendingEdit {
            scope,
            mode: Mode::Edit,
            target: Some(node.id().clone()),
            form: OrgForm {
                rt: rt.as_ref().map(ToString::to_string),
                title: node.title.clone(),
                name: node.name.clone(),
                address: node.address.clone(),
                ..OrgForm::default()
            },
            rt,
        });
    }

    /// Close the modal without touching any tree.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    fn pin_rt(&self, scope: Scope) -> Option<RtKey> {
        match scope {
            Scope::Rw => None,
            Scope::Rt => self.rts.selected().cloned(),
        }
    }

    /// RW tree for `Scope::Rw`; otherwise the tree for `rt`, falling back to the
    /// selected RT. `None` when the key is unknown.
    pub fn resolve_root(&self, scope: Scope, rt: Option<&RtKey>) -> Option<&OrgNode> {
        match scope {
            Scope::Rw => Some(&self.rw),
            Scope::Rt => rt.or(self.rts.selected()).and_then(|key| self.rts.get(key)),
        }
    }

    pub fn resolve_root_mut(&mut self, scope: Scope, rt: Option<&RtKey>) -> Option<&mut OrgNode> {
        match scope {
            Scope::Rw => Some(&mut self.rw),
            Scope::Rt => {
                let key = rt.or(self.rts.selected())?.clone();
                self.rts.get_mut(&key)
            }
        }
    }

    /// Commit the validated form to the tree the pending edit points at.
    pub fn save(&mut self, form: ValidatedOrgForm) -> SaveOutcome {
        let Some(pending) = self.pending.as_ref() else {
            tracing::debug!("save without an open modal ignored");
            return SaveOutcome::NoPendingEdit;
        };
        let scope = pending.scope;
        let mode = pending.mode;
        let target = pending.target.clone();
        let rt = match (form.rt(), &pending.rt) {
            (Some(explicit), _) => Some(explicit.clone()),
            (None, pinned) => {
                if scope == Scope::Rt {
                    tracing::debug!(rt = ?pinned, "form carries no RT; using the RT pinned at open");
                }
                pinned.clone()
            }
        };

        let Some(root) = self.resolve_root_mut(scope, rt.as_ref()) else {
            tracing::debug!(?scope, rt = ?rt, "save target tree not found");
            return SaveOutcome::NotFound;
        };

        let outcome = match (mode, target) {
            (Mode::Edit, Some(id)) => {
                let Some(node) = root.find_mut(&id) else {
                    tracing::debug!(node_id = %id, "edit target not found");
                    return SaveOutcome::NotFound;
                };
                node.title = form.title().to_string();
                node.name = form.name().to_string();
                node.address = form.address().to_string();
                tracing::info!(?scope, node_id = %id, "org node updated");
                SaveOutcome::Updated(id)
            }
            _ => {
                let id = NodeId::generate();
                let node = OrgNode::new(id.clone(), form.title(), form.name(), form.address());
                match form.level() {
                    Level::Above => root.push_front(node),
                    Level::Equal => root.push_back(node),
                }
                tracing::info!(?scope, node_id = %id, level = ?form.level(), "org node added");
                SaveOutcome::Added(id)
            }
        };

        self.pending = None;
        outcome
    }

    /// Delete the node the open modal is editing.
    ///
    /// Roots are rejected up front with a warning. Otherwise the modal closes,
    /// the user is asked to confirm, and the node is spliced out only on an
    /// explicit yes.
    pub async fn delete_node<C, N>(&mut self, confirm: &C, notifier: &N) -> DomainResult<DeleteOutcome>
    where
        C: Confirm,
        N: Notifier,
    {
        let Some(pending) = self.pending.as_ref() else {
            return Ok(DeleteOutcome::NoPendingEdit);
        };
        let Some(target) = pending.target.clone() else {
            return Ok(DeleteOutcome::NoPendingEdit);
        };
        let scope = pending.scope;
        let rt = pending.rt.clone();

        let Some(root) = self.resolve_root(scope, rt.as_ref()) else {
            tracing::debug!(?scope, rt = ?rt, "delete target tree not found");
            return Ok(DeleteOutcome::NotFound);
        };
        if root.has_id(&target) {
            notifier.warn(
                "Cannot delete",
                "The top position of a structure cannot be removed.",
            );
            tracing::warn!(?scope, node_id = %target, "root deletion rejected");
            return Err(DomainError::RootDeletionRejected);
        }

        self.pending = None;

        let confirmed = confirm
            .reveal(ConfirmOptions::destructive(
                "Delete position",
                "Are you sure you want to delete this position?",
            ))
            .await;
        if !confirmed {
            tracing::debug!(node_id = %target, "delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let removed = self
            .resolve_root_mut(scope, rt.as_ref())
            .and_then(|root| root.remove_descendant(&target));
        match removed {
            Some(node) => {
                tracing::info!(?scope, node_id = %target, "org node deleted");
                Ok(DeleteOutcome::Removed(node))
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }

    pub fn add_rt(&mut self, raw: &str) -> DomainResult<RtAdded> {
        self.rts.add(raw)
    }

    pub fn select_rt(&mut self, raw: &str) -> DomainResult<()> {
        let key = RtKey::parse(raw)?;
        self.rts.select(&key)
    }
}
