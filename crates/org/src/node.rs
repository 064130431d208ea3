use serde::{Deserialize, Serialize};

use rwportal_core::{Entity, NodeId};

/// One position in an organization chart.
///
/// Children are ordered; an absent `children` field deserializes as empty and
/// an empty list is omitted when serializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgNode {
    id: NodeId,
    pub title: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<OrgNode>,
}

impl OrgNode {
    pub fn new(
        id: NodeId,
        title: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            name: name.into(),
            address: address.into(),
            children: Vec::new(),
        }
    }

    /// Builder-style helper used by seed data and tests.
    pub fn with_children(mut self, children: Vec<OrgNode>) -> Self {
        self.children = children;
        self
    }

    pub fn children(&self) -> &[OrgNode] {
        &self.children
    }

    /// Insert as the first child.
    pub fn push_front(&mut self, child: OrgNode) {
        self.children.insert(0, child);
    }

    /// Insert as the last child.
    pub fn push_back(&mut self, child: OrgNode) {
        self.children.push(child);
    }

    /// Pre-order depth-first search; first match wins.
    pub fn find(&self, id: &NodeId) -> Option<&OrgNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &NodeId) -> Option<&mut OrgNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Splice the node with `id` out of its parent's child list.
    ///
    /// The receiver itself is never removed, which is what keeps tree roots
    /// permanent.
    pub fn remove_descendant(&mut self, id: &NodeId) -> Option<OrgNode> {
        if let Some(index) = self.children.iter().position(|c| c.id == *id) {
            return Some(self.children.remove(index));
        }
        self.children
            .iter_mut()
            .find_map(|child| child.remove_descendant(id))
    }

    /// Number of nodes in this subtree, including the receiver.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(OrgNode::size).sum::<usize>()
    }

    /// Identifiers in pre-order.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_ids(&mut out);
        out
    }

    fn collect_ids(&self, out: &mut Vec<NodeId>) {
        out.push(self.id.clone());
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

impl Entity for OrgNode {
    type Id = NodeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
