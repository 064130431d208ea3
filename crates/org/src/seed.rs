//! Demo data the portal ships with.

use rwportal_core::NodeId;

use crate::node::OrgNode;
use crate::rt::{RtKey, RtRegistry};
use crate::structure::OrgStructure;

fn position(id: &str, title: &str, name: &str, address: &str) -> OrgNode {
    OrgNode::new(NodeId::from(id), title, name, address)
}

/// RW 09 board.
pub fn rw_board() -> OrgNode {
    position("rw-root", "RW Chair", "Budi Santoso", "RW 09").with_children(vec![
        position("rw-vice", "RW Vice Chair", "Andi Pratama", "RW 09"),
        position("rw-vice-2", "RW Second Vice Chair", "Andi Pratama 2", "RW 09"),
        position("rw-secretary", "RW Secretary", "Siti Rahmawati", "RW 09").with_children(vec![
            position("rw-secretary-1", "Administration Section", "Dewi Lestari", "RW 09"),
            position("rw-secretary-2", "Archive Section", "Rizky Maulana", "RW 09"),
        ]),
        position("rw-treasurer", "RW Treasurer", "Agus Salim", "RW 09"),
    ])
}

/// RT 01..=04, each a chairperson with no board yet. RT 01 is selected.
pub fn rt_registry() -> RtRegistry {
    let chairs = ["Rudi Hartono", "Slamet Riyadi", "Andi Saputra", "Joko Susilo"];
    let mut registry = RtRegistry::new();
    for (number, chair) in (1u32..).zip(chairs) {
        let Ok(key) = RtKey::from_number(number) else {
            continue;
        };
        let root = OrgNode::new(key.root_id(), "RT Chair", chair, key.as_str());
        registry.insert(key, root);
    }
    registry
}

impl OrgStructure {
    /// Store preloaded with [`rw_board`] and [`rt_registry`].
    pub fn seeded() -> Self {
        Self::new(rw_board(), rt_registry())
    }
}
