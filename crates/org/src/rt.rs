//! RT keys and the registry of per-RT trees.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rwportal_core::{DomainError, DomainResult, NodeId, ValueObject};

use crate::node::OrgNode;

/// Normalized RT label, always `"RT NN"`.
///
/// Accepts `"5"`, `"05"`, `"RT5"`, `"rt 05"` and `"RT 05"`; all normalize to
/// `"RT 05"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RtKey(String);

impl RtKey {
    pub const MAX: u32 = 99;

    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        let digits = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("rt") => trimmed[2..].trim_start(),
            _ => trimmed,
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "RT label must be a number, got {raw:?}"
            )));
        }

        let number: u32 = digits
            .parse()
            .map_err(|_| DomainError::validation(format!("RT number out of range: {raw:?}")))?;
        Self::from_number(number)
    }

    pub fn from_number(number: u32) -> DomainResult<Self> {
        if number == 0 || number > Self::MAX {
            return Err(DomainError::validation(format!(
                "RT number must be between 1 and {}, got {number}",
                Self::MAX
            )));
        }
        Ok(Self(format!("RT {number:02}")))
    }

    pub fn number(&self) -> u32 {
        // Constructors guarantee the "RT NN" shape.
        self.0[3..].parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier for the permanent root of this RT's tree (`rt05-root`).
    pub fn root_id(&self) -> NodeId {
        NodeId::new(format!("rt{:02}-root", self.number()))
    }
}

impl ValueObject for RtKey {}

impl core::fmt::Display for RtKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RtKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RtKey> for String {
    fn from(value: RtKey) -> Self {
        value.0
    }
}

/// Result of [`RtRegistry::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtAdded {
    Created(RtKey),
    AlreadyExists(RtKey),
}

/// RT key → tree, plus the ordered list of known keys and the current
/// selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RtRegistry {
    trees: BTreeMap<RtKey, OrgNode>,
    known: Vec<RtKey>,
    selected: Option<RtKey>,
}

impl RtRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing tree. Returns `false` (and keeps the old tree) if
    /// the key is already present. The first registered key becomes selected.
    pub fn insert(&mut self, key: RtKey, tree: OrgNode) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.trees.insert(key.clone(), tree);
        self.known.push(key.clone());
        if self.selected.is_none() {
            self.selected = Some(key);
        }
        true
    }

    /// Normalize `raw`, and if the key is new create an empty tree for it,
    /// append it to the known list and select it.
    pub fn add(&mut self, raw: &str) -> DomainResult<RtAdded> {
        let key = RtKey::parse(raw)?;
        if self.contains(&key) {
            tracing::debug!(rt = %key, "RT already registered");
            return Ok(RtAdded::AlreadyExists(key));
        }

        let root = OrgNode::new(key.root_id(), "RT Chair", "", key.as_str());
        self.trees.insert(key.clone(), root);
        self.known.push(key.clone());
        self.selected = Some(key.clone());

        tracing::info!(rt = %key, "RT registered");
        Ok(RtAdded::Created(key))
    }

    pub fn select(&mut self, key: &RtKey) -> DomainResult<()> {
        if !self.contains(key) {
            return Err(DomainError::not_found(key.to_string()));
        }
        self.selected = Some(key.clone());
        Ok(())
    }

    pub fn selected(&self) -> Option<&RtKey> {
        self.selected.as_ref()
    }

    /// Known keys in registration order.
    pub fn known(&self) -> &[RtKey] {
        &self.known
    }

    pub fn get(&self, key: &RtKey) -> Option<&OrgNode> {
        self.trees.get(key)
    }

    pub fn get_mut(&mut self, key: &RtKey) -> Option<&mut OrgNode> {
        self.trees.get_mut(key)
    }

    pub fn contains(&self, key: &RtKey) -> bool {
        self.trees.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}
