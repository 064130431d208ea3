//! Modal form buffer and its validation.

use serde::{Deserialize, Serialize};

use rwportal_core::{DomainError, DomainResult};

use crate::rt::RtKey;

/// Which tree an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Rw,
    Rt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Add,
    Edit,
}

/// Where a new node lands among the resolved root's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// First child.
    #[default]
    Above,
    /// Last child.
    Equal,
}

/// Raw form buffer as the UI fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgForm {
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rt: Option<String>,
    pub title: String,
    pub name: String,
    pub address: String,
}

impl OrgForm {
    /// Check the form; the first failing field is reported.
    ///
    /// A blank `rt` label counts as absent.
    pub fn validate(&self) -> DomainResult<ValidatedOrgForm> {
        let title = required("title", &self.title)?;
        let name = required("name", &self.name)?;
        let address = required("address", &self.address)?;

        let rt = match self.rt.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(RtKey::parse(label)?),
        };

        Ok(ValidatedOrgForm {
            level: self.level,
            rt,
            title,
            name,
            address,
        })
    }
}

fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// A form that passed validation. Only [`OrgForm::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrgForm {
    level: Level,
    rt: Option<RtKey>,
    title: String,
    name: String,
    address: String,
}

impl ValidatedOrgForm {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn rt(&self) -> Option<&RtKey> {
        self.rt.as_ref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}
