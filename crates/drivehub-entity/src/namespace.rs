//! Namespace value object.

use serde::{Deserialize, Serialize};

/// Isolation scope under which every drive entity is partitioned.
///
/// Both fields are mandatory; there is no namespace-less mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    /// Stable namespace identifier.
    pub id: String,
    /// Display name; slugified into storage keys.
    pub name: String,
}

impl Namespace {
    /// Create a namespace value.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Whether both fields are present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.id.trim().is_empty() && !self.name.trim().is_empty()
    }
}
