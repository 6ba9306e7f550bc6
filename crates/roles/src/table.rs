//! Named permission specs loaded from TOML.

use crate::{Error, Permissions, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A set of permission specs keyed by operation name.
///
/// Each top-level TOML key names an operation; its value is any shape a
/// [`PermissionsSpec`](crate::PermissionsSpec) accepts:
///
/// ```toml
/// read = "guest"
/// publish = ["author", "verified"]
///
/// [edit]
/// every = "member"
/// some = ["owner", "admin"]
/// none = "banned"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionTable {
    entries: BTreeMap<String, Permissions>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a table from a TOML string.
    ///
    /// Every entry is normalized while parsing, so a malformed entry fails
    /// the whole table.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }

    /// Get the permissions for an operation.
    pub fn get(&self, name: &str) -> Option<&Permissions> {
        self.entries.get(name)
    }

    /// Add or replace the permissions for an operation.
    pub fn insert(&mut self, name: impl Into<String>, permissions: Permissions) -> Option<Permissions> {
        self.entries.insert(name.into(), permissions)
    }

    /// Operation names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Permissions)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
