//! Permissions specifications and their normalization.
//!
//! Callers describe what an operation requires in a loose form: a single
//! role name, a list of role names (all required), or an object with
//! `every`, `some` and `none` fields. [`PermissionsSpec::normalize`] turns
//! any of these into the canonical [`Permissions`] consumed by the
//! evaluator.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The value of a single quantifier field in a structured spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSelector {
    Role(String),
    List(Vec<String>),
    /// A nested object. Accepted by the parser so that normalization can
    /// reject it as [`Error::InvalidPermissions`].
    Nested(Map<String, Value>),
}

impl RoleSelector {
    fn normalize(self, field: &str) -> Result<Vec<String>> {
        match self {
            RoleSelector::Role(name) => Ok(vec![name]),
            RoleSelector::List(names) => Ok(names),
            RoleSelector::Nested(_) => Err(Error::InvalidPermissions(format!(
                "`{field}` must be a role name or a list of role names"
            ))),
        }
    }
}

/// A loosely-typed permissions specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionsSpec {
    /// A single role that must pass.
    Role(String),
    /// Roles that must all pass.
    List(Vec<String>),
    /// Explicit quantifiers.
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        every: Option<RoleSelector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        some: Option<RoleSelector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        none: Option<RoleSelector>,
    },
}

impl PermissionsSpec {
    /// Parse a spec from arbitrary JSON.
    ///
    /// Anything that is not a string, a list of strings or an object fails
    /// with [`Error::InvalidPermissions`].
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidPermissions(e.to_string()))
    }

    /// Convert into canonical form.
    ///
    /// A lone role name under any quantifier is wrapped into a one-element
    /// list; a nested object under any quantifier is rejected.
    pub fn normalize(self) -> Result<Permissions> {
        match self {
            PermissionsSpec::Role(name) => Ok(Permissions {
                every: vec![name],
                ..Default::default()
            }),
            PermissionsSpec::List(names) => Ok(Permissions {
                every: names,
                ..Default::default()
            }),
            PermissionsSpec::Object { every, some, none } => Ok(Permissions {
                every: normalize_field(every, "every")?,
                some: normalize_field(some, "some")?,
                none: normalize_field(none, "none")?,
            }),
        }
    }
}

fn normalize_field(selector: Option<RoleSelector>, field: &str) -> Result<Vec<String>> {
    Ok(selector
        .map(|s| s.normalize(field))
        .transpose()?
        .unwrap_or_default())
}

impl From<&str> for PermissionsSpec {
    fn from(name: &str) -> Self {
        PermissionsSpec::Role(name.to_string())
    }
}

impl From<String> for PermissionsSpec {
    fn from(name: String) -> Self {
        PermissionsSpec::Role(name)
    }
}

impl From<Vec<String>> for PermissionsSpec {
    fn from(names: Vec<String>) -> Self {
        PermissionsSpec::List(names)
    }
}

impl From<Vec<&str>> for PermissionsSpec {
    fn from(names: Vec<&str>) -> Self {
        names.as_slice().into()
    }
}

impl From<&[&str]> for PermissionsSpec {
    fn from(names: &[&str]) -> Self {
        PermissionsSpec::List(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PermissionsSpec {
    fn from(names: [&str; N]) -> Self {
        names.as_slice().into()
    }
}

impl From<Permissions> for PermissionsSpec {
    fn from(permissions: Permissions) -> Self {
        let field = |roles: Vec<String>| (!roles.is_empty()).then_some(RoleSelector::List(roles));
        PermissionsSpec::Object {
            every: field(permissions.every),
            some: field(permissions.some),
            none: field(permissions.none),
        }
    }
}

/// Canonical permissions: three ordered lists of role names.
///
/// An empty list means the quantifier is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PermissionsSpec")]
pub struct Permissions {
    /// Every role must pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub every: Vec<String>,
    /// At least one role must pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub some: Vec<String>,
    /// No role may pass.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub none: Vec<String>,
}

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add roles that must all pass.
    pub fn every<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.every.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Add roles of which at least one must pass.
    pub fn some<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.some.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Add roles that must not pass.
    pub fn none<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.none.extend(roles.into_iter().map(Into::into));
        self
    }

    /// True when no quantifier names any role; such permissions always pass.
    pub fn is_empty(&self) -> bool {
        self.every.is_empty() && self.some.is_empty() && self.none.is_empty()
    }
}

impl TryFrom<PermissionsSpec> for Permissions {
    type Error = Error;

    fn try_from(spec: PermissionsSpec) -> Result<Self> {
        spec.normalize()
    }
}
