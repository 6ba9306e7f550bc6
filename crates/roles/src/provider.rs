//! Role registry and evaluation.

use crate::permissions::{Permissions, PermissionsSpec};
use crate::table::PermissionTable;
use crate::validator::{Rejection, Validator};
use crate::{Error, Result};
use futures_util::{FutureExt, future};
use serde_json::Value;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{debug, trace};

/// Payloads of the roles that passed, keyed by role name.
pub type RoleValues = BTreeMap<String, Value>;

/// Registry of role validators.
///
/// Roles are registered up front and the provider is then shared
/// read-only between evaluations. Every evaluation invokes validators one
/// at a time, in the order the roles are listed, and waits for each to
/// settle before moving on.
#[derive(Default)]
pub struct RoleProvider {
    roles: HashMap<String, Box<dyn Validator>>,
}

impl RoleProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a validator for `name`, replacing any previous one.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        validator: impl Validator + 'static,
    ) -> &mut Self {
        self.roles.insert(name.into(), Box::new(validator));
        self
    }

    /// Get the validator registered for `name`.
    pub fn lookup(&self, name: &str) -> Option<&dyn Validator> {
        self.roles.get(name).map(|v| v.as_ref())
    }

    /// Names of all registered roles, in no particular order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Validate a single role.
    ///
    /// Resolves with the validator's payload. Resolving with `false`, or
    /// rejecting with any plain value, becomes [`Error::PermissionDenied`].
    /// Rejecting with a real error propagates it as [`Error::Validator`].
    pub async fn validate_role(&self, name: &str, params: &[Value]) -> Result<Value> {
        let validator = self
            .lookup(name)
            .ok_or_else(|| Error::RoleNotDefined(name.to_string()))?;

        trace!(role = name, "validating role");

        // Build the future inside the unwind scope so a panic in `validate`
        // itself is caught too.
        let outcome = AssertUnwindSafe(future::lazy(|_| validator.validate(params)).flatten())
            .catch_unwind()
            .await
            .map_err(|panic| Error::ValidatorPanicked {
                role: name.to_string(),
                message: panic_message(panic.as_ref()),
            })?;

        match outcome {
            Ok(Value::Bool(false)) | Err(Rejection::Value(_)) => {
                debug!(role = name, "role denied");
                Err(Error::PermissionDenied(name.to_string()))
            }
            Ok(value) => Ok(value),
            Err(Rejection::Error(err)) => Err(Error::Validator(err)),
        }
    }

    /// Require every role to pass.
    ///
    /// Stops at the first failure and returns it; later roles are not
    /// invoked. An empty list passes with no values.
    pub async fn expect_every<S: AsRef<str>>(
        &self,
        roles: &[S],
        params: &[Value],
    ) -> Result<RoleValues> {
        let mut values = RoleValues::new();

        for name in roles {
            let name = name.as_ref();
            let value = self.validate_role(name, params).await?;
            values.insert(name.to_string(), value);
        }

        Ok(values)
    }

    /// Require at least one role to pass.
    ///
    /// Resolves with the first passing role only. A denial or validator
    /// error moves on to the next role; if every role fails, the failure of
    /// the last one tried is returned. An undefined role is returned
    /// immediately without trying the rest. An empty list passes with no
    /// values.
    pub async fn expect_some<S: AsRef<str>>(
        &self,
        roles: &[S],
        params: &[Value],
    ) -> Result<RoleValues> {
        let mut last_error = None;

        for name in roles {
            let name = name.as_ref();
            match self.validate_role(name, params).await {
                Ok(value) => return Ok(RoleValues::from([(name.to_string(), value)])),
                Err(err @ Error::RoleNotDefined(_)) => return Err(err),
                Err(err) => {
                    debug!(role = name, error = %err, "role failed, trying next");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Ok(RoleValues::new()),
        }
    }

    /// Require that no role passes.
    ///
    /// A validator error or panic counts as "not granted" just like a
    /// denial. An undefined role is returned immediately. The first role
    /// that passes fails the check with [`Error::UnexpectedPermission`].
    /// Always resolves with no values.
    pub async fn expect_none<S: AsRef<str>>(
        &self,
        roles: &[S],
        params: &[Value],
    ) -> Result<RoleValues> {
        for name in roles {
            let name = name.as_ref();
            match self.validate_role(name, params).await {
                Ok(_) => return Err(Error::UnexpectedPermission(name.to_string())),
                Err(err @ Error::RoleNotDefined(_)) => return Err(err),
                Err(err) if err.is_denied() => {}
                Err(err) => {
                    debug!(role = name, error = %err, "validator failed, treating role as not granted");
                }
            }
        }

        Ok(RoleValues::new())
    }

    /// Normalize a permissions spec and evaluate it.
    pub async fn validate(
        &self,
        spec: impl Into<PermissionsSpec>,
        params: &[Value],
    ) -> Result<RoleValues> {
        let permissions = spec.into().normalize()?;
        self.evaluate(&permissions, params).await
    }

    /// Evaluate normalized permissions.
    ///
    /// Runs `every`, then `none`, then `some`, each to completion before the
    /// next. The first failing phase aborts the evaluation. The result holds
    /// the payloads from `every` and `some`; on a name collision the later
    /// phase wins.
    pub async fn evaluate(&self, permissions: &Permissions, params: &[Value]) -> Result<RoleValues> {
        let mut values = RoleValues::new();

        if !permissions.every.is_empty() {
            values.extend(self.expect_every(&permissions.every, params).await?);
        }

        if !permissions.none.is_empty() {
            self.expect_none(&permissions.none, params).await?;
        }

        if !permissions.some.is_empty() {
            values.extend(self.expect_some(&permissions.some, params).await?);
        }

        debug!(granted = values.len(), "permissions satisfied");
        Ok(values)
    }

    /// Evaluate the permissions registered under `name` in a table.
    pub async fn validate_named(
        &self,
        table: &PermissionTable,
        name: &str,
        params: &[Value],
    ) -> Result<RoleValues> {
        let permissions = table
            .get(name)
            .ok_or_else(|| Error::InvalidPermissions(format!("no permissions named '{name}'")))?;
        self.evaluate(permissions, params).await
    }
}

impl fmt::Debug for RoleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.roles().collect();
        names.sort_unstable();
        f.debug_struct("RoleProvider").field("roles", &names).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
