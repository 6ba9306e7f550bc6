//! Role evaluation error types.

use thiserror::Error;

/// Boxed error returned by a failing validator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Role evaluation errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No validator is registered under the role name.
    #[error("Role '{0}' not defined")]
    RoleNotDefined(String),

    /// The validator denied the role (explicit `false` or a non-error rejection).
    #[error("Missing permissions for role '{0}'")]
    PermissionDenied(String),

    /// A role listed under `none` was granted.
    #[error("Permission for role '{0}' should not be available")]
    UnexpectedPermission(String),

    /// The permissions specification has a shape that cannot be normalized.
    #[error("Invalid permissions object: {0}")]
    InvalidPermissions(String),

    /// A validator failed with a real error.
    ///
    /// The message is the validator's own; the boxed error can be
    /// downcast to recover the original type.
    #[error("{0}")]
    Validator(BoxError),

    /// A validator panicked while running.
    #[error("validator for role '{role}' panicked: {message}")]
    ValidatorPanicked { role: String, message: String },

    /// Failed to parse a permission table.
    #[error("failed to parse permissions: {0}")]
    Parse(String),

    /// An I/O error occurred while reading a permission table.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The role this error refers to, if it is scoped to a single role.
    pub fn role(&self) -> Option<&str> {
        match self {
            Error::RoleNotDefined(role)
            | Error::PermissionDenied(role)
            | Error::UnexpectedPermission(role)
            | Error::ValidatorPanicked { role, .. } => Some(role),
            _ => None,
        }
    }

    /// Whether this is a normalized denial rather than a fault.
    pub fn is_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_role() {
        assert_eq!(
            Error::PermissionDenied("b".into()).to_string(),
            "Missing permissions for role 'b'"
        );
        assert_eq!(
            Error::UnexpectedPermission("e".into()).to_string(),
            "Permission for role 'e' should not be available"
        );
        assert_eq!(
            Error::RoleNotDefined("x".into()).to_string(),
            "Role 'x' not defined"
        );
    }

    #[test]
    fn test_validator_error_keeps_message() {
        let err = Error::Validator("database unreachable".into());
        assert_eq!(err.to_string(), "database unreachable");
        assert_eq!(err.role(), None);
        assert!(!err.is_denied());
    }

    #[test]
    fn test_role_accessor() {
        assert_eq!(Error::PermissionDenied("a".into()).role(), Some("a"));
        assert!(Error::PermissionDenied("a".into()).is_denied());
        assert_eq!(Error::InvalidPermissions("x".into()).role(), None);
    }
}
