//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No permission spec is registered under the given name.
    #[error("no permissions named '{name}'. Run 'rolecheck list' to see them")]
    UnknownPermission { name: String },

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Evaluation failed or was denied.
    #[error(transparent)]
    Roles(#[from] roles::Error),

    /// Failed to render output.
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
