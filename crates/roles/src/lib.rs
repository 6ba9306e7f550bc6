//! Role-based permission evaluation.
//!
//! Callers register named validators ("roles") on a [`RoleProvider`] and
//! then ask whether a combination of them holds for a given set of params:
//!
//! - **every** — all listed roles must pass
//! - **some** — at least one listed role must pass
//! - **none** — no listed role may pass
//!
//! Validators are opaque predicates. A validator that resolves with a value
//! grants the role and that value becomes the role's payload. Resolving or
//! rejecting with `false` (or rejecting with any plain value) denies it.
//! Rejecting with a real error is a fault and is propagated unchanged.
//!
//! Roles are always checked one at a time, left to right.
//!
//! # Example
//!
//! ```
//! use roles::{Permissions, RoleProvider, validator};
//! use serde_json::{json, Value};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> roles::Result<()> {
//! let mut roles = RoleProvider::new();
//! roles
//!     .define("member", validator::from_fn(|_| Ok(json!({ "since": 2019 }))))
//!     .define("owner", validator::from_fn(|params| {
//!         Ok(Value::Bool(params.first() == Some(&json!("alice"))))
//!     }))
//!     .define("banned", validator::Constant(json!(false)));
//!
//! let edit = Permissions::new().every(["member"]).some(["owner"]).none(["banned"]);
//!
//! let granted = roles.evaluate(&edit, &[json!("alice")]).await?;
//! assert_eq!(granted["owner"], json!(true));
//!
//! let err = roles.evaluate(&edit, &[json!("bob")]).await.unwrap_err();
//! assert_eq!(err.to_string(), "Missing permissions for role 'owner'");
//! # Ok(())
//! # }
//! ```

mod error;
mod permissions;
mod provider;
mod table;
pub mod validator;

pub use error::{BoxError, Error, Result};
pub use permissions::{Permissions, PermissionsSpec, RoleSelector};
pub use provider::{RoleProvider, RoleValues};
pub use table::PermissionTable;
pub use validator::{Outcome, Rejection, Validator};
