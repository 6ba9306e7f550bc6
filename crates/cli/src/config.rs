//! Configuration loading from roles.toml.

use roles::{PermissionTable, PermissionsSpec, RoleProvider, validator::Constant};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Static role grants. Each role resolves with its value; `false` denies.
    #[serde(default)]
    pub roles: BTreeMap<String, Value>,

    /// Named permission specs.
    #[serde(default)]
    pub permissions: PermissionTable,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load the explicit config path, or `default` if none was given.
    ///
    /// A missing explicit path is an error; a missing default file yields
    /// an empty config.
    pub fn resolve(explicit: Option<&Path>, default: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::load(path),
            None if default.exists() => Self::load(default),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the configured roles.
    pub fn apply_overrides(&mut self, grants: &[Grant], denies: &[String]) {
        for grant in grants {
            self.roles.insert(grant.role.clone(), grant.value.clone());
        }
        for role in denies {
            self.roles.insert(role.clone(), Value::Bool(false));
        }
    }

    /// Build a provider with one constant validator per configured role.
    pub fn provider(&self) -> RoleProvider {
        let mut provider = RoleProvider::new();
        for (name, value) in &self.roles {
            provider.define(name.clone(), Constant(value.clone()));
        }
        provider
    }
}

/// A `--grant role[=value]` override.
#[derive(Debug, Clone, PartialEq)]
pub struct Grant {
    pub role: String,
    pub value: Value,
}

impl std::str::FromStr for Grant {
    type Err = ConfigError;

    /// `admin` grants `true`. `admin=3` grants the JSON value `3`; a value
    /// that is not valid JSON is taken as a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (role, value) = match s.split_once('=') {
            Some((role, raw)) => {
                let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
                (role, value)
            }
            None => (s, Value::Bool(true)),
        };

        if role.is_empty() {
            return Err(ConfigError::InvalidGrant(s.to_string()));
        }

        Ok(Self {
            role: role.to_string(),
            value,
        })
    }
}

/// Parse an ad-hoc spec from the command line.
///
/// JSON is parsed as-is; anything that is not valid JSON is taken as a
/// single role name.
pub fn parse_spec(raw: &str) -> Result<PermissionsSpec, roles::Error> {
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    PermissionsSpec::from_value(value)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found at {}. Pass --config or create roles.toml", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid grant '{0}': expected ROLE or ROLE=VALUE")]
    InvalidGrant(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONFIG: &str = r#"
[roles]
guest = true
banned = false
admin = { level = 3 }

[permissions]
read = "guest"

[permissions.edit]
every = "guest"
some = ["owner", "admin"]
none = "banned"
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!(config.roles["banned"], json!(false));
        assert_eq!(config.roles["admin"], json!({ "level": 3 }));
        assert_eq!(config.permissions.len(), 2);
        assert_eq!(config.permissions.get("edit").unwrap().some, ["owner", "admin"]);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.roles.is_empty());
        assert!(config.permissions.is_empty());
    }

    #[test]
    fn test_bad_permissions_fail_parse() {
        let err = Config::parse("[permissions]\nread = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_grant_parsing() {
        assert_eq!(
            "admin".parse::<Grant>().unwrap(),
            Grant { role: "admin".into(), value: json!(true) }
        );
        assert_eq!("level=3".parse::<Grant>().unwrap().value, json!(3));
        assert_eq!("team=core".parse::<Grant>().unwrap().value, json!("core"));
        assert_eq!("off=false".parse::<Grant>().unwrap().value, json!(false));
        assert!("=1".parse::<Grant>().is_err());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rolecheck-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolve_missing_explicit_path_fails() {
        let dir = scratch_dir("explicit");
        let missing = dir.join("missing.toml");

        let err = Config::resolve(Some(missing.as_path()), &dir.join("roles.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { ref path } if *path == missing));
    }

    #[test]
    fn test_resolve_missing_default_is_empty() {
        let dir = scratch_dir("default-missing");
        let config = Config::resolve(None, &dir.join("roles.toml")).unwrap();
        assert!(config.roles.is_empty());
        assert!(config.permissions.is_empty());
    }

    #[test]
    fn test_resolve_loads_files() {
        let dir = scratch_dir("load");
        let default = dir.join("roles.toml");
        std::fs::write(&default, CONFIG).unwrap();
        let explicit = dir.join("other.toml");
        std::fs::write(&explicit, "[roles]\nops = true\n").unwrap();

        let config = Config::resolve(None, &default).unwrap();
        assert_eq!(config.permissions.len(), 2);

        let config = Config::resolve(Some(explicit.as_path()), &default).unwrap();
        assert_eq!(config.roles.keys().collect::<Vec<_>>(), ["ops"]);
        assert!(config.permissions.is_empty());
    }

    #[test]
    fn test_parse_spec_bare_word_is_role() {
        let spec = parse_spec("admin").unwrap();
        assert_eq!(spec, PermissionsSpec::from("admin"));
    }

    #[test]
    fn test_parse_spec_json() {
        let per = parse_spec(r#"{"every":["member"],"none":"banned"}"#)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(per.every, ["member"]);
        assert_eq!(per.none, ["banned"]);

        assert_eq!(parse_spec(r#"["a","b"]"#).unwrap(), PermissionsSpec::from(["a", "b"]));
        assert!(matches!(parse_spec("42"), Err(roles::Error::InvalidPermissions(_))));
    }

    #[tokio::test]
    async fn test_overrides_feed_provider() {
        let mut config = Config::parse(CONFIG).unwrap();
        let edit = config.permissions.get("edit").unwrap().clone();

        let err = config.provider().evaluate(&edit, &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Role 'owner' not defined");

        config.apply_overrides(&["owner".parse::<Grant>().unwrap()], &["admin".to_string()]);
        let granted = config.provider().evaluate(&edit, &[]).await.unwrap();
        assert_eq!(granted.keys().collect::<Vec<_>>(), ["guest", "owner"]);

        config.apply_overrides(&["banned".parse::<Grant>().unwrap()], &[]);
        let err = config.provider().evaluate(&edit, &[]).await.unwrap_err();
        assert_eq!(err.role(), Some("banned"));
    }
}
