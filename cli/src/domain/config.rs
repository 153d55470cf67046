//! Domain types and validators for the deploy configuration.
//!
//! Pure functions only. No I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deploy.config.yaml";

/// Value left in template fields that must be edited before deploying.
pub const PLACEHOLDER: &str = "/";

/// Required environment keys, in the order they are checked.
pub const REQUIRED_KEYS: &[&str] = &[
    "name",
    "script",
    "host",
    "port",
    "username",
    "distPath",
    "webDir",
];

/// Template written by `deploy-cli init`.
pub const CONFIG_TEMPLATE: &str = r#"# deploy-cli configuration
projectName: my-project

# Key used by every environment that does not set its own.
privateKey: ~/.ssh/id_rsa
passphrase: ""

dev:
  name: development
  script: npm run build:dev
  host: /
  port: 22
  username: /
  password: ""
  distPath: dist
  webDir: /
  isWindows: false
  isRemoveRemoteFile: true

prod:
  name: production
  script: npm run build:prod
  host: /
  port: 22
  username: /
  password: ""
  distPath: dist
  webDir:
    - /
  isWindows: false
  isRemoveRemoteFile: true
"#;

// ── Config schema ────────────────────────────────────────────────────────────

/// Whole config file: project-wide defaults plus one record per environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployFile {
    /// Display name used in the confirmation prompt.
    #[serde(default)]
    pub project_name: Option<String>,
    /// Default private key path for every environment.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Default passphrase for `private_key`.
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Every other top-level key is an environment name.
    #[serde(flatten)]
    pub environments: BTreeMap<String, RawEnvConfig>,
}

/// One environment exactly as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEnvConfig {
    pub name: Option<String>,
    /// Build command, run through the local shell.
    pub script: Option<String>,
    pub host: Option<String>,
    pub port: Option<PortValue>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub private_key: Option<String>,
    pub passphrase: Option<String>,
    /// Local build output directory, also the archive base name.
    pub dist_path: Option<String>,
    pub web_dir: Option<WebDir>,
    pub is_windows: Option<bool>,
    pub is_remove_remote_file: Option<bool>,
}

/// `port` may be written as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u64),
    Text(String),
}

/// `webDir` may be one remote path or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebDir {
    One(String),
    Many(Vec<String>),
}

impl WebDir {
    /// Normalize to a list; a single path is a one-element list.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::One(dir) => vec![dir.clone()],
            Self::Many(dirs) => dirs.clone(),
        }
    }
}

/// Authentication accepted by the validator. Exactly one per environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    PrivateKey {
        path: String,
        passphrase: Option<String>,
    },
    Password(String),
}

/// A validated, immutable environment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub name: String,
    pub build_script: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: Credential,
    pub dist_path: String,
    /// Remote directories; the same artifact is replicated to each one.
    pub web_dirs: Vec<String>,
    /// Selects `DEL /Q /S /F` over `rm -rf` for remote deletes.
    pub is_windows: bool,
    /// Gates the stale-remote cleanup step.
    pub remove_remote_files: bool,
}

impl DeploymentConfig {
    /// Local archive file name, `<distPath>.zip`.
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.dist_path)
    }
}

impl DeployFile {
    /// Environment record with the project-wide key defaults merged in.
    ///
    /// A `privateKey` or `passphrase` set on the environment itself wins
    /// over the top-level default. This is deliberately the reverse of the
    /// older tool this config format comes from, where the top-level value
    /// overwrote the environment's own.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEnvironment` if `env` is not defined.
    pub fn environment(&self, env: &str) -> Result<RawEnvConfig, ConfigError> {
        let mut raw = self
            .environments
            .get(env)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownEnvironment(env.to_string()))?;
        if raw.private_key.is_none() {
            raw.private_key.clone_from(&self.private_key);
        }
        if raw.passphrase.is_none() {
            raw.passphrase.clone_from(&self.passphrase);
        }
        Ok(raw)
    }

    /// Resolve and validate `env` in one go.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn resolve(&self, env: &str) -> Result<DeploymentConfig, ConfigError> {
        validate(&self.environment(env)?, env)
    }

    /// Project name for prompts, falling back to the environment key.
    #[must_use]
    pub fn project_label<'a>(&'a self, env: &'a str) -> &'a str {
        self.project_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(env)
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a raw environment record.
///
/// Checks the credential first, then every key in [`REQUIRED_KEYS`] order.
///
/// # Errors
///
/// Returns `MissingCredential` when neither `privateKey` nor `password` is
/// set, or `InvalidField` naming the first missing or placeholder key.
pub fn validate(raw: &RawEnvConfig, env: &str) -> Result<DeploymentConfig, ConfigError> {
    let private_key = non_empty(raw.private_key.as_deref());
    let password = non_empty(raw.password.as_deref());
    let credential = match (private_key, password) {
        (Some(path), _) => Credential::PrivateKey {
            path: path.to_string(),
            passphrase: non_empty(raw.passphrase.as_deref()).map(str::to_string),
        },
        (None, Some(password)) => Credential::Password(password.to_string()),
        (None, None) => {
            return Err(ConfigError::MissingCredential {
                env: env.to_string(),
            });
        }
    };

    let name = required(raw.name.as_deref(), "name", env)?;
    let build_script = required(raw.script.as_deref(), "script", env)?;
    let host = required(raw.host.as_deref(), "host", env)?;
    let port = port(raw.port.as_ref(), env)?;
    let username = required(raw.username.as_deref(), "username", env)?;
    let dist_path = dist_path(raw.dist_path.as_deref(), env)?;
    let web_dirs = web_dirs(raw.web_dir.as_ref(), env)?;

    Ok(DeploymentConfig {
        name,
        build_script,
        host,
        port,
        username,
        credential,
        dist_path,
        web_dirs,
        is_windows: raw.is_windows.unwrap_or(false),
        remove_remote_files: raw.is_remove_remote_file.unwrap_or(true),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid(key: &str, env: &str) -> ConfigError {
    ConfigError::InvalidField {
        key: key.to_string(),
        env: env.to_string(),
    }
}

fn required(value: Option<&str>, key: &str, env: &str) -> Result<String, ConfigError> {
    match non_empty(value) {
        Some(v) if v != PLACEHOLDER => Ok(v.to_string()),
        _ => Err(invalid(key, env)),
    }
}

fn port(value: Option<&PortValue>, env: &str) -> Result<u16, ConfigError> {
    let parsed = match value {
        Some(PortValue::Number(n)) => u16::try_from(*n).ok(),
        Some(PortValue::Text(s)) => s.trim().parse::<u16>().ok(),
        None => None,
    };
    parsed.filter(|p| *p != 0).ok_or_else(|| invalid("port", env))
}

/// `distPath` must name a directory below the working directory; it is
/// archived and later deleted recursively.
fn dist_path(value: Option<&str>, env: &str) -> Result<String, ConfigError> {
    let path = required(value, "distPath", env)?;
    let absolute = path.starts_with(['/', '\\']) || path.get(1..2) == Some(":");
    let escapes = path
        .split(['/', '\\'])
        .filter(|c| !c.is_empty())
        .all(|c| c == ".")
        || path.split(['/', '\\']).any(|c| c == "..");
    if absolute || escapes {
        return Err(invalid("distPath", env));
    }
    Ok(path)
}

/// Characters that would split or alter the remote shell command a
/// target directory is spliced into.
const SHELL_SPECIAL: &[char] = &[';', '&', '|', '`', '$', '<', '>', '\'', '"'];

fn web_dirs(value: Option<&WebDir>, env: &str) -> Result<Vec<String>, ConfigError> {
    let dirs = value.map(WebDir::to_list).unwrap_or_default();
    let unusable = |d: &String| {
        d.trim().is_empty()
            || d == PLACEHOLDER
            || d.chars().any(|c| c.is_whitespace() || SHELL_SPECIAL.contains(&c))
    };
    if dirs.is_empty() || dirs.iter().any(unusable) {
        return Err(invalid("webDir", env));
    }
    Ok(dirs)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
