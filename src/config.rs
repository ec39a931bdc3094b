//! Operator configuration
//!
//! `vadmin` reads one JSON file. Every field is optional; absent fields
//! take the defaults below.
//!
//! ```json
//! {
//!   "backend": "process",
//!   "dev_mode": true,
//!   "exec_prefix": ["kubectl", "exec", "-n", "{namespace}", "{name}", "-c", "{container}", "--"],
//!   "operation_timeout_secs": 600
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{
    BackendKind, ProcessSettings, DEFAULT_ADMINTOOLS_CONF, DEFAULT_ADMINTOOLS_PATH,
    DEFAULT_CONTAINER, DEFAULT_DUMP_MAX_BYTES,
};
use crate::options::DEFAULT_SUPERUSER;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Locations of the TLS material used by the structured backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub ca_cert_path: PathBuf,

    /// File holding the superuser password
    #[serde(default)]
    pub password_file: Option<PathBuf>,

    /// Environment variable holding the superuser password
    #[serde(default)]
    pub password_env: Option<String>,
}

/// `vadmin` configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpsConfig {
    /// Execution backend (default: "process")
    #[serde(default = "default_backend")]
    pub backend: BackendKind,

    /// Dump admintools.conf around every process backend command
    #[serde(default)]
    pub dev_mode: bool,

    /// Database superuser (default: "dbadmin")
    #[serde(default = "default_superuser")]
    pub superuser: String,

    /// Container the tool runs in (default: "server")
    #[serde(default = "default_container")]
    pub container: String,

    #[serde(default = "default_admintools_path")]
    pub admintools_path: String,

    #[serde(default = "default_admintools_conf_path")]
    pub admintools_conf_path: String,

    /// Remote-exec prefix. `{namespace}`, `{name}` and `{container}` are
    /// substituted per call. Empty runs commands locally.
    #[serde(default)]
    pub exec_prefix: Vec<String>,

    /// Upper bound on one attempt (default: 600s, 0 disables)
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// How long resolved credentials are reused (default: 300s, 0 disables)
    #[serde(default = "default_credential_cache_ttl_secs")]
    pub credential_cache_ttl_secs: u64,

    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// Longest configuration dump written to the log (default: 64 KiB)
    #[serde(default = "default_dump_max_bytes")]
    pub diagnostic_dump_max_bytes: usize,
}

fn default_backend() -> BackendKind {
    BackendKind::Process
}
fn default_superuser() -> String {
    DEFAULT_SUPERUSER.to_string()
}
fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}
fn default_admintools_path() -> String {
    DEFAULT_ADMINTOOLS_PATH.to_string()
}
fn default_admintools_conf_path() -> String {
    DEFAULT_ADMINTOOLS_CONF.to_string()
}
fn default_operation_timeout_secs() -> u64 {
    600
}
fn default_credential_cache_ttl_secs() -> u64 {
    300
}
fn default_dump_max_bytes() -> usize {
    DEFAULT_DUMP_MAX_BYTES
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dev_mode: false,
            superuser: default_superuser(),
            container: default_container(),
            admintools_path: default_admintools_path(),
            admintools_conf_path: default_admintools_conf_path(),
            exec_prefix: Vec::new(),
            operation_timeout_secs: default_operation_timeout_secs(),
            credential_cache_ttl_secs: default_credential_cache_ttl_secs(),
            tls: None,
            diagnostic_dump_max_bytes: default_dump_max_bytes(),
        }
    }
}

impl OpsConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: OpsConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.superuser.trim().is_empty() {
            return Err(ConfigError::Invalid("superuser must not be empty".into()));
        }
        if self.container.trim().is_empty() {
            return Err(ConfigError::Invalid("container must not be empty".into()));
        }
        if self.admintools_path.trim().is_empty() {
            return Err(ConfigError::Invalid("admintools_path must not be empty".into()));
        }
        if self.diagnostic_dump_max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "diagnostic_dump_max_bytes must be > 0".into(),
            ));
        }
        if self.backend == BackendKind::Structured && self.tls.is_none() {
            return Err(ConfigError::Invalid(
                "structured backend requires a 'tls' section".into(),
            ));
        }
        if let Some(tls) = &self.tls {
            if tls.password_file.is_some() && tls.password_env.is_some() {
                return Err(ConfigError::Invalid(
                    "tls.password_file and tls.password_env are mutually exclusive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Per-attempt timeout, `None` when disabled
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_secs > 0).then(|| Duration::from_secs(self.operation_timeout_secs))
    }

    /// Credential cache TTL, `None` when caching is disabled
    pub fn credential_cache_ttl(&self) -> Option<Duration> {
        (self.credential_cache_ttl_secs > 0)
            .then(|| Duration::from_secs(self.credential_cache_ttl_secs))
    }

    pub fn process_settings(&self) -> ProcessSettings {
        ProcessSettings {
            admintools_path: self.admintools_path.clone(),
            container: self.container.clone(),
            dev_mode: self.dev_mode,
            dump_max_bytes: self.diagnostic_dump_max_bytes,
        }
    }
}
