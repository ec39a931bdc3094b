//! Backend Parameters
//!
//! [`AddNodeOptions`] is the full parameter shape of an add-node call.
//! The structured backend consumes it as-is. The process backend only
//! formats a handful of its fields into command-line flags.

mod builder;

pub use builder::{OptionBuilder, DEFAULT_SUPERUSER};

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::credentials::Credentials;
use crate::request::HostIdentity;

/// Parameters for adding nodes to a database.
#[derive(Debug, Clone, Serialize)]
pub struct AddNodeOptions {
    /// Host the clustering call is issued through
    pub bootstrap_host: String,

    /// Orchestration identity of the bootstrap host, when known
    pub initiator_name: Option<HostIdentity>,

    /// Subcluster the new nodes join; `None` lets the cluster pick
    pub subcluster_name: Option<String>,

    pub database: DatabaseOptions,
}

/// Database-wide parameters of a clustering call.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseOptions {
    pub name: String,
    pub raw_hosts: Vec<String>,
    pub ipv6: bool,
    pub catalog_prefix: String,
    pub data_prefix: String,
    pub config_directory: Option<String>,
    pub depot_prefix: Option<String>,
    pub is_eon: bool,
    pub user_name: String,
    #[serde(skip)]
    pub credentials: Option<Arc<Credentials>>,
    pub log_path: Option<String>,
    pub honor_user_input: bool,
}

impl DatabaseOptions {
    pub fn key(&self) -> Option<&[u8]> {
        self.credentials.as_deref().map(Credentials::key)
    }

    pub fn cert(&self) -> Option<&[u8]> {
        self.credentials.as_deref().map(Credentials::cert)
    }

    pub fn ca_cert(&self) -> Option<&[u8]> {
        self.credentials.as_deref().map(Credentials::ca_cert)
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.as_deref().map(Credentials::password)
    }

    /// Key, cert and CA cert are all present.
    pub fn has_complete_credentials(&self) -> bool {
        self.credentials
            .as_deref()
            .map(Credentials::is_complete)
            .unwrap_or(false)
    }
}

impl AddNodeOptions {
    /// JSON view for logs and diagnostics. Secret material is replaced by
    /// a certificate fingerprint.
    pub fn redacted_json(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        let credentials = match self.database.credentials.as_deref() {
            Some(creds) => json!({
                "cert_fingerprint": creds.fingerprint(),
                "password_set": !creds.password().is_empty(),
            }),
            None => Value::Null,
        };
        if let Some(database) = value.get_mut("database").and_then(Value::as_object_mut) {
            database.insert("credentials".to_string(), credentials);
        }
        Ok(value)
    }
}
