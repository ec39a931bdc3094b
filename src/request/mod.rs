//! Mutation Requests
//!
//! A [`MutationRequest`] is the backend-agnostic description of one cluster
//! change. It is built by applying [`RequestOption`]s in order to a
//! [`RequestParms`]; later options override earlier ones for the same field.
//! The result is validated once and is immutable afterwards.
//!
//! ```ignore
//! let request = MutationRequest::new(OperationKind::AddNode, [
//!     with_initiator_ip("10.244.1.7"),
//!     with_hosts(["10.244.1.9"]),
//!     with_database("vertdb"),
//! ])?;
//! ```

mod host;

pub use host::{is_ipv6, HostIdentity};

use std::fmt;

use crate::error::{MutationError, MutationResult};

/// Cluster change being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    AddNode,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::AddNode => "AddNode",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable parameter set that options are applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParms {
    /// Address of the cluster member issuing the change
    pub initiator_ip: String,
    /// Orchestration identity of the initiator (process backend)
    pub initiator_name: Option<HostIdentity>,
    /// Addresses of the hosts to add
    pub hosts: Vec<String>,
    /// Known cluster members the initiator may be drawn from
    pub cluster_hosts: Vec<String>,
    pub subcluster: String,
    pub database: String,
    pub catalog_prefix: String,
    pub data_prefix: String,
    pub depot_prefix: String,
    pub eon: bool,
    /// Explicit IPv6 flag; derived from the initiator when unset
    pub ipv6: Option<bool>,
    pub honor_user_input: bool,
}

impl Default for RequestParms {
    fn default() -> Self {
        Self {
            initiator_ip: String::new(),
            initiator_name: None,
            hosts: Vec::new(),
            cluster_hosts: Vec::new(),
            subcluster: String::new(),
            database: String::new(),
            catalog_prefix: String::new(),
            data_prefix: String::new(),
            depot_prefix: String::new(),
            eon: false,
            ipv6: None,
            honor_user_input: true,
        }
    }
}

impl RequestParms {
    /// Apply options in order to a default parameter set.
    pub fn make<I>(opts: I) -> Self
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let mut parms = Self::default();
        for opt in opts {
            opt(&mut parms);
        }
        parms
    }
}

/// A single configuration step applied to [`RequestParms`].
pub type RequestOption = Box<dyn FnOnce(&mut RequestParms) + Send>;

pub fn with_initiator_ip(ip: impl Into<String>) -> RequestOption {
    let ip = ip.into();
    Box::new(move |p| p.initiator_ip = ip)
}

pub fn with_initiator_name(name: HostIdentity) -> RequestOption {
    Box::new(move |p| p.initiator_name = Some(name))
}

pub fn with_hosts<I, S>(hosts: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
    Box::new(move |p| p.hosts = hosts)
}

pub fn with_cluster_hosts<I, S>(hosts: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
    Box::new(move |p| p.cluster_hosts = hosts)
}

pub fn with_subcluster(name: impl Into<String>) -> RequestOption {
    let name = name.into();
    Box::new(move |p| p.subcluster = name)
}

pub fn with_database(name: impl Into<String>) -> RequestOption {
    let name = name.into();
    Box::new(move |p| p.database = name)
}

pub fn with_catalog_prefix(path: impl Into<String>) -> RequestOption {
    let path = path.into();
    Box::new(move |p| p.catalog_prefix = path)
}

pub fn with_data_prefix(path: impl Into<String>) -> RequestOption {
    let path = path.into();
    Box::new(move |p| p.data_prefix = path)
}

pub fn with_depot_prefix(path: impl Into<String>) -> RequestOption {
    let path = path.into();
    Box::new(move |p| p.depot_prefix = path)
}

pub fn with_eon(eon: bool) -> RequestOption {
    Box::new(move |p| p.eon = eon)
}

pub fn with_ipv6(ipv6: bool) -> RequestOption {
    Box::new(move |p| p.ipv6 = Some(ipv6))
}

pub fn with_honor_user_input(honor: bool) -> RequestOption {
    Box::new(move |p| p.honor_user_input = honor)
}

/// Validated, immutable description of one cluster change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    kind: OperationKind,
    parms: RequestParms,
    ipv6: bool,
}

impl MutationRequest {
    /// Build and validate a request from options.
    pub fn new<I>(kind: OperationKind, opts: I) -> MutationResult<Self>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        Self::from_parms(kind, RequestParms::make(opts))
    }

    /// Validate an already-assembled parameter set.
    ///
    /// Checks structure only: at least one target host, one initiator,
    /// no blank or duplicate hosts, and when known cluster members are
    /// given, an initiator drawn from the targets or those members.
    /// Field completeness is checked by the option builder.
    pub fn from_parms(kind: OperationKind, mut parms: RequestParms) -> MutationResult<Self> {
        parms.initiator_ip = parms.initiator_ip.trim().to_string();
        for host in parms.hosts.iter_mut().chain(parms.cluster_hosts.iter_mut()) {
            *host = host.trim().to_string();
        }

        if parms.hosts.is_empty() {
            return Err(MutationError::invalid_request("at least one target host is required"));
        }
        if parms.hosts.iter().any(|h| h.is_empty()) {
            return Err(MutationError::invalid_request("target hosts must not be blank"));
        }
        for (i, host) in parms.hosts.iter().enumerate() {
            if parms.hosts[..i].contains(host) {
                return Err(MutationError::invalid_request(format!(
                    "duplicate target host {}",
                    host
                )));
            }
        }
        if parms.initiator_ip.is_empty() {
            return Err(MutationError::invalid_request("an initiator host is required"));
        }
        if !parms.cluster_hosts.is_empty()
            && !parms.hosts.contains(&parms.initiator_ip)
            && !parms.cluster_hosts.contains(&parms.initiator_ip)
        {
            return Err(MutationError::invalid_request(format!(
                "initiator {} is neither a target host nor a known cluster member",
                parms.initiator_ip
            )));
        }

        let ipv6 = parms.ipv6.unwrap_or_else(|| is_ipv6(&parms.initiator_ip));
        Ok(Self { kind, parms, ipv6 })
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn initiator_ip(&self) -> &str {
        &self.parms.initiator_ip
    }

    pub fn initiator_name(&self) -> Option<&HostIdentity> {
        self.parms.initiator_name.as_ref()
    }

    pub fn hosts(&self) -> &[String] {
        &self.parms.hosts
    }

    pub fn subcluster(&self) -> &str {
        &self.parms.subcluster
    }

    pub fn database(&self) -> &str {
        &self.parms.database
    }

    pub fn catalog_prefix(&self) -> &str {
        &self.parms.catalog_prefix
    }

    pub fn data_prefix(&self) -> &str {
        &self.parms.data_prefix
    }

    pub fn depot_prefix(&self) -> &str {
        &self.parms.depot_prefix
    }

    pub fn is_eon(&self) -> bool {
        self.parms.eon
    }

    pub fn is_ipv6(&self) -> bool {
        self.ipv6
    }

    pub fn honor_user_input(&self) -> bool {
        self.parms.honor_user_input
    }
}
