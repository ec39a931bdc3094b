//! Host addressing helpers

use std::fmt;
use std::net::Ipv6Addr;

use serde::{Deserialize, Serialize};

/// Identity of a cluster member in its orchestration environment
/// (for pods: namespace and name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostIdentity {
    pub namespace: String,
    pub name: String,
}

impl HostIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `namespace/name`. A bare name lands in the `default` namespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        match s.split_once('/') {
            Some((ns, name)) if !ns.is_empty() && !name.is_empty() && !name.contains('/') => {
                Some(Self::new(ns, name))
            }
            Some(_) => None,
            None if !s.is_empty() => Some(Self::new("default", s)),
            None => None,
        }
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Whether an address is an IPv6 literal. Brackets are accepted.
pub fn is_ipv6(addr: &str) -> bool {
    let addr = addr.trim();
    let addr = addr
        .strip_prefix('[')
        .and_then(|a| a.strip_suffix(']'))
        .unwrap_or(addr);
    addr.parse::<Ipv6Addr>().is_ok()
}
