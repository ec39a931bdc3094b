//! CLI argument definitions using clap
//!
//! Commands:
//! - vadmin add-node --config <path> --host <ip>... --initiator <ip> ...
//! - vadmin show-options --config <path> ...

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::request::{
    with_catalog_prefix, with_cluster_hosts, with_data_prefix, with_database, with_depot_prefix,
    with_eon, with_hosts, with_initiator_ip, with_initiator_name, with_ipv6, with_subcluster,
    HostIdentity, RequestOption,
};

use super::errors::{CliError, CliResult};

/// vadmin - add nodes to a running database cluster
#[derive(Parser, Debug)]
#[command(name = "vadmin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add hosts to the database through the configured backend
    AddNode(RequestArgs),

    /// Print the options the configured backend would receive, secrets redacted
    ShowOptions(RequestArgs),
}

/// Arguments describing one add-node request
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Path to configuration file
    #[arg(long, default_value = "./vadmin.json")]
    pub config: PathBuf,

    /// Database name
    #[arg(long)]
    pub database: String,

    /// Address of a host to add (repeatable)
    #[arg(long = "host", required = true)]
    pub hosts: Vec<String>,

    /// Address of a current cluster member (repeatable)
    #[arg(long = "cluster-host")]
    pub cluster_hosts: Vec<String>,

    /// Address of the cluster member that issues the mutation
    #[arg(long)]
    pub initiator: String,

    /// Orchestration identity of the initiator, as namespace/name
    #[arg(long)]
    pub initiator_pod: Option<String>,

    /// Subcluster receiving the new hosts
    #[arg(long, default_value = "")]
    pub subcluster: String,

    #[arg(long, default_value = "")]
    pub catalog_path: String,

    #[arg(long, default_value = "")]
    pub data_path: String,

    #[arg(long, default_value = "")]
    pub depot_path: String,

    /// Database runs in Eon mode
    #[arg(long)]
    pub eon: bool,

    /// Override IPv6 detection from the initiator address
    #[arg(long)]
    pub ipv6: Option<bool>,
}

impl RequestArgs {
    /// Request options for these arguments.
    pub fn request_options(&self) -> CliResult<Vec<RequestOption>> {
        let mut opts = vec![
            with_initiator_ip(self.initiator.clone()),
            with_hosts(self.hosts.clone()),
            with_cluster_hosts(self.cluster_hosts.clone()),
            with_database(self.database.clone()),
            with_subcluster(self.subcluster.clone()),
            with_catalog_prefix(self.catalog_path.clone()),
            with_data_prefix(self.data_path.clone()),
            with_depot_prefix(self.depot_path.clone()),
            with_eon(self.eon),
        ];
        if let Some(pod) = &self.initiator_pod {
            let identity = HostIdentity::parse(pod).ok_or_else(|| {
                CliError::InvalidArgument(format!(
                    "--initiator-pod '{}' is not of the form namespace/name",
                    pod
                ))
            })?;
            opts.push(with_initiator_name(identity));
        }
        if let Some(ipv6) = self.ipv6 {
            opts.push(with_ipv6(ipv6));
        }
        Ok(opts)
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
