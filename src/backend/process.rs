//! Process backend
//!
//! Runs `admintools` inside a cluster member's environment through a
//! [`CommandChannel`]. The tool reads most cluster facts (and its
//! credentials) from local state on that host, so only a few option
//! fields become flags.
//!
//! In dev mode the contents of `admintools.conf` are dumped to the log
//! before and after the command. Dumps are best-effort: their failures are
//! logged and never change the command's outcome.

use std::sync::Arc;

use thiserror::Error;

use super::{BackendKind, ExecutionOutcome, MutationBackend};
use crate::context::CallContext;
use crate::error::{MutationError, MutationResult};
use crate::observability::LogSink;
use crate::options::AddNodeOptions;
use crate::request::HostIdentity;
use crate::BoxFuture;

pub const DEFAULT_ADMINTOOLS_PATH: &str = "/opt/vertica/bin/admintools";
pub const DEFAULT_ADMINTOOLS_CONF: &str = "/opt/vertica/config/admintools.conf";
pub const DEFAULT_CONTAINER: &str = "server";

/// Default upper bound on a logged configuration dump
pub const DEFAULT_DUMP_MAX_BYTES: usize = 64 * 1024;

/// Captured result of a command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Transport-level failure of a command channel
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("failed to start command: {0}")]
    Spawn(String),

    #[error("command transport failed: {0}")]
    Transport(String),

    #[error("command exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

/// Runs commands on cluster members.
///
/// Concurrent commands to one host are serialized below this layer.
pub trait CommandChannel: Send + Sync {
    /// Run `argv` in `container` on `host`. A non-zero exit is not a
    /// channel error; it is reported through `exit_code`.
    fn exec<'a>(
        &'a self,
        host: &'a HostIdentity,
        container: &'a str,
        argv: &'a [String],
    ) -> BoxFuture<'a, Result<CommandOutput, ChannelError>>;

    /// Fetch the tool's configuration file from `host`.
    fn dump_config<'a>(
        &'a self,
        host: &'a HostIdentity,
    ) -> BoxFuture<'a, Result<String, ChannelError>>;
}

/// Process backend settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSettings {
    pub admintools_path: String,
    pub container: String,
    /// Dump `admintools.conf` around every command
    pub dev_mode: bool,
    /// Dumps longer than this are truncated before logging
    pub dump_max_bytes: usize,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            admintools_path: DEFAULT_ADMINTOOLS_PATH.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            dev_mode: false,
            dump_max_bytes: DEFAULT_DUMP_MAX_BYTES,
        }
    }
}

/// Format `admintools -t db_add_node` for the given options.
pub fn admintools_add_node_argv(admintools_path: &str, options: &AddNodeOptions) -> Vec<String> {
    let mut argv = vec![
        admintools_path.to_string(),
        "-t".to_string(),
        "db_add_node".to_string(),
        format!("--hosts={}", options.database.raw_hosts.join(",")),
        format!("--database={}", options.database.name),
    ];
    if options.database.is_eon {
        if let Some(subcluster) = &options.subcluster_name {
            argv.push(format!("--subcluster={}", subcluster));
        }
    }
    argv.push("--noprompts".to_string());
    argv
}

/// Backend that runs `admintools` on the initiator.
pub struct ProcessBackend {
    channel: Arc<dyn CommandChannel>,
    settings: ProcessSettings,
    log: Arc<dyn LogSink>,
}

impl ProcessBackend {
    pub fn new(
        channel: Arc<dyn CommandChannel>,
        settings: ProcessSettings,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            channel,
            settings,
            log,
        }
    }

    pub fn settings(&self) -> &ProcessSettings {
        &self.settings
    }

    /// Run a command on `initiator` and return its stdout.
    ///
    /// Order: pre-dump (dev mode), command, post-dump (dev mode). The
    /// post-dump is skipped when the command was cancelled, since the
    /// context it would run under is already spent.
    /// A non-zero exit or transport failure becomes a process backend error
    /// that keeps the captured stdout and stderr.
    pub async fn exec_admintools(
        &self,
        ctx: &CallContext,
        initiator: &HostIdentity,
        argv: &[String],
    ) -> MutationResult<String> {
        ctx.check()?;

        if self.settings.dev_mode {
            self.dump_config(ctx, initiator, "before").await;
        }

        let result = ctx
            .run(async {
                self.channel
                    .exec(initiator, &self.settings.container, argv)
                    .await
                    .map_err(|e| MutationError::backend(BackendKind::Process, e.to_string()))
            })
            .await;

        if self.settings.dev_mode {
            match &result {
                Err(e) if e.is_cancelled() => {
                    let host = initiator.to_string();
                    let reason = e.to_string();
                    self.log.warn(
                        "ADMINTOOLS_CONF_DUMP_SKIPPED",
                        &[
                            ("host", host.as_str()),
                            ("phase", "after"),
                            ("reason", reason.as_str()),
                        ],
                    );
                }
                _ => self.dump_config(ctx, initiator, "after").await,
            }
        }

        let output = result?;
        if output.exit_code != 0 {
            let command = argv.get(1..).map(|a| a.join(" ")).unwrap_or_default();
            return Err(MutationError::backend_with_output(
                BackendKind::Process,
                format!("'{}' exited with status {}", command, output.exit_code),
                output.stdout,
                output.stderr,
            ));
        }
        Ok(output.stdout)
    }

    async fn dump_config(&self, ctx: &CallContext, host: &HostIdentity, phase: &str) {
        let host_name = host.to_string();
        let dump = ctx
            .run(async {
                self.channel
                    .dump_config(host)
                    .await
                    .map_err(|e| MutationError::backend(BackendKind::Process, e.to_string()))
            })
            .await;

        match dump {
            Ok(contents) => {
                let (contents, truncated) = truncate(&contents, self.settings.dump_max_bytes);
                self.log.info(
                    "ADMINTOOLS_CONF_DUMP",
                    &[
                        ("host", host_name.as_str()),
                        ("phase", phase),
                        ("contents", contents),
                        ("truncated", if truncated { "true" } else { "false" }),
                    ],
                );
            }
            Err(e) => {
                let error = e.to_string();
                self.log.warn(
                    "ADMINTOOLS_CONF_DUMP_FAILED",
                    &[
                        ("host", host_name.as_str()),
                        ("phase", phase),
                        ("error", error.as_str()),
                    ],
                );
            }
        }
    }
}

/// Cut `s` to at most `max` bytes on a char boundary.
fn truncate(s: &str, max: usize) -> (&str, bool) {
    if s.len() <= max {
        return (s, false);
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    (&s[..end], true)
}

impl MutationBackend for ProcessBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Process
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a CallContext,
        options: &'a AddNodeOptions,
    ) -> BoxFuture<'a, MutationResult<ExecutionOutcome>> {
        Box::pin(async move {
            ctx.check()?;
            let initiator = options.initiator_name.as_ref().ok_or_else(|| {
                MutationError::invalid_request(
                    "process backend requires the initiator host identity",
                )
            })?;

            let argv = admintools_add_node_argv(&self.settings.admintools_path, options);
            let attempt = ctx.attempt_id().to_string();
            let host = initiator.to_string();
            let command = argv.join(" ");
            self.log.info(
                "ADD_NODE_STARTED",
                &[
                    ("attempt", attempt.as_str()),
                    ("backend", BackendKind::Process.as_str()),
                    ("initiator", host.as_str()),
                    ("command", command.as_str()),
                ],
            );

            let stdout = self.exec_admintools(ctx, initiator, &argv).await?;
            Ok(ExecutionOutcome::CommandOutput { stdout })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DatabaseOptions;

    fn options(eon: bool) -> AddNodeOptions {
        AddNodeOptions {
            bootstrap_host: "10.244.1.7".into(),
            initiator_name: Some(HostIdentity::new("vertica", "db-sc1-0")),
            subcluster_name: Some("sc1".into()),
            database: DatabaseOptions {
                name: "vertdb".into(),
                raw_hosts: vec!["10.244.1.9".into(), "10.244.1.10".into()],
                ipv6: false,
                catalog_prefix: "/catalog".into(),
                data_prefix: "/data".into(),
                config_directory: None,
                depot_prefix: None,
                is_eon: eon,
                user_name: "dbadmin".into(),
                credentials: None,
                log_path: None,
                honor_user_input: true,
            },
        }
    }

    #[test]
    fn test_eon_argv_includes_subcluster() {
        let argv = admintools_add_node_argv(DEFAULT_ADMINTOOLS_PATH, &options(true));
        assert_eq!(
            argv,
            vec![
                "/opt/vertica/bin/admintools",
                "-t",
                "db_add_node",
                "--hosts=10.244.1.9,10.244.1.10",
                "--database=vertdb",
                "--subcluster=sc1",
                "--noprompts",
            ]
        );
    }

    #[test]
    fn test_enterprise_argv_omits_subcluster() {
        let argv = admintools_add_node_argv("admintools", &options(false));
        assert!(!argv.iter().any(|a| a.starts_with("--subcluster")));
        assert_eq!(argv.last().map(String::as_str), Some("--noprompts"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        assert_eq!(truncate("abc", 10), ("abc", false));
        assert_eq!(truncate("abcdef", 3), ("abc", true));
        // 'é' is two bytes; cutting inside it backs off
        assert_eq!(truncate("aé", 2), ("a", true));
    }

    #[test]
    fn test_default_settings() {
        let settings = ProcessSettings::default();
        assert!(!settings.dev_mode);
        assert_eq!(settings.container, "server");
        assert_eq!(settings.admintools_path, DEFAULT_ADMINTOOLS_PATH);
    }
}
