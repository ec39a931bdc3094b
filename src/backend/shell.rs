//! Shell command channel
//!
//! Runs commands through a remote-exec prefix such as
//! `kubectl exec -n {namespace} {name} -c {container} --`. The
//! placeholders are filled per call. An empty prefix runs commands
//! locally, which is what tests use.

use std::process::Stdio;

use tokio::process::Command;

use super::process::{
    ChannelError, CommandChannel, CommandOutput, DEFAULT_ADMINTOOLS_CONF, DEFAULT_CONTAINER,
};
use crate::request::HostIdentity;
use crate::BoxFuture;

/// [`CommandChannel`] backed by `tokio::process`.
///
/// Children are killed when the call future is dropped, so cancelling an
/// attempt aborts the command.
#[derive(Debug, Clone)]
pub struct ShellCommandChannel {
    prefix: Vec<String>,
    config_path: String,
    config_container: String,
}

impl ShellCommandChannel {
    pub fn new(prefix: Vec<String>) -> Self {
        Self {
            prefix,
            config_path: DEFAULT_ADMINTOOLS_CONF.to_string(),
            config_container: DEFAULT_CONTAINER.to_string(),
        }
    }

    /// Run commands on the local machine.
    pub fn local() -> Self {
        Self::new(Vec::new())
    }

    /// Path of the tool's configuration file on the remote host.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Container `dump_config` reads the configuration file from.
    pub fn with_config_container(mut self, container: impl Into<String>) -> Self {
        self.config_container = container.into();
        self
    }

    /// Full command line for `argv` on `host`.
    pub fn command_line(
        &self,
        host: &HostIdentity,
        container: &str,
        argv: &[String],
    ) -> Vec<String> {
        self.prefix
            .iter()
            .map(|part| {
                part.replace("{namespace}", &host.namespace)
                    .replace("{name}", &host.name)
                    .replace("{container}", container)
            })
            .chain(argv.iter().cloned())
            .collect()
    }

    async fn run(&self, line: Vec<String>) -> Result<CommandOutput, ChannelError> {
        let (program, args) = line
            .split_first()
            .ok_or_else(|| ChannelError::Spawn("empty command line".to_string()))?;

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ChannelError::Spawn(format!("{}: {}", program, e)))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

impl CommandChannel for ShellCommandChannel {
    fn exec<'a>(
        &'a self,
        host: &'a HostIdentity,
        container: &'a str,
        argv: &'a [String],
    ) -> BoxFuture<'a, Result<CommandOutput, ChannelError>> {
        Box::pin(async move { self.run(self.command_line(host, container, argv)).await })
    }

    fn dump_config<'a>(
        &'a self,
        host: &'a HostIdentity,
    ) -> BoxFuture<'a, Result<String, ChannelError>> {
        Box::pin(async move {
            let argv = vec!["cat".to_string(), self.config_path.clone()];
            let line = self.command_line(host, &self.config_container, &argv);
            let output = self.run(line).await?;
            if output.exit_code != 0 {
                return Err(ChannelError::NonZeroExit {
                    code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                });
            }
            Ok(output.stdout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn host() -> HostIdentity {
        HostIdentity::new("vertica", "db-sc1-0")
    }

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_placeholders() {
        let channel = ShellCommandChannel::new(argv(&[
            "kubectl", "exec", "-n", "{namespace}", "{name}", "-c", "{container}", "--",
        ]));

        let admin = argv(&["admintools", "-t", "list_allnodes"]);
        let line = channel.command_line(&host(), "server", &admin);

        assert_eq!(
            line,
            argv(&[
                "kubectl", "exec", "-n", "vertica", "db-sc1-0", "-c", "server", "--",
                "admintools", "-t", "list_allnodes",
            ])
        );
    }

    #[tokio::test]
    async fn test_local_exec_captures_stdout() {
        let channel = ShellCommandChannel::local();
        let output = channel
            .exec(&host(), "server", &argv(&["sh", "-c", "echo OK"]))
            .await
            .unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, "OK\n");
    }

    #[tokio::test]
    async fn test_local_exec_reports_exit_code() {
        let channel = ShellCommandChannel::local();
        let output = channel
            .exec(&host(), "server", &argv(&["sh", "-c", "echo partial; echo bad >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout, "partial\n");
        assert_eq!(output.stderr, "bad\n");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let channel = ShellCommandChannel::local();
        let err = channel
            .exec(&host(), "server", &argv(&["/nonexistent/vadmin-test-binary"]))
            .await
            .unwrap_err();

        assert!(matches!(err, ChannelError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_dump_config_reads_file() {
        let dir = tempdir().unwrap();
        let conf = dir.path().join("admintools.conf");
        fs::write(&conf, "[Configuration]\nformat = 3\n").unwrap();

        let channel = ShellCommandChannel::local().with_config_path(conf.to_string_lossy());
        let contents = channel.dump_config(&host()).await.unwrap();

        assert!(contents.contains("format = 3"));
    }

    #[tokio::test]
    async fn test_dump_config_missing_file() {
        let dir = tempdir().unwrap();
        let channel = ShellCommandChannel::local()
            .with_config_path(dir.path().join("missing.conf").to_string_lossy());

        let err = channel.dump_config(&host()).await.unwrap_err();
        assert!(matches!(err, ChannelError::NonZeroExit { .. }));
    }
}
