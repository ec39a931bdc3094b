//! CLI command implementations
//!
//! Commands are thin: they load configuration, assemble [`ClusterOps`] and
//! run one attempt on a tokio runtime. Ctrl-C cancels the attempt.

use std::sync::Arc;

use serde_json::json;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::config::OpsConfig;
use crate::context::CallContext;
use crate::observability::{JsonLogSink, LogEventSink, LogSink};
use crate::ops::ClusterOps;
use crate::request::{MutationRequest, OperationKind};

use super::args::{Cli, Command, RequestArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::AddNode(args) => add_node(&args),
        Command::ShowOptions(args) => show_options(&args),
    }
}

/// Add hosts to the database
pub fn add_node(args: &RequestArgs) -> CliResult<()> {
    let ops = assemble(args)?;
    let opts = args.request_options()?;

    let rt = runtime()?;
    let outcome = rt.block_on(async {
        let ctx = CallContext::with_cancellation(cancel_on_interrupt());
        ops.add_node(&ctx, opts).await
    });

    match (outcome.outcome, outcome.error) {
        (Some(result), None) => write_response(json!({
            "backend": ops.backend_kind().as_str(),
            "summary": result.summary(),
        })),
        (_, error) => {
            let reason = outcome.reason.unwrap_or_default();
            let message = error.map(|e| e.to_string()).unwrap_or_default();
            write_error(&reason, &message, outcome.requeue)?;
            Err(CliError::MutationFailed {
                reason,
                message,
                requeue: outcome.requeue,
            })
        }
    }
}

/// Print the options the configured backend would receive
pub fn show_options(args: &RequestArgs) -> CliResult<()> {
    let ops = assemble(args)?;
    let request = MutationRequest::new(OperationKind::AddNode, args.request_options()?)?;

    let rt = runtime()?;
    let options = rt.block_on(async {
        let ctx = CallContext::with_cancellation(cancel_on_interrupt());
        ops.build_options(&ctx, &request).await
    })?;

    write_response(json!({
        "backend": ops.backend_kind().as_str(),
        "options": options.redacted_json()?,
    }))
}

fn assemble(args: &RequestArgs) -> CliResult<ClusterOps> {
    let config = OpsConfig::load(&args.config)?;
    let log: Arc<dyn LogSink> = Arc::new(JsonLogSink::default());
    let events = Arc::new(LogEventSink::new(Arc::clone(&log)));
    // no clustering library is linked into the binary
    Ok(ClusterOps::from_config(&config, None, events, log)?)
}

fn runtime() -> CliResult<Runtime> {
    Runtime::new().map_err(|e| CliError::Runtime(format!("failed to create tokio runtime: {}", e)))
}

/// Token cancelled on the first Ctrl-C. Must be called inside a runtime.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}
