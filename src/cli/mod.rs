//! CLI module for vadmin
//!
//! Provides command-line interface for:
//! - add-node: run one add-node attempt and print the outcome
//! - show-options: print the options a backend would receive

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, RequestArgs};
pub use commands::{add_node, run, run_command, show_options};
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
