use clap::Parser;

use crate::cmd::Commands;

/// Simple, file-backed task tracker.
/// Tasks are kept in ./tasks.json.
///
/// Help is the `help` command rather than a flag, and unknown command names are
/// captured so the dispatcher can answer them itself.
#[derive(Parser, Debug)]
#[command(
    name = "task-cli",
    about = "Track short text tasks from the command line",
    disable_help_flag = true,
    disable_help_subcommand = true,
    allow_external_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}
