//! # task-cli - command-line task tracker
//!
//! Add, update, delete, mark and list short text tasks. Tasks live in
//! `tasks.json` in the working directory, which is created on first run.
//!
//! ## Quick Start
//!
//! ```bash
//! task-cli add "Write the release notes"
//! task-cli mark-in-progress 1
//! task-cli list in-progress
//! task-cli mark-done 1
//! task-cli delete 1
//! ```
//!
//! Every invocation reads the whole file, applies at most one change and writes
//! the whole file back. Running two invocations against the same file at the
//! same time can lose an update; the tool is meant for one user at a prompt.
//!
//! ## Exit codes
//!
//! - `0` success
//! - `1` the referenced task does not exist
//! - `2` the arguments were rejected
//! - `3` the task file could not be read or written (including a corrupt file,
//!   which is left untouched)
//!
//! Diagnostics go to stderr and are controlled by `RUST_LOG` (default `warn`).

use std::io;
use std::process::ExitCode;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod logging;
pub mod task;

use config::Config;
use db::TaskStore;

fn main() -> ExitCode {
    let config = Config::default();

    if let Err(e) = logging::init(&config.log_filter) {
        eprintln!("Failed to initialise logging: {e}");
    }

    let store = TaskStore::new(config.data_file.clone());
    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();

    let code = cmd::run(std::env::args_os(), &store, &mut out, &mut err);
    ExitCode::from(code)
}
