//! Command implementations for the CLI interface.
//!
//! Each invocation is independent: arguments are validated first, then the
//! collection is loaded, changed in memory, and saved back whole. A command
//! that is rejected never reaches `save`.

use std::ffi::OsString;
use std::io::Write;
use std::str::FromStr;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::db::{print_tasks, TaskStore};
use crate::error::CommandError;
use crate::fields::Status;
use crate::task::now;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task.
    #[command(disable_help_flag = true)]
    Add {
        /// Task description; words are joined with single spaces.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Replace the description of a task.
    #[command(disable_help_flag = true)]
    Update {
        /// Task ID followed by the new description.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Delete a task by ID.
    #[command(disable_help_flag = true)]
    Delete {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Mark a task in-progress.
    #[command(disable_help_flag = true)]
    MarkInProgress {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Mark a task done.
    #[command(disable_help_flag = true)]
    MarkDone {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List tasks, optionally only those with one status.
    #[command(disable_help_flag = true)]
    List {
        /// todo | in-progress | done
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show usage.
    #[command(disable_help_flag = true)]
    Help {
        /// Ignored.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Generate a shell completion script.
    #[command(disable_help_flag = true)]
    Completions {
        /// bash | elvish | fish | powershell | zsh
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(external_subcommand)]
    External(Vec<String>),
}

pub const USAGE: &str = "\
Usage: task-cli <command> [arguments]

  add \"task description\"
  update <id> \"new description\"
  delete <id>
  mark-in-progress <id>
  mark-done <id>
  list [todo|in-progress|done]
  completions <shell>
  help";

/// Bootstrap the task file, parse `argv`, run the command and report any
/// failure. Returns the process exit code.
pub fn run<I, T, W, E>(argv: I, store: &TaskStore, out: &mut W, err_out: &mut E) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    let result = store
        .ensure_exists()
        .map_err(CommandError::from)
        .and_then(|()| match Cli::try_parse_from(argv) {
            Ok(cli) => dispatch(cli.command, store, out),
            // Every subcommand accepts free-form arguments, so clap only
            // rejects input that does not name a command at all.
            Err(e) => Err(CommandError::UnknownCommand(format!("{:?}", e.kind()))),
        });

    match result {
        Ok(()) => 0,
        Err(e) => report(&e, out, err_out),
    }
}

/// Validate the arguments of `command` and run it against `store`.
pub fn dispatch<W: Write>(
    command: Option<Commands>,
    store: &TaskStore,
    out: &mut W,
) -> Result<(), CommandError> {
    match command {
        None | Some(Commands::Help { .. }) => {
            writeln!(out, "{USAGE}")?;
            Ok(())
        }
        Some(Commands::Add { args }) => {
            let description = join_description(&args)?;
            cmd_add(store, out, description)
        }
        Some(Commands::Update { args }) => {
            let args = require(&args, 2, "update")?;
            let id = parse_id(&args[0])?;
            let description = join_description(&args[1..])?;
            cmd_update(store, out, id.known()?, description)
        }
        Some(Commands::Delete { args }) => {
            let args = require(&args, 1, "delete")?;
            cmd_delete(store, out, parse_id(&args[0])?.known()?)
        }
        Some(Commands::MarkInProgress { args }) => {
            let args = require(&args, 1, "mark-in-progress")?;
            cmd_mark(store, out, parse_id(&args[0])?.known()?, Status::InProgress)
        }
        Some(Commands::MarkDone { args }) => {
            let args = require(&args, 1, "mark-done")?;
            cmd_mark(store, out, parse_id(&args[0])?.known()?, Status::Done)
        }
        Some(Commands::List { args }) => {
            let filter = args.first().map(|s| s.parse::<Status>()).transpose()?;
            cmd_list(store, out, filter)
        }
        Some(Commands::Completions { args }) => {
            let args = require(&args, 1, "completions")?;
            let shell = Shell::from_str(&args[0])
                .map_err(|_| CommandError::InvalidShell(args[0].clone()))?;
            cmd_completions(out, shell)
        }
        Some(Commands::External(args)) => Err(CommandError::UnknownCommand(
            args.into_iter().next().unwrap_or_default(),
        )),
    }
}

/// Print a failure: user-input rejections go to `out` like any other command
/// output, storage failures go to `err_out`. Returns the exit code.
pub fn report<W: Write, E: Write>(err: &CommandError, out: &mut W, err_out: &mut E) -> u8 {
    if err.is_user_error() {
        let _ = writeln!(out, "{err}");
        if err.shows_usage() {
            let _ = writeln!(out, "{USAGE}");
        }
    } else {
        debug!(error = ?err, "command failed");
        let _ = writeln!(err_out, "Error: {err}");
    }
    err.exit_code()
}

/// Add a new task to the task file.
pub fn cmd_add<W: Write>(store: &TaskStore, out: &mut W, description: String) -> Result<(), CommandError> {
    let mut list = store.load()?;
    let Some(id) = list.add(description, now()) else {
        return Err(CommandError::IdsExhausted);
    };
    store.save(&list)?;
    info!(id, "task added");
    writeln!(out, "Task added (id: {id})")?;
    Ok(())
}

/// Replace a task's description.
pub fn cmd_update<W: Write>(
    store: &TaskStore,
    out: &mut W,
    id: u64,
    description: String,
) -> Result<(), CommandError> {
    let mut list = store.load()?;
    let Some(task) = list.get_mut(id) else {
        return Err(CommandError::NotFound(id.to_string()));
    };
    task.set_description(description, now());
    store.save(&list)?;
    info!(id, "task updated");
    writeln!(out, "Task {id} updated")?;
    Ok(())
}

/// Delete a task permanently.
pub fn cmd_delete<W: Write>(store: &TaskStore, out: &mut W, id: u64) -> Result<(), CommandError> {
    let mut list = store.load()?;
    list.remove(id).ok_or(CommandError::NotFound(id.to_string()))?;
    store.save(&list)?;
    info!(id, "task deleted");
    writeln!(out, "Task {id} deleted")?;
    Ok(())
}

/// Set a task's status.
pub fn cmd_mark<W: Write>(
    store: &TaskStore,
    out: &mut W,
    id: u64,
    status: Status,
) -> Result<(), CommandError> {
    let mut list = store.load()?;
    let Some(task) = list.get_mut(id) else {
        return Err(CommandError::NotFound(id.to_string()));
    };
    task.set_status(status, now());
    store.save(&list)?;
    info!(id, %status, "task status changed");
    writeln!(out, "Task {id} marked as {status}")?;
    Ok(())
}

/// List tasks in storage order.
pub fn cmd_list<W: Write>(store: &TaskStore, out: &mut W, filter: Option<Status>) -> Result<(), CommandError> {
    let list = store.load()?;
    print_tasks(out, list.filter(filter))?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions<W: Write>(out: &mut W, shell: Shell) -> Result<(), CommandError> {
    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, out);
    Ok(())
}

fn require<'a>(args: &'a [String], n: usize, command: &'static str) -> Result<&'a [String], CommandError> {
    if args.len() < n {
        return Err(CommandError::MissingArguments { command });
    }
    Ok(args)
}

/// An integer id argument.
#[derive(Debug, PartialEq, Eq)]
enum TaskRef {
    Id(u64),
    /// Negative or past `u64::MAX`; kept in canonical decimal form.
    OutOfRange(String),
}

impl TaskRef {
    /// The id, or `NotFound` for integers no task can carry.
    fn known(self) -> Result<u64, CommandError> {
        match self {
            TaskRef::Id(id) => Ok(id),
            TaskRef::OutOfRange(text) => Err(CommandError::NotFound(text)),
        }
    }
}

/// Parse a signed decimal integer of any size. Only non-integers are rejected.
fn parse_id(arg: &str) -> Result<TaskRef, CommandError> {
    let trimmed = arg.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::InvalidId(arg.to_string()));
    }

    let digits = match digits.trim_start_matches('0') {
        "" => "0",
        rest => rest,
    };
    if negative && digits != "0" {
        return Ok(TaskRef::OutOfRange(format!("-{digits}")));
    }
    Ok(match digits.parse::<u64>() {
        Ok(id) => TaskRef::Id(id),
        Err(_) => TaskRef::OutOfRange(digits.to_string()),
    })
}

fn join_description(words: &[String]) -> Result<String, CommandError> {
    let description = words.join(" ").trim().to_string();
    if description.is_empty() {
        return Err(CommandError::EmptyDescription);
    }
    Ok(description)
}
