//! Error types for the store and the command dispatcher.
//!
//! `CommandError` renders as the exact message shown to the user, so the
//! dispatcher only needs to print it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or write the task file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access task file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("task file {} is corrupt: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("task file {} is corrupt: task id {id} appears more than once", .path.display())]
    DuplicateId { path: PathBuf, id: u64 },

    #[error("failed to serialise tasks: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }
}

/// A status string outside `todo`, `in-progress`, `done`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status '{0}'")]
pub struct StatusParseError(pub String);

/// Everything a single command can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing arguments for {command}.")]
    MissingArguments { command: &'static str },

    #[error("Invalid task ID. It must be an integer.")]
    InvalidId(String),

    #[error("Enter a description")]
    EmptyDescription,

    #[error("Task {0} not found")]
    NotFound(String),

    #[error("Invalid status. Status must be one of: todo, in-progress, done")]
    InvalidStatus(String),

    #[error("Unknown shell '{0}'. Use one of: bash, elvish, fish, powershell, zsh")]
    InvalidShell(String),

    #[error("Unknown command")]
    UnknownCommand(String),

    #[error("no task ids left: the largest id is already {}", u64::MAX)]
    IdsExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl From<StatusParseError> for CommandError {
    fn from(err: StatusParseError) -> Self {
        CommandError::InvalidStatus(err.0)
    }
}

impl CommandError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            CommandError::NotFound(_) => 1,
            CommandError::MissingArguments { .. }
            | CommandError::InvalidId(_)
            | CommandError::EmptyDescription
            | CommandError::InvalidStatus(_)
            | CommandError::InvalidShell(_)
            | CommandError::UnknownCommand(_) => 2,
            CommandError::IdsExhausted | CommandError::Store(_) | CommandError::Output(_) => 3,
        }
    }

    /// Whether the usage text follows the message.
    pub fn shows_usage(&self) -> bool {
        matches!(
            self,
            CommandError::MissingArguments { .. } | CommandError::UnknownCommand(_)
        )
    }

    /// Rejections of user input are reported on stdout; anything else is fatal.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            CommandError::IdsExhausted | CommandError::Store(_) | CommandError::Output(_)
        )
    }
}
