//! Error types for workflow orchestration
//!
//! Parse failures of result artifacts are not represented here: they are
//! captured inside each artifact and queried through `valid()`/`error()`.

use std::io;
use thiserror::Error;

/// Main error type for commands, tools, instrumentation and workflows
#[derive(Debug, Error)]
pub enum Error {
    /// The operation was aborted through a cancel token or a declined confirmation
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// An external command exited with a non-zero code
    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    NonZeroExit { command: String, code: i32, stdout: String, stderr: String },

    /// The command could not be started at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Cancellation was requested but the process could not be terminated
    #[error("Process {pid:?} running `{command}` could not be terminated: {reason}")]
    Unkillable { command: String, pid: Option<u32>, reason: String },

    /// A required binary is not resolvable
    #[error("Command `{name}` not found. {hint}")]
    CommandNotFound { name: String, hint: String },

    /// A precondition was violated before any destructive action took place
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A pipelined runner was assembled inconsistently
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// Settings could not be read or written
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Cancellation is informational and should not be styled as a failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub(crate) fn cancelled(what: impl Into<String>) -> Self {
        Error::Cancelled(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
