//! External command execution
//!
//! Runs one shell command line to completion or cancellation and normalizes
//! the outcome into an [`ExecutionResult`] or a typed [`Error`](crate::Error).

pub mod command;
pub mod lookup;

pub use command::{CommandExecution, ExecuteOptions, ExecutionResult};
pub use lookup::command_exists;
