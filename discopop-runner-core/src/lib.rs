//! Core functionality for discopop-runner
//!
//! This crate drives the DiscoPoP toolchain: it runs external commands with
//! cooperative cancellation, builds and profiles instrumented CMake projects,
//! invokes the analysis tools and merges their file-based results into one
//! queryable model.

pub mod cancel;
pub mod config;
pub mod error;
pub mod instrumentation;
pub mod pipeline;
pub mod process;
pub mod results;
pub mod tools;
pub mod workflow;

pub use cancel::{CancelToken, ListenerId};
pub use config::RunnerConfig;
pub use error::{Error, Result};
pub use instrumentation::{CMakeInstrumentation, ProjectInfo};
pub use pipeline::{PipelinedToolRunner, ToolRunner};
pub use process::{CommandExecution, ExecuteOptions, ExecutionResult};
pub use results::{CombinedHotspot, CombinedSuggestion, ResultArtifact, ResultManager};
pub use tools::ToolSuite;
pub use workflow::{DiscoPoPWorkflow, HotspotWorkflow, OptimizerWorkflow, PhaseWeights, WorkflowUi};
