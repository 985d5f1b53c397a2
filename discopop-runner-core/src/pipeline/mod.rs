//! Generic ordered-step executor with weighted progress
//!
//! The concrete workflows are fixed pipelines; this runner expresses
//! arbitrary tool chains as a list of [`ToolRunner`] steps.

pub mod command_step;
pub mod progress;
pub mod runner;

pub use command_step::{CommandStep, PipelinePlan, StepDefinition};
pub use progress::{
    NestedProgress, NestedProgressFactory, Progress, ProgressFactory, ProgressUpdate,
    RecordedProgress, SilentProgress,
};
pub use runner::{PipelineReport, PipelinedToolRunner, StepFailure, ToolRunner, equal_weights};
