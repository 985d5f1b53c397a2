//! Shell commands as pipeline steps, and step lists loaded from TOML

use super::progress::{Progress, ProgressFactory, ProgressUpdate};
use super::runner::{PipelinedToolRunner, ToolRunner};
use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::process::{CommandExecution, ExecuteOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Runs one command line; non-zero exit and cancellation fail the step
pub struct CommandStep {
    description: String,
    options: ExecuteOptions,
}

impl CommandStep {
    pub fn new(description: impl Into<String>, options: ExecuteOptions) -> Self {
        Self {
            description: description.into(),
            options: options.error_on_non_zero_exit().error_on_cancellation(),
        }
    }
}

#[async_trait]
impl ToolRunner for CommandStep {
    fn description(&self) -> String {
        self.description.clone()
    }

    async fn run(&self, progress: &dyn Progress) -> Result<()> {
        progress.report(ProgressUpdate::message(format!("$ {}", self.options.command)));
        let result = CommandExecution::execute(self.options.clone()).await?;
        for line in result.stdout.lines().filter(|line| !line.trim().is_empty()) {
            progress.report(ProgressUpdate::message(line));
        }
        Ok(())
    }
}

/// Step list file
///
/// ```toml
/// continue_on_error = false
/// weights = [70.0, 30.0]
///
/// [[steps]]
/// description = "Explore"
/// command = "discopop_explorer"
/// working_directory = ".discopop"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelinePlan {
    pub continue_on_error: bool,
    pub weights: Option<Vec<f64>>,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub description: String,
    pub command: String,
    /// Relative paths resolve against the plan file's directory
    #[serde(default)]
    pub working_directory: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl PipelinePlan {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Turn the plan into a runner; `base` anchors relative working directories
    pub fn into_runner(
        self,
        base: &Path,
        inner_progress: impl ProgressFactory + 'static,
        token: Option<CancelToken>,
        kill_grace: std::time::Duration,
    ) -> Result<PipelinedToolRunner> {
        let steps = self
            .steps
            .into_iter()
            .map(|step| {
                let working_directory = match step.working_directory {
                    Some(dir) if dir.is_absolute() => dir,
                    Some(dir) => base.join(dir),
                    None => base.to_path_buf(),
                };
                let options = ExecuteOptions::new(step.command, working_directory)
                    .envs(step.env)
                    .cancel_token(token.clone())
                    .kill_grace(kill_grace);
                Box::new(CommandStep::new(step.description, options)) as Box<dyn ToolRunner>
            })
            .collect();

        PipelinedToolRunner::new(steps, inner_progress, self.weights, self.continue_on_error)
    }
}
