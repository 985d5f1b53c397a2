//! Re-run of the optimizer over an existing DiscoPoP result directory

use super::{PhaseWeights, WorkflowUi, parse_results};
use crate::cancel::CancelToken;
use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::results::ResultManager;
use crate::tools::{OptimizerArguments, PatchGeneratorOptions, ToolSuite};
use std::path::PathBuf;
use tracing::info;

/// Needs the output of an earlier DiscoPoP run; builds nothing
pub struct OptimizerWorkflow {
    dot_discopop: PathBuf,
    config: RunnerConfig,
    arguments: OptimizerArguments,
}

impl OptimizerWorkflow {
    pub fn new(
        dot_discopop: impl Into<PathBuf>,
        config: RunnerConfig,
        arguments: OptimizerArguments,
    ) -> Self {
        Self { dot_discopop: dot_discopop.into(), config, arguments }
    }

    pub async fn run(&self, ui: &dyn WorkflowUi, token: &CancelToken) -> Result<ResultManager> {
        if !self.dot_discopop.is_dir() {
            return Err(Error::Precondition(format!(
                "{} does not exist, run the DiscoPoP workflow first",
                self.dot_discopop.display()
            )));
        }
        let weights = PhaseWeights::OPTIMIZER;
        let tools = ToolSuite::new(&self.dot_discopop, &self.config);
        info!("Optimizer workflow in {}", self.dot_discopop.display());

        token.check("the optimizer")?;
        ui.report_message("Running the optimizer", 0);
        tools.optimizer().run(&self.arguments, Some(token)).await?;
        ui.report_progress(weights.analysis);

        token.check("patch generation")?;
        ui.report_message("Generating patches", 0);
        let options =
            PatchGeneratorOptions { only_optimizer_output_patterns: true, ..Default::default() };
        tools.patch_generator().run(&options, Some(token)).await?;
        ui.report_progress(weights.patch_generation);

        parse_results(&self.dot_discopop, weights.parsing, ui, token)
    }
}
