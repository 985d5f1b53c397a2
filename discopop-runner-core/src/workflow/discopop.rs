//! Full DiscoPoP analysis of a CMake project

use super::{PhaseWeights, WorkflowUi, instrument, parse_results};
use crate::cancel::CancelToken;
use crate::config::RunnerConfig;
use crate::error::Result;
use crate::instrumentation::{CMakeInstrumentation, ProjectInfo, ProvidedWrapper};
use crate::results::ResultManager;
use crate::tools::{ExplorerOptions, PatchGeneratorOptions, ToolSuite, WrapperKind};
use std::path::PathBuf;
use tracing::info;

/// Instrument, profile, explore, generate patches, parse
pub struct DiscoPoPWorkflow {
    project: ProjectInfo,
    dot_discopop: PathBuf,
    config: RunnerConfig,
    explorer_options: ExplorerOptions,
    patch_generator_options: PatchGeneratorOptions,
}

impl DiscoPoPWorkflow {
    pub fn new(project: ProjectInfo, dot_discopop: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        Self {
            project,
            dot_discopop: dot_discopop.into(),
            config,
            explorer_options: ExplorerOptions::default(),
            patch_generator_options: PatchGeneratorOptions::default(),
        }
    }

    pub fn with_explorer_options(mut self, options: ExplorerOptions) -> Self {
        self.explorer_options = options;
        self
    }

    pub fn with_patch_generator_options(mut self, options: PatchGeneratorOptions) -> Self {
        self.patch_generator_options = options;
        self
    }

    pub async fn run(&self, ui: &dyn WorkflowUi, token: &CancelToken) -> Result<ResultManager> {
        let weights = PhaseWeights::DISCOPOP;
        let tools = ToolSuite::new(&self.dot_discopop, &self.config);
        let instrumentation = CMakeInstrumentation::new(
            self.project.clone(),
            &self.dot_discopop,
            ProvidedWrapper::new(tools.config_provider(), WrapperKind::DiscoPoP),
            &self.config,
        )?;
        info!(
            "DiscoPoP workflow for {} with results in {}",
            self.project.src_directory.display(),
            self.dot_discopop.display()
        );

        let skip_confirmation = self.config.workflow.skip_overwrite_confirmation;
        instrument(&instrumentation, &weights, skip_confirmation, ui, token).await?;

        token.check("pattern exploration")?;
        ui.report_message("Exploring parallel patterns", 0);
        tools.explorer().run(&self.explorer_options, Some(token)).await?;
        ui.report_progress(weights.analysis);

        token.check("patch generation")?;
        ui.report_message("Generating patches", 0);
        tools.patch_generator().run(&self.patch_generator_options, Some(token)).await?;
        ui.report_progress(weights.patch_generation);

        parse_results(&self.dot_discopop, weights.parsing, ui, token)
    }
}
