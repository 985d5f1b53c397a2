//! Hotspot detection of a CMake project

use super::{PhaseWeights, WorkflowUi, instrument, parse_results};
use crate::cancel::CancelToken;
use crate::config::RunnerConfig;
use crate::error::Result;
use crate::instrumentation::{CMakeInstrumentation, ProjectInfo, ProvidedWrapper};
use crate::results::ResultManager;
use crate::tools::{ToolSuite, WrapperKind};
use std::path::PathBuf;
use tracing::info;

pub struct HotspotWorkflow {
    project: ProjectInfo,
    dot_discopop: PathBuf,
    config: RunnerConfig,
}

impl HotspotWorkflow {
    pub fn new(project: ProjectInfo, dot_discopop: impl Into<PathBuf>, config: RunnerConfig) -> Self {
        Self { project, dot_discopop: dot_discopop.into(), config }
    }

    pub async fn run(&self, ui: &dyn WorkflowUi, token: &CancelToken) -> Result<ResultManager> {
        let weights = PhaseWeights::HOTSPOT;
        let tools = ToolSuite::new(&self.dot_discopop, &self.config);
        let instrumentation = CMakeInstrumentation::new(
            self.project.clone(),
            &self.dot_discopop,
            ProvidedWrapper::new(tools.config_provider(), WrapperKind::HotspotDetection),
            &self.config,
        )?;
        info!("Hotspot detection for {}", self.project.src_directory.display());

        let skip_confirmation = self.config.workflow.skip_overwrite_confirmation;
        instrument(&instrumentation, &weights, skip_confirmation, ui, token).await?;

        token.check("hotspot analysis")?;
        ui.report_message("Analyzing hotspots", 0);
        tools.hotspot_detector().run(Some(token)).await?;
        ui.report_progress(weights.analysis);
        // No patches for hotspots; the increments still total 100
        ui.report_progress(weights.patch_generation);

        parse_results(&self.dot_discopop, weights.parsing, ui, token)
    }
}
