//! DiscoPoP, hotspot-detection and optimizer workflows
//!
//! Each workflow is a fixed sequence of phases. Cancellation is checked at
//! every phase boundary and, while a command runs, enforced by terminating
//! it. Progress is reported as increments that add up to 100 on success.
//! No two workflows may share a result directory at the same time.

pub mod discopop;
pub mod hotspot;
pub mod optimizer;


pub use discopop::DiscoPoPWorkflow;
pub use hotspot::HotspotWorkflow;
pub use optimizer::OptimizerWorkflow;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::instrumentation::CMakeInstrumentation;
use crate::results::ResultManager;
use async_trait::async_trait;
use std::path::Path;

/// The caller's side of a running workflow
#[async_trait]
pub trait WorkflowUi: Send + Sync {
    /// Nesting 0 is a phase change, anything deeper is detail
    fn report_message(&self, message: &str, nesting: u8);

    /// Percentage points to add to the caller's running total
    fn report_progress(&self, increment: f64);

    /// Asked at most once per run, before the build directory is wiped
    async fn request_confirmation(&self, message: &str) -> bool;
}

/// Share of the total progress granted to each phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWeights {
    pub prepare: f64,
    pub cmake: f64,
    pub make: f64,
    pub instrumentation: f64,
    pub analysis: f64,
    pub patch_generation: f64,
    pub parsing: f64,
}

impl PhaseWeights {
    pub const DISCOPOP: PhaseWeights = PhaseWeights {
        prepare: 5.0,
        cmake: 10.0,
        make: 10.0,
        instrumentation: 30.0,
        analysis: 30.0,
        patch_generation: 10.0,
        parsing: 5.0,
    };

    /// Same split as DiscoPoP; the patch share is reported without a phase
    pub const HOTSPOT: PhaseWeights = PhaseWeights::DISCOPOP;

    /// No instrumentation; analysis is the optimizer run
    pub const OPTIMIZER: PhaseWeights = PhaseWeights {
        prepare: 0.0,
        cmake: 0.0,
        make: 0.0,
        instrumentation: 0.0,
        analysis: 80.0,
        patch_generation: 10.0,
        parsing: 10.0,
    };

    pub fn total(&self) -> f64 {
        self.prepare
            + self.cmake
            + self.make
            + self.instrumentation
            + self.analysis
            + self.patch_generation
            + self.parsing
    }
}

/// Confirm, prepare, configure, build and run the instrumented executable
pub(crate) async fn instrument(
    instrumentation: &CMakeInstrumentation,
    weights: &PhaseWeights,
    skip_confirmation: bool,
    ui: &dyn WorkflowUi,
    token: &CancelToken,
) -> Result<()> {
    let build = &instrumentation.project().build_directory;
    if build.exists() && !skip_confirmation {
        let question = format!(
            "The build directory {} already exists and will be deleted. Continue?",
            build.display()
        );
        if !ui.request_confirmation(&question).await {
            return Err(Error::cancelled(format!(
                "overwriting {} was declined",
                build.display()
            )));
        }
    }
    token.check("preparing the build directory")?;

    ui.report_message("Preparing the build directory", 0);
    ui.report_message(&build.display().to_string(), 1);
    instrumentation.prepare_build_directory()?;
    ui.report_progress(weights.prepare);

    ui.report_message("Configuring with CMake", 0);
    instrumentation.run_cmake(token).await?;
    ui.report_progress(weights.cmake);

    ui.report_message("Building the instrumented executable", 0);
    instrumentation.run_make(token).await?;
    ui.report_progress(weights.make);

    ui.report_message("Running the instrumented executable", 0);
    let runs = instrumentation.runs();
    let share = weights.instrumentation / runs.len() as f64;
    for (index, arguments) in runs.iter().enumerate() {
        ui.report_message(&format!("Run {}/{}: {:?}", index + 1, runs.len(), arguments), 1);
        instrumentation.run_executable(arguments, token).await?;
        ui.report_progress(share);
    }

    Ok(())
}

/// Final phase of every workflow
pub(crate) fn parse_results(
    dot_discopop: &Path,
    weight: f64,
    ui: &dyn WorkflowUi,
    token: &CancelToken,
) -> Result<ResultManager> {
    token.check("parsing the results")?;

    ui.report_message("Parsing the results", 0);
    let results = ResultManager::new(dot_discopop);
    for (artifact, error) in results.errors() {
        ui.report_message(&format!("{artifact}: {error}"), 1);
    }
    ui.report_progress(weight);
    Ok(results)
}
