use crate::cli::app::StepsArgs;
use crate::cli::{TerminalUi, cancel_on_interrupt};
use anyhow::{Result, bail};
use discopop_runner_core::RunnerConfig;
use discopop_runner_core::pipeline::{NestedProgressFactory, PipelinePlan};
use std::path::Path;
use tracing::{error, info};

pub async fn execute(args: StepsArgs, config: RunnerConfig) -> Result<()> {
    let mut plan = PipelinePlan::from_file(&args.file)?;
    plan.continue_on_error |= args.continue_on_error;
    let base = args.file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let token = cancel_on_interrupt();
    let runner = plan.into_runner(
        base,
        NestedProgressFactory,
        Some(token),
        config.execution.kill_grace_period(),
    )?;
    info!("Running {} step(s) from {}", runner.len(), args.file.display());

    let ui = TerminalUi::new(true);
    let report = match runner.run(&ui).await {
        Ok(report) => report,
        Err(e) if e.is_cancellation() => {
            ui.abandon("Cancelled");
            info!("{}", e);
            return Ok(());
        }
        Err(e) => {
            ui.abandon("Failed");
            return Err(e.into());
        }
    };

    if report.is_success() {
        ui.finish("Done");
        return Ok(());
    }
    ui.abandon("Failed");
    for failure in &report.failures {
        error!("Step {} ({}) failed: {}", failure.index + 1, failure.description, failure.error);
    }
    bail!("{} of {} step(s) failed", report.failures.len(), runner.len())
}
