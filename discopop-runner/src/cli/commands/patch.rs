use crate::cli::app::{PatchAction, PatchArgs};
use crate::cli::cancel_on_interrupt;
use anyhow::{Result, bail};
use discopop_runner_core::RunnerConfig;
use discopop_runner_core::ToolSuite;
use discopop_runner_core::results::{AppliedStatus, ResultArtifact};
use discopop_runner_core::tools::ApplicatorStatus;
use tracing::info;

pub async fn execute(args: PatchArgs, config: RunnerConfig) -> Result<()> {
    let token = cancel_on_interrupt();
    let tools = ToolSuite::new(&args.dot, &config);
    let applicator = tools.patch_applicator();

    let outcome = match &args.action {
        PatchAction::Apply { ids } => applicator.apply(ids, Some(&token)).await?,
        PatchAction::Rollback { ids } => applicator.rollback(ids, Some(&token)).await?,
        PatchAction::Clear => applicator.clear(Some(&token)).await?,
        PatchAction::Load => applicator.load(Some(&token)).await?,
        PatchAction::List => applicator.list(Some(&token)).await?,
    };

    if !outcome.stdout.is_empty() {
        println!("{}", outcome.stdout);
    }
    match outcome.status() {
        ApplicatorStatus::Success => {}
        ApplicatorStatus::NothingToDo => info!("Nothing to do"),
        ApplicatorStatus::Failed(code) => {
            bail!("Patch applicator exited with code {}: {}", code, outcome.stderr)
        }
    }

    let status = AppliedStatus::new(&args.dot);
    match status.error() {
        None => {
            let applied: Vec<String> = status.applied().iter().map(u64::to_string).collect();
            println!("Applied suggestions: [{}]", applied.join(", "));
        }
        Some(e) => info!("No applied status available: {}", e),
    }
    Ok(())
}
