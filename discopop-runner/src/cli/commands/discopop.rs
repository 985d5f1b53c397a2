use crate::cli::app::InstrumentArgs;
use crate::cli::{TerminalUi, cancel_on_interrupt, finish_workflow};
use anyhow::Result;
use discopop_runner_core::{DiscoPoPWorkflow, RunnerConfig};

pub async fn execute(args: InstrumentArgs, mut config: RunnerConfig) -> Result<()> {
    config.workflow.skip_overwrite_confirmation |= args.yes;
    let workflow = DiscoPoPWorkflow::new(args.project(), args.dot(), config);

    let token = cancel_on_interrupt();
    let ui = TerminalUi::new(false).with_cancel_token(token.clone());
    let outcome = workflow.run(&ui, &token).await;

    if let Some(results) = finish_workflow(&ui, outcome)? {
        super::results::print_results(&results, false)?;
    }
    Ok(())
}
