pub mod app;
pub mod commands;
pub mod ui;

pub use app::{Cli, Commands};
pub use ui::TerminalUi;

use discopop_runner_core::{CancelToken, Error, ResultManager};
use tracing::{info, warn};

/// A token cancelled by the first Ctrl-C
pub fn cancel_on_interrupt() -> CancelToken {
    let token = CancelToken::new();
    let interrupted = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            interrupted.cancel();
        }
    });
    token
}

/// Close the progress bar; a cancelled run is not a failure
pub fn finish_workflow(
    ui: &TerminalUi,
    outcome: Result<ResultManager, Error>,
) -> anyhow::Result<Option<ResultManager>> {
    match outcome {
        Ok(results) => {
            ui.finish("Done");
            Ok(Some(results))
        }
        Err(e) if e.is_cancellation() => {
            ui.abandon("Cancelled");
            info!("{}", e);
            Ok(None)
        }
        Err(e) => {
            ui.abandon("Failed");
            Err(e.into())
        }
    }
}
