//! `discopop_patch_applicator`: applies and rolls back generated patches
//!
//! Exit codes are part of this tool's normal vocabulary, so they come back
//! as an [`ApplicatorOutcome`] instead of an error. Only a missing binary,
//! a spawn failure or cancellation is an error.

use super::Tool;
use crate::cancel::CancelToken;
use crate::error::Result;
use crate::process::CommandExecution;
use std::path::Path;
use tracing::{info, warn};

/// Meaning of the applicator's exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicatorStatus {
    Success,
    /// Already applied, already rolled back, or nothing to load
    NothingToDo,
    Failed(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicatorOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ApplicatorOutcome {
    pub fn status(&self) -> ApplicatorStatus {
        match self.exit_code {
            0 => ApplicatorStatus::Success,
            1 => ApplicatorStatus::NothingToDo,
            code => ApplicatorStatus::Failed(code),
        }
    }
}

/// Maintains `patch_applicator/applied_suggestions.json`
#[derive(Debug)]
pub struct PatchApplicator {
    tool: Tool,
}

impl PatchApplicator {
    pub(crate) fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    pub async fn apply(&self, ids: &[u64], token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        self.run(with_ids("-a", ids), token).await
    }

    pub async fn rollback(&self, ids: &[u64], token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        self.run(with_ids("-r", ids), token).await
    }

    /// Roll back everything that is applied
    pub async fn clear(&self, token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        self.run(vec!["-C".to_string()], token).await
    }

    /// Re-apply the last saved set of patches
    pub async fn load(&self, token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        self.run(vec!["-L".to_string()], token).await
    }

    pub async fn list(&self, token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        self.run(vec!["-l".to_string()], token).await
    }

    async fn run(&self, args: Vec<String>, token: Option<&CancelToken>) -> Result<ApplicatorOutcome> {
        let command_line = self.tool.command_line(&args);
        info!("Running {}", command_line);

        let options = self.tool.options(command_line, token)?.error_on_cancellation();
        let result = CommandExecution::execute(options).await?;
        let outcome = ApplicatorOutcome {
            exit_code: result.exit_code,
            stdout: result.stdout,
            stderr: result.stderr,
        };

        if let ApplicatorStatus::Failed(code) = outcome.status() {
            warn!("Patch applicator exited with code {}: {}", code, outcome.stderr);
        }
        Ok(outcome)
    }
}

fn with_ids(flag: &str, ids: &[u64]) -> Vec<String> {
    std::iter::once(flag.to_string()).chain(ids.iter().map(u64::to_string)).collect()
}
