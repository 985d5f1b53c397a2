//! `discopop_patch_generator`: turns suggestions into applicable patches

use super::Tool;
use crate::cancel::CancelToken;
use crate::error::Result;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchGeneratorOptions {
    /// Only patch what the optimizer kept
    pub only_optimizer_output_patterns: bool,
    pub only_maximum_id_pattern: bool,
    pub verbose: bool,
    pub extra_arguments: Vec<String>,
}

impl PatchGeneratorOptions {
    pub fn to_arguments(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.only_optimizer_output_patterns {
            args.push("--only-optimizer-output-patterns".to_string());
        }
        if self.only_maximum_id_pattern {
            args.push("--only-maximum-id-pattern".to_string());
        }
        if self.verbose {
            args.push("-v".to_string());
        }
        args.extend(self.extra_arguments.iter().cloned());
        args
    }
}

/// Writes `patch_generator/<id>/` into the result directory
#[derive(Debug)]
pub struct PatchGenerator {
    tool: Tool,
}

impl PatchGenerator {
    pub(crate) fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    pub async fn run(&self, options: &PatchGeneratorOptions, token: Option<&CancelToken>) -> Result<()> {
        info!("Generating patches in {}", self.dot_discopop().display());
        self.tool.run(&options.to_arguments(), token).await?;
        Ok(())
    }
}
