//! `discopop_explorer`: pattern detection over the profiling data

use super::Tool;
use crate::cancel::CancelToken;
use crate::error::Result;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplorerOptions {
    /// Passed through verbatim after the program name
    pub extra_arguments: Vec<String>,
}

impl ExplorerOptions {
    pub fn to_arguments(&self) -> Vec<String> {
        self.extra_arguments.clone()
    }
}

/// Writes `explorer/patterns.json` into the result directory
#[derive(Debug)]
pub struct Explorer {
    tool: Tool,
}

impl Explorer {
    pub(crate) fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    pub async fn run(&self, options: &ExplorerOptions, token: Option<&CancelToken>) -> Result<()> {
        info!("Running {} in {}", self.tool.program(), self.dot_discopop().display());
        self.tool.run(&options.to_arguments(), token).await?;
        Ok(())
    }
}
