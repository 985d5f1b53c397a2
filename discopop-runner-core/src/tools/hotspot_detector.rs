//! `hotspot_analyzer`: classifies code regions by measured runtime

use super::Tool;
use crate::cancel::CancelToken;
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Writes `hotspot_detection/Hotspots.json` into the result directory
#[derive(Debug)]
pub struct HotspotDetector {
    tool: Tool,
}

impl HotspotDetector {
    pub(crate) fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    pub async fn run(&self, token: Option<&CancelToken>) -> Result<()> {
        info!("Running {} in {}", self.tool.program(), self.dot_discopop().display());
        self.tool.run::<&str>(&[], token).await?;
        Ok(())
    }
}
