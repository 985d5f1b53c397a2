//! `discopop_config_provider`: where DiscoPoP is installed

use super::Tool;
use crate::config::BuildSettings;
use crate::error::{Error, Result};
use crate::process::CommandExecution;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CMake wrapper flavours shipped with DiscoPoP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    /// Instruments for dependence profiling
    DiscoPoP,
    /// Instruments for runtime hotspot measurement
    HotspotDetection,
}

#[derive(Debug, Clone)]
pub struct ConfigProvider {
    tool: Tool,
    build: BuildSettings,
}

impl ConfigProvider {
    pub(crate) fn new(tool: Tool, build: BuildSettings) -> Self {
        Self { tool, build }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    /// Installed DiscoPoP version
    pub async fn version(&self) -> Result<String> {
        self.query("-v").await
    }

    /// DiscoPoP build directory
    pub async fn build_directory(&self) -> Result<PathBuf> {
        self.query("-b").await.map(PathBuf::from)
    }

    /// DiscoPoP source directory
    pub async fn source_directory(&self) -> Result<PathBuf> {
        self.query("-s").await.map(PathBuf::from)
    }

    /// Locate the CMake wrapper script for `kind`
    ///
    /// A configured absolute path wins over `<build dir>/scripts/<name>`.
    pub async fn cmake_wrapper(&self, kind: WrapperKind) -> Result<PathBuf> {
        let (configured, name) = match kind {
            WrapperKind::DiscoPoP => (&self.build.cmake_wrapper, &self.build.cmake_wrapper_name),
            WrapperKind::HotspotDetection => {
                (&self.build.hotspot_cmake_wrapper, &self.build.hotspot_cmake_wrapper_name)
            }
        };

        if let Some(path) = configured {
            debug!("Using configured {:?} wrapper {}", kind, path.display());
            return Ok(path.clone());
        }

        let build_directory = self.build_directory().await?;
        Ok(build_directory.join("scripts").join(name))
    }

    // Short-lived query: no cancel token
    async fn query(&self, flag: &str) -> Result<String> {
        let options = self.tool.options(self.tool.command_line(&[flag]), None)?.error_on_non_zero_exit();
        let output = CommandExecution::execute(options).await?.stdout;
        if output.is_empty() {
            return Err(Error::Precondition(format!(
                "{} {} printed nothing",
                self.tool.program(),
                flag
            )));
        }
        Ok(output)
    }
}
