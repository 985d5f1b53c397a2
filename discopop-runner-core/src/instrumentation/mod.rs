//! Building and running an instrumented target program

pub mod cmake;

pub use cmake::CMakeInstrumentation;

use crate::error::Result;
use crate::tools::{ConfigProvider, WrapperKind};
use async_trait::async_trait;
use std::path::PathBuf;

/// The target project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub src_directory: PathBuf,
    /// Wiped and recreated by every instrumentation run
    pub build_directory: PathBuf,
    /// Path of the built executable relative to the build directory
    pub executable_name: String,
    /// One run per entry, in order
    pub executable_arguments: Vec<String>,
}

/// Where the CMake wrapper script comes from, resolved when configuration starts
#[async_trait]
pub trait WrapperScriptSource: Send + Sync {
    async fn wrapper_script(&self) -> Result<PathBuf>;
}

#[async_trait]
impl WrapperScriptSource for PathBuf {
    async fn wrapper_script(&self) -> Result<PathBuf> {
        Ok(self.clone())
    }
}

/// Wrapper script located through `discopop_config_provider`
#[derive(Debug, Clone)]
pub struct ProvidedWrapper {
    provider: ConfigProvider,
    kind: WrapperKind,
}

impl ProvidedWrapper {
    pub fn new(provider: &ConfigProvider, kind: WrapperKind) -> Self {
        Self { provider: provider.clone(), kind }
    }
}

#[async_trait]
impl WrapperScriptSource for ProvidedWrapper {
    async fn wrapper_script(&self) -> Result<PathBuf> {
        self.provider.cmake_wrapper(self.kind).await
    }
}
