//! Wrappers around the DiscoPoP analysis binaries
//!
//! A [`ToolSuite`] is bound to one result directory and creates each wrapper
//! on first use. Every wrapper checks that its binary resolves before it
//! spawns anything and runs with the result directory as working directory.

pub mod config_provider;
pub mod explorer;
pub mod hotspot_detector;
pub mod optimizer;
pub mod patch_applicator;
pub mod patch_generator;

pub use config_provider::{ConfigProvider, WrapperKind};
pub use explorer::{Explorer, ExplorerOptions};
pub use hotspot_detector::HotspotDetector;
pub use optimizer::{Optimizer, OptimizerArguments, OptimizerOptions};
pub use patch_applicator::{ApplicatorOutcome, ApplicatorStatus, PatchApplicator};
pub use patch_generator::{PatchGenerator, PatchGeneratorOptions};

use crate::cancel::CancelToken;
use crate::config::{BuildSettings, RunnerConfig, ToolCommands};
use crate::error::Result;
use crate::process::{CommandExecution, ExecuteOptions, ExecutionResult, command_exists};
use once_cell::sync::OnceCell;
use regex_utils::shell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const INSTALL_HINT: &str = "Make sure DiscoPoP is installed and its binaries are on the PATH, \
                            or point the [tools] section of the runner settings at them.";

/// One external binary scoped to a result directory
#[derive(Debug, Clone)]
pub(crate) struct Tool {
    program: String,
    dot_discopop: PathBuf,
    kill_grace: Duration,
}

impl Tool {
    pub(crate) fn new(program: &str, dot_discopop: &Path, kill_grace: Duration) -> Self {
        Self { program: program.to_string(), dot_discopop: dot_discopop.to_path_buf(), kill_grace }
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn dot_discopop(&self) -> &Path {
        &self.dot_discopop
    }

    /// Command line with every argument quoted
    pub(crate) fn command_line<S: AsRef<str>>(&self, args: &[S]) -> String {
        shell::join(std::iter::once(self.program.as_str()).chain(args.iter().map(|a| a.as_ref())))
    }

    /// Options for running `command_line`, after the binary was found
    pub(crate) fn options(
        &self,
        command_line: String,
        token: Option<&CancelToken>,
    ) -> Result<ExecuteOptions> {
        command_exists(&self.program, true, INSTALL_HINT)?;

        // Queries such as the version check may run before the result directory exists
        let working_directory =
            if self.dot_discopop.is_dir() { self.dot_discopop.clone() } else { PathBuf::from(".") };

        Ok(ExecuteOptions::new(command_line, working_directory)
            .cancel_token(token.cloned())
            .kill_grace(self.kill_grace))
    }

    /// Run to success; failure and cancellation are errors
    pub(crate) async fn run<S: AsRef<str>>(
        &self,
        args: &[S],
        token: Option<&CancelToken>,
    ) -> Result<ExecutionResult> {
        self.run_line(self.command_line(args), token).await
    }

    pub(crate) async fn run_line(
        &self,
        command_line: String,
        token: Option<&CancelToken>,
    ) -> Result<ExecutionResult> {
        let options = self.options(command_line, token)?.error_on_non_zero_exit().error_on_cancellation();
        CommandExecution::execute(options).await
    }
}

/// Lazily constructed wrappers sharing one result directory
#[derive(Debug)]
pub struct ToolSuite {
    dot_discopop: PathBuf,
    commands: ToolCommands,
    build: BuildSettings,
    kill_grace: Duration,

    config_provider: OnceCell<ConfigProvider>,
    explorer: OnceCell<Explorer>,
    optimizer: OnceCell<Optimizer>,
    patch_generator: OnceCell<PatchGenerator>,
    patch_applicator: OnceCell<PatchApplicator>,
    hotspot_detector: OnceCell<HotspotDetector>,
}

impl ToolSuite {
    pub fn new(dot_discopop: impl Into<PathBuf>, config: &RunnerConfig) -> Self {
        Self {
            dot_discopop: dot_discopop.into(),
            commands: config.tools.clone(),
            build: config.build.clone(),
            kill_grace: config.execution.kill_grace_period(),
            config_provider: OnceCell::new(),
            explorer: OnceCell::new(),
            optimizer: OnceCell::new(),
            patch_generator: OnceCell::new(),
            patch_applicator: OnceCell::new(),
            hotspot_detector: OnceCell::new(),
        }
    }

    pub fn dot_discopop(&self) -> &Path {
        &self.dot_discopop
    }

    pub fn config_provider(&self) -> &ConfigProvider {
        self.config_provider.get_or_init(|| {
            ConfigProvider::new(self.tool(&self.commands.config_provider), self.build.clone())
        })
    }

    pub fn explorer(&self) -> &Explorer {
        self.explorer.get_or_init(|| Explorer::new(self.tool(&self.commands.explorer)))
    }

    pub fn optimizer(&self) -> &Optimizer {
        self.optimizer.get_or_init(|| Optimizer::new(self.tool(&self.commands.optimizer)))
    }

    pub fn patch_generator(&self) -> &PatchGenerator {
        self.patch_generator
            .get_or_init(|| PatchGenerator::new(self.tool(&self.commands.patch_generator)))
    }

    pub fn patch_applicator(&self) -> &PatchApplicator {
        self.patch_applicator
            .get_or_init(|| PatchApplicator::new(self.tool(&self.commands.patch_applicator)))
    }

    pub fn hotspot_detector(&self) -> &HotspotDetector {
        self.hotspot_detector
            .get_or_init(|| HotspotDetector::new(self.tool(&self.commands.hotspot_analyzer)))
    }

    /// Every configured binary with whether it resolves
    pub fn availability(&self) -> Vec<(String, bool)> {
        [
            &self.commands.config_provider,
            &self.commands.explorer,
            &self.commands.optimizer,
            &self.commands.patch_generator,
            &self.commands.patch_applicator,
            &self.commands.hotspot_analyzer,
        ]
        .into_iter()
        .map(|name| (name.clone(), command_exists(name, false, INSTALL_HINT).unwrap_or(false)))
        .collect()
    }

    fn tool(&self, program: &str) -> Tool {
        debug!("Creating wrapper for {} in {}", program, self.dot_discopop.display());
        Tool::new(program, &self.dot_discopop, self.kill_grace)
    }
}

#[cfg(all(test, unix))]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};

    /// Write an executable shell script standing in for an external tool
    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
