//! `discopop_optimizer`: ranks and filters the detected suggestions

use super::Tool;
use crate::cancel::CancelToken;
use crate::error::Result;
use regex_utils::shell;
use std::path::{Path, PathBuf};
use tracing::info;

/// Structured optimizer settings, rendered flag by flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizerOptions {
    /// `-o`, 0 to 3
    pub optimization_level: u8,
    pub doall_microbench_file: Option<PathBuf>,
    pub reduction_microbench_file: Option<PathBuf>,
    pub allow_nested_parallelism: bool,
    pub system_configuration: Option<PathBuf>,
    pub plot: bool,
    pub verbose: bool,
}

impl OptimizerOptions {
    pub fn to_arguments(&self) -> Vec<String> {
        let mut args = vec!["-o".to_string(), self.optimization_level.to_string()];

        let files = [
            ("--doall-microbench-file", &self.doall_microbench_file),
            ("--reduction-microbench-file", &self.reduction_microbench_file),
            ("--system-configuration", &self.system_configuration),
        ];
        for (flag, file) in files {
            if let Some(file) = file {
                args.push(flag.to_string());
                args.push(file.display().to_string());
            }
        }

        if self.allow_nested_parallelism {
            args.push("--allow-nested-parallelism".to_string());
        }
        if self.plot {
            args.push("--plot".to_string());
        }
        if self.verbose {
            args.push("-v".to_string());
        }
        args
    }
}

/// Either structured options or a raw argument string used as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimizerArguments {
    Structured(OptimizerOptions),
    Override(String),
}

impl Default for OptimizerArguments {
    fn default() -> Self {
        OptimizerArguments::Structured(OptimizerOptions::default())
    }
}

/// Writes `optimizer/patterns.json` into the result directory
#[derive(Debug)]
pub struct Optimizer {
    tool: Tool,
}

impl Optimizer {
    pub(crate) fn new(tool: Tool) -> Self {
        Self { tool }
    }

    pub fn dot_discopop(&self) -> &Path {
        self.tool.dot_discopop()
    }

    pub fn command_line(&self, arguments: &OptimizerArguments) -> String {
        match arguments {
            OptimizerArguments::Structured(options) => {
                self.tool.command_line(&options.to_arguments())
            }
            OptimizerArguments::Override(raw) if raw.trim().is_empty() => {
                shell::quote(self.tool.program())
            }
            OptimizerArguments::Override(raw) => {
                format!("{} {}", shell::quote(self.tool.program()), raw.trim())
            }
        }
    }

    pub async fn run(&self, arguments: &OptimizerArguments, token: Option<&CancelToken>) -> Result<()> {
        let command_line = self.command_line(arguments);
        info!("Running {}", command_line);
        self.tool.run_line(command_line, token).await?;
        Ok(())
    }
}
