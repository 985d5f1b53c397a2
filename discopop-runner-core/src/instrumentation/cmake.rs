//! CMake-based instrumentation: prepare, configure, build, run
//!
//! Every phase except the first checks the cancel token before it starts
//! and runs its command with non-zero exits and cancellation as errors.

use super::{ProjectInfo, WrapperScriptSource};
use crate::cancel::CancelToken;
use crate::config::RunnerConfig;
use crate::error::{Error, Result};
use crate::process::lookup::is_executable;
use crate::process::{CommandExecution, ExecuteOptions};
use regex_utils::shell;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory CMake's compiler checks leave behind when no result directory is exported
const LOCAL_RESULT_DIRECTORY: &str = ".discopop";

pub struct CMakeInstrumentation {
    project: ProjectInfo,
    dot_discopop: PathBuf,
    wrapper: Box<dyn WrapperScriptSource>,
    make_command: String,
    result_env_var: String,
    kill_grace: Duration,
}

impl CMakeInstrumentation {
    /// Fails when the result directory is the one `run_cmake` scrubs from the build directory
    pub fn new(
        project: ProjectInfo,
        dot_discopop: impl Into<PathBuf>,
        wrapper: impl WrapperScriptSource + 'static,
        config: &RunnerConfig,
    ) -> Result<Self> {
        let dot_discopop = dot_discopop.into();
        let local = project.build_directory.join(LOCAL_RESULT_DIRECTORY);
        if normalize(&dot_discopop) == normalize(&local) {
            return Err(Error::Precondition(format!(
                "the result directory {} must not be {}, it is deleted after configuration",
                dot_discopop.display(),
                local.display()
            )));
        }

        Ok(Self {
            project,
            dot_discopop,
            wrapper: Box::new(wrapper),
            make_command: config.build.make_command.clone(),
            result_env_var: config.build.result_env_var.clone(),
            kill_grace: config.execution.kill_grace_period(),
        })
    }

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    pub fn dot_discopop(&self) -> &Path {
        &self.dot_discopop
    }

    /// Argument strings of the executable runs; no arguments means a single bare run
    pub fn runs(&self) -> Vec<&str> {
        if self.project.executable_arguments.is_empty() {
            return vec![""];
        }
        self.project.executable_arguments.iter().map(String::as_str).collect()
    }

    /// Recreate an empty build directory and make sure the result directory exists
    pub fn prepare_build_directory(&self) -> Result<()> {
        let build = &self.project.build_directory;
        if build.exists() {
            debug!("Removing {}", build.display());
            std::fs::remove_dir_all(build)?;
        }
        std::fs::create_dir_all(build)?;
        std::fs::create_dir_all(&self.dot_discopop)?;
        Ok(())
    }

    /// Configure the project through the CMake wrapper script
    pub async fn run_cmake(&self, token: &CancelToken) -> Result<()> {
        token.check("CMake configuration")?;

        let script = self.wrapper.wrapper_script().await?;
        if !is_executable(&script) {
            return Err(Error::Precondition(format!(
                "CMake wrapper {} does not exist or is not executable",
                script.display()
            )));
        }

        let command = shell::join([
            script.display().to_string(),
            self.project.src_directory.display().to_string(),
        ]);
        info!("Configuring {}", self.project.src_directory.display());
        self.execute(self.options(command), token).await?;

        let local = self.project.build_directory.join(LOCAL_RESULT_DIRECTORY);
        if local.exists() {
            debug!("Removing stray {}", local.display());
            std::fs::remove_dir_all(&local)?;
        }
        Ok(())
    }

    /// Build with the result directory exported
    pub async fn run_make(&self, token: &CancelToken) -> Result<()> {
        token.check("build")?;

        info!("Building in {}", self.project.build_directory.display());
        let options = self.options(self.make_command.clone()).env(&self.result_env_var, self.dot_discopop_env());
        self.execute(options, token).await
    }

    /// One run of the instrumented executable with a raw argument string
    pub async fn run_executable(&self, arguments: &str, token: &CancelToken) -> Result<()> {
        token.check("instrumented run")?;

        let executable = self.project.build_directory.join(&self.project.executable_name);
        let program = shell::quote(&executable.display().to_string());
        let command =
            if arguments.trim().is_empty() { program } else { format!("{} {}", program, arguments.trim()) };

        info!("Running {}", command);
        let options = self.options(command).env(&self.result_env_var, self.dot_discopop_env());
        self.execute(options, token).await
    }

    /// Every executable run, strictly one after the other
    pub async fn run_instrumentation(&self, token: &CancelToken) -> Result<()> {
        for arguments in self.runs() {
            self.run_executable(arguments, token).await?;
        }
        Ok(())
    }

    fn options(&self, command: String) -> ExecuteOptions {
        ExecuteOptions::new(command, &self.project.build_directory).kill_grace(self.kill_grace)
    }

    async fn execute(&self, options: ExecuteOptions, token: &CancelToken) -> Result<()> {
        let options =
            options.cancel_token(Some(token.clone())).error_on_non_zero_exit().error_on_cancellation();
        CommandExecution::execute(options).await?;
        Ok(())
    }

    fn dot_discopop_env(&self) -> String {
        self.dot_discopop.display().to_string()
    }
}

/// Absolute, lexically normalized form of a path that may not exist yet
fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
