//! Command execution with cooperative cancellation
//!
//! A command line is handed to the platform shell. When a [`CancelToken`]
//! fires while the process runs, the process group receives a termination
//! signal, then a kill signal if it does not exit within the grace period.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Options for a single [`CommandExecution::execute`] call
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Full command line, arguments included
    pub command: String,
    pub working_directory: PathBuf,
    /// Merged over the inherited environment, overlay wins
    pub env: BTreeMap<String, String>,
    pub cancel_token: Option<CancelToken>,
    pub error_on_non_zero_exit: bool,
    pub error_on_cancellation: bool,
    pub trim_output: bool,
    pub kill_grace: Duration,
}

impl ExecuteOptions {
    pub fn new(command: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            working_directory: working_directory.into(),
            env: BTreeMap::new(),
            cancel_token: None,
            error_on_non_zero_exit: false,
            error_on_cancellation: false,
            trim_output: true,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: BTreeMap<String, String>) -> Self {
        self.env.extend(vars);
        self
    }

    pub fn cancel_token(mut self, token: Option<CancelToken>) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn error_on_non_zero_exit(mut self) -> Self {
        self.error_on_non_zero_exit = true;
        self
    }

    pub fn error_on_cancellation(mut self) -> Self {
        self.error_on_cancellation = true;
        self
    }

    pub fn keep_whitespace(mut self) -> Self {
        self.trim_output = false;
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

/// Normalized outcome of one command
///
/// `exit_code` is only meaningful when `cancelled` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub cancelled: bool,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == 0
    }
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    CancelRequested,
}

/// Runs external commands
pub struct CommandExecution;

impl CommandExecution {
    /// Run one command to completion or cancellation
    pub async fn execute(options: ExecuteOptions) -> Result<ExecutionResult> {
        debug!("Executing `{}` in {}", options.command, options.working_directory.display());

        let mut child = shell_command(&options.command)
            .current_dir(&options.working_directory)
            .envs(&options.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn { command: options.command.clone(), source })?;

        let stdout = collect(child.stdout.take());
        let stderr = collect(child.stderr.take());

        let outcome = match &options.cancel_token {
            Some(token) => tokio::select! {
                status = child.wait() => Outcome::Exited(status),
                _ = token.cancelled() => Outcome::CancelRequested,
            },
            None => Outcome::Exited(child.wait().await),
        };

        let (status, cancelled) = match outcome {
            Outcome::Exited(status) => (status?, false),
            Outcome::CancelRequested => stop(&mut child, &options).await?,
        };

        let (stdout, stderr) = if cancelled {
            drain_after_kill(stdout, stderr, &options).await?
        } else {
            (finish(stdout, options.trim_output).await, finish(stderr, options.trim_output).await)
        };

        let result = ExecutionResult {
            stdout,
            stderr,
            exit_code: if cancelled { 0 } else { exit_code(&status) },
            cancelled,
        };

        if cancelled {
            debug!("`{}` terminated after cancellation", options.command);
            if options.error_on_cancellation {
                return Err(Error::cancelled(format!("`{}` was cancelled", options.command)));
            }
            return Ok(result);
        }

        if result.exit_code != 0 {
            warn!("`{}` exited with code {}", options.command, result.exit_code);
            if options.error_on_non_zero_exit {
                return Err(Error::NonZeroExit {
                    command: options.command,
                    code: result.exit_code,
                    stdout: result.stdout,
                    stderr: result.stderr,
                });
            }
        }

        Ok(result)
    }
}

fn shell_command(command_line: &str) -> Command {
    let mut command = if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.arg("/C");
        command
    } else {
        let mut command = Command::new("sh");
        command.arg("-c");
        command
    };
    command.arg(command_line);

    // Own process group, so signals reach everything the shell started
    #[cfg(unix)]
    command.process_group(0);

    command
}

/// Honour a cancel request unless the child already exited on its own
///
/// Returns the exit status and whether the run was interrupted.
async fn stop(child: &mut Child, options: &ExecuteOptions) -> Result<(ExitStatus, bool)> {
    match child.try_wait()? {
        Some(status) => {
            debug!("`{}` finished before the cancellation took effect", options.command);
            Ok((status, false))
        }
        None => Ok((terminate(child, options).await?, true)),
    }
}

/// Stop a running child: termination signal, grace period, kill signal
///
/// The kill signal always goes to the whole process group, even when the
/// shell itself already exited on the termination signal.
async fn terminate(child: &mut Child, options: &ExecuteOptions) -> Result<ExitStatus> {
    let pid = child.id();
    warn!("Cancelling `{}` (pid {:?})", options.command, pid);

    let leader_status = if signal::terminate(pid) {
        match tokio::time::timeout(options.kill_grace, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                warn!(
                    "`{}` still running {:?} after the termination signal, killing it",
                    options.command, options.kill_grace
                );
                None
            }
        }
    } else {
        warn!("Could not deliver the termination signal to `{}`, killing it", options.command);
        None
    };

    // Fails harmlessly once every member of the group is gone
    let group_killed = signal::kill(pid);

    if let Some(status) = leader_status {
        return Ok(status);
    }

    if !group_killed && child.start_kill().is_err() {
        error!("Neither termination nor kill signal reached `{}`", options.command);
        return Err(Error::Unkillable {
            command: options.command.clone(),
            pid,
            reason: "neither the termination nor the kill signal could be delivered".to_string(),
        });
    }

    match tokio::time::timeout(options.kill_grace, child.wait()).await {
        Ok(status) => Ok(status?),
        Err(_) => {
            error!("`{}` survived the kill signal", options.command);
            Err(Error::Unkillable {
                command: options.command.clone(),
                pid,
                reason: format!("still running {:?} after the kill signal", options.kill_grace),
            })
        }
    }
}

/// Collect the output of a killed command within the grace period
///
/// A descendant outside the process group can keep the pipes open forever.
async fn drain_after_kill(
    stdout: JoinHandle<Vec<u8>>,
    stderr: JoinHandle<Vec<u8>>,
    options: &ExecuteOptions,
) -> Result<(String, String)> {
    let readers = [stdout.abort_handle(), stderr.abort_handle()];
    let trim = options.trim_output;
    let output = async { (finish(stdout, trim).await, finish(stderr, trim).await) };
    let drained = tokio::time::timeout(options.kill_grace, output).await;

    match drained {
        Ok(output) => Ok(output),
        Err(_) => {
            for reader in readers {
                reader.abort();
            }
            error!("Output of `{}` still open after the kill signal", options.command);
            Err(Error::Unkillable {
                command: options.command.clone(),
                pid: None,
                reason: format!(
                    "a descendant kept the output open {:?} after the kill signal",
                    options.kill_grace
                ),
            })
        }
    }
}

fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

fn collect<R>(stream: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut stream) = stream {
            if let Err(e) = stream.read_to_end(&mut buffer).await {
                warn!("Failed to read process output: {}", e);
            }
        }
        buffer
    })
}

async fn finish(handle: JoinHandle<Vec<u8>>, trim: bool) -> String {
    let bytes = handle.await.unwrap_or_default();
    let text = String::from_utf8_lossy(&bytes);
    if trim { text.trim().to_string() } else { text.into_owned() }
}

#[cfg(unix)]
mod signal {
    pub fn terminate(pid: Option<u32>) -> bool {
        send(pid, libc::SIGTERM)
    }

    pub fn kill(pid: Option<u32>) -> bool {
        send(pid, libc::SIGKILL)
    }

    fn send(pid: Option<u32>, signal: libc::c_int) -> bool {
        let Some(pid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
            return false;
        };
        // Negative pid addresses the process group created at spawn
        unsafe { libc::kill(-pid, signal) == 0 }
    }
}

#[cfg(not(unix))]
mod signal {
    pub fn terminate(_pid: Option<u32>) -> bool {
        false
    }

    pub fn kill(_pid: Option<u32>) -> bool {
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    fn options(command: &str) -> ExecuteOptions {
        ExecuteOptions::new(command, std::env::temp_dir())
    }

    fn cancel_after(token: &CancelToken, delay: Duration) {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            token.cancel();
        });
    }

    #[tokio::test]
    async fn test_clean_success_trims_output() {
        let result = CommandExecution::execute(options("echo '  hello  '")).await.unwrap();
        assert_eq!(result, ExecutionResult {
            stdout: "hello".to_string(),
            stderr: String::new(),
            exit_code: 0,
            cancelled: false,
        });
        assert!(result.success());
    }

    #[tokio::test]
    async fn test_keep_whitespace() {
        let result =
            CommandExecution::execute(options("echo hello").keep_whitespace()).await.unwrap();
        assert_eq!(result.stdout, "hello\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_data_by_default() {
        let result = CommandExecution::execute(options("echo oops 1>&2; exit 7")).await.unwrap();
        assert_eq!(result.exit_code, 7);
        assert!(!result.cancelled);
        assert_eq!(result.stderr, "oops");
    }

    #[tokio::test]
    async fn test_non_zero_exit_can_fail() {
        let err = CommandExecution::execute(options("exit 7").error_on_non_zero_exit())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NonZeroExit { code: 7, .. }));
    }

    #[tokio::test]
    async fn test_unknown_command_is_an_exit_code() {
        let result =
            CommandExecution::execute(options("definitely_not_a_discopop_tool")).await.unwrap();
        assert_eq!(result.exit_code, 127);
    }

    #[tokio::test]
    async fn test_spawn_failure_ignores_throw_flags() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = CommandExecution::execute(ExecuteOptions::new("true", missing)).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_environment_overlay_wins() {
        let result = CommandExecution::execute(
            options("echo \"$DOT_DISCOPOP:$HOME\"")
                .env("DOT_DISCOPOP", "/tmp/project/.discopop")
                .env("HOME", "/overlay/home"),
        )
        .await
        .unwrap();
        assert_eq!(result.stdout, "/tmp/project/.discopop:/overlay/home");
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = TempDir::new().unwrap();
        let result =
            CommandExecution::execute(ExecuteOptions::new("pwd -P", dir.path())).await.unwrap();
        assert_eq!(PathBuf::from(result.stdout), dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_cancellation_resolves_as_cancelled() {
        let token = CancelToken::new();
        cancel_after(&token, Duration::from_millis(100));

        let started = Instant::now();
        let result =
            CommandExecution::execute(options("sleep 30").cancel_token(Some(token))).await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.exit_code, 0);
        assert!(!result.success());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancellation_can_fail() {
        let token = CancelToken::new();
        cancel_after(&token, Duration::from_millis(100));

        let err = CommandExecution::execute(
            options("sleep 30").cancel_token(Some(token)).error_on_cancellation(),
        )
        .await
        .unwrap_err();
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn test_ignored_termination_signal_escalates() {
        let token = CancelToken::new();
        cancel_after(&token, Duration::from_millis(200));

        let started = Instant::now();
        let result = CommandExecution::execute(
            options("trap '' TERM; sleep 30; echo finished")
                .cancel_token(Some(token))
                .kill_grace(Duration::from_millis(300)),
        )
        .await
        .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.stdout, "");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancellation_kills_descendants_ignoring_termination() {
        let token = CancelToken::new();
        cancel_after(&token, Duration::from_millis(200));

        let started = Instant::now();
        let result = CommandExecution::execute(
            options("(trap '' TERM; sleep 8); echo after")
                .cancel_token(Some(token))
                .kill_grace(Duration::from_millis(300)),
        )
        .await
        .unwrap();

        assert!(result.cancelled);
        assert_eq!(result.stdout, "");
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_exit_before_cancel_keeps_real_status() {
        let opts = options("exit 3");
        let mut child = shell_command(&opts.command)
            .current_dir(&opts.working_directory)
            .stdin(Stdio::null())
            .spawn()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let (status, cancelled) = stop(&mut child, &opts).await.unwrap();
        assert!(!cancelled);
        assert_eq!(exit_code(&status), 3);
    }

    #[tokio::test]
    async fn test_token_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();

        let result =
            CommandExecution::execute(options("sleep 30").cancel_token(Some(token))).await.unwrap();
        assert!(result.cancelled);
    }

    #[tokio::test]
    async fn test_finished_process_ignores_later_cancel() {
        let token = CancelToken::new();
        let result = CommandExecution::execute(options("echo done").cancel_token(Some(token.clone())))
            .await
            .unwrap();
        token.cancel();

        assert!(!result.cancelled);
        assert_eq!(result.stdout, "done");
    }
}
