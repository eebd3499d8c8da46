//! Abstraction over external command execution.
//!
//! [`CommandRunner`] allows swapping the real process execution
//! ([`SystemCommandRunner`]) with a mock in tests. Every call to the container
//! engine, the clipboard helpers and `sudo` goes through this trait, which keeps
//! the listing commands testable without a docker daemon.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Exit code, standard output and standard error of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    /// Process exit code (`-1` when the process was killed by a signal)
    pub code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ExecOutput {
    /// Build a successful output with `stdout` as content.
    pub fn ok(stdout: impl Into<String>) -> Self {
        ExecOutput {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Build a failed output with exit `code` and `stderr` as content.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        ExecOutput {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// `true` when the process exited with code 0.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl From<Output> for ExecOutput {
    fn from(output: Output) -> Self {
        ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Error raised when an external program could not be run at all.
///
/// A non-zero exit code is *not* an error, it is reported in [`ExecOutput`].
#[derive(Debug, Error)]
pub enum RunError {
    #[allow(missing_docs)]
    #[error("Unable to start `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `cmd` with the given `args`, wait for it and capture both output streams.
    fn run(&self, cmd: &str, args: Vec<String>) -> Result<ExecOutput, RunError>;

    /// Same as [`CommandRunner::run`] with `input` written to the process stdin.
    fn run_with_input(
        &self,
        cmd: &str,
        args: Vec<String>,
        input: &str,
    ) -> Result<ExecOutput, RunError>;

    /// Run `cmd` attached to the current terminal and return its exit code.
    fn run_interactive(&self, cmd: &str, args: Vec<String>) -> Result<i32, RunError>;
}

/// Render `cmd` and `args` as a line that can be pasted in a POSIX shell.
///
/// ```
/// use dok::command::format_command;
/// assert_eq!(
///     format_command("docker", &["ps".into(), "--format".into(), "{{.ID}} {{.Names}}".into()]),
///     "docker ps --format '{{.ID}} {{.Names}}'"
/// );
/// ```
pub fn format_command(cmd: &str, args: &[String]) -> String {
    let mut line = shell_words::quote(cmd).into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&shell_words::quote(arg));
    }
    line
}

/// Default implementation that delegates to [`std::process::Command`].
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    fn spawn_failed(cmd: &str) -> impl FnOnce(std::io::Error) -> RunError + '_ {
        move |source| RunError::SpawnFailed {
            program: cmd.to_owned(),
            source,
        }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, cmd: &str, args: Vec<String>) -> Result<ExecOutput, RunError> {
        info!("Running command: {}", format_command(cmd, &args));
        let output = Command::new(cmd)
            .args(&args)
            .output()
            .map_err(Self::spawn_failed(cmd))?;
        let output = ExecOutput::from(output);
        debug!("`{}` exited with {}", cmd, output.code);
        Ok(output)
    }

    fn run_with_input(
        &self,
        cmd: &str,
        args: Vec<String>,
        input: &str,
    ) -> Result<ExecOutput, RunError> {
        info!("Running command: {}", format_command(cmd, &args));
        debug!("Piping {} bytes to `{}`", input.len(), cmd);
        let mut child = Command::new(cmd)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(Self::spawn_failed(cmd))?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(Self::spawn_failed(cmd))?;
            // stdin is dropped here so that the child sees EOF
        }
        let output = child.wait_with_output().map_err(Self::spawn_failed(cmd))?;
        Ok(output.into())
    }

    fn run_interactive(&self, cmd: &str, args: Vec<String>) -> Result<i32, RunError> {
        info!("Running command: {}", format_command(cmd, &args));
        let status = Command::new(cmd)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(Self::spawn_failed(cmd))?;
        Ok(status.code().unwrap_or(-1))
    }
}
