// src/operation/shell.rs

//! Shell command operation.

use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{FoundationError, Result};
use crate::operation::{Operation, Parameters};

/// Per-call input for [`ShellCommand`]: extra environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInput {
    pub env: Vec<(String, String)>,
}

impl CommandInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Captured result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `cmd` through the platform shell (`sh -c`, or `cmd /C` on Windows).
///
/// A non-zero exit status is reported as [`FoundationError::OperationFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    cmd: String,
    working_dir: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            working_dir: None,
        }
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.cmd
    }

    fn build(&self, input: CommandInput) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.envs(input.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Run the command without blocking a runtime thread.
    ///
    /// The child is killed when the returned future is dropped, so a caller
    /// that times out or aborts the task also stops the process.
    pub async fn run(&self, input: CommandInput) -> Result<CommandOutput> {
        info!(cmd = %self.cmd, "starting command");

        let output = tokio::process::Command::from(self.build(input))
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning command '{}'", self.cmd))?;

        self.finish(output)
    }

    fn finish(&self, output: Output) -> Result<CommandOutput> {
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        for line in stdout.lines() {
            debug!(cmd = %self.cmd, "stdout: {}", line);
        }
        for line in stderr.lines() {
            debug!(cmd = %self.cmd, "stderr: {}", line);
        }

        let code = output.status.code().unwrap_or(-1);
        info!(
            cmd = %self.cmd,
            exit_code = code,
            success = output.status.success(),
            "command exited"
        );

        if !output.status.success() {
            return Err(FoundationError::OperationFailed(format!(
                "command '{}' exited with code {}",
                self.cmd, code
            )));
        }

        Ok(CommandOutput {
            exit_code: code,
            stdout,
            stderr,
        })
    }
}

impl Operation for ShellCommand {
    type Input = CommandInput;
    type Output = CommandOutput;

    fn name(&self) -> &str {
        &self.cmd
    }

    fn parameters(&self) -> Parameters {
        let mut params = Parameters::new().with("cmd", self.cmd.as_str());
        if let Some(dir) = &self.working_dir {
            params.insert("working_dir", dir.to_string_lossy().into_owned());
        }
        params
    }

    fn execute(&self, input: CommandInput) -> Result<CommandOutput> {
        info!(cmd = %self.cmd, "starting command");

        let output = self
            .build(input)
            .output()
            .with_context(|| format!("spawning command '{}'", self.cmd))?;

        self.finish(output)
    }
}
