//! Execution of the gated command
//!
//! The command line comes from configuration and is split on whitespace only.
//! There is no quoting or escaping, so an argument containing a space cannot
//! be expressed. No shell is involved.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// A program and its arguments, split from a configured command string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    /// Split `raw` on whitespace. Returns `None` when there is no program.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Run the command once, capturing stdout and stderr in full.
    ///
    /// Any text on stderr makes the run a failure and stdout is discarded.
    /// The child is killed if the timeout elapses before it exits.
    pub async fn run(&self, timeout: Duration) -> Result<CommandOutput, CommandError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CommandError::Launch {
                program: self.program.clone(),
                source: e,
            })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| CommandError::TimedOut(timeout))?
            .map_err(CommandError::Io)?;

        tracing::debug!(
            program = %self.program,
            status = %output.status,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "Command finished"
        );

        Ok(CommandOutput::from_streams(&output.stdout, &output.stderr))
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a command that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Nothing was written to stderr
    Stdout(String),
    /// Something was written to stderr
    Stderr(String),
}

impl CommandOutput {
    /// Classify captured streams. Any byte on stderr, whitespace included, is a failure.
    pub fn from_streams(stdout: &[u8], stderr: &[u8]) -> Self {
        if !stderr.is_empty() {
            return CommandOutput::Stderr(String::from_utf8_lossy(stderr).into_owned());
        }
        CommandOutput::Stdout(String::from_utf8_lossy(stdout).into_owned())
    }
}

#[derive(Debug)]
pub enum CommandError {
    /// The program could not be started at all
    Launch {
        program: String,
        source: std::io::Error,
    },
    /// Reading the child's output or waiting on it failed
    Io(std::io::Error),
    TimedOut(Duration),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Launch { program, source } => {
                write!(f, "failed to launch {}: {}", program, source)
            }
            CommandError::Io(e) => write!(f, "failed to collect command output: {}", e),
            CommandError::TimedOut(d) => write!(f, "command timed out after {:?}", d),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Launch { source, .. } => Some(source),
            CommandError::Io(e) => Some(e),
            CommandError::TimedOut(_) => None,
        }
    }
}
