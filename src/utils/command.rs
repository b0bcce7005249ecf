//! Process execution primitives with captured output and exit codes.

use std::path::Path;
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::{CommandFailedDetails, Error, Result};

/// Captured output from an external process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    pub command: String,
    pub success: bool,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ProcessOutput {
    fn from_output(command: String, output: Output) -> Self {
        Self {
            command,
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }

    pub fn failure_details(&self) -> CommandFailedDetails {
        CommandFailedDetails {
            command: self.command.clone(),
            exit_code: self.exit_code,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }

    /// Turn a non-zero exit into the error built by `to_error`.
    pub fn require_success(self, to_error: fn(CommandFailedDetails) -> Error) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(to_error(self.failure_details()))
        }
    }
}

/// Render a program and its arguments the way a user would type them.
pub fn display_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| {
        if a.is_empty() || a.contains(char::is_whitespace) {
            format!("'{}'", a.replace('\'', "'\\''"))
        } else {
            a.to_string()
        }
    }));
    parts.join(" ")
}

/// Run a program in `dir` and capture its output.
///
/// A non-zero exit is not an error here; only failing to start the
/// process is. Callers decide what a failed exit means.
pub fn capture(dir: &Path, program: &str, args: &[&str]) -> Result<ProcessOutput> {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::process_spawn_failed(program, e.to_string()))?;

    Ok(ProcessOutput::from_output(display_command(program, args), output))
}

/// Check if a command succeeds in a directory without surfacing its output.
pub fn succeeded_in(dir: &Path, program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Whether `program --version` can be started and exits cleanly.
pub fn is_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
