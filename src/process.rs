//! Subprocess execution and failure classification.
//!
//! [`SystemCommandRunner`] is the production [`CommandRunner`]. Raw stderr
//! text is inspected in exactly one place, [`CommandOutput::failure_kind`],
//! so the rest of the crate branches on [`FailureKind`] instead of strings.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::traits::CommandRunner;

/// Exit code reported when the executable could not be started at all
pub const SPAWN_FAILED_EXIT_CODE: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandRequest {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Human-readable form used in log lines
    #[must_use]
    pub fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Classifies a failed command. Returns `None` for a zero exit code.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.is_success() {
            return None;
        }
        if self.exit_code == SPAWN_FAILED_EXIT_CODE {
            return Some(FailureKind::SpawnFailed);
        }

        let stderr = self.stderr.to_ascii_lowercase();
        let contains_any = |needles: &[&str]| needles.iter().any(|n| stderr.contains(n));

        if contains_any(&[
            "could not resolve host",
            "unable to access",
            "connection refused",
            "connection timed out",
            "network is unreachable",
            "could not read from remote repository",
        ]) {
            return Some(FailureKind::Network);
        }

        if (stderr.contains(".lock") && contains_any(&["file exists", "unable to create"]))
            || stderr.contains("locked working tree")
        {
            return Some(FailureKind::Locked);
        }

        // Several query commands (show-ref --quiet, merge-base --is-ancestor)
        // signal a negative answer with a bare exit code 1.
        if (self.exit_code == 1 && stderr.trim().is_empty())
            || contains_any(&[
                "not a valid",
                "unknown revision",
                "does not exist",
                "no such",
                "not found",
                "invalid reference",
                "no upstream",
            ])
        {
            return Some(FailureKind::NotFound);
        }

        Some(FailureKind::Other)
    }

    /// The most relevant line of stderr for a one-line error message
    #[must_use]
    pub fn error_line(&self) -> String {
        let lines: Vec<&str> = self
            .stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if let Some(line) = lines.iter().find(|line| {
            let lower = line.to_ascii_lowercase();
            lower.starts_with("fatal:") || lower.starts_with("error:")
        }) {
            return (*line).to_string();
        }

        lines.last().map_or_else(
            || format!("exited with status {}", self.exit_code),
            |line| (*line).to_string(),
        )
    }
}

/// Classified reason for a failed command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// The queried object does not exist (or the tool could not tell)
    NotFound,
    Network,
    /// Another process holds a lock on the repository metadata
    Locked,
    SpawnFailed,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::NotFound => "not found",
            FailureKind::Network => "network error",
            FailureKind::Locked => "repository locked",
            FailureKind::SpawnFailed => "could not start process",
            FailureKind::Other => "command failed",
        };
        f.write_str(label)
    }
}

/// Runs commands with [`std::process::Command`], blocking until exit
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, request: &CommandRequest) -> CommandOutput {
        debug!(command = %request.display(), cwd = %request.cwd.display(), "running");

        let mut command = Command::new(&request.program);
        command.args(&request.args).current_dir(&request.cwd);
        for (key, value) in &request.env {
            command.env(key, value);
        }

        match command.output() {
            Ok(output) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                // Killed by a signal: no exit code
                exit_code: output.status.code().unwrap_or(-1),
            },
            Err(e) => CommandOutput::failure(
                SPAWN_FAILED_EXIT_CODE,
                format!("failed to run `{}`: {}", request.program, e),
            ),
        }
    }
}
