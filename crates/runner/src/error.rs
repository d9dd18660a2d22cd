use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a command did not produce a successful [`crate::ProcessOutcome`].
///
/// Variants that ran the child carry whatever output was captured before it stopped.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("working directory {} does not exist", .0.display())]
    MissingWorkingDirectory(PathBuf),

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
        truncated: bool,
    },

    #[error("`{command}` was cancelled")]
    Cancelled {
        command: String,
        stdout: String,
        stderr: String,
        truncated: bool,
    },

    #[error("`{command}` timed out after {}s", .after.as_secs())]
    TimedOut {
        command: String,
        after: Duration,
        stdout: String,
        stderr: String,
        truncated: bool,
    },

    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    /// Exit code of a child that exited on its own; `None` when killed or never started.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Captured standard error, empty when the child never ran.
    pub fn stderr(&self) -> &str {
        match self {
            Self::NonZeroExit { stderr, .. }
            | Self::Cancelled { stderr, .. }
            | Self::TimedOut { stderr, .. } => stderr,
            _ => "",
        }
    }

    pub fn stdout(&self) -> &str {
        match self {
            Self::NonZeroExit { stdout, .. }
            | Self::Cancelled { stdout, .. }
            | Self::TimedOut { stdout, .. } => stdout,
            _ => "",
        }
    }

    /// Whether either captured stream hit the capture cap.
    pub fn truncated(&self) -> bool {
        match self {
            Self::NonZeroExit { truncated, .. }
            | Self::Cancelled { truncated, .. }
            | Self::TimedOut { truncated, .. } => *truncated,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}
