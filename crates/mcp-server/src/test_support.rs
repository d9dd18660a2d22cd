use async_trait::async_trait;
use rtlscope_runner::{CommandSpec, ProcessOutcome, ProcessRunner, RunError};
use std::sync::Mutex;

/// Cross-test synchronization for process-wide state (env vars, cwd, etc.).
///
/// Rust tests run in parallel by default, but env vars are shared per-process.
/// Any test that mutates or depends on process-wide env should lock this mutex.
pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Runner double that records every command instead of spawning it.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    fail_with_stderr: Option<String>,
}

impl RecordingRunner {
    pub(crate) fn failing(stderr: &str) -> Self {
        Self {
            calls: Mutex::default(),
            fail_with_stderr: Some(stderr.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutcome, RunError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        match &self.fail_with_stderr {
            Some(stderr) => Err(RunError::NonZeroExit {
                command: spec.to_string(),
                code: Some(2),
                stdout: String::new(),
                stderr: stderr.clone(),
                truncated: false,
            }),
            None => Ok(ProcessOutcome {
                exit_code: 0,
                stdout: "build ok\n".to_string(),
                stderr: String::new(),
                truncated: false,
            }),
        }
    }
}
