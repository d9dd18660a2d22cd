use crate::capture::{capture, CaptureBuffer};
use crate::error::RunError;
use crate::spec::{CommandSpec, ProcessOutcome};
use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Per-stream capture cap used when none is configured.
pub const DEFAULT_MAX_CAPTURE_BYTES: usize = 1024 * 1024;

/// How long to wait for pipe readers after killing a cancelled child. Grandchildren that
/// inherited the pipes may keep them open past the kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

type ReaderTask = JoinHandle<io::Result<()>>;

/// Seam between handlers and real subprocesses.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutcome, RunError>;
}

#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    max_capture_bytes: usize,
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self::with_capture_limit(DEFAULT_MAX_CAPTURE_BYTES)
    }

    pub fn with_capture_limit(max_capture_bytes: usize) -> Self {
        Self { max_capture_bytes }
    }

    /// Run `spec`, killing the child if `cancel` completes first.
    ///
    /// `cancel` bounds the whole run, including draining both pipes after the child exits.
    /// A triggered cancellation resolves to [`RunError::Cancelled`], never to a non-zero
    /// exit.
    pub async fn run_until<F>(&self, spec: &CommandSpec, cancel: F) -> Result<ProcessOutcome, RunError>
    where
        F: Future<Output = ()>,
    {
        let dir_exists = tokio::fs::metadata(&spec.working_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !dir_exists {
            return Err(RunError::MissingWorkingDirectory(spec.working_dir.clone()));
        }

        let command = spec.to_string();
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: spec.program.clone(),
                source,
            })?;
        log::debug!("spawned `{command}` in {}", spec.working_dir.display());

        let limit = self.max_capture_bytes;
        let stdout_buf = CaptureBuffer::default();
        let stderr_buf = CaptureBuffer::default();
        let mut stdout_task = tokio::spawn(capture(child.stdout.take(), limit, stdout_buf.clone()));
        let mut stderr_task = tokio::spawn(capture(child.stderr.take(), limit, stderr_buf.clone()));

        tokio::pin!(cancel);
        let finished = tokio::select! {
            finished = wait_and_drain(&mut child, &mut stdout_task, &mut stderr_task) => Some(finished),
            () = &mut cancel => None,
        };

        let Some(finished) = finished else {
            // The child may already be reaped while a grandchild holds the pipes.
            if matches!(child.try_wait(), Ok(None)) {
                if let Err(err) = child.kill().await {
                    log::warn!("failed to kill cancelled `{command}`: {err}");
                }
            }
            let drained = tokio::time::timeout(DRAIN_GRACE, async {
                let _ = (&mut stdout_task).await;
                let _ = (&mut stderr_task).await;
            })
            .await;
            if drained.is_err() {
                log::debug!("`{command}` left its pipes open; abandoning readers");
            }
            stdout_task.abort();
            stderr_task.abort();

            let stdout = stdout_buf.snapshot();
            let stderr = stderr_buf.snapshot();
            log::debug!("`{command}` cancelled");
            return Err(RunError::Cancelled {
                command,
                truncated: stdout.truncated || stderr.truncated,
                stdout: stdout.text,
                stderr: stderr.text,
            });
        };

        let status = finished.map_err(|source| RunError::Io {
            command: command.clone(),
            source,
        })?;
        let stdout = stdout_buf.snapshot();
        let stderr = stderr_buf.snapshot();
        let truncated = stdout.truncated || stderr.truncated;
        log::debug!("`{command}` finished with {status}");
        if status.success() {
            Ok(ProcessOutcome {
                exit_code: status.code().unwrap_or(0),
                truncated,
                stdout: stdout.text,
                stderr: stderr.text,
            })
        } else {
            Err(RunError::NonZeroExit {
                command,
                code: status.code(),
                stdout: stdout.text,
                stderr: stderr.text,
                truncated,
            })
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ProcessOutcome, RunError> {
        let Some(after) = spec.timeout else {
            return self.run_until(spec, std::future::pending::<()>()).await;
        };
        match self.run_until(spec, tokio::time::sleep(after)).await {
            Err(RunError::Cancelled {
                command,
                stdout,
                stderr,
                truncated,
            }) => Err(RunError::TimedOut {
                command,
                after,
                stdout,
                stderr,
                truncated,
            }),
            other => other,
        }
    }
}

/// Wait for the child and for both readers to hit EOF.
async fn wait_and_drain(
    child: &mut Child,
    stdout_task: &mut ReaderTask,
    stderr_task: &mut ReaderTask,
) -> io::Result<ExitStatus> {
    let status = child.wait().await?;
    join_reader(stdout_task).await?;
    join_reader(stderr_task).await?;
    Ok(status)
}

async fn join_reader(task: &mut ReaderTask) -> io::Result<()> {
    task.await.map_err(io::Error::other)?
}
