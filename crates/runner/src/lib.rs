//! Bounded subprocess execution.
//!
//! [`TokioProcessRunner`] spawns a command in a working directory, drains stdout and stderr
//! concurrently with the wait (so a chatty child never blocks on a full pipe), and resolves
//! successfully only on exit status zero. There is no implicit timeout and no retry; callers
//! bound execution with [`CommandSpec::timeout`] or [`TokioProcessRunner::run_until`].

mod capture;
mod error;
mod runner;
mod spec;

pub use error::RunError;
pub use runner::{ProcessRunner, TokioProcessRunner, DEFAULT_MAX_CAPTURE_BYTES};
pub use spec::{CommandSpec, ProcessOutcome};
