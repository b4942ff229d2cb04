//! Child process execution

pub mod local;

use crate::error::PoseError;
use crate::invoker::PoseCommand;
use async_trait::async_trait;

pub use local::TokioProcessRunner;

/// Exit status and captured streams of a finished child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a command to completion and captures its output
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &PoseCommand) -> Result<ProcessOutput, PoseError>;
}
