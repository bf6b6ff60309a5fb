//! Per-file orchestration of extraction, generation and writing.

mod orchestrator;
mod stats;

use std::path::PathBuf;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::generation::LlmError;
use crate::task::TaskKind;
use crate::writer::WriteError;

pub use orchestrator::Pipeline;
pub use stats::{FailureRecord, RunStats};

/// A recoverable failure of one (file, task) pair.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Extraction(#[from] ExtractionError),

    #[error("{0}")]
    Generation(#[from] LlmError),

    #[error("{0}")]
    Write(#[from] WriteError),
}

impl TaskError {
    /// Stage at which the task failed, for logs.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extraction",
            Self::Generation(_) => "generation",
            Self::Write(_) => "write",
        }
    }
}

/// Terminal state of one task of one file.
#[derive(Debug)]
pub enum TaskOutcome {
    Written(PathBuf),
    /// The destination already existed.
    Skipped(PathBuf),
    Failed(TaskError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A failure with `continue_on_error` disabled. Carries the stats up to
    /// and including the failing file.
    #[error("run aborted: {task} of {} failed: {reason}", relative.display())]
    Aborted {
        relative: PathBuf,
        task: TaskKind,
        reason: String,
        stats: Box<RunStats>,
    },
}

impl PipelineError {
    pub fn stats(&self) -> &RunStats {
        match self {
            Self::Aborted { stats, .. } => stats,
        }
    }
}
