use thiserror::Error;

use crate::app::reporter::ReportError;
use crate::domain::{InvalidTransition, RunId, Stage};
use crate::ports::{RunnerError, TransformationError};

/// Pipeline-fatal errors. None of them is retried inside the core.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bronze cleaner failure, passed through unchanged.
    #[error(transparent)]
    Transformation(#[from] TransformationError),

    #[error("dbt command failed: {stderr}")]
    CommandFailure {
        stage: Stage,
        exit_code: i32,
        stderr: String,
    },

    #[error("{stage} stage could not start its command: {source}")]
    Runner {
        stage: Stage,
        #[source]
        source: RunnerError,
    },

    #[error("quality report for run {run_id} could not be written: {source}")]
    ReportWrite {
        run_id: RunId,
        #[source]
        source: ReportError,
    },

    #[error("run {0} is already in flight")]
    RunInFlight(RunId),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

impl PipelineError {
    /// Captured stderr of a failed tool command.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CommandFailure { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
