//! Error types for Drydock.

use crate::BuildPhase;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("queue is full")]
    QueueFull,

    #[error("phase {phase} failed for job {job_id}: {message}")]
    PhaseFailed {
        phase: BuildPhase,
        job_id: String,
        message: String,
    },

    #[error("operation failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("cancelled")]
    Cancelled,

    #[error("source sync failed: {0}")]
    SyncFailed(String),

    #[error("project build failed: {0}")]
    BuildFailed(String),

    #[error("image build failed: {0}")]
    ImageBuildFailed(String),

    #[error("dependency cache error: {0}")]
    Cache(String),

    #[error("message bus error: {0}")]
    Bus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
