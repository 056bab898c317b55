use crate::types::JobHandle;
use thiserror::Error;

/// Failure taxonomy for campaign and enrichment runs.
///
/// Soft failures (a job whose results cannot be fetched, a probe whose
/// metadata lookup fails) never surface here; they are absorbed where they
/// happen and only logged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("measurement submission to '{target}' failed (batch {batch_index}): {message}")]
    Submission {
        target: String,
        batch_index: usize,
        message: String,
        /// Measurements accepted before the rejection.
        created: Vec<JobHandle>,
    },
    #[error("campaign produced no results")]
    EmptyResults { jobs: Vec<JobHandle> },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Measurements that exist on the platform despite the failure.
    pub fn created_jobs(&self) -> &[JobHandle] {
        match self {
            Error::Submission { created, .. } => created,
            Error::EmptyResults { jobs } => jobs,
            _ => &[],
        }
    }
}
