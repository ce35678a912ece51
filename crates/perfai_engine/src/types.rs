use std::fmt;

use perfai_core::{DashboardStats, JobId, JobSummary, PollerState, StartedAnalysis};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A watched job produced a new poller state (including the initial empty one).
    PollUpdate { job_id: JobId, state: PollerState },
    AnalysisStarted(Result<StartedAnalysis, ApiError>),
    /// The AI-generation request for `job_id` was rejected.
    GenerationFailed { job_id: JobId, error: ApiError },
    /// The AI-generation request for `job_id` has finished, successfully or not.
    GenerationSettled { job_id: JobId },
    History(Result<Vec<JobSummary>, ApiError>),
    DashboardStats(Result<DashboardStats, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiFailureKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for ApiFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailureKind::InvalidUrl => write!(f, "invalid url"),
            ApiFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailureKind::Timeout => write!(f, "timeout"),
            ApiFailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            ApiFailureKind::Decode => write!(f, "malformed response body"),
            ApiFailureKind::Network => write!(f, "network error"),
        }
    }
}
