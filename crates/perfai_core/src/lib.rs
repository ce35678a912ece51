//! PerfAI core: wire types, view-model derivation and the pure poll-cycle state machine.
mod effect;
mod history;
mod job;
mod lenient;
mod msg;
mod options;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use history::{filter_history, DashboardStats, Latency, ScoreBand};
pub use job::{
    ApiEndpointStat, EndpointHealth, JobError, JobId, JobStatus, JobSummary, Metrics,
    RawJobResponse, Recommendation, Severity, StartedAnalysis, Timestamp,
};
pub use msg::Msg;
pub use options::{Backoff, PollOptions};
pub use state::{PollerState, Stage};
pub use update::{update, PollError, JOB_FAILED_MESSAGE, TRANSPORT_FAILURE_MESSAGE};
pub use view_model::{merge, ArtifactPolicy, MergeDefaults, ViewModel};
