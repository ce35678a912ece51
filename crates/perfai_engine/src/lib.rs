//! PerfAI engine: REST transport, job polling and effect execution.
mod client;
mod engine;
mod persist;
mod poller;
mod report;
mod token;
mod trigger;
mod types;

pub use client::{
    AnalysisApi, ApiClient, ClientSettings, GenerationTrigger, JobFetcher, DEFAULT_BASE_URL,
};
pub use engine::EngineHandle;
pub use persist::{ensure_output_dir, write_atomically, PersistError};
pub use poller::{JobStatusPoller, UpdateSink};
pub use report::{render_report, write_report, ReportError};
pub use token::{StaticToken, TokenProvider};
pub use trigger::request_secondary_generation;
pub use types::{ApiError, ApiFailureKind, EngineEvent};
