//! Wire types returned by the analysis backend.
//!
//! The backend is loose about shapes (ids arrive as numbers or strings, the
//! waiting status has had two spellings, metric entries drift in type), so the
//! types here accept every form observed and normalize it. A field that cannot
//! be interpreted decodes as absent instead of failing the response.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::lenient;

/// Opaque job (session) identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "WireId")]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for JobId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => Self(text),
            WireId::Number(number) => Self(number.to_string()),
        }
    }
}

/// Lifecycle status reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    /// Primary audit done; telemetry or AI output may still arrive.
    WaitingForSecondaryData,
    Completed,
    Failed,
    /// Any status this client does not know. Treated as still running.
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::WaitingForSecondaryData => "waiting_for_secondary_data",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => JobStatus::Pending,
            // Older backends call the waiting phase after the telemetry it waits for.
            "waiting_for_secondary_data" | "waiting_for_telemetry" => {
                JobStatus::WaitingForSecondaryData
            }
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(value),
        }
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        match value {
            JobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creation time as sent by the backend: either an ISO string or epoch millis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Text(String),
    EpochMillis(i64),
}

/// Raw snapshot of a job as returned by `GET /analysis/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawJobResponse {
    #[serde(default, deserialize_with = "lenient::value")]
    pub id: Option<JobId>,
    #[serde(default, deserialize_with = "lenient::from_text")]
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub target_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub metrics: Option<Metrics>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub artifacts: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub error: Option<JobError>,
    /// Top-level fields this client has no typed slot for.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawJobResponse {
    pub fn with_status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient::value")]
    pub performance: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub seo: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub api: Option<Vec<ApiEndpointStat>>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub ai: Option<Vec<Recommendation>>,
}

/// Failure detail; the backend sends either `{ "message": ... }` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct JobError {
    pub message: Option<String>,
}

impl From<Value> for JobError {
    fn from(value: Value) -> Self {
        let message = match value {
            Value::Object(mut fields) => fields.remove("message").and_then(lenient::as_text),
            other => lenient::as_text(other),
        };
        Self { message }
    }
}

/// Latency statistics for one backend route captured by the telemetry SDK.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpointStat {
    #[serde(default, deserialize_with = "lenient::text")]
    pub endpoint: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub best_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub p95: Option<f64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub hit_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub success_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_slow: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointHealth {
    Optimal,
    Slow,
}

impl ApiEndpointStat {
    pub fn best_latency(&self) -> Option<f64> {
        self.best_latency.or(self.avg_latency)
    }

    pub fn hits(&self) -> u64 {
        self.hit_count.or(self.count).unwrap_or(1)
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate.unwrap_or(100.0)
    }

    pub fn health(&self) -> EndpointHealth {
        if self.is_slow.unwrap_or(false) {
            EndpointHealth::Slow
        } else {
            EndpointHealth::Optimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Medium,
        }
    }
}

impl From<Severity> for String {
    fn from(value: Severity) -> Self {
        value.as_str().to_string()
    }
}

/// One AI-generated optimization suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "severity_or_default")]
    pub severity: Severity,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub suggested_fix: Option<String>,
}

fn severity_or_default<'de, D>(de: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::from_text(de)?.unwrap_or_default())
}

impl Recommendation {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("General")
    }
}

/// Response of `POST /analysis/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedAnalysis {
    pub session_id: JobId,
}

/// One row of `GET /analysis/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    #[serde(default, deserialize_with = "lenient::text_or_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::from_text")]
    pub status: Option<JobStatus>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub score: Option<f64>,
}
