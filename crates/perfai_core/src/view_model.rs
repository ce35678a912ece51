use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    ApiEndpointStat, JobError, JobId, JobStatus, RawJobResponse, Recommendation, Timestamp,
};

/// Which `artifacts` keys may be lifted into [`ViewModel::extras`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArtifactPolicy {
    /// Lift every artifact key.
    #[default]
    Permissive,
    /// Lift only the named keys; everything else is dropped.
    AllowList(BTreeSet<String>),
}

impl ArtifactPolicy {
    pub fn allow<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ArtifactPolicy::AllowList(keys.into_iter().map(Into::into).collect())
    }

    pub fn admits(&self, key: &str) -> bool {
        match self {
            ArtifactPolicy::Permissive => true,
            ArtifactPolicy::AllowList(keys) => keys.contains(key),
        }
    }
}

/// Fallback values applied under every raw response.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeDefaults {
    pub performance: Map<String, Value>,
    pub seo: Map<String, Value>,
    pub artifacts: ArtifactPolicy,
}

impl Default for MergeDefaults {
    fn default() -> Self {
        let mut seo = Map::new();
        seo.insert("score".to_string(), json!(0));
        seo.insert("issues".to_string(), json!([]));
        Self {
            performance: Map::new(),
            seo,
            artifacts: ArtifactPolicy::default(),
        }
    }
}

/// Display-ready snapshot of a job, rebuilt from scratch on every poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub id: Option<JobId>,
    pub status: Option<JobStatus>,
    pub target_url: Option<String>,
    pub created_at: Option<Timestamp>,
    pub performance: Map<String, Value>,
    pub seo: Map<String, Value>,
    pub api: Vec<ApiEndpointStat>,
    pub ai: Vec<Recommendation>,
    pub error: Option<JobError>,
    /// Untyped top-level fields plus admitted artifacts (artifacts win).
    pub extras: Map<String, Value>,
}

impl ViewModel {
    pub fn performance_score(&self) -> Option<f64> {
        self.performance.get("score").and_then(Value::as_f64)
    }

    pub fn seo_score(&self) -> Option<f64> {
        self.seo.get("score").and_then(Value::as_f64)
    }

    pub fn seo_issues(&self) -> &[Value] {
        self.seo
            .get("issues")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A performance metric (`lcp`, `cls`, ...) rendered as text, if present.
    pub fn performance_metric(&self, key: &str) -> Option<String> {
        match self.performance.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn captured_routes(&self) -> usize {
        self.api.len()
    }

    pub fn is_waiting_for_secondary_data(&self) -> bool {
        self.status == Some(JobStatus::WaitingForSecondaryData)
    }

    /// Secondary (AI) generation needs captured telemetry while the job waits for it.
    pub fn ready_for_secondary_generation(&self) -> bool {
        self.is_waiting_for_secondary_data() && !self.api.is_empty()
    }
}

/// Builds a fresh [`ViewModel`] from `defaults` and one raw response.
///
/// Object-valued metrics are merged key by key over the defaults; list-valued
/// metrics are taken wholesale because each response is a full snapshot.
pub fn merge(defaults: &MergeDefaults, raw: &RawJobResponse) -> ViewModel {
    let metrics = raw.metrics.clone().unwrap_or_default();

    let mut extras = raw.extra.clone();
    if let Some(artifacts) = &raw.artifacts {
        for (key, value) in artifacts {
            if defaults.artifacts.admits(key) {
                extras.insert(key.clone(), value.clone());
            }
        }
    }

    let target_url = raw.target_url.clone().or_else(|| {
        extras
            .get("url")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned)
    });

    ViewModel {
        id: raw.id.clone(),
        status: raw.status.clone(),
        target_url,
        created_at: raw.created_at.clone(),
        performance: overlay(&defaults.performance, metrics.performance),
        seo: overlay(&defaults.seo, metrics.seo),
        api: metrics.api.unwrap_or_default(),
        ai: metrics.ai.unwrap_or_default(),
        error: raw.error.clone(),
        extras,
    }
}

fn overlay(base: &Map<String, Value>, top: Option<Map<String, Value>>) -> Map<String, Value> {
    let mut merged = base.clone();
    if let Some(top) = top {
        merged.extend(top);
    }
    merged
}
