use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{lenient, JobSummary};

/// Rows whose URL contains `term`, ignoring case. A blank term keeps everything.
pub fn filter_history<'a>(rows: &'a [JobSummary], term: &str) -> Vec<&'a JobSummary> {
    let needle = term.trim().to_lowercase();
    rows.iter()
        .filter(|row| needle.is_empty() || row.url.to_lowercase().contains(&needle))
        .collect()
}

/// Traffic-light bucket for a 0-100 audit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Good,
    Average,
    Poor,
    /// No score yet (missing or zero).
    Unscored,
}

impl ScoreBand {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(score) if score >= 90.0 => ScoreBand::Good,
            Some(score) if score >= 50.0 => ScoreBand::Average,
            Some(score) if score > 0.0 => ScoreBand::Poor,
            _ => ScoreBand::Unscored,
        }
    }
}

/// Average latency as the backend reports it: preformatted text or milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Latency {
    Text(String),
    Millis(f64),
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Text(text) => f.write_str(text),
            Latency::Millis(ms) => write!(f, "{ms:.0}ms"),
        }
    }
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "total_or_zero")]
    pub total_analyses: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_performance: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_seo: Option<f64>,
    #[serde(default, deserialize_with = "lenient::value")]
    pub avg_latency: Option<Latency>,
}

fn total_or_zero<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::count(de)?.unwrap_or_default())
}

impl DashboardStats {
    /// Approximates the dashboard from history rows when the backend has no stats endpoint.
    pub fn from_history(rows: &[JobSummary]) -> Self {
        let scores: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.score)
            .filter(|score| *score > 0.0)
            .collect();
        let avg_performance = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        Self {
            total_analyses: rows.len() as u64,
            avg_performance,
            avg_seo: None,
            avg_latency: None,
        }
    }
}
