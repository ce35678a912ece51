use std::fmt::Write as _;

use chrono::{DateTime, Local};
use perfai_core::{
    DashboardStats, EndpointHealth, JobId, JobStatus, JobSummary, PollerState, ScoreBand, Stage,
    Timestamp, ViewModel,
};

use super::constants::*;

/// One-line progress summary printed whenever a poll changes something visible.
pub fn progress_line(job_id: &JobId, state: &PollerState) -> String {
    let stage = match state.stage {
        Stage::PrimaryAudit => "Running Lighthouse audit",
        Stage::PrimaryComplete => "Lighthouse audit complete",
    };
    let status = state
        .view_model
        .as_ref()
        .and_then(|vm| vm.status.as_ref())
        .map(JobStatus::as_str)
        .unwrap_or("queued");

    let mut line = format!("[{job_id}] {stage} ({status}, poll {})", state.attempts);
    if let Some(vm) = &state.view_model {
        if vm.is_waiting_for_secondary_data() {
            let _ = write!(
                line,
                " - waiting for backend telemetry, {} route(s) captured",
                vm.captured_routes()
            );
        }
    }
    if let Some(message) = &state.error_message {
        let _ = write!(line, " - {message}");
    }
    line
}

/// Full human-readable report for the latest state of a job.
pub fn report(job_id: &JobId, state: &PollerState) -> String {
    let mut out = String::new();
    let Some(vm) = &state.view_model else {
        let _ = writeln!(out, "Analysis {job_id}: no data received");
        if let Some(message) = &state.error_message {
            let _ = writeln!(out, "Error: {message}");
        }
        return out;
    };

    let _ = writeln!(out, "Analysis {job_id}");
    if let Some(url) = &vm.target_url {
        let _ = writeln!(out, "URL:     {url}");
    }
    if let Some(created) = &vm.created_at {
        let _ = writeln!(out, "Created: {}", format_timestamp(created));
    }
    let status = vm.status.as_ref().map(JobStatus::as_str).unwrap_or(MISSING_VALUE);
    let _ = writeln!(out, "Status:  {status}");

    write_performance(&mut out, vm);
    write_seo(&mut out, vm);
    write_api(&mut out, vm);
    write_recommendations(&mut out, vm);

    if let Some(message) = &state.error_message {
        let _ = writeln!(out);
        let _ = writeln!(out, "Error: {message}");
    }
    if let Some(detail) = vm.error.as_ref().and_then(|e| e.message.as_deref()) {
        if state.error_message.as_deref() != Some(detail) {
            let _ = writeln!(out, "Backend error: {detail}");
        }
    }
    out
}

fn write_performance(out: &mut String, vm: &ViewModel) {
    let _ = writeln!(out);
    let _ = writeln!(out, "Performance: {}", format_score(vm.performance_score()));
    for (key, label) in PERFORMANCE_METRICS {
        let value = vm.performance_metric(key);
        let flag = if metric_needs_attention(key, value.as_deref()) {
            "  (needs attention)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {:<28} {}{}",
            label,
            value.as_deref().unwrap_or(MISSING_VALUE),
            flag
        );
    }
}

fn write_seo(out: &mut String, vm: &ViewModel) {
    let _ = writeln!(out);
    let _ = writeln!(out, "SEO: {}", format_score(vm.seo_score()));
    for issue in vm.seo_issues() {
        let text = issue
            .as_str()
            .map(str::to_string)
            .or_else(|| {
                issue
                    .get("title")
                    .and_then(|t| t.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| issue.to_string());
        let _ = writeln!(out, "  - {text}");
    }
}

fn write_api(out: &mut String, vm: &ViewModel) {
    if vm.api.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "API endpoints ({}):", vm.api.len());
    for stat in &vm.api {
        let endpoint = format!(
            "{} {}",
            stat.method.as_deref().unwrap_or("GET"),
            stat.endpoint.as_deref().unwrap_or(MISSING_VALUE)
        );
        let latency = stat
            .best_latency()
            .map(|ms| format!("{ms:.0}ms"))
            .unwrap_or_else(|| MISSING_VALUE.to_string());
        let health = match stat.health() {
            EndpointHealth::Optimal => "optimal",
            EndpointHealth::Slow => "slow",
        };
        let _ = writeln!(
            out,
            "  {:<width$} {:>8} {:>6} hits {:>5.1}% ok  {}",
            truncate(&endpoint, ENDPOINT_COLUMN_WIDTH),
            latency,
            stat.hits(),
            stat.success_rate(),
            health,
            width = ENDPOINT_COLUMN_WIDTH
        );
    }
}

fn write_recommendations(out: &mut String, vm: &ViewModel) {
    if vm.ai.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "AI recommendations:");
    for rec in &vm.ai {
        let _ = writeln!(
            out,
            "  [{}] {} ({})",
            rec.severity.as_str(),
            rec.title,
            rec.category()
        );
        if !rec.description.is_empty() {
            let _ = writeln!(out, "      {}", rec.description);
        }
        if let Some(fix) = &rec.suggested_fix {
            let _ = writeln!(out, "      Fix: {fix}");
        }
    }
}

/// Tabular listing of past analyses.
pub fn history_table(rows: &[&JobSummary]) -> String {
    if rows.is_empty() {
        return "No analyses found.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:<width$} {:<16} {:<28} {:>5}",
        "ID",
        "URL",
        "DATE",
        "STATUS",
        "SCORE",
        width = URL_COLUMN_WIDTH
    );
    for row in rows {
        let date = row
            .date
            .as_deref()
            .map(format_date_text)
            .unwrap_or_else(|| MISSING_VALUE.to_string());
        let status = row.status.as_ref().map(JobStatus::as_str).unwrap_or(MISSING_VALUE);
        let _ = writeln!(
            out,
            "{:<12} {:<width$} {:<16} {:<28} {:>5}",
            truncate(row.id.as_str(), 12),
            truncate(&row.url, URL_COLUMN_WIDTH),
            date,
            status,
            format_banded_score(row.score),
            width = URL_COLUMN_WIDTH
        );
    }
    out
}

pub fn stats(stats: &DashboardStats) -> String {
    let latency = stats
        .avg_latency
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| MISSING_VALUE.to_string());
    format!(
        "Total analyses:      {}\nAvg performance:     {}\nAvg SEO:             {}\nAvg API latency:     {}\n",
        stats.total_analyses,
        format_score(stats.avg_performance),
        format_score(stats.avg_seo),
        latency
    )
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{score:.0}/100"),
        None => MISSING_VALUE.to_string(),
    }
}

fn format_banded_score(score: Option<f64>) -> String {
    let marker = match ScoreBand::from_score(score) {
        ScoreBand::Good => "+",
        ScoreBand::Average => "~",
        ScoreBand::Poor => "!",
        ScoreBand::Unscored => return MISSING_VALUE.to_string(),
    };
    format!("{}{marker}", score.unwrap_or_default().round())
}

fn metric_needs_attention(key: &str, value: Option<&str>) -> bool {
    let Some(number) = value.and_then(leading_number) else {
        return false;
    };
    match key {
        "lcp" => number > LCP_WARN_THRESHOLD,
        "cls" => number > CLS_WARN_THRESHOLD,
        _ => false,
    }
}

/// Parses the numeric prefix of values like `"1.8 s"` or `"0.05"`.
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

fn format_timestamp(timestamp: &Timestamp) -> String {
    match timestamp {
        Timestamp::Text(text) => format_date_text(text),
        Timestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
            .map(|utc| utc.with_timezone(&Local).format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| ms.to_string()),
    }
}

fn format_date_text(text: &str) -> String {
    DateTime::parse_from_rfc3339(text)
        .map(|parsed| parsed.with_timezone(&Local).format(DATE_FORMAT).to_string())
        .unwrap_or_else(|_| text.to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfai_core::{merge, MergeDefaults, RawJobResponse};
    use serde_json::json;

    fn state_from(raw: serde_json::Value) -> PollerState {
        let raw: RawJobResponse = serde_json::from_value(raw).unwrap();
        PollerState {
            view_model: Some(merge(&MergeDefaults::default(), &raw)),
            stage: Stage::PrimaryComplete,
            terminal: true,
            attempts: 4,
            ..PollerState::new()
        }
    }

    #[test]
    fn leading_number_reads_units() {
        assert_eq!(leading_number("1.8 s"), Some(1.8));
        assert_eq!(leading_number(" 0.25"), Some(0.25));
        assert_eq!(leading_number("n/a"), None);
    }

    #[test]
    fn slow_vitals_are_flagged() {
        assert!(metric_needs_attention("lcp", Some("3.1 s")));
        assert!(!metric_needs_attention("lcp", Some("2.5 s")));
        assert!(metric_needs_attention("cls", Some("0.2")));
        assert!(!metric_needs_attention("ttfb", Some("900 ms")));
        assert!(!metric_needs_attention("lcp", None));
    }

    #[test]
    fn report_shows_placeholders_for_missing_metrics() {
        let state = state_from(json!({
            "status": "completed",
            "targetUrl": "https://example.com",
            "metrics": { "performance": { "score": 87, "lcp": "3.4 s" } }
        }));
        let text = report(&JobId::new("42"), &state);
        assert!(text.contains("URL:     https://example.com"));
        assert!(text.contains("Performance: 87/100"));
        assert!(text.contains("3.4 s  (needs attention)"));
        assert!(text.contains("Cumulative Layout Shift      ---"));
        assert!(text.contains("SEO: 0/100"));
    }

    #[test]
    fn report_lists_endpoints_and_recommendations() {
        let state = state_from(json!({
            "status": "completed",
            "metrics": {
                "api": [{ "endpoint": "/api/users", "method": "POST", "avgLatency": 320.4, "isSlow": true }],
                "ai": [{ "title": "Compress images", "description": "Use WebP.", "severity": "high" }]
            }
        }));
        let text = report(&JobId::new("7"), &state);
        assert!(text.contains("POST /api/users"));
        assert!(text.contains("320ms"));
        assert!(text.contains("slow"));
        assert!(text.contains("[high] Compress images (General)"));
        assert!(text.contains("Use WebP."));
    }

    #[test]
    fn progress_line_mentions_captured_routes_while_waiting() {
        let mut state = state_from(json!({
            "status": "waiting_for_secondary_data",
            "metrics": { "api": [{ "endpoint": "/a" }, { "endpoint": "/b" }] }
        }));
        state.terminal = false;
        let line = progress_line(&JobId::new("9"), &state);
        assert!(line.starts_with("[9] Lighthouse audit complete"));
        assert!(line.contains("2 route(s) captured"));
    }

    #[test]
    fn history_table_bands_scores() {
        let rows: Vec<JobSummary> = serde_json::from_value(json!([
            { "id": 1, "url": "https://fast.dev", "score": 95 },
            { "id": 2, "url": "https://slow.dev", "score": 20 },
            { "id": 3, "url": "https://new.dev" }
        ]))
        .unwrap();
        let refs: Vec<&JobSummary> = rows.iter().collect();
        let text = history_table(&refs);
        assert!(text.contains("95+"));
        assert!(text.contains("20!"));
        assert_eq!(text.lines().count(), 4);
        assert_eq!(history_table(&[]), "No analyses found.\n");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 6), "abc...");
    }
}
