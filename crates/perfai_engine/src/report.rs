use std::path::{Path, PathBuf};

use perfai_core::{JobId, PollerState, ViewModel};
use serde::Serialize;

use crate::persist::{write_atomically, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// JSON document written for a finished (or abandoned) poll session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    job_id: &'a JobId,
    stage: u8,
    terminal: bool,
    attempts: u32,
    error_message: Option<&'a str>,
    view_model: Option<&'a ViewModel>,
}

pub fn render_report(job_id: &JobId, state: &PollerState) -> Result<String, ReportError> {
    let report = Report {
        job_id,
        stage: state.stage.index(),
        terminal: state.terminal,
        attempts: state.attempts,
        error_message: state.error_message.as_deref(),
        view_model: state.view_model.as_ref(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Serializes `state` as pretty JSON and writes it atomically to `path`.
pub fn write_report(path: &Path, job_id: &JobId, state: &PollerState) -> Result<PathBuf, ReportError> {
    let content = render_report(job_id, state)?;
    Ok(write_atomically(path, content.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perfai_core::Stage;

    #[test]
    fn empty_state_renders_nulls() {
        let text = render_report(&JobId::new("j1"), &PollerState::new()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["jobId"], "j1");
        assert_eq!(value["stage"], Stage::PrimaryAudit.index());
        assert_eq!(value["viewModel"], serde_json::Value::Null);
    }
}
