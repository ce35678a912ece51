use std::fs;

use perfai_core::{
    merge, JobId, MergeDefaults, Msg, PollOptions, PollerState, RawJobResponse,
};
use perfai_engine::{ensure_output_dir, write_atomically, write_report};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("reports");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("report.json");

    write_atomically(&target, b"first").unwrap();
    assert_eq!(fs::read_to_string(&target).unwrap(), "first");

    let again = write_atomically(&target, b"second").unwrap();
    assert_eq!(again, target);
    assert_eq!(fs::read_to_string(&target).unwrap(), "second");
}

#[test]
fn no_partial_file_when_parent_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let result = write_atomically(&blocker.join("report.json"), b"data");
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

#[test]
fn report_contains_view_model_and_outcome() {
    let temp = TempDir::new().unwrap();
    let raw: RawJobResponse = serde_json::from_value(json!({
        "id": "j7",
        "status": "completed",
        "targetUrl": "https://example.com",
        "metrics": { "performance": { "score": 92 } }
    }))
    .unwrap();
    let (state, _) = perfai_core::update(
        PollerState::new(),
        Msg::FetchSucceeded(raw.clone()),
        &PollOptions::default(),
    );
    assert_eq!(
        state.view_model.as_ref(),
        Some(&merge(&MergeDefaults::default(), &raw))
    );

    let path = write_report(&temp.path().join("out/j7.json"), &JobId::new("j7"), &state).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(written["jobId"], "j7");
    assert_eq!(written["terminal"], true);
    assert_eq!(written["stage"], 1);
    assert_eq!(written["errorMessage"], serde_json::Value::Null);
    assert_eq!(written["viewModel"]["targetUrl"], "https://example.com");
    assert_eq!(written["viewModel"]["performance"]["score"], 92);
    assert_eq!(written["viewModel"]["status"], "completed");
}
