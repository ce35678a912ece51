use std::path::Path;
use std::process::{Command, Output};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn perfai(workdir: &Path, base_url: &str, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("perfai").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("PERFAI_TOKEN")
        .env_remove("PERFAI_BASE_URL")
        .args(["--base-url", base_url, "--log-level", "error"])
        .args(args);
    cmd
}

async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("run perfai"))
        .await
        .expect("join")
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("perfai")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("generate-ai"));
}

#[test]
fn version_prints_package_version() {
    Command::cargo_bin("perfai")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn blank_url_is_rejected() {
    let temp = tempfile::TempDir::new().unwrap();
    perfai(temp.path(), "http://127.0.0.1:9/api", &["start", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("URL must not be empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn watch_prints_report_and_writes_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "status": "completed",
            "targetUrl": "https://example.com",
            "metrics": {
                "performance": { "score": 93, "lcp": "1.2 s" },
                "seo": { "score": 88, "issues": ["Missing meta description"] }
            }
        })))
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let base_url = format!("{}/api", server.uri());
    let output = run(perfai(
        temp.path(),
        &base_url,
        &["watch", "42", "--output", "out/report.json"],
    ))
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Performance: 93/100"))
        .stdout(predicate::str::contains("Missing meta description"));

    let written = std::fs::read_to_string(temp.path().join("out/report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(report["jobId"], "42");
    assert_eq!(report["terminal"], true);
    assert_eq!(report["viewModel"]["status"], "completed");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_job_exits_with_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "error": { "message": "timeout" }
        })))
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let base_url = format!("{}/api", server.uri());
    let output = run(perfai(temp.path(), &base_url, &["watch", "9"])).await;

    output
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: timeout"));
}

#[tokio::test(flavor = "multi_thread")]
async fn history_search_filters_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/history"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "url": "https://shop.example", "score": 91 },
            { "id": 2, "url": "https://blog.example", "score": 40 }
        ])))
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let base_url = format!("{}/api", server.uri());
    let output = run(perfai(
        temp.path(),
        &base_url,
        &["history", "--limit", "5", "--search", "SHOP"],
    ))
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("https://shop.example"))
        .stdout(predicate::str::contains("https://blog.example").not());
}

#[tokio::test(flavor = "multi_thread")]
async fn stats_falls_back_to_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/stats"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "url": "https://a.example", "score": 80 },
            { "id": 2, "url": "https://b.example", "score": 60 }
        ])))
        .mount(&server)
        .await;

    let temp = tempfile::TempDir::new().unwrap();
    let base_url = format!("{}/api", server.uri());
    let output = run(perfai(temp.path(), &base_url, &["stats"])).await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Total analyses:      2"))
        .stdout(predicate::str::contains("Avg performance:     70/100"));
}
