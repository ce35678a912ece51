use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use perfai_core::{
    DashboardStats, JobId, JobStatus, JobSummary, PollOptions, RawJobResponse, StartedAnalysis,
};
use perfai_engine::{
    AnalysisApi, ApiError, ApiFailureKind, EngineEvent, EngineHandle, GenerationTrigger,
    JobFetcher,
};

#[derive(Default)]
struct FakeBackend {
    statuses: Mutex<VecDeque<JobStatus>>,
    generation_fails: bool,
}

#[async_trait::async_trait]
impl JobFetcher for FakeBackend {
    async fn fetch_job(&self, job_id: &JobId) -> Result<RawJobResponse, ApiError> {
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(JobStatus::Completed);
        let mut raw = RawJobResponse::with_status(status);
        raw.id = Some(job_id.clone());
        Ok(raw)
    }
}

#[async_trait::async_trait]
impl GenerationTrigger for FakeBackend {
    async fn trigger_generation(&self, _job_id: &JobId) -> Result<(), ApiError> {
        if self.generation_fails {
            Err(ApiError::new(ApiFailureKind::HttpStatus(503), "unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl AnalysisApi for FakeBackend {
    async fn start_analysis(&self, url: &str) -> Result<StartedAnalysis, ApiError> {
        if url.is_empty() {
            return Err(ApiError::new(ApiFailureKind::HttpStatus(400), "url required"));
        }
        Ok(StartedAnalysis {
            session_id: JobId::new("new-session"),
        })
    }

    async fn history(&self, _limit: Option<usize>) -> Result<Vec<JobSummary>, ApiError> {
        Ok(Vec::new())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Err(ApiError::new(ApiFailureKind::HttpStatus(404), "no stats"))
    }
}

fn fast_options() -> PollOptions {
    PollOptions {
        initial_interval: Duration::from_millis(5),
        waiting_interval: Duration::from_millis(5),
        ..PollOptions::default()
    }
}

/// Collects events until `done` matches one, or fails after a few seconds.
fn collect_until(engine: &EngineHandle, done: impl Fn(&EngineEvent) -> bool) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let finished = done(&event);
            events.push(event);
            if finished {
                return events;
            }
        }
    }
    panic!("engine did not produce the expected event; got {events:?}");
}

#[test]
fn watch_streams_updates_until_terminal() {
    let backend = Arc::new(FakeBackend {
        statuses: Mutex::new(VecDeque::from([
            JobStatus::Pending,
            JobStatus::WaitingForSecondaryData,
            JobStatus::Completed,
        ])),
        ..FakeBackend::default()
    });
    let engine = EngineHandle::new(backend).expect("engine");
    engine.watch(JobId::new("j1"), fast_options());

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::PollUpdate { state, .. } if state.terminal)
    });

    let states: Vec<_> = events
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::PollUpdate { job_id, state } => {
                assert_eq!(job_id, JobId::new("j1"));
                Some(state)
            }
            _ => None,
        })
        .collect();
    assert_eq!(states.len(), 4);
    assert!(states[0].view_model.is_none());
    assert_eq!(states[3].attempts, 3);
}

#[test]
fn start_analysis_reports_session_id() {
    let engine = EngineHandle::new(Arc::new(FakeBackend::default())).expect("engine");
    engine.start_analysis("https://example.com");

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::AnalysisStarted(_))
    });
    match events.last() {
        Some(EngineEvent::AnalysisStarted(Ok(started))) => {
            assert_eq!(started.session_id, JobId::new("new-session"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn failed_generation_is_reported_before_it_settles() {
    let backend = Arc::new(FakeBackend {
        generation_fails: true,
        ..FakeBackend::default()
    });
    let engine = EngineHandle::new(backend).expect("engine");
    engine.generate_ai(JobId::new("j2"));

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::GenerationSettled { .. })
    });
    assert_eq!(events.len(), 2);
    match &events[0] {
        EngineEvent::GenerationFailed { job_id, error } => {
            assert_eq!(job_id, &JobId::new("j2"));
            assert_eq!(error.kind, ApiFailureKind::HttpStatus(503));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn one_shot_errors_come_back_as_events() {
    let engine = EngineHandle::new(Arc::new(FakeBackend::default())).expect("engine");
    engine.dashboard_stats();

    let events = collect_until(&engine, |event| {
        matches!(event, EngineEvent::DashboardStats(_))
    });
    assert!(matches!(
        events.last(),
        Some(EngineEvent::DashboardStats(Err(ApiError {
            kind: ApiFailureKind::HttpStatus(404),
            ..
        })))
    ));
}
