//! Drives repeated status fetches for one job until it reaches a terminal state.
//!
//! Each [`JobStatusPoller`] owns one tokio task, one cancellation token and
//! its own [`PollerState`]. The decision of what to do after a fetch lives in
//! [`perfai_core::update`]; this module only executes the resulting effects.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use perfai_core::{update, Effect, JobId, Msg, PollOptions, PollerState};
use perfai_logging::{perfai_debug, perfai_info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::JobFetcher;

/// Receives every state a poller produces.
pub trait UpdateSink: Send + Sync {
    fn on_update(&self, state: &PollerState);
}

impl<F> UpdateSink for F
where
    F: Fn(&PollerState) + Send + Sync,
{
    fn on_update(&self, state: &PollerState) {
        self(state)
    }
}

static NEXT_POLLER_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Id of the poller whose sink is running on this thread, 0 when none.
    static DELIVERING: Cell<u64> = const { Cell::new(0) };
}

/// Serializes sink calls against `stop` so no call can begin after `stop` returns.
struct Delivery {
    id: u64,
    gate: Mutex<()>,
    cancel: CancellationToken,
    sink: Arc<dyn UpdateSink>,
}

impl Delivery {
    /// Returns `false` once the poller has been stopped.
    fn deliver(&self, state: &PollerState) -> bool {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            return false;
        }
        let _marker = DeliveringMarker::enter(self.id);
        self.sink.on_update(state);
        true
    }

    fn close(&self) {
        self.cancel.cancel();
        // Inside any sink we must not wait: our own gate is held by this
        // thread, and another poller's sink may be waiting on ours.
        if DELIVERING.with(Cell::get) == 0 {
            drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}

struct DeliveringMarker {
    previous: u64,
}

impl DeliveringMarker {
    fn enter(id: u64) -> Self {
        let previous = DELIVERING.with(|current| current.replace(id));
        Self { previous }
    }
}

impl Drop for DeliveringMarker {
    fn drop(&mut self) {
        DELIVERING.with(|current| current.set(self.previous));
    }
}

pub struct JobStatusPoller {
    job_id: JobId,
    delivery: Arc<Delivery>,
    task: Option<JoinHandle<()>>,
}

impl JobStatusPoller {
    /// Starts polling `job_id`. Must be called within a tokio runtime.
    ///
    /// `sink` is called once right away with the empty initial state, then
    /// exactly once per completed cycle.
    pub fn start(
        job_id: JobId,
        fetcher: Arc<dyn JobFetcher>,
        sink: Arc<dyn UpdateSink>,
        options: PollOptions,
    ) -> Self {
        let delivery = Arc::new(Delivery {
            id: NEXT_POLLER_ID.fetch_add(1, Ordering::Relaxed),
            gate: Mutex::new(()),
            cancel: CancellationToken::new(),
            sink,
        });

        let state = PollerState::new();
        delivery.deliver(&state);

        perfai_info!("Polling job {}", job_id);
        let task = tokio::spawn(run_cycles(
            job_id.clone(),
            fetcher,
            delivery.clone(),
            options,
            state,
        ));

        Self {
            job_id,
            delivery,
            task: Some(task),
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Cancels any pending cycle. Idempotent, and safe to call from any sink.
    ///
    /// Outside a sink, no update is delivered once this returns. Called from
    /// inside a sink it does not wait for another thread's in-flight
    /// delivery, but no new delivery starts.
    pub fn stop(&self) {
        self.delivery.close();
    }

    /// True once the poller was stopped or its job reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.delivery.cancel.is_cancelled()
            || self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits until the polling task has exited.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for JobStatusPoller {
    fn drop(&mut self) {
        self.delivery.cancel.cancel();
    }
}

async fn run_cycles(
    job_id: JobId,
    fetcher: Arc<dyn JobFetcher>,
    delivery: Arc<Delivery>,
    options: PollOptions,
    mut state: PollerState,
) {
    let cancel = delivery.cancel.clone();
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = fetcher.fetch_job(&job_id) => outcome,
        };

        let msg = match outcome {
            Ok(raw) => Msg::FetchSucceeded(raw),
            Err(err) => Msg::FetchFailed {
                detail: err.to_string(),
            },
        };
        let (next, effect) = update(state, msg, &options);
        state = next;

        if !delivery.deliver(&state) {
            break;
        }

        match effect {
            Effect::Stop => {
                perfai_info!(
                    "Job {} finished after {} attempts: {}",
                    job_id,
                    state.attempts,
                    state.error_message.as_deref().unwrap_or("ok")
                );
                break;
            }
            Effect::ScheduleNext { delay } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    perfai_debug!("Poll task for job {} exited", job_id);
}
