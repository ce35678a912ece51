use std::collections::HashMap;
use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use perfai_core::{JobId, PollOptions, PollerState};
use perfai_logging::perfai_debug;

use crate::poller::JobStatusPoller;
use crate::trigger::request_secondary_generation;
use crate::{AnalysisApi, EngineEvent, GenerationTrigger, JobFetcher};

enum EngineCommand {
    Watch { job_id: JobId, options: PollOptions },
    Unwatch { job_id: JobId },
    GenerateAi { job_id: JobId },
    StartAnalysis { url: String },
    History { limit: Option<usize> },
    DashboardStats,
}

/// Synchronous front for the async engine.
///
/// Owns a tokio runtime on a background thread. Commands go in through the
/// methods below; results come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new<A>(api: Arc<A>) -> io::Result<Self>
    where
        A: AnalysisApi + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("perfai-engine".to_string())
            .spawn(move || {
                let _guard = runtime.enter();
                let mut pollers: HashMap<JobId, JobStatusPoller> = HashMap::new();
                while let Ok(command) = cmd_rx.recv() {
                    handle_command(&api, &mut pollers, command, &event_tx);
                }
                for poller in pollers.values() {
                    poller.stop();
                }
                perfai_debug!("Engine command loop exited");
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    /// Starts (or restarts) polling `job_id`.
    pub fn watch(&self, job_id: JobId, options: PollOptions) {
        let _ = self.cmd_tx.send(EngineCommand::Watch { job_id, options });
    }

    pub fn unwatch(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::Unwatch { job_id });
    }

    pub fn generate_ai(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(EngineCommand::GenerateAi { job_id });
    }

    pub fn start_analysis(&self, url: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(EngineCommand::StartAnalysis { url: url.into() });
    }

    pub fn history(&self, limit: Option<usize>) {
        let _ = self.cmd_tx.send(EngineCommand::History { limit });
    }

    pub fn dashboard_stats(&self) {
        let _ = self.cmd_tx.send(EngineCommand::DashboardStats);
    }

    /// Blocks until the next event. `None` once the engine thread is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

fn handle_command<A>(
    api: &Arc<A>,
    pollers: &mut HashMap<JobId, JobStatusPoller>,
    command: EngineCommand,
    event_tx: &mpsc::Sender<EngineEvent>,
) where
    A: AnalysisApi + 'static,
{
    match command {
        EngineCommand::Watch { job_id, options } => {
            pollers.retain(|_, poller| !poller.is_finished());
            if let Some(previous) = pollers.remove(&job_id) {
                previous.stop();
            }
            let tx = event_tx.clone();
            let sink_job_id = job_id.clone();
            let sink = Arc::new(move |state: &PollerState| {
                let _ = tx.send(EngineEvent::PollUpdate {
                    job_id: sink_job_id.clone(),
                    state: state.clone(),
                });
            });
            let fetcher: Arc<dyn JobFetcher> = api.clone();
            let poller = JobStatusPoller::start(job_id.clone(), fetcher, sink, options);
            pollers.insert(job_id, poller);
        }
        EngineCommand::Unwatch { job_id } => {
            if let Some(poller) = pollers.remove(&job_id) {
                poller.stop();
            }
        }
        EngineCommand::GenerateAi { job_id } => {
            let trigger: Arc<dyn GenerationTrigger> = api.clone();
            let failed_tx = event_tx.clone();
            let failed_job_id = job_id.clone();
            let request = request_secondary_generation(job_id.clone(), trigger, move |error| {
                let _ = failed_tx.send(EngineEvent::GenerationFailed {
                    job_id: failed_job_id,
                    error,
                });
            });
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let _ = request.await;
                let _ = tx.send(EngineEvent::GenerationSettled { job_id });
            });
        }
        EngineCommand::StartAnalysis { url } => {
            let api = api.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let result = api.start_analysis(&url).await;
                let _ = tx.send(EngineEvent::AnalysisStarted(result));
            });
        }
        EngineCommand::History { limit } => {
            let api = api.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let result = api.history(limit).await;
                let _ = tx.send(EngineEvent::History(result));
            });
        }
        EngineCommand::DashboardStats => {
            let api = api.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let result = api.dashboard_stats().await;
                let _ = tx.send(EngineEvent::DashboardStats(result));
            });
        }
    }
}
