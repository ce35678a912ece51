use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use perfai_core::{filter_history, DashboardStats, JobId};
use perfai_engine::{ApiClient, ApiFailureKind, EngineEvent, EngineHandle, StaticToken};
use perfai_logging::{perfai_debug, perfai_info, perfai_warn};

use super::cli::{Cli, Command};
use super::config::AppConfig;
use super::{logging, ui, watch};

pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);
    logging::initialize(&config.log);
    perfai_debug!("Using backend {}", config.base_url);

    let tokens = Arc::new(StaticToken::new(config.token.clone()));
    let client = ApiClient::new(config.client_settings(), tokens)
        .map_err(|err| anyhow!("invalid backend url {:?}: {err}", config.base_url))?;
    let engine = EngineHandle::new(Arc::new(client)).context("failed to start engine")?;

    match cli.command {
        Command::Start {
            url,
            watch,
            watch_args,
        } => {
            let url = url.trim();
            if url.is_empty() {
                bail!("URL must not be empty");
            }
            engine.start_analysis(url);
            let started = wait_for(&engine, |event| match event {
                EngineEvent::AnalysisStarted(result) => Some(result),
                _ => None,
            })?
            .context("failed to start analysis")?;
            perfai_info!("Started analysis {} for {}", started.session_id, url);
            println!("{}", started.session_id);
            if watch {
                return watch::watch_job(&engine, &config, started.session_id, &watch_args);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch { id, args } => watch::watch_job(&engine, &config, JobId::new(id), &args),
        Command::History { limit, search } => {
            let rows = fetch_history(&engine, limit)?;
            let shown = filter_history(&rows, search.as_deref().unwrap_or_default());
            print!("{}", ui::history_table(&shown));
            Ok(ExitCode::SUCCESS)
        }
        Command::Stats => {
            engine.dashboard_stats();
            let stats = match wait_for(&engine, |event| match event {
                EngineEvent::DashboardStats(result) => Some(result),
                _ => None,
            })? {
                Ok(stats) => stats,
                Err(err) if matches!(err.kind, ApiFailureKind::HttpStatus(404)) => {
                    perfai_warn!("No stats endpoint ({err}); deriving stats from history");
                    DashboardStats::from_history(&fetch_history(&engine, None)?)
                }
                Err(err) => return Err(err).context("failed to load dashboard stats"),
            };
            print!("{}", ui::stats(&stats));
            Ok(ExitCode::SUCCESS)
        }
        Command::GenerateAi { id } => {
            let job_id = JobId::new(id);
            engine.generate_ai(job_id.clone());
            let mut failed = false;
            wait_for(&engine, |event| match event {
                EngineEvent::GenerationFailed { job_id: id, error } if id == job_id => {
                    eprintln!("AI insight request failed: {error}");
                    failed = true;
                    None
                }
                EngineEvent::GenerationSettled { job_id: id } if id == job_id => Some(()),
                _ => None,
            })?;
            if failed {
                return Ok(ExitCode::FAILURE);
            }
            println!("AI insight generation requested for {job_id}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn fetch_history(
    engine: &EngineHandle,
    limit: Option<usize>,
) -> anyhow::Result<Vec<perfai_core::JobSummary>> {
    engine.history(limit);
    wait_for(engine, |event| match event {
        EngineEvent::History(result) => Some(result),
        _ => None,
    })?
    .context("failed to load history")
}

/// Drains engine events until `pick` accepts one.
fn wait_for<T>(
    engine: &EngineHandle,
    mut pick: impl FnMut(EngineEvent) -> Option<T>,
) -> anyhow::Result<T> {
    loop {
        let event = engine
            .recv()
            .ok_or_else(|| anyhow!("engine stopped unexpectedly"))?;
        if let Some(value) = pick(event) {
            return Ok(value);
        }
    }
}
