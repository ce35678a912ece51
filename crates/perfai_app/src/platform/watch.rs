use std::process::ExitCode;

use perfai_core::{JobId, PollerState, Stage};
use perfai_engine::{write_report, EngineEvent, EngineHandle};
use perfai_logging::{perfai_debug, perfai_info, perfai_warn};

use super::cli::WatchArgs;
use super::config::AppConfig;
use super::ui;

/// Polls `job_id` until it settles, printing progress to stderr and the report to stdout.
pub fn watch_job(
    engine: &EngineHandle,
    config: &AppConfig,
    job_id: JobId,
    args: &WatchArgs,
) -> anyhow::Result<ExitCode> {
    engine.watch(job_id.clone(), config.poll_options(args.max_attempts));

    let mut last_line = String::new();
    let mut generation_requested = false;
    let mut latest = PollerState::new();

    loop {
        let Some(event) = engine.recv() else {
            perfai_warn!("Engine stopped before job {} settled", job_id);
            break;
        };
        match event {
            EngineEvent::PollUpdate {
                job_id: updated,
                state,
            } if updated == job_id => {
                let line = ui::progress_line(&job_id, &state);
                if line != last_line {
                    eprintln!("{line}");
                    last_line = line;
                }

                let ready = state
                    .view_model
                    .as_ref()
                    .is_some_and(|vm| vm.ready_for_secondary_generation());
                if args.generate_ai && ready && !generation_requested {
                    perfai_info!("Requesting AI insights for job {}", job_id);
                    eprintln!("[{job_id}] Requesting AI insights...");
                    engine.generate_ai(job_id.clone());
                    generation_requested = true;
                }

                let done = state.terminal
                    || (args.primary_only && state.stage == Stage::PrimaryComplete);
                latest = state;
                if done {
                    break;
                }
            }
            EngineEvent::GenerationFailed { job_id: failed, error } if failed == job_id => {
                perfai_warn!("AI generation for job {} failed: {}", job_id, error);
                eprintln!("[{job_id}] AI insight request failed: {error}");
            }
            other => perfai_debug!("Ignoring engine event while watching: {:?}", other),
        }
    }

    if !latest.terminal {
        engine.unwatch(job_id.clone());
    }

    print!("{}", ui::report(&job_id, &latest));
    if let Some(path) = &args.output {
        let written = write_report(path, &job_id, &latest)?;
        eprintln!("Report written to {}", written.display());
    }

    Ok(if latest.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
