use std::time::Duration;

use perfai_logging::{perfai_debug, perfai_warn};

use crate::{merge, Effect, JobStatus, Msg, PollOptions, PollerState, Stage};

pub const TRANSPORT_FAILURE_MESSAGE: &str = "Failed to load analysis.";
pub const JOB_FAILED_MESSAGE: &str = "Analysis failed.";

/// Why a poll session ended without a completed job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    /// The backend could not be reached or answered with an error. The detail
    /// is kept for logs; consumers see the generic message.
    #[error("Failed to load analysis.")]
    Transport(String),
    /// The backend reported `status: failed`.
    #[error("{0}")]
    JobFailed(String),
    #[error("Analysis did not finish after {0} attempts.")]
    AttemptsExhausted(u32),
}

/// Pure poll-cycle transition: applies one fetch outcome and returns what to do next.
///
/// The view model is replaced wholesale on every successful fetch.
pub fn update(mut state: PollerState, msg: Msg, options: &PollOptions) -> (PollerState, Effect) {
    state.attempts = state.attempts.saturating_add(1);

    let effect = match msg {
        Msg::FetchFailed { detail } => {
            perfai_warn!("Poll attempt {} failed in transport: {}", state.attempts, detail);
            state.fail(PollError::Transport(detail));
            Effect::Stop
        }
        Msg::FetchSucceeded(raw) => {
            state.view_model = Some(merge(&options.defaults, &raw));
            match raw.status {
                Some(JobStatus::Completed) => {
                    state.stage = Stage::PrimaryComplete;
                    state.terminal = true;
                    Effect::Stop
                }
                Some(JobStatus::Failed) => {
                    let message = raw
                        .error
                        .and_then(|error| error.message)
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| JOB_FAILED_MESSAGE.to_string());
                    state.fail(PollError::JobFailed(message));
                    Effect::Stop
                }
                Some(JobStatus::WaitingForSecondaryData) => continue_polling(
                    &mut state,
                    Stage::PrimaryComplete,
                    options.waiting_interval,
                    options,
                ),
                Some(JobStatus::Pending) => continue_polling(
                    &mut state,
                    Stage::PrimaryAudit,
                    options.initial_interval,
                    options,
                ),
                other => {
                    perfai_warn!(
                        "Treating response with status {:?} as still running",
                        other.as_ref().map(JobStatus::as_str)
                    );
                    continue_polling(
                        &mut state,
                        Stage::PrimaryAudit,
                        options.initial_interval,
                        options,
                    )
                }
            }
        }
    };

    (state, effect)
}

fn continue_polling(
    state: &mut PollerState,
    stage: Stage,
    base: Duration,
    options: &PollOptions,
) -> Effect {
    if state.attempts > 1 && state.stage == stage {
        state.phase_cycles = state.phase_cycles.saturating_add(1);
    } else {
        state.phase_cycles = 0;
    }
    state.stage = stage;
    state.terminal = false;

    if let Some(max) = options.max_attempts {
        if state.attempts >= max {
            state.fail(PollError::AttemptsExhausted(state.attempts));
            return Effect::Stop;
        }
    }

    let delay = options.backoff.delay(base, state.phase_cycles);
    perfai_debug!(
        "Attempt {} at stage {}: next poll in {:?}",
        state.attempts,
        stage.index(),
        delay
    );
    Effect::ScheduleNext { delay }
}
