use std::time::Duration;

use crate::MergeDefaults;

/// How the delay grows while a job stays in the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Always wait the stage's base interval.
    #[default]
    Fixed,
    /// Multiply the base interval by `factor` per consecutive cycle, capped at `max_interval`.
    Exponential { factor: u32, max_interval: Duration },
}

impl Backoff {
    /// Delay before the next fetch after `streak` earlier cycles in the same stage.
    pub fn delay(&self, base: Duration, streak: u32) -> Duration {
        match *self {
            Backoff::Fixed => base,
            Backoff::Exponential {
                factor,
                max_interval,
            } => base
                .saturating_mul(factor.max(1).saturating_pow(streak))
                .min(max_interval),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollOptions {
    /// Interval while the primary audit is still running.
    pub initial_interval: Duration,
    /// Interval once the job waits for secondary data.
    pub waiting_interval: Duration,
    /// `None` polls until the job is terminal, however long that takes.
    pub max_attempts: Option<u32>,
    pub backoff: Backoff,
    pub defaults: MergeDefaults,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(2000),
            waiting_interval: Duration::from_millis(3000),
            max_attempts: None,
            backoff: Backoff::Fixed,
            defaults: MergeDefaults::default(),
        }
    }
}
