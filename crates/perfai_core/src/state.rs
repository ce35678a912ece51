use serde::Serialize;

use crate::{PollError, ViewModel};

/// Two-phase progress indicator derived from the job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Stage {
    /// Primary (Lighthouse) audit still running.
    #[default]
    PrimaryAudit,
    /// Primary audit done; secondary data may still be arriving.
    PrimaryComplete,
}

impl Stage {
    pub fn index(self) -> u8 {
        match self {
            Stage::PrimaryAudit => 0,
            Stage::PrimaryComplete => 1,
        }
    }
}

/// Everything a consumer needs to render one poll session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollerState {
    pub view_model: Option<ViewModel>,
    pub stage: Stage,
    pub terminal: bool,
    pub error_message: Option<String>,
    /// Typed form of `error_message`.
    pub failure: Option<PollError>,
    /// Completed fetches in this session.
    pub attempts: u32,
    /// Consecutive non-terminal cycles spent in the current stage.
    pub phase_cycles: u32,
}

impl PollerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub(crate) fn fail(&mut self, error: PollError) {
        self.terminal = true;
        self.error_message = Some(error.to_string());
        self.failure = Some(error);
    }
}
