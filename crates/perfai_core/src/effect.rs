use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch again once `delay` has elapsed.
    ScheduleNext { delay: Duration },
    /// The session is terminal; no further cycles.
    Stop,
}
