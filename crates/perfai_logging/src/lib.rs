#![deny(missing_docs)]
//! Shared logging utilities for the PerfAI workspace.
//!
//! Every crate logs through the `perfai_*` macros so the sink can be chosen
//! once by the binary. The macros go through the re-exported `log` facade,
//! which means callers do not need their own `log` dependency.

#[doc(hidden)]
pub use log;

use log::LevelFilter;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! perfai_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! perfai_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! perfai_info {
    ($($arg:tt)*) => {{
        $crate::log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! perfai_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! perfai_error {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
    }};
}

/// Parses a level name as written in config files (`"info"`, `"Debug"`, ...).
///
/// Unknown names fall back to `Info`.
pub fn parse_level(name: &str) -> LevelFilter {
    name.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Environment variable read by [`initialize_for_tests`].
pub const TEST_LOG_ENV: &str = "PERFAI_TEST_LOG";

/// Installs a stderr logger for test binaries, once per process.
///
/// The level comes from `PERFAI_TEST_LOG` (see [`parse_level`]) and defaults
/// to `warn`, so poll loops stay quiet unless a failing test is rerun with
/// `PERFAI_TEST_LOG=debug`. Later calls, or calls after another logger was
/// installed, do nothing.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = test_level(std::env::var(TEST_LOG_ENV).ok().as_deref());
    let config = ConfigBuilder::new()
        .add_filter_allow_str("perfai")
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Never);
}

fn test_level(setting: Option<&str>) -> LevelFilter {
    setting.map_or(LevelFilter::Warn, parse_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_accepts_mixed_case_and_falls_back() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level(" Warn "), LevelFilter::Warn);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_level_defaults_to_warn_and_honours_the_override() {
        assert_eq!(test_level(None), LevelFilter::Warn);
        assert_eq!(test_level(Some("trace")), LevelFilter::Trace);
        assert_eq!(test_level(Some("nonsense")), LevelFilter::Info);
    }
}
