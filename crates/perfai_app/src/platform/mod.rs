mod app;
pub mod cli;
mod config;
mod logging;
mod ui;
mod watch;

pub use app::run_app;
