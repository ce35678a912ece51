mod constants;
mod render;

pub use render::{history_table, progress_line, report, stats};
