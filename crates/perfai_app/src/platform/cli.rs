use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Terminal client for the PerfAI website performance analysis service.
#[derive(Parser, Debug)]
#[command(name = "perfai", version, about)]
pub struct Cli {
    /// RON config file. Defaults to ./perfai.ron when it exists.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. https://host/api.
    #[arg(long, env = "PERFAI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token sent with every request.
    #[arg(long, env = "PERFAI_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Log level: error, warn, info, debug or trace.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new analysis for a URL.
    Start {
        url: String,
        /// Keep polling the new job and print its report.
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        watch_args: WatchArgs,
    },
    /// Poll an analysis until it finishes and print its report.
    Watch {
        id: String,
        #[command(flatten)]
        args: WatchArgs,
    },
    /// List recent analyses.
    History {
        /// Maximum number of rows to fetch.
        #[arg(long)]
        limit: Option<usize>,
        /// Only show rows whose URL contains this text.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show dashboard statistics.
    Stats,
    /// Request AI insight generation for an analysis.
    GenerateAi { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Request AI insights as soon as backend telemetry has been captured.
    #[arg(long)]
    pub generate_ai: bool,

    /// Stop once the Lighthouse audit is done instead of waiting for telemetry and AI insights.
    #[arg(long)]
    pub primary_only: bool,

    /// Write the final report as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Give up after this many polls; 0 polls until the job finishes.
    #[arg(long)]
    pub max_attempts: Option<u32>,
}
