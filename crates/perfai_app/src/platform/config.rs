use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use perfai_core::{ArtifactPolicy, Backoff, MergeDefaults, PollOptions};
use perfai_engine::{ClientSettings, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use super::cli::Cli;
use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "perfai.ron";

/// Polls before `watch` gives up: 30 to 45 minutes at the default intervals.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 900;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_body_bytes: u64,
    pub poll: PollConfig,
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            max_body_bytes: client.max_body_bytes,
            poll: PollConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_interval_ms: u64,
    pub waiting_interval_ms: u64,
    /// `None` polls until the job is terminal.
    pub max_attempts: Option<u32>,
    /// Enables exponential backoff with this multiplier when set.
    pub backoff_factor: Option<u32>,
    pub max_interval_ms: u64,
    /// Restricts the artifact keys copied into the view model. `None` copies all of them.
    pub artifact_fields: Option<Vec<String>>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 2000,
            waiting_interval_ms: 3000,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            backoff_factor: None,
            max_interval_ms: 30_000,
            artifact_fields: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub destination: LogDestination,
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            destination: LogDestination::Terminal,
            file: PathBuf::from("./perfai.log"),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./perfai.ron` when no path is given and that file exists.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Command-line flags and environment variables win over the file.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(token) = &cli.token {
            self.token = Some(token.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log.level = level.clone();
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Poll options; `max_attempts_override` of `Some(0)` means unbounded.
    pub fn poll_options(&self, max_attempts_override: Option<u32>) -> PollOptions {
        let poll = &self.poll;
        let max_attempts = match max_attempts_override {
            Some(0) => None,
            Some(max) => Some(max),
            None => poll.max_attempts,
        };
        let backoff = match poll.backoff_factor {
            Some(factor) if factor > 1 => Backoff::Exponential {
                factor,
                max_interval: Duration::from_millis(poll.max_interval_ms),
            },
            _ => Backoff::Fixed,
        };
        let artifacts = match &poll.artifact_fields {
            Some(fields) => ArtifactPolicy::allow(fields.iter().cloned()),
            None => ArtifactPolicy::Permissive,
        };

        PollOptions {
            initial_interval: Duration::from_millis(poll.initial_interval_ms),
            waiting_interval: Duration::from_millis(poll.waiting_interval_ms),
            max_attempts,
            backoff,
            defaults: MergeDefaults {
                artifacts,
                ..MergeDefaults::default()
            },
        }
    }
}
