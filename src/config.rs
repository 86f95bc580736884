// Runtime configuration
// Read from <config_dir>/youtube-queue/config.toml when it exists, then
// overridden by YOUTUBE_API_KEY / YOUTUBE_API_BASE from the environment.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const CONFIG_DIR_NAME: &str = "youtube-queue";
const CONFIG_FILE_NAME: &str = "config.toml";
pub const MAX_RESULTS_PER_CALL: usize = 50;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_page_size() -> usize {
    20
}

fn default_max_fetch_iterations() -> usize {
    6
}

fn default_batch_size() -> usize {
    20
}

fn default_source_results() -> usize {
    25
}

fn default_detail_batch_cap() -> usize {
    50
}

fn default_channel_cap_percent() -> usize {
    30
}

fn default_refill_threshold() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_category_id() -> Option<String> {
    Some("10".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub mixer: MixerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Results per page, also the upstream `maxResults`.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on upstream fetches while filling one filtered page.
    #[serde(default = "default_max_fetch_iterations")]
    pub max_fetch_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// `maxResults` for each of the two recommendation queries.
    #[serde(default = "default_source_results")]
    pub source_results: usize,
    #[serde(default = "default_detail_batch_cap")]
    pub detail_batch_cap: usize,
    /// Per-channel share of one batch, in percent.
    #[serde(default = "default_channel_cap_percent")]
    pub channel_cap_percent: usize,
    /// Refill once fewer than this many items remain after the current one.
    #[serde(default = "default_refill_threshold")]
    pub refill_threshold: usize,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_category_id")]
    pub category_id: Option<String>,
    /// Fixed shuffle seed, for reproducible batches.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            search: SearchSettings::default(),
            mixer: MixerSettings::default(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_fetch_iterations: default_max_fetch_iterations(),
        }
    }
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            source_results: default_source_results(),
            detail_batch_cap: default_detail_batch_cap(),
            channel_cap_percent: default_channel_cap_percent(),
            refill_threshold: default_refill_threshold(),
            initial_delay_ms: default_initial_delay_ms(),
            category_id: default_category_id(),
            seed: None,
        }
    }
}

impl MixerSettings {
    /// ceil(batch * percent / 100), never below one.
    pub fn per_channel_cap(&self) -> usize {
        ((self.batch_size * self.channel_cap_percent + 99) / 100).max(1)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl AppConfig {
    /// Default location plus environment overrides. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    // Takes a lookup so tests don't have to touch the process environment
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("YOUTUBE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(base) = lookup("YOUTUBE_API_BASE").filter(|b| !b.trim().is_empty()) {
            self.api_base_url = base;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Both go upstream as maxResults, which the API caps at 50
        if !(1..=MAX_RESULTS_PER_CALL).contains(&self.search.page_size) {
            return Err(ConfigError::Invalid(format!(
                "search.page_size must be between 1 and {}",
                MAX_RESULTS_PER_CALL
            )));
        }
        if !(1..=MAX_RESULTS_PER_CALL).contains(&self.mixer.source_results) {
            return Err(ConfigError::Invalid(format!(
                "mixer.source_results must be between 1 and {}",
                MAX_RESULTS_PER_CALL
            )));
        }
        if self.search.max_fetch_iterations == 0 {
            return Err(ConfigError::Invalid(
                "search.max_fetch_iterations must be at least 1".into(),
            ));
        }
        if self.mixer.batch_size == 0 {
            return Err(ConfigError::Invalid("mixer.batch_size must be at least 1".into()));
        }
        if self.mixer.channel_cap_percent == 0 || self.mixer.channel_cap_percent > 100 {
            return Err(ConfigError::Invalid(
                "mixer.channel_cap_percent must be between 1 and 100".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
