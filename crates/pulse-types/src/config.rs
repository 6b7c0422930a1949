//! Configuration loading for review-pulse.
//!
//! Layered precedence: built-in defaults -> config file
//! (~/.config/review-pulse/config.toml) -> environment variables (PULSE_*)
//! -> CLI flags (applied by the caller after load).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::batch::ReprocessPolicy;
use crate::error::PulseError;

/// Extraction client (chat-completions endpoint) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// API base URL (OpenAI-compatible, e.g. "https://api.groq.com/openai/v1")
    pub base_url: String,

    /// Model name
    pub model: String,

    /// API key; usually supplied via PULSE_API__API_KEY, never written to
    /// the config file
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Completion token cap per call
    pub max_tokens: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama3-70b-8192".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tokens: 1000,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Topic extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Seed topic names included in every prompt to bootstrap consistent
    /// phrasing; also drive the seed-flag substring heuristic
    pub seed_topics: Vec<String>,

    /// Reviews per model call
    pub chunk_size: usize,

    /// Fixed delay between model calls, in milliseconds
    pub call_delay_ms: u64,
}

fn default_seed_topics() -> Vec<String> {
    [
        "Delivery issue",
        "Food quality issue",
        "Delivery partner behavior",
        "App technical issue",
        "Feature request",
        "Service timing request",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            seed_topics: default_seed_topics(),
            chunk_size: 10,
            call_delay_ms: 2000,
        }
    }
}

impl ExtractionSettings {
    /// Inter-call delay as a Duration.
    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.call_delay_ms)
    }
}

/// Topic consolidation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationSettings {
    /// Cosine similarity at or above which a mention merges into an
    /// existing canonical topic
    pub similarity_threshold: f32,

    /// Dimension of the hashed name embeddings
    pub embedding_dimension: usize,
}

impl Default for ConsolidationSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            embedding_dimension: 256,
        }
    }
}

/// Trend reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    /// Trailing window length in days
    pub window_days: u32,

    /// Number of topics in the top-overall and trending-now lists
    pub top_n: usize,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            top_n: 10,
        }
    }
}

/// Batch orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Safety bound on reviews considered per day
    pub daily_review_cap: usize,

    /// What to do with a day that already reached a terminal state
    pub reprocess: ReprocessPolicy,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            daily_review_cap: 100,
            reprocess: ReprocessPolicy::Reject,
        }
    }
}

/// Main application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the RocksDB storage directory
    pub db_path: String,

    /// Directory for trend report artifacts
    pub output_dir: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Extraction client settings
    pub api: ApiSettings,

    /// Extraction settings
    pub extraction: ExtractionSettings,

    /// Consolidation settings
    pub consolidation: ConsolidationSettings,

    /// Trend reporting settings
    pub trends: TrendSettings,

    /// Batch orchestration settings
    pub batch: BatchSettings,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "review-pulse")
}

fn default_db_path() -> String {
    project_dirs()
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data/db"))
        .to_string_lossy()
        .to_string()
}

fn default_output_dir() -> String {
    project_dirs()
        .map(|p| p.data_local_dir().join("reports"))
        .unwrap_or_else(|| PathBuf::from("./output"))
        .to_string_lossy()
        .to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            output_dir: default_output_dir(),
            log_level: "info".to_string(),
            api: ApiSettings::default(),
            extraction: ExtractionSettings::default(),
            consolidation: ConsolidationSettings::default(),
            trends: TrendSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Default config file (~/.config/review-pulse/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (PULSE_*, "__" separates nesting, e.g.
    ///    PULSE_API__MODEL)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, PulseError> {
        let config_dir = project_dirs()
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("PULSE")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .map_err(|e| PulseError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| PulseError::Config(e.to_string()))?;

        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), PulseError> {
        let threshold = self.consolidation.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(PulseError::Config(format!(
                "similarity_threshold must be 0.0-1.0, got {}",
                threshold
            )));
        }
        if self.extraction.chunk_size == 0 {
            return Err(PulseError::Config("chunk_size must be > 0".to_string()));
        }
        if self.consolidation.embedding_dimension == 0 {
            return Err(PulseError::Config(
                "embedding_dimension must be > 0".to_string(),
            ));
        }
        if self.trends.window_days == 0 {
            return Err(PulseError::Config("window_days must be > 0".to_string()));
        }
        if self.batch.daily_review_cap == 0 {
            return Err(PulseError::Config(
                "daily_review_cap must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Database path as a PathBuf.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.db_path)
    }

    /// Report output directory as a PathBuf.
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_extraction_defaults() {
        let settings = ExtractionSettings::default();
        assert_eq!(settings.chunk_size, 10);
        assert_eq!(settings.call_delay(), Duration::from_millis(2000));
        assert_eq!(settings.seed_topics.len(), 6);
    }

    #[test]
    fn test_consolidation_defaults() {
        let settings = ConsolidationSettings::default();
        assert!((settings.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(settings.embedding_dimension, 256);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut settings = Settings::default();
        settings.consolidation.similarity_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut settings = Settings::default();
        settings.extraction.chunk_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_serialization_round_trip() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.extraction.chunk_size, settings.extraction.chunk_size);
        assert_eq!(parsed.batch.reprocess, ReprocessPolicy::Reject);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Settings =
            serde_json::from_str(r#"{"extraction": {"chunk_size": 5}}"#).unwrap();
        assert_eq!(parsed.extraction.chunk_size, 5);
        assert_eq!(parsed.extraction.call_delay_ms, 2000);
        assert_eq!(parsed.trends.window_days, 30);
    }
}
