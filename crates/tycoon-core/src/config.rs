//! Configuration loading and typed config structures for the Tycoon engine.
//!
//! The canonical configuration lives in `tycoon-config.yaml` at the project
//! root. Every section and field has a default, so an empty file (or no
//! file at all) yields a playable session.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `tycoon-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EngineConfig {
    /// Tick pacing and reproducibility.
    #[serde(default)]
    pub session: SessionConfig,

    /// Starting economy and level curve.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Event content and offering cadence.
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TYCOON_SEED` overrides `session.seed`
    /// - `TYCOON_CONTENT` overrides `events.content_path`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    ///
    /// A `TYCOON_SEED` that does not parse as an integer is ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TYCOON_SEED")
            && let Ok(seed) = val.trim().parse::<u64>()
        {
            self.session.seed = seed;
        }
        if let Ok(val) = std::env::var("TYCOON_CONTENT") {
            self.events.content_path = PathBuf::from(val);
        }
    }
}

/// Tick pacing and reproducibility.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Random seed for consequence selection and event offering.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Game seconds that elapse per tick.
    #[serde(default = "default_seconds_per_tick")]
    pub seconds_per_tick: f64,

    /// Stop after this many ticks. `None` runs until interrupted.
    #[serde(default)]
    pub max_ticks: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            seconds_per_tick: default_seconds_per_tick(),
            max_ticks: None,
        }
    }
}

/// Starting economy and the experience-to-level curve.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EconomyConfig {
    /// Cash on hand when the session starts.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: Decimal,

    /// Founder time available when the session starts, in seconds.
    #[serde(default = "default_starting_time_budget")]
    pub starting_time_budget: f64,

    /// Experience needed to reach level 2, 3, and so on. Ascending.
    #[serde(default = "default_level_thresholds")]
    pub level_thresholds: Vec<i64>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_cash: default_starting_cash(),
            starting_time_budget: default_starting_time_budget(),
            level_thresholds: default_level_thresholds(),
        }
    }
}

/// Event content and offering cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventsConfig {
    /// Path to the JSON event catalog.
    #[serde(default = "default_content_path")]
    pub content_path: PathBuf,

    /// Game seconds between event offers.
    #[serde(default = "default_offer_interval_seconds")]
    pub offer_interval_seconds: f64,

    /// Real seconds a choice may stay pending before the default is taken.
    #[serde(default = "default_auto_select_after_seconds")]
    pub auto_select_after_seconds: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            content_path: default_content_path(),
            offer_interval_seconds: default_offer_interval_seconds(),
            auto_select_after_seconds: default_auto_select_after_seconds(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_seconds_per_tick() -> f64 {
    1.0
}

fn default_starting_cash() -> Decimal {
    Decimal::new(5_000, 0)
}

const fn default_starting_time_budget() -> f64 {
    3600.0
}

fn default_level_thresholds() -> Vec<i64> {
    vec![100, 250, 500, 1_000, 2_000, 4_000]
}

fn default_content_path() -> PathBuf {
    PathBuf::from("content/events.json")
}

const fn default_offer_interval_seconds() -> f64 {
    60.0
}

const fn default_auto_select_after_seconds() -> f64 {
    15.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.session.seed, 42);
        assert_eq!(config.session.tick_interval_ms, 1000);
        assert_eq!(config.economy.starting_cash, Decimal::new(5_000, 0));
        assert_eq!(config.economy.level_thresholds.len(), 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
session:
  seed: 7
  tick_interval_ms: 250
  seconds_per_tick: 2.0
  max_ticks: 100

economy:
  starting_cash: 1200.50
  starting_time_budget: 1800
  level_thresholds: [50, 150]

events:
  content_path: "data/events.json"
  offer_interval_seconds: 30
  auto_select_after_seconds: 5

logging:
  level: "debug"
  json: true
"#;

        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.session.tick_interval_ms, 250);
        assert_eq!(config.session.max_ticks, Some(100));
        assert_eq!(config.economy.starting_cash, Decimal::new(120_050, 2));
        assert_eq!(config.economy.level_thresholds, vec![50, 150]);
        assert_eq!(config.events.content_path, PathBuf::from("data/events.json"));
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "economy:\n  starting_time_budget: 60\n";
        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert!((config.economy.starting_time_budget - 60.0).abs() < f64::EPSILON);
        // Everything else uses defaults
        assert_eq!(config.economy.starting_cash, Decimal::new(5_000, 0));
        assert_eq!(config.events.content_path, PathBuf::from("content/events.json"));
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let config = EngineConfig::parse("session: [unterminated");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("tycoon-config.yaml");
        if path.exists() {
            let config = EngineConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
