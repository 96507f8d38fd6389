//! Application Configuration - detector, stream, driver, and sink settings
//!
//! Each section implements `Default` with the values in [`super::defaults`],
//! so a missing file or a partial file behaves exactly like the built-in
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ZWATCH_CONFIG";

/// Config file searched for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "zwatch.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitoring run.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$ZWATCH_CONFIG` env var
/// 2. `./zwatch.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Z-score detector parameters
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Synthetic stream parameters
    #[serde(default)]
    pub stream: StreamConfig,

    /// Tick loop pacing
    #[serde(default)]
    pub driver: DriverConfig,

    /// Anomaly log file
    #[serde(default)]
    pub anomaly_log: AnomalyLogConfig,

    /// Live dashboard server
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ZWATCH_CONFIG` environment variable
    /// 2. `./zwatch.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// Defaults apply only when no file is configured. A file that exists
    /// but cannot be read, parsed, or validated is an error, as is a
    /// `$ZWATCH_CONFIG` that names a missing file.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            let config = Self::load_from_file(&p)?;
            info!(path = %p.display(), "Loaded config from {}", CONFIG_ENV_VAR);
            return Ok(config);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(&local)?;
            info!("Loaded config from ./{}", LOCAL_CONFIG_FILE);
            return Ok(config);
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings; range violations are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Validate all values. Every problem is collected before returning so
    /// the operator sees the full list at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Inter-tick delay as a `Duration`.
    pub fn tick_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.driver.tick_delay_ms)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Detector
// ============================================================================

/// Sliding-window Z-score parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Most recent samples used for the reference statistics
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// |z| threshold (strictly greater flags the sample)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_window_capacity() -> usize { defaults::WINDOW_CAPACITY }
fn default_threshold() -> f64 { defaults::Z_THRESHOLD }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            threshold: default_threshold(),
        }
    }
}

// ============================================================================
// Stream
// ============================================================================

/// Synthetic stream shape: `sin(f * t) + N(0, σ)` plus occasional spikes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// RNG seed; `None` draws from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "default_seasonal_frequency")]
    pub seasonal_frequency: f64,

    #[serde(default = "default_noise_std_dev")]
    pub noise_std_dev: f64,

    #[serde(default = "default_spike_probability")]
    pub spike_probability: f64,

    #[serde(default = "default_spike_magnitude")]
    pub spike_magnitude: f64,
}

fn default_seasonal_frequency() -> f64 { defaults::SEASONAL_FREQUENCY }
fn default_noise_std_dev() -> f64 { defaults::NOISE_STD_DEV }
fn default_spike_probability() -> f64 { defaults::SPIKE_PROBABILITY }
fn default_spike_magnitude() -> f64 { defaults::SPIKE_MAGNITUDE }

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            seed: None,
            seasonal_frequency: default_seasonal_frequency(),
            noise_std_dev: default_noise_std_dev(),
            spike_probability: default_spike_probability(),
            spike_magnitude: default_spike_magnitude(),
        }
    }
}

// ============================================================================
// Driver
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Delay between ticks in milliseconds (0 = as fast as the source allows)
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,

    /// Stop after this many ticks; `None` runs until interrupted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
}

fn default_tick_delay_ms() -> u64 { defaults::TICK_DELAY_MS }

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: default_tick_delay_ms(),
            max_ticks: None,
        }
    }
}

// ============================================================================
// Anomaly Log
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyLogConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,

    /// Keep existing log contents instead of truncating at startup
    #[serde(default)]
    pub append: bool,
}

fn default_log_path() -> PathBuf {
    PathBuf::from(defaults::ANOMALY_LOG_PATH)
}

impl Default for AnomalyLogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            append: false,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,

    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_enabled() -> bool { true }
fn default_server_addr() -> String { defaults::SERVER_ADDR.to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            addr: default_server_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.window_capacity, 100);
        assert!((config.detector.threshold - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.driver.tick_delay_ms, 100);
        assert_eq!(config.anomaly_log.path, PathBuf::from("anomaly_log.txt"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[detector]
threshold = 2.5
"#,
        )
        .unwrap();
        assert!((config.detector.threshold - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.detector.window_capacity, 100);
        assert!((config.stream.noise_std_dev - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
[detector]
window_capacity = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("window_capacity"));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = AppConfig::from_toml_str("[detector\nthreshold = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_, _)));
    }

    #[test]
    fn test_toml_round_trip_preserves_seed() {
        let mut config = AppConfig::default();
        config.stream.seed = Some(42);
        config.driver.max_ticks = Some(500);
        let text = config.to_toml().unwrap();
        let parsed = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.stream.seed, Some(42));
        assert_eq!(parsed.driver.max_ticks, Some(500));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zwatch.toml");
        let mut config = AppConfig::default();
        config.detector.window_capacity = 250;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.detector.window_capacity, 250);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load_from_file(Path::new("/nonexistent/zwatch.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }
}
