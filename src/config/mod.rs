//! Runtime Configuration Module
//!
//! Detector, stream-simulation, driver, log, and dashboard settings loaded
//! from TOML, replacing hardcoded constants with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `ZWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `zwatch.toml` in the current working directory
//! 3. Built-in defaults (see [`defaults`]), only when neither file exists
//!
//! A file that is found but fails to parse or validate aborts startup.
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! // In main():
//! config::init(AppConfig::load()?);
//!
//! // Anywhere in the codebase:
//! let capacity = config::get().detector.window_capacity;
//! ```

mod app_config;
pub mod defaults;
pub mod validation;

pub use app_config::*;

use std::sync::OnceLock;

/// Global configuration, initialized once at startup.
static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: AppConfig) {
    if APP_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration, or the built-in defaults if `init()` has
/// not been called.
pub fn get() -> &'static AppConfig {
    static FALLBACK: OnceLock<AppConfig> = OnceLock::new();
    APP_CONFIG
        .get()
        .unwrap_or_else(|| FALLBACK.get_or_init(AppConfig::default))
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    APP_CONFIG.get().is_some()
}
