//! System-wide default constants.
//!
//! Centralises the numbers that `AppConfig::default()` and the
//! uninitialised-config fallbacks share. Grouped by subsystem.

// ============================================================================
// Detector
// ============================================================================

/// Number of most recent samples used for mean / std-dev.
pub const WINDOW_CAPACITY: usize = 100;

/// |z| must strictly exceed this to flag a sample.
pub const Z_THRESHOLD: f64 = 3.0;

// ============================================================================
// Stream Simulation
// ============================================================================

/// Angular step of the seasonal component: `sin(SEASONAL_FREQUENCY * t)`.
pub const SEASONAL_FREQUENCY: f64 = 0.1;

/// Standard deviation of the Gaussian noise added to every sample.
pub const NOISE_STD_DEV: f64 = 0.5;

/// Per-sample probability of an injected spike.
pub const SPIKE_PROBABILITY: f64 = 0.01;

/// Magnitude of an injected spike (sign chosen uniformly).
pub const SPIKE_MAGNITUDE: f64 = 5.0;

// ============================================================================
// Driver
// ============================================================================

/// Delay between ticks (ms). 100 ms = 10 samples per second.
pub const TICK_DELAY_MS: u64 = 100;

/// Initial capacity reserved for the stream buffer (samples).
///
/// 36 000 = 1 hour at the default tick rate.
pub const STREAM_PREALLOC: usize = 36_000;

// ============================================================================
// Anomaly Log
// ============================================================================

/// Default anomaly log path, relative to the working directory.
pub const ANOMALY_LOG_PATH: &str = "anomaly_log.txt";

// ============================================================================
// Dashboard
// ============================================================================

/// Default dashboard bind address.
pub const SERVER_ADDR: &str = "127.0.0.1:8080";

/// Samples returned by `/api/v1/stream` when no `tail` is given.
pub const DASHBOARD_DEFAULT_TAIL: usize = 500;

// ============================================================================
// Terminal Plot
// ============================================================================

/// Number of recent samples drawn by the terminal sparkline.
pub const PLOT_WIDTH: usize = 60;
