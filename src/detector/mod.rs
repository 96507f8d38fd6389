//! Sliding-Window Z-Score Anomaly Detection
//!
//! Flags samples in the active window whose Z-score, computed against the
//! window's own mean and population standard deviation, exceeds a threshold
//! in absolute value.
//!
//! ## Properties
//!
//! - Stateless: every call recomputes from the stream snapshot it is given
//! - Events are ordered by ascending global index
//! - A zero-variance window yields no events instead of dividing by zero
//!
//! ## Usage
//!
//! ```
//! use zwatch::detector::ZScoreDetector;
//!
//! let detector = ZScoreDetector::new(100, 3.0).unwrap();
//! let mut stream = vec![0.0; 10];
//! stream.push(10.0);
//!
//! let events = detector.detect(&stream);
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].global_index, 10);
//! ```

mod window;

pub use window::{window_offset, Window, WindowStats};

use thiserror::Error;

use crate::config::{self, defaults, DetectorConfig};
use crate::types::AnomalyEvent;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum DetectorError {
    #[error("Window capacity must be > 0")]
    ZeroWindowCapacity,

    #[error("Threshold must be a finite number > 0, got {0}")]
    InvalidThreshold(f64),
}

// ============================================================================
// Detection
// ============================================================================

/// Detect anomalies in the active window of `stream`.
///
/// Pure function of its inputs. Callers are expected to pass a validated
/// capacity and threshold; see [`ZScoreDetector::new`].
pub fn detect_anomalies(stream: &[f64], window_capacity: usize, threshold: f64) -> Vec<AnomalyEvent> {
    let window = Window::of(stream, window_capacity);
    match window.stats() {
        Some(stats) => flag_outliers(&window, &stats, threshold),
        None => Vec::new(),
    }
}

fn flag_outliers(window: &Window<'_>, stats: &WindowStats, threshold: f64) -> Vec<AnomalyEvent> {
    if stats.is_degenerate() {
        return Vec::new();
    }

    window
        .values()
        .iter()
        .enumerate()
        .filter_map(|(i, &value)| {
            let z = stats.z_score(value)?;
            (z.abs() > threshold).then(|| AnomalyEvent::new(window.global_index(i), value))
        })
        .collect()
}

/// Full result of one detection pass, for callers that want the window
/// statistics alongside the events.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    /// Global index of the first sample in the window
    pub offset: usize,
    /// Number of samples in the window
    pub len: usize,
    /// `None` for an empty stream
    pub stats: Option<WindowStats>,
    pub events: Vec<AnomalyEvent>,
}

// ============================================================================
// Detector
// ============================================================================

/// Validated detector parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreDetector {
    window_capacity: usize,
    threshold: f64,
}

impl ZScoreDetector {
    /// Build a detector, rejecting a zero window or a non-positive /
    /// non-finite threshold.
    pub fn new(window_capacity: usize, threshold: f64) -> Result<Self, DetectorError> {
        if window_capacity == 0 {
            return Err(DetectorError::ZeroWindowCapacity);
        }
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(DetectorError::InvalidThreshold(threshold));
        }
        Ok(Self {
            window_capacity,
            threshold,
        })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, DetectorError> {
        Self::new(config.window_capacity, config.threshold)
    }

    pub const fn window_capacity(&self) -> usize {
        self.window_capacity
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Active window of `stream` under this detector's capacity.
    pub fn window<'a>(&self, stream: &'a [f64]) -> Window<'a> {
        Window::of(stream, self.window_capacity)
    }

    /// Anomaly events in the active window, ascending by global index.
    pub fn detect(&self, stream: &[f64]) -> Vec<AnomalyEvent> {
        detect_anomalies(stream, self.window_capacity, self.threshold)
    }

    /// Like [`detect`](Self::detect) but also returns the window statistics.
    pub fn analyze(&self, stream: &[f64]) -> WindowReport {
        let window = self.window(stream);
        let stats = window.stats();
        let events = stats
            .as_ref()
            .map(|s| flag_outliers(&window, s, self.threshold))
            .unwrap_or_default();

        WindowReport {
            offset: window.offset(),
            len: window.len(),
            stats,
            events,
        }
    }
}

/// Uses the global config when initialised, otherwise the built-in
/// defaults (window 100, threshold 3.0).
impl Default for ZScoreDetector {
    fn default() -> Self {
        let fallback = Self {
            window_capacity: defaults::WINDOW_CAPACITY,
            threshold: defaults::Z_THRESHOLD,
        };
        if config::is_initialized() {
            Self::from_config(&config::get().detector).unwrap_or(fallback)
        } else {
            fallback
        }
    }
}
