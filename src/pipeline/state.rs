//! Application State and System Status
//!
//! Shared state for the detection pipeline, written by the dashboard
//! visualizer and read by the API handlers.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::defaults;
use crate::detector::ZScoreDetector;
use crate::types::AnomalyEvent;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state accessible from API handlers and the tick loop.
///
/// This struct is wrapped in `Arc<RwLock<>>` for access across the async
/// runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    /// System uptime (serializes as seconds)
    #[serde(skip, default = "Instant::now")]
    pub uptime: Instant,

    /// Current system status
    pub status: SystemStatus,

    /// Name of the sample source feeding the stream
    pub source_name: String,

    /// Ticks completed
    pub ticks: u64,

    /// Every value received, indexed by global position
    #[serde(skip)]
    pub stream: Vec<f64>,

    /// Every anomaly reported, ascending by global index
    #[serde(skip)]
    pub anomalies: Vec<AnomalyEvent>,

    /// Time of the last tick
    pub last_update: Option<chrono::DateTime<chrono::Utc>>,

    pub window_capacity: usize,
    pub threshold: f64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            uptime: Instant::now(),
            status: SystemStatus::Initializing,
            source_name: String::from("none"),
            ticks: 0,
            stream: Vec::new(),
            anomalies: Vec::new(),
            last_update: None,
            window_capacity: defaults::WINDOW_CAPACITY,
            threshold: defaults::Z_THRESHOLD,
        }
    }
}

impl AppState {
    /// Fresh state describing `detector` fed by `source_name`.
    pub fn new(detector: &ZScoreDetector, source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            window_capacity: detector.window_capacity(),
            threshold: detector.threshold(),
            ..Self::default()
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.uptime.elapsed().as_secs()
    }
}

/// System operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemStatus {
    /// No sample received yet
    Initializing,
    /// Receiving samples
    Monitoring,
    /// Tick loop has exited
    Stopped,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Initializing => write!(f, "Initializing"),
            SystemStatus::Monitoring => write!(f, "Monitoring"),
            SystemStatus::Stopped => write!(f, "Stopped"),
        }
    }
}
