//! zwatch: Real-Time Z-Score Anomaly Detection
//!
//! Watches a scalar stream one value per tick and flags values that sit too
//! many standard deviations from the mean of a sliding window.
//!
//! ## Architecture
//!
//! - **Stream**: Synthetic signal generator and stdin / replay sources
//! - **Detector**: Stateless sliding-window Z-score detection
//! - **Pipeline**: Tick loop with once-per-index anomaly admission
//! - **Sink**: Anomaly log file and visualizers
//! - **API**: Read-only JSON dashboard

pub mod api;
pub mod config;
pub mod detector;
pub mod pipeline;
pub mod sink;
pub mod stream;
pub mod types;

// Re-export configuration
pub use config::AppConfig;

// Re-export commonly used types
pub use types::{AnomalyEvent, Sample, StreamBuffer};

// Re-export detector
pub use detector::{detect_anomalies, DetectorError, ZScoreDetector};

// Re-export stream sources
pub use stream::{SampleEvent, SampleSource, SignalGenerator};

// Re-export pipeline
pub use pipeline::{AppState, PipelineStats, ProcessingLoop};
