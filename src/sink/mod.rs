//! Consumers of detector output: the anomaly log and the visualizers.

pub mod anomaly_log;
pub mod visualizer;

pub use anomaly_log::{AnomalyLogError, AnomalyLogger, FileAnomalyLogger};
pub use visualizer::{DashboardVisualizer, TerminalVisualizer, Visualizer, VisualizerSet};
