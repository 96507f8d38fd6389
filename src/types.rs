//! Core data types shared by the stream source, detector, and sinks.
//!
//! A stream is an append-only sequence of `f64` values. Each value's
//! position since stream start is its global index; anomaly events refer
//! back to samples by that index.

use serde::{Deserialize, Serialize};

// ============================================================================
// Sample
// ============================================================================

/// A single stream value tagged with its global index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 0-based position since stream start
    pub index: usize,
    /// Measured value
    pub value: f64,
}

// ============================================================================
// Anomaly Event
// ============================================================================

/// A sample whose Z-score exceeded the detection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    /// Global index of the flagged sample
    pub global_index: usize,
    /// Value of the flagged sample
    pub value: f64,
}

impl AnomalyEvent {
    pub const fn new(global_index: usize, value: f64) -> Self {
        Self { global_index, value }
    }
}

impl From<AnomalyEvent> for Sample {
    fn from(event: AnomalyEvent) -> Self {
        Self {
            index: event.global_index,
            value: event.value,
        }
    }
}

/// Log line format: `Anomaly at index <global_index> with value <value>`.
impl std::fmt::Display for AnomalyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Anomaly at index {} with value {}",
            self.global_index, self.value
        )
    }
}

// ============================================================================
// Stream Buffer
// ============================================================================

/// Caller-owned append-only stream.
///
/// The driver owns exactly one of these per run. Values are never removed
/// or rewritten, so a value's position is its global index for the lifetime
/// of the run.
#[derive(Debug, Clone, Default)]
pub struct StreamBuffer {
    values: Vec<f64>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append a value and return it as a [`Sample`] with its global index.
    pub fn push(&mut self, value: f64) -> Sample {
        let index = self.values.len();
        self.values.push(value);
        Sample { index, value }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read-only snapshot of every value appended so far.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Most recently appended sample.
    pub fn latest(&self) -> Option<Sample> {
        self.values.last().map(|&value| Sample {
            index: self.values.len() - 1,
            value,
        })
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl From<Vec<f64>> for StreamBuffer {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_consecutive_indices() {
        let mut stream = StreamBuffer::new();
        let a = stream.push(1.5);
        let b = stream.push(-0.25);
        let c = stream.push(3.0);

        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(c.index, 2);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.as_slice(), &[1.5, -0.25, 3.0]);
    }

    #[test]
    fn test_latest() {
        let mut stream = StreamBuffer::new();
        assert!(stream.latest().is_none());
        stream.push(4.0);
        stream.push(7.0);
        assert_eq!(stream.latest(), Some(Sample { index: 1, value: 7.0 }));
    }

    #[test]
    fn test_anomaly_event_log_line() {
        let event = AnomalyEvent::new(42, 5.5);
        assert_eq!(event.to_string(), "Anomaly at index 42 with value 5.5");
    }

    #[test]
    fn test_anomaly_event_serializes() {
        let event = AnomalyEvent::new(7, -4.25);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"global_index":7,"value":-4.25}"#);
    }
}
