//! Sliding window over a stream snapshot.
//!
//! The window is the last `capacity` values of the stream (or all of them
//! while the stream is shorter). Positions inside the window are local;
//! [`Window::global_index`] is the only place local positions are mapped
//! back to stream indices.

use statrs::statistics::Statistics;

use crate::types::Sample;

/// Global index of the first sample in the active window.
///
/// `0` while `stream_len <= capacity`, `stream_len - capacity` afterwards.
pub const fn window_offset(stream_len: usize, capacity: usize) -> usize {
    stream_len.saturating_sub(capacity)
}

/// Read-only view of the active window of a stream snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    offset: usize,
    values: &'a [f64],
}

impl<'a> Window<'a> {
    /// Select the active window of `stream` for the given capacity.
    pub fn of(stream: &'a [f64], capacity: usize) -> Self {
        let offset = window_offset(stream.len(), capacity);
        Self {
            offset,
            values: &stream[offset..],
        }
    }

    /// Global index of the window's first sample.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn values(&self) -> &'a [f64] {
        self.values
    }

    pub const fn len(&self) -> usize {
        self.values.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Map a window-local position to its global stream index.
    pub const fn global_index(&self, local_index: usize) -> usize {
        self.offset + local_index
    }

    /// Window contents as globally-indexed samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + 'a {
        let offset = self.offset;
        self.values
            .iter()
            .enumerate()
            .map(move |(i, &value)| Sample {
                index: offset + i,
                value,
            })
    }

    /// Mean and population standard deviation of the window.
    pub fn stats(&self) -> Option<WindowStats> {
        WindowStats::compute(self.values)
    }
}

// ============================================================================
// Window Statistics
// ============================================================================

/// Reference statistics for one window.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct WindowStats {
    /// Number of samples the statistics were computed over
    pub len: usize,
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std_dev: f64,
}

impl WindowStats {
    /// Compute statistics over `values`. `None` for an empty slice.
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            len: values.len(),
            mean: values.iter().mean(),
            std_dev: values.iter().population_std_dev(),
        })
    }

    /// Whether a Z-score is defined for this window.
    ///
    /// False when every value is identical (zero spread) or when the window
    /// contains non-finite values.
    pub fn is_degenerate(&self) -> bool {
        !(self.mean.is_finite() && self.std_dev.is_finite() && self.std_dev > 0.0)
    }

    /// `(value - mean) / std_dev`, or `None` on a degenerate window.
    pub fn z_score(&self, value: f64) -> Option<f64> {
        if self.is_degenerate() {
            None
        } else {
            Some((value - self.mean) / self.std_dev)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_short_stream_is_zero() {
        assert_eq!(window_offset(0, 100), 0);
        assert_eq!(window_offset(1, 100), 0);
        assert_eq!(window_offset(100, 100), 0);
    }

    #[test]
    fn test_offset_long_stream() {
        assert_eq!(window_offset(101, 100), 1);
        assert_eq!(window_offset(150, 100), 50);
        assert_eq!(window_offset(10_000, 100), 9_900);
    }

    #[test]
    fn test_window_length_is_min_of_len_and_capacity() {
        let stream: Vec<f64> = (0..250).map(f64::from).collect();
        for len in [0usize, 1, 99, 100, 101, 250] {
            let window = Window::of(&stream[..len], 100);
            assert_eq!(window.len(), len.min(100));
            assert_eq!(window.offset() + window.len(), len);
        }
    }

    #[test]
    fn test_global_index_maps_back_to_stream_value() {
        let stream: Vec<f64> = (0..250).map(|i| f64::from(i) * 0.5).collect();
        let window = Window::of(&stream, 100);
        assert_eq!(window.offset(), 150);
        for (local, &value) in window.values().iter().enumerate() {
            assert_eq!(stream[window.global_index(local)], value);
        }
    }

    #[test]
    fn test_samples_carry_global_indices() {
        let stream = [1.0, 2.0, 3.0, 4.0, 5.0];
        let window = Window::of(&stream, 3);
        let samples: Vec<Sample> = window.samples().collect();
        assert_eq!(
            samples,
            vec![
                Sample { index: 2, value: 3.0 },
                Sample { index: 3, value: 4.0 },
                Sample { index: 4, value: 5.0 },
            ]
        );
    }

    #[test]
    fn test_population_std_dev() {
        // mean 5, squared deviations sum to 32, /8 = 4, sqrt = 2
        let stats = WindowStats::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_has_no_stats() {
        assert!(WindowStats::compute(&[]).is_none());
    }

    #[test]
    fn test_identical_values_are_degenerate() {
        let stats = WindowStats::compute(&[2.0; 5]).unwrap();
        assert_eq!(stats.std_dev, 0.0);
        assert!(stats.is_degenerate());
        assert!(stats.z_score(2.0).is_none());
    }

    #[test]
    fn test_single_value_is_degenerate() {
        let stats = WindowStats::compute(&[3.7]).unwrap();
        assert!(stats.is_degenerate());
    }

    #[test]
    fn test_nan_value_is_degenerate() {
        let stats = WindowStats::compute(&[1.0, f64::NAN, 2.0]).unwrap();
        assert!(stats.is_degenerate());
    }
}
