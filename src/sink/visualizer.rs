//! Visualizers: consumers that get the whole stream and every reported
//! anomaly once per tick.
//!
//! - [`DashboardVisualizer`] publishes into the shared [`AppState`] that the
//!   HTTP dashboard reads
//! - [`TerminalVisualizer`] draws a sparkline of the recent stream on stderr
//! - [`VisualizerSet`] fans out to several visualizers
//!
//! Pass `()` when nothing should be rendered.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::pipeline::{AppState, SystemStatus};
use crate::types::AnomalyEvent;

/// Sparkline levels, lowest to highest.
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Receives the stream and the anomalies reported so far after every tick.
///
/// `anomalies` is ascending by global index and only ever grows.
#[async_trait]
pub trait Visualizer: Send + 'static {
    async fn render(&mut self, stream: &[f64], anomalies: &[AnomalyEvent]) -> Result<()>;

    /// Called once after the last tick.
    async fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Visualizer for () {
    async fn render(&mut self, _stream: &[f64], _anomalies: &[AnomalyEvent]) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl Visualizer for Box<dyn Visualizer> {
    async fn render(&mut self, stream: &[f64], anomalies: &[AnomalyEvent]) -> Result<()> {
        (**self).render(stream, anomalies).await
    }

    async fn finish(&mut self) -> Result<()> {
        (**self).finish().await
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Mirrors the stream and anomaly list into shared state for the API.
///
/// Only the suffix added since the previous tick is copied.
pub struct DashboardVisualizer {
    state: Arc<RwLock<AppState>>,
}

impl DashboardVisualizer {
    pub fn new(state: Arc<RwLock<AppState>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Visualizer for DashboardVisualizer {
    async fn render(&mut self, stream: &[f64], anomalies: &[AnomalyEvent]) -> Result<()> {
        let mut state = self.state.write().await;

        if let Some(new_values) = stream.get(state.stream.len()..) {
            state.stream.extend_from_slice(new_values);
        }
        if let Some(new_events) = anomalies.get(state.anomalies.len()..) {
            state.anomalies.extend_from_slice(new_events);
        }

        state.ticks = stream.len() as u64;
        state.last_update = Some(chrono::Utc::now());
        state.status = SystemStatus::Monitoring;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.state.write().await.status = SystemStatus::Stopped;
        Ok(())
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Prints a two-line plot of the most recent samples every `every` ticks:
/// a sparkline, then a marker row with `^` under each reported anomaly.
pub struct TerminalVisualizer {
    every: u64,
    width: usize,
    ticks: u64,
}

impl TerminalVisualizer {
    /// `every = 0` is treated as 1.
    pub fn new(every: u64, width: usize) -> Self {
        Self {
            every: every.max(1),
            width: width.max(1),
            ticks: 0,
        }
    }

    /// Render the last `width` samples of `stream`.
    pub fn render_frame(stream: &[f64], anomalies: &[AnomalyEvent], width: usize) -> String {
        let start = stream.len().saturating_sub(width);
        let visible = &stream[start..];
        if visible.is_empty() {
            return String::from("(no samples)\n");
        }

        let (min, max) = visible
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = max - min;

        let sparkline: String = visible
            .iter()
            .map(|&v| {
                if span <= 0.0 {
                    LEVELS[LEVELS.len() / 2]
                } else {
                    let level = ((v - min) / span * (LEVELS.len() - 1) as f64).round() as usize;
                    LEVELS[level.min(LEVELS.len() - 1)]
                }
            })
            .collect();

        let mut markers = vec![' '; visible.len()];
        let recent = anomalies.partition_point(|e| e.global_index < start);
        for event in &anomalies[recent..] {
            if let Some(slot) = markers.get_mut(event.global_index - start) {
                *slot = '^';
            }
        }
        let markers: String = markers.into_iter().collect();

        format!(
            "[t={}] last={:.3} min={:.3} max={:.3} anomalies={}\n{}\n{}\n",
            stream.len() - 1,
            visible[visible.len() - 1],
            min,
            max,
            anomalies.len(),
            sparkline,
            markers.trim_end()
        )
    }
}

#[async_trait]
impl Visualizer for TerminalVisualizer {
    async fn render(&mut self, stream: &[f64], anomalies: &[AnomalyEvent]) -> Result<()> {
        self.ticks += 1;
        if self.ticks % self.every != 0 {
            return Ok(());
        }
        let frame = Self::render_frame(stream, anomalies, self.width);
        std::io::stderr().lock().write_all(frame.as_bytes())?;
        Ok(())
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Renders to every member in insertion order. A failing member is logged
/// and skipped so one broken output does not starve the others.
#[derive(Default)]
pub struct VisualizerSet {
    members: Vec<Box<dyn Visualizer>>,
}

impl VisualizerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, visualizer: impl Visualizer) -> Self {
        self.members.push(Box::new(visualizer));
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl Visualizer for VisualizerSet {
    async fn render(&mut self, stream: &[f64], anomalies: &[AnomalyEvent]) -> Result<()> {
        for member in &mut self.members {
            if let Err(e) = member.render(stream, anomalies).await {
                tracing::warn!("[Visualizer] Render failed: {}", e);
            }
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        for member in &mut self.members {
            if let Err(e) = member.finish().await {
                tracing::warn!("[Visualizer] Finish failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_marks_anomalies_under_sparkline() {
        let mut stream = vec![0.0; 10];
        stream.push(10.0);
        let anomalies = vec![AnomalyEvent::new(10, 10.0)];

        let frame = TerminalVisualizer::render_frame(&stream, &anomalies, 5);
        let lines: Vec<&str> = frame.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("[t=10] last=10.000"));
        assert!(lines[0].ends_with("anomalies=1"));
        assert_eq!(lines[1], "▁▁▁▁█");
        assert_eq!(lines[2], "    ^");
    }

    #[test]
    fn test_frame_ignores_anomalies_scrolled_off() {
        let stream: Vec<f64> = (0..20).map(f64::from).collect();
        let anomalies = vec![AnomalyEvent::new(2, 2.0), AnomalyEvent::new(18, 18.0)];

        let frame = TerminalVisualizer::render_frame(&stream, &anomalies, 4);
        let markers = frame.lines().nth(2).unwrap();
        assert_eq!(markers, "  ^");
    }

    #[test]
    fn test_frame_flat_stream() {
        let frame = TerminalVisualizer::render_frame(&[1.0, 1.0, 1.0], &[], 10);
        assert_eq!(frame.lines().nth(1).unwrap(), "▅▅▅");
    }

    #[test]
    fn test_frame_empty_stream() {
        assert_eq!(TerminalVisualizer::render_frame(&[], &[], 10), "(no samples)\n");
    }

    #[tokio::test]
    async fn test_dashboard_copies_only_new_suffix() {
        let state = Arc::new(RwLock::new(AppState::default()));
        let mut viz = DashboardVisualizer::new(state.clone());

        viz.render(&[1.0, 2.0], &[]).await.unwrap();
        viz.render(&[1.0, 2.0, 9.0], &[AnomalyEvent::new(2, 9.0)]).await.unwrap();

        {
            let s = state.read().await;
            assert_eq!(s.stream, vec![1.0, 2.0, 9.0]);
            assert_eq!(s.anomalies, vec![AnomalyEvent::new(2, 9.0)]);
            assert_eq!(s.ticks, 3);
            assert_eq!(s.status, SystemStatus::Monitoring);
            assert!(s.last_update.is_some());
        }

        viz.finish().await.unwrap();
        assert_eq!(state.read().await.status, SystemStatus::Stopped);
    }

    struct Failing;

    #[async_trait]
    impl Visualizer for Failing {
        async fn render(&mut self, _: &[f64], _: &[AnomalyEvent]) -> Result<()> {
            anyhow::bail!("broken pipe")
        }
    }

    #[tokio::test]
    async fn test_set_continues_past_failing_member() {
        let state = Arc::new(RwLock::new(AppState::default()));
        let mut set = VisualizerSet::new()
            .with(Failing)
            .with(DashboardVisualizer::new(state.clone()));
        assert_eq!(set.len(), 2);

        set.render(&[0.5], &[]).await.unwrap();
        assert_eq!(state.read().await.stream, vec![0.5]);
    }
}
