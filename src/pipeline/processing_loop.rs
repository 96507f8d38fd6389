//! Tick loop shared by every input mode.
//!
//! One tick: pull a value from the source, append it to the stream, run the
//! detector over the active window, admit new anomalies through the ledger,
//! log them, render, then wait out the tick delay. Cancellation is observed
//! both while waiting on the source and while sleeping.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ledger::AnomalyLedger;
use crate::config;
use crate::detector::{WindowStats, ZScoreDetector};
use crate::sink::{AnomalyLogger, Visualizer};
use crate::stream::{SampleEvent, SampleSource};
use crate::types::{AnomalyEvent, StreamBuffer};

// ============================================================================
// Run Results
// ============================================================================

/// Why the loop exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown token cancelled (Ctrl+C)
    Cancelled,
    /// Source reported end of data
    SourceExhausted,
    /// Configured tick limit reached
    TickLimit,
    /// Source returned an unrecoverable error
    SourceError(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::SourceExhausted => write!(f, "source exhausted"),
            StopReason::TickLimit => write!(f, "tick limit reached"),
            StopReason::SourceError(e) => write!(f, "source error: {e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub ticks: u64,
    pub anomalies_logged: u64,
    pub stop_reason: StopReason,
    /// Statistics of the window at the final tick
    pub last_window: Option<WindowStats>,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pipeline: {} ticks, {} anomalies logged ({})",
            self.ticks, self.anomalies_logged, self.stop_reason
        )
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub stats: PipelineStats,
    pub stream: StreamBuffer,
    pub anomalies: Vec<AnomalyEvent>,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns the stream and every consumer for one run.
///
/// Built with [`new()`](ProcessingLoop::new), tuned with the `with_*`
/// builders, then consumed by [`run()`](ProcessingLoop::run).
pub struct ProcessingLoop<L: AnomalyLogger, V: Visualizer> {
    detector: ZScoreDetector,
    logger: L,
    visualizer: V,
    cancel_token: CancellationToken,
    tick_delay: Duration,
    max_ticks: Option<u64>,
    stream: StreamBuffer,
    ledger: AnomalyLedger,
}

impl<L: AnomalyLogger, V: Visualizer> ProcessingLoop<L, V> {
    /// Tick delay and limit start from the global config.
    pub fn new(detector: ZScoreDetector, logger: L, visualizer: V, cancel_token: CancellationToken) -> Self {
        let cfg = config::get();
        Self {
            detector,
            logger,
            visualizer,
            cancel_token,
            tick_delay: cfg.tick_delay(),
            max_ticks: cfg.driver.max_ticks,
            stream: StreamBuffer::with_capacity(config::defaults::STREAM_PREALLOC),
            ledger: AnomalyLedger::new(),
        }
    }

    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    /// `None` runs until cancelled or the source ends.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Run until the source is exhausted, the tick limit is hit, or the
    /// token is cancelled.
    ///
    /// Source errors end the run normally with [`StopReason::SourceError`].
    /// Failing to write the anomaly log is fatal and returned as `Err`.
    pub async fn run<S: SampleSource>(mut self, source: &mut S) -> Result<RunOutcome> {
        let mut ticks = 0u64;
        let mut last_window = None;

        info!(
            "[TickLoop] Watching {} (window {}, threshold {})",
            source.source_name(),
            self.detector.window_capacity(),
            self.detector.threshold()
        );

        let stop_reason = loop {
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                info!("[TickLoop] Tick limit reached ({} ticks)", ticks);
                break StopReason::TickLimit;
            }

            let event = tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[TickLoop] Shutdown signal received");
                    break StopReason::Cancelled;
                }
                result = source.next_sample() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[TickLoop] Source error: {}", e);
                            break StopReason::SourceError(e.to_string());
                        }
                    }
                }
            };

            let value = match event {
                SampleEvent::Value(v) => v,
                SampleEvent::Eof => {
                    info!("[TickLoop] Source reached end ({} ticks processed)", ticks);
                    break StopReason::SourceExhausted;
                }
            };

            let sample = self.stream.push(value);
            let report = self.detector.analyze(self.stream.as_slice());

            for event in self.ledger.admit(&report.events, self.stream.len()) {
                warn!(
                    index = event.global_index,
                    value = event.value,
                    "[TickLoop] {}",
                    event
                );
                self.logger
                    .record(event)
                    .context("Failed to record anomaly")?;
            }

            if let Some(stats) = report.stats {
                debug!(
                    tick = sample.index,
                    value = sample.value,
                    mean = stats.mean,
                    std_dev = stats.std_dev,
                    window_offset = report.offset,
                    "[TickLoop] tick"
                );
            }
            last_window = report.stats;

            if let Err(e) = self
                .visualizer
                .render(self.stream.as_slice(), self.ledger.events())
                .await
            {
                warn!("[TickLoop] Visualizer error: {}", e);
            }

            ticks += 1;

            if ticks % 100 == 0 {
                info!(
                    "[TickLoop] Progress: {} ticks | Anomalies: {}",
                    ticks,
                    self.ledger.len()
                );
            }

            if !self.tick_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = self.cancel_token.cancelled() => {
                        info!("[TickLoop] Shutdown signal received");
                        break StopReason::Cancelled;
                    }
                    _ = tokio::time::sleep(self.tick_delay) => {}
                }
            }
        };

        self.logger.flush().context("Failed to flush anomaly log")?;
        if let Err(e) = self.visualizer.finish().await {
            warn!("[TickLoop] Visualizer error on finish: {}", e);
        }

        let stats = PipelineStats {
            ticks,
            anomalies_logged: self.ledger.len() as u64,
            stop_reason,
            last_window,
        };
        info!("[TickLoop] {}", stats);

        Ok(RunOutcome {
            stats,
            stream: self.stream,
            anomalies: self.ledger.into_events(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ReplaySource;

    fn quiet_loop<L: AnomalyLogger>(logger: L, token: CancellationToken) -> ProcessingLoop<L, ()> {
        ProcessingLoop::new(ZScoreDetector::new(100, 3.0).unwrap(), logger, (), token)
            .with_tick_delay(Duration::ZERO)
            .with_max_ticks(None)
    }

    #[tokio::test]
    async fn test_replay_reports_spike_once() {
        let mut values = vec![0.0; 10];
        values.push(10.0);
        values.extend(std::iter::repeat(0.0).take(30));
        let mut source = ReplaySource::new(values);

        let outcome = quiet_loop(Vec::<AnomalyEvent>::new(), CancellationToken::new())
            .run(&mut source)
            .await
            .unwrap();

        assert_eq!(outcome.stats.stop_reason, StopReason::SourceExhausted);
        assert_eq!(outcome.stats.ticks, 41);
        assert_eq!(outcome.stream.len(), 41);
        assert_eq!(outcome.anomalies, vec![AnomalyEvent::new(10, 10.0)]);
        assert_eq!(outcome.stats.anomalies_logged, 1);
    }

    #[tokio::test]
    async fn test_tick_limit() {
        let mut source = ReplaySource::new(vec![1.0; 50]);
        let outcome = quiet_loop((), CancellationToken::new())
            .with_max_ticks(Some(20))
            .run(&mut source)
            .await
            .unwrap();

        assert_eq!(outcome.stats.stop_reason, StopReason::TickLimit);
        assert_eq!(outcome.stats.ticks, 20);
        assert!(outcome.anomalies.is_empty());
        let last = outcome.stats.last_window.unwrap();
        assert_eq!(last.std_dev, 0.0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let mut source = ReplaySource::new(vec![1.0; 5]);

        let outcome = quiet_loop((), token).run(&mut source).await.unwrap();
        assert_eq!(outcome.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.stats.ticks, 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_tick_delay() {
        let token = CancellationToken::new();
        let mut source = ReplaySource::new(vec![1.0; 5]);
        let pipeline = quiet_loop((), token.clone()).with_tick_delay(Duration::from_secs(3600));

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let outcome = pipeline.run(&mut source).await.unwrap();
        canceller.await.unwrap();
        assert_eq!(outcome.stats.stop_reason, StopReason::Cancelled);
        assert_eq!(outcome.stats.ticks, 1);
    }

    #[test]
    fn test_stats_display() {
        let stats = PipelineStats {
            ticks: 42,
            anomalies_logged: 3,
            stop_reason: StopReason::Cancelled,
            last_window: None,
        };
        assert_eq!(stats.to_string(), "Pipeline: 42 ticks, 3 anomalies logged (cancelled)");
    }
}
