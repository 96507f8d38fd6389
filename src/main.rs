//! zwatch - Real-Time Z-Score Anomaly Detection
//!
//! Watches a scalar stream one value per tick, flags values far from the
//! sliding-window mean, appends them to the anomaly log, and serves a
//! read-only JSON dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Synthetic stream (sine + noise + rare spikes), 10 ticks/s
//! cargo run --release
//!
//! # External stream, one value per line
//! cargo run --release --bin simulation -- --ticks 2000 | ./zwatch --stdin
//!
//! # Write a starter config
//! ./zwatch --print-config > zwatch.toml
//! ```
//!
//! # Environment Variables
//!
//! - `ZWATCH_CONFIG`: Path to a TOML config file (default: `./zwatch.toml`)
//! - `ZWATCH_SERVER_ADDR`: Dashboard bind address (default: 127.0.0.1:8080)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use zwatch::api::{create_app, DashboardState};
use zwatch::config::{self, defaults, AppConfig};
use zwatch::detector::ZScoreDetector;
use zwatch::pipeline::{AppState, PipelineStats, ProcessingLoop, StopReason};
use zwatch::sink::{DashboardVisualizer, FileAnomalyLogger, TerminalVisualizer, VisualizerSet};
use zwatch::stream::{SampleSource, SignalGenerator, StdinSource, SyntheticSource};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "zwatch")]
#[command(about = "Real-time Z-score anomaly detection over a scalar stream")]
#[command(version)]
struct CliArgs {
    /// Read values from stdin (one per line: plain number or JSON sample)
    /// instead of the synthetic generator
    #[arg(long)]
    stdin: bool,

    /// Path to a TOML config file (overrides ZWATCH_CONFIG and ./zwatch.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed for the synthetic generator (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Sliding window capacity in samples
    #[arg(long, value_name = "N")]
    window: Option<usize>,

    /// Absolute Z-score above which a sample is anomalous
    #[arg(long, value_name = "X")]
    threshold: Option<f64>,

    /// Delay between ticks in milliseconds (0 = as fast as possible)
    #[arg(long, value_name = "MS")]
    tick_delay_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Anomaly log file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Append to the anomaly log instead of truncating it
    #[arg(long)]
    append_log: bool,

    /// Dashboard bind address (HOST:PORT)
    #[arg(short, long, env = "ZWATCH_SERVER_ADDR", value_name = "HOST:PORT")]
    addr: Option<String>,

    /// Do not start the HTTP dashboard
    #[arg(long)]
    no_dashboard: bool,

    /// Print a terminal sparkline every N ticks (0 = off)
    #[arg(long, value_name = "N", default_value = "0")]
    plot_every: u64,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl CliArgs {
    /// Apply CLI overrides on top of the file configuration.
    fn apply_overrides(&self, cfg: &mut AppConfig) {
        if let Some(seed) = self.seed {
            cfg.stream.seed = Some(seed);
        }
        if let Some(window) = self.window {
            cfg.detector.window_capacity = window;
        }
        if let Some(threshold) = self.threshold {
            cfg.detector.threshold = threshold;
        }
        if let Some(delay) = self.tick_delay_ms {
            cfg.driver.tick_delay_ms = delay;
        }
        if self.ticks.is_some() {
            cfg.driver.max_ticks = self.ticks;
        }
        if let Some(ref path) = self.log_file {
            cfg.anomaly_log.path = path.clone();
        }
        if self.append_log {
            cfg.anomaly_log.append = true;
        }
        if self.no_dashboard {
            cfg.server.enabled = false;
        }

        if let Some(ref addr) = self.addr {
            cfg.server.addr = addr.clone();
        }
    }
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

// ============================================================================
// Detector Runner
// ============================================================================

/// Run the tick loop over `source` with the configured sinks.
///
/// The dashboard server, when enabled, runs alongside and is shut down once
/// the loop exits.
async fn run_detector<S: SampleSource>(
    mut source: S,
    detector: ZScoreDetector,
    plot_every: u64,
    cancel_token: CancellationToken,
) -> Result<PipelineStats> {
    let cfg = config::get();

    let logger = FileAnomalyLogger::from_config(&cfg.anomaly_log)
        .context("Failed to open anomaly log")?;
    info!(
        "📝 Anomaly log: {} ({})",
        cfg.anomaly_log.path.display(),
        if cfg.anomaly_log.append { "append" } else { "truncate" }
    );

    let app_state = Arc::new(RwLock::new(AppState::new(&detector, source.source_name())));
    let mut visualizers = VisualizerSet::new();
    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    let server_token = cancel_token.child_token();

    if cfg.server.enabled {
        let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
            .await
            .with_context(|| format!("Failed to bind dashboard on {}", cfg.server.addr))?;
        info!("🌐 Dashboard: http://{}/api/v1/status", cfg.server.addr);

        let app = create_app(DashboardState::new(Arc::clone(&app_state)));
        spawn_http_server(&mut task_set, listener, app, server_token.clone());
        visualizers = visualizers.with(DashboardVisualizer::new(Arc::clone(&app_state)));
    }

    if plot_every > 0 {
        visualizers = visualizers.with(TerminalVisualizer::new(plot_every, defaults::PLOT_WIDTH));
    }

    let outcome = ProcessingLoop::new(detector, logger, visualizers, cancel_token)
        .run(&mut source)
        .await;

    server_token.cancel();
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => info!("Task {} completed normally", task_name),
            Ok(Err(e)) => error!("Task failed with error: {}", e),
            Err(e) => error!("Task panicked: {}", e),
        }
    }

    Ok(outcome?.stats)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut app_config = match args.config {
        Some(ref path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load configuration")?,
    };
    args.apply_overrides(&mut app_config);
    app_config.validate().context("Invalid configuration")?;

    if args.print_config {
        print!("{}", app_config.to_toml()?);
        return Ok(());
    }

    config::init(app_config);
    let cfg = config::get();
    let detector = ZScoreDetector::from_config(&cfg.detector)?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  zwatch - Real-Time Z-Score Anomaly Detection");
    info!(
        "  Window: {} samples | Threshold: |z| > {} | Tick: {} ms",
        detector.window_capacity(),
        detector.threshold(),
        cfg.driver.tick_delay_ms
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let stats = if args.stdin {
        info!("📥 Input: stdin (one value per line)");
        run_detector(StdinSource::stdin(), detector, args.plot_every, cancel_token).await?
    } else {
        info!("🧪 Input: synthetic stream (sine + Gaussian noise + spikes)");
        let generator = SignalGenerator::from_config(&cfg.stream)?;
        run_detector(SyntheticSource::new(generator), detector, args.plot_every, cancel_token).await?
    };

    info!("{}", stats);
    println!(
        "\nReal-time anomaly detection stopped. {} anomalies logged.",
        stats.anomalies_logged
    );

    // The stdin reader runs on a blocking thread that cannot be interrupted
    // mid-read; exit without waiting for it.
    if args.stdin && stats.stop_reason != StopReason::SourceExhausted {
        std::process::exit(0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_flag_beats_env_and_file() {
        std::env::set_var("ZWATCH_SERVER_ADDR", "127.0.0.1:9100");

        let mut cfg = AppConfig::default();
        CliArgs::try_parse_from(["zwatch"]).unwrap().apply_overrides(&mut cfg);
        assert_eq!(cfg.server.addr, "127.0.0.1:9100");

        let mut cfg = AppConfig::default();
        CliArgs::try_parse_from(["zwatch", "--addr", "0.0.0.0:9200"])
            .unwrap()
            .apply_overrides(&mut cfg);
        assert_eq!(cfg.server.addr, "0.0.0.0:9200");

        std::env::remove_var("ZWATCH_SERVER_ADDR");
        let mut cfg = AppConfig::default();
        CliArgs::try_parse_from(["zwatch", "--window", "20", "--no-dashboard"])
            .unwrap()
            .apply_overrides(&mut cfg);
        assert_eq!(cfg.server.addr, defaults::SERVER_ADDR);
        assert_eq!(cfg.detector.window_capacity, 20);
        assert!(!cfg.server.enabled);
    }
}
