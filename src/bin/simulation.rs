//! Stream Simulation
//!
//! Emits the synthetic test signal (slow sine + Gaussian noise + rare
//! spikes) one sample per line for piping into the detector.
//!
//! # Usage
//! ```bash
//! ./simulation --ticks 5000 --delay-ms 10 --seed 7 | ./zwatch --stdin
//! ```

use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use zwatch::stream::{GeneratorParams, SignalGenerator};
use zwatch::types::Sample;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Bare value per line
    Plain,
    /// `{"index": .., "value": ..}` per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "zwatch-simulation")]
#[command(about = "Synthetic scalar stream generator for zwatch testing")]
#[command(version)]
struct Args {
    /// Number of samples to emit
    #[arg(short, long, default_value = "1000")]
    ticks: u64,

    /// Delay between samples in milliseconds (0 = no delay)
    #[arg(short, long, default_value = "0")]
    delay_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    format: OutputFormat,

    /// Suppress mission log (only output samples)
    #[arg(short, long)]
    quiet: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Angular frequency of the seasonal sine (radians per tick)
    #[arg(long, default_value_t = GeneratorParams::default().seasonal_frequency)]
    frequency: f64,

    /// Standard deviation of the Gaussian noise
    #[arg(long, default_value_t = GeneratorParams::default().noise_std_dev)]
    noise: f64,

    /// Per-tick spike probability
    #[arg(long, default_value_t = GeneratorParams::default().spike_probability)]
    spike_probability: f64,

    /// Spike magnitude (added with random sign)
    #[arg(long, default_value_t = GeneratorParams::default().spike_magnitude)]
    spike_magnitude: f64,
}

// ============================================================================
// Mission Log
// ============================================================================

fn log_mission(tick: u64, message: &str, quiet: bool) {
    if !quiet {
        eprintln!("[t={:>6}] {}", tick, message);
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let params = GeneratorParams {
        seasonal_frequency: args.frequency,
        noise_std_dev: args.noise,
        spike_probability: args.spike_probability,
        spike_magnitude: args.spike_magnitude,
    };
    let mut generator = SignalGenerator::new(params, args.seed)?;
    let delay = Duration::from_millis(args.delay_ms);

    log_mission(0, &"=".repeat(60), args.quiet);
    log_mission(0, "ZWATCH STREAM SIMULATION", args.quiet);
    log_mission(0, &"=".repeat(60), args.quiet);
    log_mission(0, &format!("  Samples: {}", args.ticks), args.quiet);
    log_mission(0, &format!("  Delay: {} ms", args.delay_ms), args.quiet);
    log_mission(
        0,
        &format!("  Signal: sin({} t) + N(0, {})", params.seasonal_frequency, params.noise_std_dev),
        args.quiet,
    );
    log_mission(
        0,
        &format!(
            "  Spikes: p = {}, magnitude ±{}",
            params.spike_probability, params.spike_magnitude
        ),
        args.quiet,
    );
    if let Some(seed) = args.seed {
        log_mission(0, &format!("  Random seed: {}", seed), args.quiet);
    }
    log_mission(0, &"=".repeat(60), args.quiet);

    let start_time = Instant::now();
    let mut last_log_percent = 0;

    let stdout = io::stdout();
    let mut stdout_lock = stdout.lock();

    for t in 0..args.ticks {
        let loop_start = Instant::now();
        let spikes_before = generator.spikes_injected();
        let value = generator.next_value(t);

        match args.format {
            OutputFormat::Plain => writeln!(stdout_lock, "{}", value)?,
            OutputFormat::Json => {
                let json = serde_json::to_string(&Sample {
                    index: t as usize,
                    value,
                })?;
                writeln!(stdout_lock, "{}", json)?;
            }
        }
        stdout_lock.flush()?;

        if generator.spikes_injected() > spikes_before {
            log_mission(t, &format!("Spike injected: {:.3}", value), args.quiet);
        }

        // Progress logging (every 10%)
        let current_percent = ((t + 1) * 100 / args.ticks) / 10 * 10;
        if current_percent > last_log_percent {
            log_mission(t, &format!("Progress: {}%", current_percent), args.quiet);
            last_log_percent = current_percent;
        }

        if !delay.is_zero() {
            let elapsed = loop_start.elapsed();
            if elapsed < delay {
                std::thread::sleep(delay - elapsed);
            }
        }
    }

    stdout_lock.flush()?;
    drop(stdout_lock);

    log_mission(args.ticks, &"=".repeat(60), args.quiet);
    log_mission(args.ticks, "SIMULATION COMPLETE", args.quiet);
    log_mission(args.ticks, &format!("Total samples: {}", args.ticks), args.quiet);
    log_mission(
        args.ticks,
        &format!("Spikes injected: {}", generator.spikes_injected()),
        args.quiet,
    );
    log_mission(
        args.ticks,
        &format!("Real time: {:.1}s", start_time.elapsed().as_secs_f64()),
        args.quiet,
    );
    log_mission(args.ticks, &"=".repeat(60), args.quiet);

    Ok(())
}
