//! Sample source abstraction for stream ingestion.
//!
//! Provides a unified trait for pulling values from different places:
//! the synthetic generator, stdin (one value per line), and pre-loaded
//! replays.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::generator::SignalGenerator;
use crate::types::Sample;

/// Events produced by a sample source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    /// A new stream value.
    Value(f64),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where stream values come from.
///
/// The processing loop calls [`next_sample`](SampleSource::next_sample)
/// in a `select!` with cancellation, so implementations may await freely.
#[async_trait]
pub trait SampleSource: Send + 'static {
    /// Read the next value from the source.
    ///
    /// Returns `SampleEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable read errors.
    async fn next_sample(&mut self) -> Result<SampleEvent>;

    /// Human-readable name for logging (e.g. "synthetic", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Synthetic Source
// ============================================================================

/// Drives a [`SignalGenerator`] with an incrementing tick counter.
#[derive(Debug)]
pub struct SyntheticSource {
    generator: SignalGenerator,
    t: u64,
}

impl SyntheticSource {
    pub const fn new(generator: SignalGenerator) -> Self {
        Self { generator, t: 0 }
    }

    /// Next tick number to be generated.
    pub const fn tick(&self) -> u64 {
        self.t
    }

    pub const fn generator(&self) -> &SignalGenerator {
        &self.generator
    }
}

#[async_trait]
impl SampleSource for SyntheticSource {
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        let value = self.generator.next_value(self.t);
        self.t += 1;
        Ok(SampleEvent::Value(value))
    }

    fn source_name(&self) -> &str {
        "synthetic"
    }
}

// ============================================================================
// Replay Source
// ============================================================================

/// Replays pre-loaded values, then reports EOF.
#[derive(Debug)]
pub struct ReplaySource {
    values: std::vec::IntoIter<f64>,
}

impl ReplaySource {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter(),
        }
    }
}

#[async_trait]
impl SampleSource for ReplaySource {
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        Ok(self.values.next().map_or(SampleEvent::Eof, SampleEvent::Value))
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Line Source (stdin)
// ============================================================================

/// Reads one value per line from any async buffered reader.
///
/// Each line is either a bare number (`0.8312`) or a JSON sample
/// (`{"index": 12, "value": 0.8312}`, as written by the `simulation`
/// binary). Blank lines are skipped; malformed or non-finite lines are
/// logged and skipped.
pub struct LineSource<R> {
    reader: R,
    line_buffer: Vec<u8>,
    name: &'static str,
    skipped: u64,
}

/// Line source over the process's stdin.
pub type StdinSource = LineSource<BufReader<tokio::io::Stdin>>;

impl StdinSource {
    pub fn stdin() -> Self {
        LineSource::new(BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl<R> LineSource<R> {
    pub fn new(reader: R, name: &'static str) -> Self {
        Self {
            reader,
            line_buffer: Vec::with_capacity(128),
            name,
            skipped: 0,
        }
    }

    /// Lines rejected so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Why an input line was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum ParseLineError {
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("not a number or JSON sample: {0}")]
    NotANumber(String),

    #[error("non-finite value {0}")]
    NonFinite(f64),
}

/// Parse one input line into a finite value.
pub fn parse_line(line: &str) -> Result<f64, ParseLineError> {
    let line = line.trim();
    let value = match line.parse::<f64>() {
        Ok(v) => v,
        Err(_) => serde_json::from_str::<Sample>(line)
            .map(|s| s.value)
            .map_err(|e| ParseLineError::NotANumber(e.to_string()))?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseLineError::NonFinite(value))
    }
}

/// Decode raw line bytes, then parse them.
fn parse_line_bytes(bytes: &[u8]) -> Result<f64, ParseLineError> {
    let line = std::str::from_utf8(bytes).map_err(|_| ParseLineError::InvalidUtf8)?;
    parse_line(line)
}

#[async_trait]
impl<R> SampleSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    async fn next_sample(&mut self) -> Result<SampleEvent> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_until(b'\n', &mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SampleEvent::Eof);
            }
            if self.line_buffer.trim_ascii().is_empty() {
                continue;
            }
            match parse_line_bytes(&self.line_buffer) {
                Ok(value) => return Ok(SampleEvent::Value(value)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!("[{}] Skipping line: {}", self.name, e);
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::GeneratorParams;
    use std::io::Cursor;

    #[test]
    fn test_parse_plain_number() {
        assert_eq!(parse_line("  1.25\n"), Ok(1.25));
        assert_eq!(parse_line("-3"), Ok(-3.0));
    }

    #[test]
    fn test_parse_json_sample() {
        assert_eq!(parse_line(r#"{"index": 4, "value": -0.5}"#), Ok(-0.5));
    }

    #[test]
    fn test_parse_rejects_garbage_and_non_finite() {
        assert!(matches!(parse_line("hello"), Err(ParseLineError::NotANumber(_))));
        assert!(matches!(parse_line("NaN"), Err(ParseLineError::NonFinite(_))));
        assert_eq!(parse_line("inf"), Err(ParseLineError::NonFinite(f64::INFINITY)));
        assert_eq!(parse_line_bytes(b"\xff\xfe\n"), Err(ParseLineError::InvalidUtf8));
    }

    #[tokio::test]
    async fn test_line_source_skips_bad_lines() {
        let mut input = b"1.0\n\nabc\n{\"index\":1,\"value\":2.5}\nNaN\n".to_vec();
        input.extend_from_slice(b"\xff\xfe\n-4\n");
        let mut source = LineSource::new(Cursor::new(input), "test");

        let mut values = Vec::new();
        loop {
            match source.next_sample().await.unwrap() {
                SampleEvent::Value(v) => values.push(v),
                SampleEvent::Eof => break,
            }
        }
        assert_eq!(values, vec![1.0, 2.5, -4.0]);
        assert_eq!(source.skipped(), 3);
        assert_eq!(source.source_name(), "test");
    }

    #[tokio::test]
    async fn test_replay_source_then_eof() {
        let mut source = ReplaySource::new(vec![1.0, 2.0]);
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Value(1.0));
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Value(2.0));
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Eof);
        assert_eq!(source.next_sample().await.unwrap(), SampleEvent::Eof);
    }

    #[tokio::test]
    async fn test_synthetic_source_advances_tick() {
        let params = GeneratorParams {
            noise_std_dev: 0.0,
            spike_probability: 0.0,
            ..GeneratorParams::default()
        };
        let generator = SignalGenerator::new(params, Some(1)).unwrap();
        let mut source = SyntheticSource::new(generator);

        for t in 0..20u64 {
            let SampleEvent::Value(v) = source.next_sample().await.unwrap() else {
                panic!("synthetic source never ends");
            };
            assert!((v - (0.1 * t as f64).sin()).abs() < 1e-12);
        }
        assert_eq!(source.tick(), 20);
    }
}
