//! Detection Pipeline Module
//!
//! ```text
//! SampleSource ──► StreamBuffer ──► ZScoreDetector ──► AnomalyLedger
//!                                                        │
//!                                   ┌────────────────────┤
//!                                   ▼                    ▼
//!                             AnomalyLogger          Visualizer ──► AppState ──► API
//! ```
//!
//! Every tick appends exactly one value, so the stream length at a tick is
//! also the tick number.

mod ledger;
mod state;
pub mod processing_loop;

pub use ledger::AnomalyLedger;
pub use processing_loop::{PipelineStats, ProcessingLoop, RunOutcome, StopReason};
pub use state::*;
