//! Walk-forward backtesting
//!
//! Replays historical snapshots, model probabilities, and resolutions
//! through the same decision chain the live path uses, under strict
//! temporal causality, and records one auditable decision per event.
//!
//! - `engine` - the sequential replay fold
//! - `metrics` - summary built by a pure fold over records, reusable for
//!   replay verification
//! - `recorder` - append-only sinks for the per-event records

pub mod engine;
pub mod metrics;
pub mod recorder;

pub use engine::{BacktestReport, WalkForwardEngine};
pub use metrics::{summarize, BacktestSummary};
pub use recorder::{DecisionRecorder, JsonlRecorder, MemoryRecorder};
