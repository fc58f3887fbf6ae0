//! fairline: no-vig pricing, edge detection, and fractional-Kelly staking
//!
//! The crate turns bookmaker quotes and a calibrated model probability
//! into a stake decision, and replays that same decision chain over
//! history in a walk-forward backtest that cannot peek at the future.
//!
//! Data flows: price normalization -> de-vig -> edge -> Kelly sizing,
//! either one-shot for a live market or orchestrated by
//! `backtest::WalkForwardEngine` over time-ordered events with an
//! append-only audit record per decision.
//!
//! Ingestion, feature engineering, model training, and CLI wiring are
//! external collaborators; inputs arrive as in-memory value sequences.

pub mod backtest;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod odds;
pub mod strategy;

pub use backtest::{
    summarize, BacktestReport, BacktestSummary, DecisionRecorder, JsonlRecorder, MemoryRecorder,
    WalkForwardEngine,
};
pub use config::{AppConfig, BettingConfig, LoggingConfig};
pub use domain::{
    BankrollState, BetRecord, EdgeDecision, EventPhase, FairDistribution, MarketSnapshot,
    MarketType, ModelProbability, Price, Quote, Resolution, SkipReason, StakeDecision,
};
pub use error::{FairlineError, Result};
pub use odds::{devig, DevigMethod};
pub use strategy::{
    EdgeCalculator, Evaluation, Evaluator, ExposureTracker, KellySizer, ReferenceBookPolicy,
};
