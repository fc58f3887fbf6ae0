//! Decision pipeline
//!
//! One evaluation runs the full chain for a single (market, model
//! probability) pair: pick eligible book snapshots, de-vig, select the
//! reference book, compute the edge, and size the stake. The chain is a
//! pure function of its inputs plus the exposure tracker, which is what
//! lets the backtester replay it over history and a live caller run it on
//! the current market with identical semantics.

pub mod edge;
pub mod kelly;

pub use edge::{EdgeCalculator, ReferenceBookPolicy, ReferenceSelection};
pub use kelly::{kelly_fraction, ExposureTracker, KellySizer, MIN_NET_ODDS};

use chrono::{DateTime, Utc};

use crate::config::BettingConfig;
use crate::domain::{
    EdgeDecision, FairDistribution, MarketSnapshot, ModelProbability, Quote, SkipReason,
    StakeDecision,
};
use crate::error::Result;

/// Every intermediate value one evaluation produced.
///
/// `fair` and `edge` stay None when the pipeline stopped before reaching
/// them; `stake` always carries the final answer (and the reason when it
/// is zero).
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub fair: Option<FairDistribution>,
    pub edge: Option<EdgeDecision>,
    pub stake: StakeDecision,
    /// Raw quotes of the reference snapshot, for the audit record
    pub reference_quotes: Vec<Quote>,
}

impl Evaluation {
    /// An evaluation that stopped before producing an edge
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            fair: None,
            edge: None,
            stake: StakeDecision::rejected(0.0, reason),
            reference_quotes: Vec::new(),
        }
    }
}

/// The full decision chain behind one configuration
#[derive(Debug, Clone)]
pub struct Evaluator {
    edges: EdgeCalculator,
    sizer: KellySizer,
}

impl Evaluator {
    pub fn new(config: BettingConfig) -> Self {
        Self {
            edges: EdgeCalculator::new(config.clone()),
            sizer: KellySizer::new(config),
        }
    }

    /// Evaluate one market against one model probability.
    ///
    /// `as_of` is the evaluation instant used for the staleness filter;
    /// callers must only pass snapshots they were allowed to see at that
    /// instant.
    pub fn evaluate(
        &self,
        snapshots: &[MarketSnapshot],
        model: &ModelProbability,
        exposure: &ExposureTracker,
        as_of: DateTime<Utc>,
    ) -> Result<Evaluation> {
        let eligible = self.edges.eligible_snapshots(snapshots, as_of);
        if eligible.is_empty() {
            return Ok(Evaluation::skipped(SkipReason::NoMarketData));
        }

        let reference = match self.edges.select_reference(&eligible, &model.outcome)? {
            Some(reference) => reference,
            None => return Ok(Evaluation::skipped(SkipReason::MissingReferencePrice)),
        };

        let edge = match self.edges.compute(model, &reference) {
            Some(edge) => edge,
            None => return Ok(Evaluation::skipped(SkipReason::MissingReferencePrice)),
        };

        let stake = self.sizer.size(&edge, exposure)?;

        Ok(Evaluation {
            fair: Some(reference.fair),
            edge: Some(edge),
            stake,
            reference_quotes: reference.snapshot.quotes,
        })
    }
}
