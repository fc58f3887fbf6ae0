use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::market::{MarketType, Quote};

/// Calibrated win probability for one outcome, produced by an external model.
///
/// The engine treats the probability as opaque; calibration quality is the
/// model's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProbability {
    pub event_id: String,
    pub market_type: MarketType,
    pub outcome: String,
    /// Probability in (0, 1)
    pub probability: f64,
    pub produced_at: DateTime<Utc>,
}

/// Fair probability distribution for one market at one book, after the
/// bookmaker margin has been stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairDistribution {
    pub event_id: String,
    pub market_type: MarketType,
    pub book_id: String,
    /// Outcome label -> fair probability; sums to 1 within tolerance
    pub probabilities: BTreeMap<String, f64>,
    /// Margin measured before normalization: sum of implied probabilities - 1
    pub overround: f64,
}

impl FairDistribution {
    pub fn probability(&self, outcome: &str) -> Option<f64> {
        self.probabilities.get(outcome).copied()
    }

    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }
}

/// Why a decision carried zero stake.
///
/// These are sizing outcomes, not errors: the pipeline completed and decided
/// not to bet. Evaluation failures that were contained per event end up here
/// too, with the original error preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "detail")]
pub enum SkipReason {
    /// Edge did not clear the configured minimum threshold
    EdgeBelowThreshold,
    /// No eligible reference quote for the target outcome
    MissingReferencePrice,
    /// Full Kelly fraction was zero or negative
    NonPositiveKelly,
    /// No headroom left under the total exposure cap
    ExposureCapReached,
    /// No market snapshot observed before the event resolved
    NoMarketData,
    /// No model probability produced before the event resolved
    NoModelProbability,
    /// Per-event evaluation error, contained and recorded
    MarketError(String),
}

impl SkipReason {
    /// Stable label used to key skip counts in the backtest summary
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::EdgeBelowThreshold => "edge_below_threshold",
            SkipReason::MissingReferencePrice => "missing_reference_price",
            SkipReason::NonPositiveKelly => "non_positive_kelly",
            SkipReason::ExposureCapReached => "exposure_cap_reached",
            SkipReason::NoMarketData => "no_market_data",
            SkipReason::NoModelProbability => "no_model_probability",
            SkipReason::MarketError(_) => "market_error",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MarketError(detail) => write!(f, "market_error: {detail}"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Signed edge between the model and the fair market line for one outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDecision {
    pub event_id: String,
    pub market_type: MarketType,
    pub outcome: String,
    pub model_probability: f64,
    pub fair_probability: f64,
    /// model_probability - fair_probability
    pub edge: f64,
    /// True when the edge clears the threshold and a usable price exists.
    /// Sub-threshold and negative edges never qualify.
    pub qualifies: bool,
    pub reference_book: String,
    /// Decimal odds at the reference book for this outcome
    pub reference_price: Decimal,
}

impl EdgeDecision {
    /// Net odds at the reference price (decimal odds minus 1)
    pub fn net_odds(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.reference_price.to_f64().unwrap_or(0.0) - 1.0
    }
}

/// Stake sizing outcome for one qualifying (or rejected) edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeDecision {
    /// Fraction of bankroll to stake, in [0, max_single_bet_fraction]
    pub stake_fraction: f64,
    /// Full Kelly fraction before the multiplier and caps
    pub full_kelly: f64,
    /// Present exactly when stake_fraction is zero
    pub skip_reason: Option<SkipReason>,
}

impl StakeDecision {
    pub fn placed(stake_fraction: f64, full_kelly: f64) -> Self {
        Self {
            stake_fraction,
            full_kelly,
            skip_reason: None,
        }
    }

    pub fn rejected(full_kelly: f64, reason: SkipReason) -> Self {
        Self {
            stake_fraction: 0.0,
            full_kelly,
            skip_reason: Some(reason),
        }
    }

    pub fn is_placed(&self) -> bool {
        self.skip_reason.is_none() && self.stake_fraction > 0.0
    }
}

/// Immutable audit record for one evaluated event.
///
/// Carries every intermediate value of the decision so a run can be
/// reconstructed from its records alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: Uuid,
    pub event_id: String,
    /// None when the event had no input at all to name a market
    pub market_type: Option<MarketType>,
    /// Outcome the model probability referred to (the side backed)
    pub outcome: Option<String>,
    /// Raw quotes from the reference snapshot, empty if evaluation never
    /// reached a reference
    pub quotes: Vec<Quote>,
    pub fair: Option<FairDistribution>,
    pub model_probability: Option<f64>,
    pub edge: Option<f64>,
    pub reference_book: Option<String>,
    pub reference_price: Option<Decimal>,
    pub stake_fraction: f64,
    /// Stake in bankroll currency, zero when skipped
    pub stake: Decimal,
    /// Bankroll snapshot the sizing read, before this bet settled
    pub bankroll_before: Decimal,
    pub skip_reason: Option<SkipReason>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub resolved_at: DateTime<Utc>,
    pub outcome_realized: String,
    /// None when no stake was placed
    pub won: Option<bool>,
    pub pnl: Decimal,
}

impl BetRecord {
    pub fn is_placed(&self) -> bool {
        self.skip_reason.is_none() && self.stake > Decimal::ZERO
    }
}
