//! Fractional-Kelly stake sizing
//!
//! Full Kelly for a binary bet at net odds b with win probability m:
//!
//! ```text
//! k* = (m*b - (1 - m)) / b
//! ```
//!
//! The configured multiplier scales k* down (half Kelly, quarter Kelly) to
//! cut variance, then two caps apply: a per-bet ceiling and the shared
//! total-exposure ceiling tracked across simultaneously open bets. When the
//! marginal stake would breach the total cap it is reduced to the remaining
//! headroom rather than rejected; only zero headroom rejects.

use tracing::debug;

use crate::config::BettingConfig;
use crate::domain::{EdgeDecision, SkipReason, StakeDecision};
use crate::error::{FairlineError, Result};

/// Net odds below this are rejected instead of fed into the k* denominator
pub const MIN_NET_ODDS: f64 = 1e-9;

/// Headroom at or below this counts as a full cap; keeps accumulated
/// float error from emitting dust-sized stakes
const MIN_HEADROOM: f64 = 1e-9;

/// Full Kelly fraction for win probability `probability` at net odds `b`.
///
/// Can be negative; callers decide what a non-positive fraction means.
pub fn kelly_fraction(probability: f64, net_odds: f64) -> Result<f64> {
    if !net_odds.is_finite() || net_odds < MIN_NET_ODDS {
        return Err(FairlineError::DegeneratePrice { net_odds });
    }
    Ok((probability * net_odds - (1.0 - probability)) / net_odds)
}

/// Stake fractions committed to bets that have not settled yet.
///
/// Fractions are of the bankroll at each bet's own evaluation instant;
/// commit on placement, release on settlement.
#[derive(Debug, Clone)]
pub struct ExposureTracker {
    max_total: f64,
    committed: f64,
}

impl ExposureTracker {
    pub fn new(max_total: f64) -> Self {
        Self {
            max_total,
            committed: 0.0,
        }
    }

    pub fn committed(&self) -> f64 {
        self.committed
    }

    /// Remaining room under the total exposure cap
    pub fn headroom(&self) -> f64 {
        (self.max_total - self.committed).max(0.0)
    }

    pub fn commit(&mut self, fraction: f64) {
        self.committed += fraction;
    }

    pub fn release(&mut self, fraction: f64) {
        self.committed = (self.committed - fraction).max(0.0);
    }
}

/// Fractional-Kelly sizer under the configured caps
#[derive(Debug, Clone)]
pub struct KellySizer {
    config: BettingConfig,
}

impl KellySizer {
    pub fn new(config: BettingConfig) -> Self {
        Self { config }
    }

    /// Size a stake for one edge decision.
    ///
    /// Non-qualifying edges are rejected here rather than at the caller so
    /// every zero stake carries its reason.
    pub fn size(&self, edge: &EdgeDecision, exposure: &ExposureTracker) -> Result<StakeDecision> {
        if !edge.qualifies {
            return Ok(StakeDecision::rejected(0.0, SkipReason::EdgeBelowThreshold));
        }

        let net_odds = edge.net_odds();
        let full_kelly = kelly_fraction(edge.model_probability, net_odds)?;

        if full_kelly <= 0.0 {
            return Ok(StakeDecision::rejected(
                full_kelly,
                SkipReason::NonPositiveKelly,
            ));
        }

        let uncapped = self.config.kelly_multiplier * full_kelly;
        let capped = uncapped.min(self.config.max_single_bet_fraction);

        let headroom = exposure.headroom();
        if headroom <= MIN_HEADROOM {
            return Ok(StakeDecision::rejected(
                full_kelly,
                SkipReason::ExposureCapReached,
            ));
        }

        let fraction = capped.min(headroom);
        debug!(
            event_id = %edge.event_id,
            outcome = %edge.outcome,
            full_kelly,
            fraction,
            headroom,
            "Stake sized"
        );

        Ok(StakeDecision::placed(fraction, full_kelly))
    }
}
