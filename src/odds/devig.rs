//! De-vig: stripping bookmaker margin from a market
//!
//! A book's implied probabilities for mutually exclusive outcomes sum to
//! more than 1; the excess (the overround) is the book's margin. De-vigging
//! rescales the implied probabilities into a fair distribution that sums
//! to 1. Each book's snapshot is de-vigged independently; picking a
//! reference among books happens later, in the edge calculator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::normalize::implied_probability;
use crate::domain::{FairDistribution, MarketSnapshot};
use crate::error::{FairlineError, Result};

/// Tolerance on the fair distribution summing to 1
pub const FAIR_SUM_TOLERANCE: f64 = 1e-6;

/// De-vig method, selected by configuration.
///
/// Proportional is the only method implemented today. The variant exists so
/// outcome-count-sensitive methods (Shin's, power devig) can slot in behind
/// the same contract without touching callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevigMethod {
    /// fair_i = implied_i / sum(implied), margin removed uniformly
    #[default]
    Proportional,
}

impl DevigMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevigMethod::Proportional => "proportional",
        }
    }
}

/// Strip the margin from one market snapshot.
///
/// Fails with `InsufficientOutcomes` when fewer than two outcomes are
/// quoted (a one-sided market cannot be normalized into a distribution)
/// and with `DegenerateMarket` when the implied mass is not positive.
pub fn devig(snapshot: &MarketSnapshot, method: DevigMethod) -> Result<FairDistribution> {
    if snapshot.quotes.len() < 2 {
        return Err(FairlineError::InsufficientOutcomes {
            market: snapshot.label(),
            count: snapshot.quotes.len(),
        });
    }

    let mut implied: Vec<(String, f64)> = Vec::with_capacity(snapshot.quotes.len());
    for quote in &snapshot.quotes {
        implied.push((quote.outcome.clone(), implied_probability(quote)?));
    }

    let implied_sum: f64 = implied.iter().map(|(_, p)| p).sum();
    if implied_sum <= 0.0 {
        return Err(FairlineError::DegenerateMarket {
            market: snapshot.label(),
            implied_sum,
        });
    }

    let probabilities: BTreeMap<String, f64> = match method {
        DevigMethod::Proportional => implied
            .into_iter()
            .map(|(outcome, p)| (outcome, p / implied_sum))
            .collect(),
    };

    Ok(FairDistribution {
        event_id: snapshot.event_id.clone(),
        market_type: snapshot.market_type,
        book_id: snapshot.book_id.clone(),
        probabilities,
        overround: implied_sum - 1.0,
    })
}
