//! Backtest summary metrics
//!
//! A pure fold over bet records. The same fold serves the live run and
//! replay verification: feeding recorded output back through `summarize`
//! must reproduce the original summary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::BetRecord;

/// Aggregate result of one walk-forward run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    /// Events that reached the recorder (placed or skipped)
    pub events_evaluated: usize,
    pub bets_placed: usize,
    pub bets_won: usize,
    pub bets_lost: usize,
    pub hit_rate: f64,

    /// Sum of stakes on placed bets
    pub total_staked: Decimal,
    /// Gross payout received on placed bets (stake included on wins)
    pub total_return: Decimal,
    pub net_pnl: Decimal,
    pub final_bankroll: Decimal,
    pub roi: f64,

    /// Mean log bankroll growth per placed bet (realized Kelly growth)
    pub log_growth_per_bet: f64,
    /// Largest peak-to-trough loss as a fraction of the peak bankroll
    pub max_drawdown: f64,
    /// Brier score of the model probabilities over evaluated events
    pub brier_score: Option<f64>,

    /// Zero-stake decisions keyed by skip reason label
    pub skipped: BTreeMap<String, usize>,
}

/// Build the summary from records and the starting bankroll.
///
/// Records must be in settlement order, which is how the engine and the
/// recorder emit them.
pub fn summarize(records: &[BetRecord], initial_bankroll: Decimal) -> BacktestSummary {
    let mut bets_placed = 0usize;
    let mut bets_won = 0usize;
    let mut total_staked = Decimal::ZERO;
    let mut total_return = Decimal::ZERO;
    let mut net_pnl = Decimal::ZERO;
    let mut skipped: BTreeMap<String, usize> = BTreeMap::new();

    let mut log_growth_sum = 0.0;
    let mut log_growth_count = 0usize;

    let mut brier_sum = 0.0;
    let mut brier_count = 0usize;

    let mut equity = initial_bankroll;
    let mut peak = initial_bankroll;
    let mut max_drawdown = 0.0f64;

    for record in records {
        if let Some(reason) = &record.skip_reason {
            *skipped.entry(reason.label().to_string()).or_insert(0) += 1;
        }

        if let (Some(model_probability), Some(outcome)) =
            (record.model_probability, record.outcome.as_ref())
        {
            let realized = if *outcome == record.outcome_realized {
                1.0
            } else {
                0.0
            };
            brier_sum += (model_probability - realized).powi(2);
            brier_count += 1;
        }

        if !record.is_placed() {
            continue;
        }

        bets_placed += 1;
        if record.won == Some(true) {
            bets_won += 1;
            total_return += record.stake + record.pnl;
        }
        total_staked += record.stake;
        net_pnl += record.pnl;

        // Per-bet log growth against the bankroll the sizing actually read
        if record.bankroll_before > Decimal::ZERO {
            let before = record.bankroll_before.to_f64().unwrap_or(0.0);
            let after = (record.bankroll_before + record.pnl).to_f64().unwrap_or(0.0);
            if before > 0.0 && after > 0.0 {
                log_growth_sum += (after / before).ln();
                log_growth_count += 1;
            }
        }

        equity += record.pnl;
        if equity > peak {
            peak = equity;
        }
        if peak > Decimal::ZERO {
            let drawdown = ((peak - equity) / peak).to_f64().unwrap_or(0.0);
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
    }

    let bets_lost = bets_placed - bets_won;
    let hit_rate = if bets_placed > 0 {
        bets_won as f64 / bets_placed as f64
    } else {
        0.0
    };
    let final_bankroll = initial_bankroll + net_pnl;
    let roi = if total_staked > Decimal::ZERO {
        (net_pnl / total_staked).to_f64().unwrap_or(0.0)
    } else {
        0.0
    };
    let log_growth_per_bet = if log_growth_count > 0 {
        log_growth_sum / log_growth_count as f64
    } else {
        0.0
    };
    let brier_score = if brier_count > 0 {
        Some(brier_sum / brier_count as f64)
    } else {
        None
    };

    BacktestSummary {
        events_evaluated: records.len(),
        bets_placed,
        bets_won,
        bets_lost,
        hit_rate,
        total_staked,
        total_return,
        net_pnl,
        final_bankroll,
        roi,
        log_growth_per_bet,
        max_drawdown,
        brier_score,
        skipped,
    }
}
