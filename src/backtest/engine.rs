//! Walk-forward replay engine
//!
//! Replays a time-ordered event history through the decision pipeline
//! while enforcing temporal causality: every decision is computed from
//! inputs timestamped strictly before the event's resolution, and sizing
//! reads a point-in-time bankroll that contains no settlement dated after
//! the event's own evaluation instant.
//!
//! The replay is a single-writer fold in nondecreasing resolution-time
//! order. Steps up to sizing are pure per event and could run in
//! parallel; the fold over bankroll and exposure is the one serialization
//! point and stays sequential.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BettingConfig;
use crate::domain::{
    BankrollState, BetRecord, EventPhase, MarketSnapshot, ModelProbability, Resolution,
    SkipReason,
};
use crate::error::{FairlineError, Result};
use crate::strategy::{Evaluation, Evaluator, ExposureTracker};

use super::metrics::{summarize, BacktestSummary};
use super::recorder::DecisionRecorder;

/// Output of one walk-forward run
#[derive(Debug, Clone)]
pub struct BacktestReport {
    /// One record per resolved event, in settlement order
    pub records: Vec<BetRecord>,
    pub summary: BacktestSummary,
    pub bankroll: BankrollState,
}

/// Ledger entry for one placed bet, used for point-in-time accounting
#[derive(Debug, Clone)]
struct PlacedBet {
    resolved_at: DateTime<Utc>,
    stake_fraction: f64,
    pnl: Decimal,
}

/// Walk-forward backtester over historical snapshots, model probabilities,
/// and resolutions
pub struct WalkForwardEngine {
    evaluator: Evaluator,
    config: BettingConfig,
    initial_bankroll: Decimal,
}

impl WalkForwardEngine {
    /// Create an engine; configuration problems are fatal here, before any
    /// event is touched.
    pub fn new(config: BettingConfig, initial_bankroll: Decimal) -> Result<Self> {
        config.validate()?;
        if initial_bankroll <= Decimal::ZERO {
            return Err(FairlineError::InvalidConfig(format!(
                "initial bankroll {initial_bankroll} must be positive"
            )));
        }
        Ok(Self {
            evaluator: Evaluator::new(config.clone()),
            config,
            initial_bankroll,
        })
    }

    /// Replay the full history and emit one audit record per resolved event.
    ///
    /// Per-event evaluation failures become zero-stake skipped records and
    /// the run continues; structural failures (non-causal input, recorder
    /// write errors) abort the run.
    pub fn run(
        &self,
        snapshots: Vec<MarketSnapshot>,
        model_probs: Vec<ModelProbability>,
        mut resolutions: Vec<Resolution>,
        recorder: &mut dyn DecisionRecorder,
    ) -> Result<BacktestReport> {
        Self::check_causal(&resolutions)?;

        // Input need not arrive presorted; the ordering below is the
        // defense against leakage.
        resolutions.sort_by(|a, b| {
            a.resolved_at
                .cmp(&b.resolved_at)
                .then_with(|| a.event_id.cmp(&b.event_id))
        });

        let mut snapshots_by_event: HashMap<String, Vec<MarketSnapshot>> = HashMap::new();
        for snapshot in snapshots {
            snapshots_by_event
                .entry(snapshot.event_id.clone())
                .or_default()
                .push(snapshot);
        }
        let mut probs_by_event: HashMap<String, Vec<ModelProbability>> = HashMap::new();
        for prob in model_probs {
            probs_by_event
                .entry(prob.event_id.clone())
                .or_default()
                .push(prob);
        }

        info!(
            events = resolutions.len(),
            initial_bankroll = %self.initial_bankroll,
            "Starting walk-forward replay"
        );

        let mut ledger: Vec<PlacedBet> = Vec::new();
        let mut records: Vec<BetRecord> = Vec::new();

        for resolution in &resolutions {
            let record = self.process_event(
                resolution,
                snapshots_by_event
                    .get(&resolution.event_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
                probs_by_event
                    .get(&resolution.event_id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
                &ledger,
            )?;

            if record.is_placed() {
                ledger.push(PlacedBet {
                    resolved_at: record.resolved_at,
                    stake_fraction: record.stake_fraction,
                    pnl: record.pnl,
                });
            }

            recorder.record(&record)?;
            records.push(record);
        }

        // Final bankroll: the same fold the summary performs, kept as an
        // explicit state value so the run exports it.
        let mut bankroll = BankrollState::new(self.initial_bankroll);
        for record in &records {
            bankroll = bankroll.settle(record.pnl);
        }

        let summary = summarize(&records, self.initial_bankroll);
        info!(
            events = summary.events_evaluated,
            bets = summary.bets_placed,
            net_pnl = %summary.net_pnl,
            final_bankroll = %bankroll.current,
            "Walk-forward replay finished"
        );

        Ok(BacktestReport {
            records,
            summary,
            bankroll,
        })
    }

    /// A duplicated resolution makes later decisions depend on which copy
    /// wins, so it is fatal rather than skippable.
    fn check_causal(resolutions: &[Resolution]) -> Result<()> {
        let mut seen: HashMap<&str, DateTime<Utc>> = HashMap::new();
        for resolution in resolutions {
            if let Some(first) = seen.insert(&resolution.event_id, resolution.resolved_at) {
                return Err(FairlineError::NonCausalInput {
                    event_id: resolution.event_id.clone(),
                    detail: format!(
                        "event resolved more than once (at {} and {})",
                        first, resolution.resolved_at
                    ),
                });
            }
        }
        Ok(())
    }

    fn process_event(
        &self,
        resolution: &Resolution,
        snapshots: &[MarketSnapshot],
        model_probs: &[ModelProbability],
        ledger: &[PlacedBet],
    ) -> Result<BetRecord> {
        let mut phase = EventPhase::Pending;

        // Strictly-prior inputs only; everything at or after the resolution
        // instant does not exist for this event.
        let visible_snapshots: Vec<MarketSnapshot> = snapshots
            .iter()
            .filter(|s| s.observed_at < resolution.resolved_at)
            .cloned()
            .collect();
        let model = model_probs
            .iter()
            .filter(|p| p.produced_at < resolution.resolved_at)
            .max_by_key(|p| p.produced_at);

        let model = match model {
            Some(model) => model,
            None => {
                debug!(event_id = %resolution.event_id, "No model probability before resolution");
                return Ok(self.skipped_record(
                    resolution,
                    visible_snapshots.first().map(|s| s.market_type),
                    SkipReason::NoModelProbability,
                    self.bankroll_at(ledger, resolution.resolved_at),
                ));
            }
        };

        // Evaluation instant: the latest input actually visible
        let as_of = visible_snapshots
            .iter()
            .map(|s| s.observed_at)
            .max()
            .map_or(model.produced_at, |t| t.max(model.produced_at));

        // Point-in-time bankroll and open exposure as of the evaluation
        // instant. Settlements dated at or after it are invisible; their
        // stakes still occupy exposure headroom.
        let bankroll = BankrollState {
            initial: self.initial_bankroll,
            current: self.bankroll_at(ledger, as_of),
        };
        let bankroll_before = bankroll.current;
        let mut exposure = ExposureTracker::new(self.config.max_total_exposure_fraction);
        exposure.commit(
            ledger
                .iter()
                .filter(|b| b.resolved_at >= as_of)
                .map(|b| b.stake_fraction)
                .sum(),
        );

        let evaluation = match self
            .evaluator
            .evaluate(&visible_snapshots, model, &exposure, as_of)
        {
            Ok(evaluation) => evaluation,
            Err(err) if !err.is_structural() => {
                warn!(
                    event_id = %resolution.event_id,
                    error = %err,
                    "Evaluation failed, recording skip and continuing"
                );
                Evaluation::skipped(SkipReason::MarketError(err.to_string()))
            }
            Err(err) => return Err(err),
        };
        self.advance(&mut phase, EventPhase::Evaluated, resolution)?;

        let stake = if evaluation.stake.is_placed() {
            bankroll.stake_for(evaluation.stake.stake_fraction)
        } else {
            Decimal::ZERO
        };

        let (won, pnl) = if stake > Decimal::ZERO {
            let won = model.outcome == resolution.outcome_realized;
            let price = evaluation
                .edge
                .as_ref()
                .map(|e| e.reference_price)
                .unwrap_or(Decimal::ONE);
            let pnl = if won {
                (stake * (price - Decimal::ONE)).round_dp(2)
            } else {
                -stake
            };
            (Some(won), pnl)
        } else {
            (None, Decimal::ZERO)
        };
        self.advance(&mut phase, EventPhase::Resolved, resolution)?;

        debug!(
            event_id = %resolution.event_id,
            outcome = %model.outcome,
            stake = %stake,
            pnl = %pnl,
            skip = ?evaluation.stake.skip_reason,
            "Event processed"
        );

        Ok(BetRecord {
            id: Uuid::new_v4(),
            event_id: resolution.event_id.clone(),
            market_type: Some(model.market_type),
            outcome: Some(model.outcome.clone()),
            quotes: evaluation.reference_quotes,
            fair: evaluation.fair,
            model_probability: Some(model.probability),
            edge: evaluation.edge.as_ref().map(|e| e.edge),
            reference_book: evaluation.edge.as_ref().map(|e| e.reference_book.clone()),
            reference_price: evaluation.edge.as_ref().map(|e| e.reference_price),
            stake_fraction: if stake > Decimal::ZERO {
                evaluation.stake.stake_fraction
            } else {
                0.0
            },
            stake,
            bankroll_before,
            skip_reason: evaluation.stake.skip_reason,
            evaluated_at: Some(as_of),
            resolved_at: resolution.resolved_at,
            outcome_realized: resolution.outcome_realized.clone(),
            won,
            pnl,
        })
    }

    /// Bankroll visible at instant `t`: initial capital plus every
    /// settlement dated strictly before `t`.
    fn bankroll_at(&self, ledger: &[PlacedBet], t: DateTime<Utc>) -> Decimal {
        self.initial_bankroll
            + ledger
                .iter()
                .filter(|b| b.resolved_at < t)
                .map(|b| b.pnl)
                .sum::<Decimal>()
    }

    fn advance(
        &self,
        phase: &mut EventPhase,
        target: EventPhase,
        resolution: &Resolution,
    ) -> Result<()> {
        if !phase.can_transition_to(target) {
            return Err(FairlineError::Internal(format!(
                "event {}: invalid phase transition {} -> {}",
                resolution.event_id, phase, target
            )));
        }
        *phase = target;
        Ok(())
    }

    fn skipped_record(
        &self,
        resolution: &Resolution,
        market_type: Option<crate::domain::MarketType>,
        reason: SkipReason,
        bankroll_before: Decimal,
    ) -> BetRecord {
        BetRecord {
            id: Uuid::new_v4(),
            event_id: resolution.event_id.clone(),
            market_type,
            outcome: None,
            quotes: Vec::new(),
            fair: None,
            model_probability: None,
            edge: None,
            reference_book: None,
            reference_price: None,
            stake_fraction: 0.0,
            stake: Decimal::ZERO,
            bankroll_before,
            skip_reason: Some(reason),
            evaluated_at: None,
            resolved_at: resolution.resolved_at,
            outcome_realized: resolution.outcome_realized.clone(),
            won: None,
            pnl: Decimal::ZERO,
        }
    }
}
