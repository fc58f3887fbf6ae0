//! Edge calculation and reference book selection
//!
//! Several books may quote the same market. Each is de-vigged
//! independently, one is chosen as the reference per the configured
//! policy, and the edge is the model probability minus the reference
//! book's fair probability for the same outcome.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BettingConfig;
use crate::domain::{EdgeDecision, FairDistribution, MarketSnapshot, ModelProbability};
use crate::error::Result;
use crate::odds::devig;

/// How the reference book is chosen when several books quote a market
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceBookPolicy {
    /// Book quoting the highest decimal odds for the target outcome.
    /// Ties break to the lexicographically smallest book id so replays
    /// are deterministic.
    #[default]
    BestPrice,
    /// A fixed book id from configuration
    ConfiguredBook,
}

impl ReferenceBookPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceBookPolicy::BestPrice => "best_price",
            ReferenceBookPolicy::ConfiguredBook => "configured_book",
        }
    }
}

/// The book chosen as reference for one evaluation
#[derive(Debug, Clone)]
pub struct ReferenceSelection {
    pub snapshot: MarketSnapshot,
    pub fair: FairDistribution,
}

/// Edge calculator over one market's snapshots
#[derive(Debug, Clone)]
pub struct EdgeCalculator {
    config: BettingConfig,
}

impl EdgeCalculator {
    pub fn new(config: BettingConfig) -> Self {
        Self { config }
    }

    /// Snapshots eligible as reference input at the evaluation instant.
    ///
    /// Applies the book allow-list and the quote staleness window. Only the
    /// most recent snapshot per book survives.
    pub fn eligible_snapshots<'a>(
        &self,
        snapshots: &'a [MarketSnapshot],
        as_of: DateTime<Utc>,
    ) -> Vec<&'a MarketSnapshot> {
        let mut latest_per_book: Vec<&MarketSnapshot> = Vec::new();

        for snapshot in snapshots {
            if !self.config.allowed_books.is_empty()
                && !self.config.allowed_books.contains(&snapshot.book_id)
            {
                continue;
            }
            if let Some(max_age) = self.config.max_quote_age_secs {
                if as_of - snapshot.observed_at > Duration::seconds(max_age) {
                    debug!(
                        book = %snapshot.book_id,
                        observed_at = %snapshot.observed_at,
                        "Discarding stale snapshot"
                    );
                    continue;
                }
            }

            match latest_per_book
                .iter()
                .position(|s| s.book_id == snapshot.book_id)
            {
                Some(i) if latest_per_book[i].observed_at < snapshot.observed_at => {
                    latest_per_book[i] = snapshot;
                }
                Some(_) => {}
                None => latest_per_book.push(snapshot),
            }
        }

        latest_per_book
    }

    /// De-vig every eligible book and choose the reference for `outcome`.
    ///
    /// Returns None when no eligible book quotes the target outcome (or the
    /// configured book is absent).
    pub fn select_reference(
        &self,
        snapshots: &[&MarketSnapshot],
        outcome: &str,
    ) -> Result<Option<ReferenceSelection>> {
        let mut devigged: Vec<(&MarketSnapshot, FairDistribution)> =
            Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            devigged.push((snapshot, devig(snapshot, self.config.devig_method)?));
        }

        let chosen = match self.config.reference_book_policy {
            ReferenceBookPolicy::ConfiguredBook => {
                let book = match self.config.configured_book.as_deref() {
                    Some(book) => book,
                    None => return Ok(None),
                };
                devigged
                    .into_iter()
                    .find(|(s, _)| s.book_id == book && s.quote_for(outcome).is_some())
            }
            ReferenceBookPolicy::BestPrice => devigged
                .into_iter()
                .filter(|(s, _)| s.quote_for(outcome).is_some())
                .max_by(|(a, _), (b, _)| {
                    let pa = a.quote_for(outcome).map(|q| q.price);
                    let pb = b.quote_for(outcome).map(|q| q.price);
                    // Higher price wins; on equal prices the smaller book id wins
                    pa.cmp(&pb)
                        .then_with(|| b.book_id.cmp(&a.book_id))
                }),
        };

        Ok(chosen.map(|(snapshot, fair)| ReferenceSelection {
            snapshot: snapshot.clone(),
            fair,
        }))
    }

    /// Signed edge for one (model, reference) pair.
    ///
    /// Returns None when the reference distribution has no probability for
    /// the model's outcome. Qualification is a hard filter: sub-threshold
    /// and negative edges never pass.
    pub fn compute(
        &self,
        model: &ModelProbability,
        reference: &ReferenceSelection,
    ) -> Option<EdgeDecision> {
        let fair_probability = reference.fair.probability(&model.outcome)?;
        let quote = reference.snapshot.quote_for(&model.outcome)?;

        let edge = model.probability - fair_probability;
        let qualifies = edge > self.config.min_edge_threshold;

        debug!(
            event_id = %model.event_id,
            outcome = %model.outcome,
            book = %reference.snapshot.book_id,
            edge,
            qualifies,
            "Edge computed"
        );

        Some(EdgeDecision {
            event_id: model.event_id.clone(),
            market_type: model.market_type,
            outcome: model.outcome.clone(),
            model_probability: model.probability,
            fair_probability,
            edge,
            qualifies,
            reference_book: reference.snapshot.book_id.clone(),
            reference_price: quote.price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketType, Quote};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn snapshot(book: &str, prices: &[(&str, Decimal)], at: DateTime<Utc>) -> MarketSnapshot {
        let quotes = prices
            .iter()
            .map(|(outcome, price)| Quote {
                event_id: "evt-1".to_string(),
                market_type: MarketType::HeadToHead,
                outcome: outcome.to_string(),
                book_id: book.to_string(),
                price: *price,
                observed_at: at,
            })
            .collect();
        MarketSnapshot::new("evt-1", MarketType::HeadToHead, book, at, quotes)
    }

    fn model(outcome: &str, probability: f64, at: DateTime<Utc>) -> ModelProbability {
        ModelProbability {
            event_id: "evt-1".to_string(),
            market_type: MarketType::HeadToHead,
            outcome: outcome.to_string(),
            probability,
            produced_at: at,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 2, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_best_price_selection() {
        let calc = EdgeCalculator::new(BettingConfig::default());
        let snaps = vec![
            snapshot("alpha", &[("home", dec!(1.88)), ("away", dec!(1.94))], t0()),
            snapshot("bravo", &[("home", dec!(1.93)), ("away", dec!(1.89))], t0()),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        let reference = calc
            .select_reference(&eligible, "home")
            .unwrap()
            .expect("reference");

        assert_eq!(reference.snapshot.book_id, "bravo");
        assert_eq!(reference.snapshot.quote_for("home").unwrap().price, dec!(1.93));
    }

    #[test]
    fn test_best_price_tie_breaks_to_smallest_book_id() {
        let calc = EdgeCalculator::new(BettingConfig::default());
        let snaps = vec![
            snapshot("zulu", &[("home", dec!(1.91)), ("away", dec!(1.91))], t0()),
            snapshot("alpha", &[("home", dec!(1.91)), ("away", dec!(1.91))], t0()),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        let reference = calc
            .select_reference(&eligible, "home")
            .unwrap()
            .expect("reference");

        assert_eq!(reference.snapshot.book_id, "alpha");
    }

    #[test]
    fn test_configured_book_policy() {
        let config = BettingConfig {
            reference_book_policy: ReferenceBookPolicy::ConfiguredBook,
            configured_book: Some("alpha".to_string()),
            ..BettingConfig::default()
        };
        let calc = EdgeCalculator::new(config);
        let snaps = vec![
            snapshot("alpha", &[("home", dec!(1.88)), ("away", dec!(1.94))], t0()),
            snapshot("bravo", &[("home", dec!(1.93)), ("away", dec!(1.89))], t0()),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        let reference = calc
            .select_reference(&eligible, "home")
            .unwrap()
            .expect("reference");

        // Best price is at bravo, but the configured book wins
        assert_eq!(reference.snapshot.book_id, "alpha");
    }

    #[test]
    fn test_configured_book_missing_yields_none() {
        let config = BettingConfig {
            reference_book_policy: ReferenceBookPolicy::ConfiguredBook,
            configured_book: Some("charlie".to_string()),
            ..BettingConfig::default()
        };
        let calc = EdgeCalculator::new(config);
        let snaps = vec![snapshot(
            "alpha",
            &[("home", dec!(1.88)), ("away", dec!(1.94))],
            t0(),
        )];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        assert!(calc.select_reference(&eligible, "home").unwrap().is_none());
    }

    #[test]
    fn test_allowed_books_filter() {
        let config = BettingConfig {
            allowed_books: vec!["alpha".to_string()],
            ..BettingConfig::default()
        };
        let calc = EdgeCalculator::new(config);
        let snaps = vec![
            snapshot("alpha", &[("home", dec!(1.88)), ("away", dec!(1.94))], t0()),
            snapshot("bravo", &[("home", dec!(1.93)), ("away", dec!(1.89))], t0()),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].book_id, "alpha");
    }

    #[test]
    fn test_stale_snapshots_discarded() {
        let config = BettingConfig {
            max_quote_age_secs: Some(600),
            ..BettingConfig::default()
        };
        let calc = EdgeCalculator::new(config);
        let fresh = t0();
        let stale = t0() - Duration::seconds(3600);
        let snaps = vec![
            snapshot("alpha", &[("home", dec!(1.88)), ("away", dec!(1.94))], stale),
            snapshot("bravo", &[("home", dec!(1.93)), ("away", dec!(1.89))], fresh),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].book_id, "bravo");
    }

    #[test]
    fn test_latest_snapshot_per_book_wins() {
        let calc = EdgeCalculator::new(BettingConfig::default());
        let earlier = t0() - Duration::seconds(300);
        let snaps = vec![
            snapshot("alpha", &[("home", dec!(1.80)), ("away", dec!(2.02))], earlier),
            snapshot("alpha", &[("home", dec!(1.88)), ("away", dec!(1.94))], t0()),
        ];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].quote_for("home").unwrap().price, dec!(1.88));
    }

    #[test]
    fn test_edge_value_and_qualification() {
        let calc = EdgeCalculator::new(BettingConfig::default());
        let snaps = vec![snapshot(
            "alpha",
            &[("home", dec!(1.91)), ("away", dec!(1.91))],
            t0(),
        )];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        let reference = calc.select_reference(&eligible, "home").unwrap().unwrap();

        // Fair is 0.5; model at 0.58 gives edge 0.08, above the 0.03 default
        let decision = calc.compute(&model("home", 0.58, t0()), &reference).unwrap();
        assert!((decision.edge - 0.08).abs() < 1e-9);
        assert!(decision.qualifies);

        // Edge exactly at threshold does not qualify (strict inequality)
        let decision = calc.compute(&model("home", 0.53, t0()), &reference).unwrap();
        assert!((decision.edge - 0.03).abs() < 1e-9);
        assert!(!decision.qualifies);

        // Negative edge never qualifies
        let decision = calc.compute(&model("home", 0.40, t0()), &reference).unwrap();
        assert!(decision.edge < 0.0);
        assert!(!decision.qualifies);
    }

    #[test]
    fn test_qualification_monotonic_in_edge() {
        let calc = EdgeCalculator::new(BettingConfig::default());
        let snaps = vec![snapshot(
            "alpha",
            &[("home", dec!(1.91)), ("away", dec!(1.91))],
            t0(),
        )];
        let eligible = calc.eligible_snapshots(&snaps, t0());
        let reference = calc.select_reference(&eligible, "home").unwrap().unwrap();

        let mut last_qualified = true;
        for m in [0.65, 0.60, 0.55, 0.53, 0.50, 0.45] {
            let decision = calc.compute(&model("home", m, t0()), &reference).unwrap();
            // Once qualification turns off it must stay off as edge decreases
            assert!(last_qualified || !decision.qualifies);
            last_qualified = decision.qualifies;
        }
    }
}
