use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one event inside a walk-forward run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventPhase {
    /// Resolution known to the replay but not yet reached
    Pending,
    /// Decision pipeline has run on strictly-prior data
    Evaluated,
    /// Outcome applied, bankroll settled
    Resolved,
}

impl EventPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventPhase::Pending => "PENDING",
            EventPhase::Evaluated => "EVALUATED",
            EventPhase::Resolved => "RESOLVED",
        }
    }

    /// Phases only ever advance: Pending -> Evaluated -> Resolved
    pub fn can_transition_to(&self, target: EventPhase) -> bool {
        matches!(
            (self, target),
            (EventPhase::Pending, EventPhase::Evaluated)
                | (EventPhase::Evaluated, EventPhase::Resolved)
        )
    }
}

impl fmt::Display for EventPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running capital for one backtest run.
///
/// Threaded as a value through the sequential fold; mutated only at
/// settlement, never while a bet is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankrollState {
    pub initial: Decimal,
    pub current: Decimal,
}

impl BankrollState {
    pub fn new(initial: Decimal) -> Self {
        Self {
            initial,
            current: initial,
        }
    }

    /// Stake amount for a fraction of the current bankroll
    pub fn stake_for(&self, fraction: f64) -> Decimal {
        let fraction = Decimal::from_f64(fraction).unwrap_or(Decimal::ZERO);
        (self.current * fraction).round_dp(2)
    }

    /// Apply realized profit or loss and return the updated state
    pub fn settle(self, pnl: Decimal) -> Self {
        Self {
            initial: self.initial,
            current: self.current + pnl,
        }
    }

    pub fn roi(&self) -> Decimal {
        if self.initial.is_zero() {
            Decimal::ZERO
        } else {
            (self.current - self.initial) / self.initial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_phase_transitions() {
        assert!(EventPhase::Pending.can_transition_to(EventPhase::Evaluated));
        assert!(EventPhase::Evaluated.can_transition_to(EventPhase::Resolved));
        assert!(!EventPhase::Pending.can_transition_to(EventPhase::Resolved));
        assert!(!EventPhase::Resolved.can_transition_to(EventPhase::Pending));
    }

    #[test]
    fn test_bankroll_settle() {
        let bankroll = BankrollState::new(dec!(1000));
        let bankroll = bankroll.settle(dec!(91.00));
        assert_eq!(bankroll.current, dec!(1091.00));
        let bankroll = bankroll.settle(dec!(-50.00));
        assert_eq!(bankroll.current, dec!(1041.00));
        assert_eq!(bankroll.initial, dec!(1000));
        assert_eq!(bankroll.roi(), dec!(0.041));
    }

    #[test]
    fn test_stake_for_fraction() {
        let bankroll = BankrollState::new(dec!(1000));
        assert_eq!(bankroll.stake_for(0.1044), dec!(104.40));
        assert_eq!(bankroll.stake_for(0.0), Decimal::ZERO);
    }
}
