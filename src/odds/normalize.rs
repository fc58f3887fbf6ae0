//! Price normalization
//!
//! Converts bookmaker prices in any supported format (decimal, American,
//! fractional) to decimal odds, and decimal odds to implied probabilities.
//! All functions are pure; anything that is not a finite price strictly
//! above 1.0 is rejected here so downstream math never sees it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{Price, Quote};
use crate::error::{FairlineError, Result};

/// Convert a price in any supported format to decimal odds.
///
/// Decimal odds are payout per unit staked with the stake included, so a
/// valid price is always strictly above 1.0.
pub fn to_decimal_odds(price: &Price) -> Result<Decimal> {
    let odds = match price {
        Price::Decimal(d) => *d,
        Price::American(0) => {
            return Err(FairlineError::InvalidPrice(
                "American odds of 0 have no decimal equivalent".to_string(),
            ))
        }
        // -110 pays 100/110 per unit, +150 pays 150/100 per unit
        Price::American(a) if *a < 0 => {
            Decimal::from(100) / Decimal::from(a.unsigned_abs()) + Decimal::ONE
        }
        Price::American(a) => Decimal::from(*a) / Decimal::from(100) + Decimal::ONE,
        Price::Fractional(_, 0) => {
            return Err(FairlineError::InvalidPrice(
                "fractional odds with zero denominator".to_string(),
            ))
        }
        Price::Fractional(num, den) => {
            Decimal::from(*num) / Decimal::from(*den) + Decimal::ONE
        }
    };

    validate_decimal_odds(odds)?;
    Ok(odds)
}

/// Check the decimal odds invariant: strictly greater than 1.0.
///
/// Odds of exactly 1.0 would be a guaranteed-loss quote (stake returned,
/// nothing won) and anything below is nonsense from a book.
pub fn validate_decimal_odds(odds: Decimal) -> Result<Decimal> {
    if odds <= Decimal::ONE {
        return Err(FairlineError::InvalidPrice(format!(
            "decimal odds {odds} must be greater than 1.0"
        )));
    }
    Ok(odds)
}

/// Implied probability of a quote: 1 / decimal odds, in (0, 1)
pub fn implied_probability(quote: &Quote) -> Result<f64> {
    validate_decimal_odds(quote.price)?;
    let odds = quote.price.to_f64().ok_or_else(|| {
        FairlineError::InvalidPrice(format!("decimal odds {} not representable", quote.price))
    })?;
    if !odds.is_finite() {
        return Err(FairlineError::InvalidPrice(format!(
            "decimal odds {odds} is not finite"
        )));
    }
    Ok(1.0 / odds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn quote(price: Decimal) -> Quote {
        Quote {
            event_id: "evt-1".to_string(),
            market_type: MarketType::HeadToHead,
            outcome: "home".to_string(),
            book_id: "pinnacle".to_string(),
            price,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_decimal_passthrough() {
        let odds = to_decimal_odds(&Price::Decimal(dec!(1.91))).unwrap();
        assert_eq!(odds, dec!(1.91));
    }

    #[test]
    fn test_american_negative() {
        // -110: risk 110 to win 100 => decimal 1.909090...
        let odds = to_decimal_odds(&Price::American(-110)).unwrap();
        let f = odds.to_f64().unwrap();
        assert!((f - 1.909090909).abs() < 1e-6);
    }

    #[test]
    fn test_american_positive() {
        // +150: risk 100 to win 150 => decimal 2.50
        let odds = to_decimal_odds(&Price::American(150)).unwrap();
        assert_eq!(odds, dec!(2.50));
    }

    #[test]
    fn test_american_zero_rejected() {
        assert!(to_decimal_odds(&Price::American(0)).is_err());
    }

    #[test]
    fn test_fractional() {
        // 10/11 => decimal 1.909090...
        let odds = to_decimal_odds(&Price::Fractional(10, 11)).unwrap();
        let f = odds.to_f64().unwrap();
        assert!((f - 1.909090909).abs() < 1e-6);

        // Evens
        let odds = to_decimal_odds(&Price::Fractional(1, 1)).unwrap();
        assert_eq!(odds, dec!(2));
    }

    #[test]
    fn test_fractional_zero_denominator_rejected() {
        assert!(to_decimal_odds(&Price::Fractional(10, 0)).is_err());
    }

    #[test]
    fn test_price_of_one_rejected() {
        let err = to_decimal_odds(&Price::Decimal(dec!(1.0)));
        assert!(matches!(err, Err(FairlineError::InvalidPrice(_))));

        // Zero-numerator fractional collapses to 1.0 and is rejected the same way
        assert!(to_decimal_odds(&Price::Fractional(0, 5)).is_err());
    }

    #[test]
    fn test_sub_one_rejected() {
        assert!(to_decimal_odds(&Price::Decimal(dec!(0.95))).is_err());
        assert!(to_decimal_odds(&Price::Decimal(dec!(-2))).is_err());
    }

    #[test]
    fn test_implied_probability() {
        let p = implied_probability(&quote(dec!(1.91))).unwrap();
        assert!((p - 0.5235602094).abs() < 1e-9);

        let p = implied_probability(&quote(dec!(2.0))).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_implied_probability_invalid_quote() {
        assert!(implied_probability(&quote(dec!(1.0))).is_err());
    }
}
