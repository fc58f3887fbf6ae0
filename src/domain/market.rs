use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market type for a quoted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    /// Straight winner market (moneyline)
    HeadToHead,
    /// Point spread / handicap market
    Spread,
    /// Over/under totals market
    Total,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::HeadToHead => "h2h",
            MarketType::Spread => "spread",
            MarketType::Total => "total",
        }
    }
}

impl std::fmt::Display for MarketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookmaker price in one of the supported quote formats.
///
/// All formats are normalized to decimal odds before any probability math;
/// see `odds::normalize`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Price {
    /// Decimal (European) odds, e.g. 1.91
    Decimal(Decimal),
    /// American odds, e.g. -110 or +150
    American(i32),
    /// Fractional odds as numerator/denominator, e.g. 10/11
    Fractional(u32, u32),
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Price::Decimal(d) => write!(f, "{d}"),
            Price::American(a) if *a > 0 => write!(f, "+{a}"),
            Price::American(a) => write!(f, "{a}"),
            Price::Fractional(num, den) => write!(f, "{num}/{den}"),
        }
    }
}

/// One book's price for one outcome of one market of one event.
///
/// `price` is always decimal odds; quotes arriving in other formats go
/// through `odds::normalize::to_decimal_odds` at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub event_id: String,
    pub market_type: MarketType,
    /// Outcome label, e.g. a team name or "over"
    pub outcome: String,
    pub book_id: String,
    /// Decimal odds (payout per unit staked, stake included)
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl Quote {
    /// Net odds (payout multiple excluding the returned stake), as f64
    pub fn net_odds(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.price.to_f64().unwrap_or(0.0) - 1.0
    }
}

/// All outcome quotes of one market at one book at one observation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub event_id: String,
    pub market_type: MarketType,
    pub book_id: String,
    pub observed_at: DateTime<Utc>,
    pub quotes: Vec<Quote>,
}

impl MarketSnapshot {
    pub fn new(
        event_id: impl Into<String>,
        market_type: MarketType,
        book_id: impl Into<String>,
        observed_at: DateTime<Utc>,
        quotes: Vec<Quote>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            market_type,
            book_id: book_id.into(),
            observed_at,
            quotes,
        }
    }

    /// Quote for a specific outcome label, if present
    pub fn quote_for(&self, outcome: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.outcome == outcome)
    }

    /// Outcome labels in quote order
    pub fn outcomes(&self) -> Vec<&str> {
        self.quotes.iter().map(|q| q.outcome.as_str()).collect()
    }

    /// Label used in diagnostics: "<event>/<market>@<book>"
    pub fn label(&self) -> String {
        format!("{}/{}@{}", self.event_id, self.market_type, self.book_id)
    }
}

/// Realized outcome of one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub event_id: String,
    /// Label of the outcome that materialized
    pub outcome_realized: String,
    pub resolved_at: DateTime<Utc>,
}
