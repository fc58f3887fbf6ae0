use thiserror::Error;

/// Main error type for the staking engine
#[derive(Error, Debug)]
pub enum FairlineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Price errors
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Degenerate price: net odds {net_odds} too small for Kelly sizing")]
    DegeneratePrice { net_odds: f64 },

    // Market errors
    #[error("Market {market}: {count} outcome(s) supplied, need at least 2 to de-vig")]
    InsufficientOutcomes { market: String, count: usize },

    #[error("Degenerate market {market}: implied probabilities sum to {implied_sum}")]
    DegenerateMarket { market: String, implied_sum: f64 },

    // Input ordering errors
    #[error("Non-causal input for event {event_id}: {detail}")]
    NonCausalInput { event_id: String, detail: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for FairlineError
pub type Result<T> = std::result::Result<T, FairlineError>;

impl FairlineError {
    /// Whether this error invalidates the whole run rather than a single event.
    ///
    /// Per-event evaluation errors are contained by the backtester and turned
    /// into skipped records; structural errors abort the run because every
    /// downstream result would be corrupted by continuing.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FairlineError::Config(_)
                | FairlineError::InvalidConfig(_)
                | FairlineError::NonCausalInput { .. }
                | FairlineError::Io(_)
                | FairlineError::Json(_)
        )
    }
}
