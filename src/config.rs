use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::{FairlineError, Result};
use crate::odds::DevigMethod;
use crate::strategy::ReferenceBookPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub betting: BettingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Staking and evaluation parameters
#[derive(Debug, Clone, Deserialize)]
pub struct BettingConfig {
    /// Minimum edge (model minus fair probability) to qualify a bet
    #[serde(default = "default_min_edge_threshold")]
    pub min_edge_threshold: f64,
    /// Fraction of full Kelly to stake (0.5 = half Kelly)
    #[serde(default = "default_kelly_multiplier")]
    pub kelly_multiplier: f64,
    /// Maximum single stake as a fraction of bankroll
    #[serde(default = "default_max_single_bet_fraction")]
    pub max_single_bet_fraction: f64,
    /// Maximum cumulative exposure across open bets, as a fraction of bankroll
    #[serde(default = "default_max_total_exposure_fraction")]
    pub max_total_exposure_fraction: f64,
    /// Method used to strip bookmaker margin
    #[serde(default)]
    pub devig_method: DevigMethod,
    /// How the reference book is chosen when several books quote a market
    #[serde(default)]
    pub reference_book_policy: ReferenceBookPolicy,
    /// Book id required when reference_book_policy = "configured_book"
    #[serde(default)]
    pub configured_book: Option<String>,
    /// Books eligible as reference input (empty = all books)
    #[serde(default)]
    pub allowed_books: Vec<String>,
    /// Discard quotes older than this many seconds at evaluation time
    #[serde(default)]
    pub max_quote_age_secs: Option<i64>,
}

fn default_min_edge_threshold() -> f64 {
    0.03
}

fn default_kelly_multiplier() -> f64 {
    0.5
}

fn default_max_single_bet_fraction() -> f64 {
    0.10
}

fn default_max_total_exposure_fraction() -> f64 {
    0.25
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self {
            min_edge_threshold: default_min_edge_threshold(),
            kelly_multiplier: default_kelly_multiplier(),
            max_single_bet_fraction: default_max_single_bet_fraction(),
            max_total_exposure_fraction: default_max_total_exposure_fraction(),
            devig_method: DevigMethod::default(),
            reference_book_policy: ReferenceBookPolicy::default(),
            configured_book: None,
            allowed_books: Vec::new(),
            max_quote_age_secs: None,
        }
    }
}

impl BettingConfig {
    /// Validate configured values.
    ///
    /// A bad configuration would silently corrupt every downstream decision,
    /// so validation failures are fatal to the run.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.kelly_multiplier <= 0.0 || self.kelly_multiplier > 1.0 {
            errors.push(format!(
                "kelly_multiplier {} must be in (0, 1]",
                self.kelly_multiplier
            ));
        }
        if self.min_edge_threshold < 0.0 {
            errors.push(format!(
                "min_edge_threshold {} must not be negative",
                self.min_edge_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.max_single_bet_fraction) {
            errors.push(format!(
                "max_single_bet_fraction {} must be in [0, 1]",
                self.max_single_bet_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.max_total_exposure_fraction) {
            errors.push(format!(
                "max_total_exposure_fraction {} must be in [0, 1]",
                self.max_total_exposure_fraction
            ));
        }
        if self.max_single_bet_fraction > self.max_total_exposure_fraction {
            errors.push(format!(
                "max_single_bet_fraction {} exceeds max_total_exposure_fraction {}",
                self.max_single_bet_fraction, self.max_total_exposure_fraction
            ));
        }
        if self.reference_book_policy == ReferenceBookPolicy::ConfiguredBook
            && self.configured_book.is_none()
        {
            errors.push("configured_book is required for the configured_book policy".to_string());
        }
        if let Some(age) = self.max_quote_age_secs {
            if age <= 0 {
                errors.push(format!("max_quote_age_secs {age} must be positive"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FairlineError::InvalidConfig(errors.join("; ")))
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("FAIRLINE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (FAIRLINE_BETTING__KELLY_MULTIPLIER, etc.)
            .add_source(
                Environment::with_prefix("FAIRLINE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.betting.validate()?;
        Ok(config)
    }
}
