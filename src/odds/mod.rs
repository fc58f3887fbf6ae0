//! Odds handling
//!
//! Price-format normalization and de-vigging. Everything here is a pure
//! function of its inputs.

pub mod devig;
pub mod normalize;

pub use devig::{devig, DevigMethod, FAIR_SUM_TOLERANCE};
pub use normalize::{implied_probability, to_decimal_odds, validate_decimal_odds};
