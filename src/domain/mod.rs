pub mod decision;
pub mod market;
pub mod state;

pub use decision::*;
pub use market::*;
pub use state::*;
