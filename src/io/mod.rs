//! Input/output helpers.
//!
//! - parameter JSON read + generic JSON writer (`params`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod params;

pub use export::*;
pub use params::*;
