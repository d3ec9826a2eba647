//! Rate-function families and validated model instances.
//!
//! Rates are implemented as small, pure functions so the simulators and
//! solvers can stay generic over the variant.

pub mod model;
pub mod rates;

pub use model::*;
pub use rates::*;
