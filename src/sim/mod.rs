//! Stochastic side of the engine.
//!
//! - `events`: the transition catalog
//! - `gillespie`: one exact trajectory
//! - `monte_carlo`: parallel extinction estimates
//! - `sampler`: trajectory datasets (stochastic or deterministic)
//! - `control`: cancellation

pub mod control;
pub mod events;
pub mod gillespie;
pub mod monte_carlo;
pub mod sampler;

pub use control::*;
pub use events::*;
pub use gillespie::*;
pub use monte_carlo::*;
pub use sampler::*;
