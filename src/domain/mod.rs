//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the parameter record (`ModelParams`) and rate family (`RateModelKind`)
//! - the closed event enumeration (`Event`)
//! - solver and simulator outputs (`Trajectory`, `ExtinctionSolution`, etc.)

pub mod types;

pub use types::*;
