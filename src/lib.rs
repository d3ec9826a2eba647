//! `methyl-dynamics` library crate.
//!
//! Cells are classified by how many of their `M` sites are methylated and
//! evolve under birth, death, methylation and demethylation. The crate answers:
//!
//! - how population counts evolve (`sim::gillespie`, `solve::propagator`)
//! - how likely a single-cell lineage is to die out (`solve::extinction`,
//!   `solve::limit`, `sim::monte_carlo`)
//! - what shape and growth rate a surviving population settles into
//!   (`solve::quasistationary`)
//!
//! The binary (`methyl`) is a thin wrapper around this library so the engine
//! stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod sim;
pub mod solve;
