//! Analytic solvers: deterministic propagation, quasistationary shape,
//! discrete extinction recursion and the continuum-limit curve.

pub mod extinction;
pub mod limit;
pub mod propagator;
pub mod quasistationary;

pub use extinction::*;
pub use limit::*;
pub use propagator::*;
pub use quasistationary::*;
