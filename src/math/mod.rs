//! Mathematical utilities: binomial kernel, linear algebra, root finding, ODEs.

pub mod binomial;
pub mod linalg;
pub mod ode;
pub mod roots;

pub use binomial::*;
pub use linalg::*;
pub use ode::*;
pub use roots::*;
