//! Utility modules

pub mod headers;
pub mod numeric;
pub mod validation;

pub use numeric::*;
pub use validation::*;
