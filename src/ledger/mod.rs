//! ADD/LESS reconciliation ledger

pub mod categories;
pub mod core;

pub use categories::*;
pub use self::core::*;
