//! Portal invoice-action feed

pub mod builder;
pub mod normalize;

pub use builder::*;
pub use normalize::{
    invoice_type_code, normalize_gstin, normalize_invoice_date, normalize_return_period,
    place_of_supply_code,
};
