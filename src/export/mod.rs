//! Export workbook assembly and rendering

pub mod workbook;
pub mod xlsx;

pub use workbook::*;
pub use xlsx::{sanitize_sheet_name, XlsxRenderer};
