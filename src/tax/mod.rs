//! Tax arithmetic: rate slabs, bucket and action totals, annexure totals

pub mod aggregate;
pub mod annexure;
pub mod gst;

pub use aggregate::*;
pub use annexure::{note_totals, sheet_totals, NoteKind, NoteTotals, SheetFamily};
pub use gst::*;
