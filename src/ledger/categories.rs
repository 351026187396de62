//! Annexure categories of the ADD/LESS reconciliation, in report order

use serde::Serialize;

use crate::tax::annexure::{normalize_sheet_name, note_totals, sheet_totals, NoteKind};
use crate::tax::gst::TaxAmounts;
use crate::types::AnnexureSheet;

/// Which side of the reconciliation a line sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Add,
    Less,
}

/// A named group of annexure sheets contributing one ledger line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnexureCategory {
    pub label: &'static str,
    pub side: Side,
    /// Sheet names as they appear in the return; matched ignoring case and punctuation
    pub sheets: &'static [&'static str],
    /// Credit/debit-note sheets only count rows of this note kind
    pub notes: Option<NoteKind>,
}

const CDNR_SHEETS: &[&str] = &["B2B-CDNR", "B2B-CDNRA"];

/// Fixed category sequence: every ADD line first, then LESS
pub static ANNEXURE_CATEGORIES: [AnnexureCategory; 6] = [
    AnnexureCategory {
        label: "Amended invoices (B2BA)",
        side: Side::Add,
        sheets: &["B2BA"],
        notes: None,
    },
    AnnexureCategory {
        label: "ITC reversal / rejected claims",
        side: Side::Add,
        sheets: &[
            "B2B (ITC Reversal)",
            "B2BA (ITC Reversal)",
            "B2B(Rejected)",
            "B2BA(Rejected)",
            "ECO(Rejected)",
            "ECOA(Rejected)",
            "ISD(Rejected)",
            "ISDA(Rejected)",
        ],
        notes: None,
    },
    AnnexureCategory {
        label: "ISD distribution (ISD, ISDA)",
        side: Side::Add,
        sheets: &["ISD", "ISDA"],
        notes: None,
    },
    AnnexureCategory {
        label: "Import of goods (IMPG, IMPGSEZ)",
        side: Side::Add,
        sheets: &["IMPG", "IMPGSEZ"],
        notes: None,
    },
    AnnexureCategory {
        label: "Debit notes (B2B-CDNR)",
        side: Side::Add,
        sheets: CDNR_SHEETS,
        notes: Some(NoteKind::Debit),
    },
    AnnexureCategory {
        label: "Credit notes (B2B-CDNR)",
        side: Side::Less,
        sheets: CDNR_SHEETS,
        notes: Some(NoteKind::Credit),
    },
];

impl AnnexureCategory {
    /// Whether a sheet belongs to this category
    pub fn includes(&self, sheet_name: &str) -> bool {
        let name = normalize_sheet_name(sheet_name);
        self.sheets.iter().any(|s| normalize_sheet_name(s) == name)
    }

    /// Sum this category over the supplied sheets; absent sheets add nothing
    pub fn totals(&self, sheets: &[AnnexureSheet]) -> TaxAmounts {
        let mut totals = TaxAmounts::default();
        for sheet in sheets.iter().filter(|s| self.includes(&s.sheet_name)) {
            let contribution = match self.notes {
                Some(NoteKind::Debit) => note_totals(sheet).debit,
                Some(NoteKind::Credit) => note_totals(sheet).credit,
                None => sheet_totals(sheet),
            };
            totals += &contribution;
        }
        totals
    }
}

/// Categories on one side, in report order
pub fn categories_for(side: Side) -> impl Iterator<Item = &'static AnnexureCategory> {
    ANNEXURE_CATEGORIES.iter().filter(move |c| c.side == side)
}

/// Whether any category consumes this sheet
pub fn is_reconciled_sheet(sheet_name: &str) -> bool {
    ANNEXURE_CATEGORIES.iter().any(|c| c.includes(sheet_name))
}
