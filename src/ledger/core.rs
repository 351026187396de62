//! ADD/LESS reconciliation of bucket totals and annexure totals

use bigdecimal::BigDecimal;
use serde::Serialize;

use crate::ledger::categories::{categories_for, is_reconciled_sheet, Side};
use crate::tax::aggregate::BucketTotals;
use crate::tax::gst::TaxAmounts;
use crate::types::{AnnexureSheet, Bucket};

/// One line of the reconciliation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerLine {
    pub label: String,
    pub tax: TaxAmounts,
    /// IGST + CGST + SGST + CESS of this line
    pub total: BigDecimal,
}

impl LedgerLine {
    pub fn new(label: impl Into<String>, tax: TaxAmounts) -> Self {
        let total = tax.total();
        Self {
            label: label.into(),
            tax,
            total,
        }
    }
}

/// Reconciliation of claimed credit against the return.
///
/// `grand_total = add_subtotal - less_subtotal`, field by field. The RCM
/// payable figure is reported alongside but never netted: the filer pays
/// reverse-charge tax directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationLedger {
    pub add: Vec<LedgerLine>,
    pub less: Vec<LedgerLine>,
    pub add_subtotal: LedgerLine,
    pub less_subtotal: LedgerLine,
    pub grand_total: LedgerLine,
    pub rcm_payable: BigDecimal,
    /// Annexure sheets no ADD or LESS category consumes
    pub unreconciled_sheets: Vec<String>,
}

fn subtotal(label: &str, lines: &[LedgerLine]) -> LedgerLine {
    LedgerLine::new(label, lines.iter().map(|line| &line.tax).sum())
}

impl ReconciliationLedger {
    /// Build the ledger from bucket totals and the return's annexure sheets
    pub fn build(buckets: &BucketTotals, sheets: &[AnnexureSheet]) -> Self {
        let mut add = vec![LedgerLine::new(
            Bucket::Allowed.label(),
            buckets.get(Bucket::Allowed).tax.clone(),
        )];
        add.extend(
            categories_for(Side::Add).map(|category| LedgerLine::new(category.label, category.totals(sheets))),
        );

        let mut less = vec![
            LedgerLine::new(
                Bucket::Disallowed.label(),
                buckets.get(Bucket::Disallowed).tax.clone(),
            ),
            LedgerLine::new(
                Bucket::MismatchedRejected.label(),
                buckets.get(Bucket::MismatchedRejected).tax.clone(),
            ),
        ];
        less.extend(
            categories_for(Side::Less).map(|category| LedgerLine::new(category.label, category.totals(sheets))),
        );

        let add_subtotal = subtotal("ADD Subtotal", &add);
        let less_subtotal = subtotal("LESS Subtotal", &less);
        let grand_total = LedgerLine::new(
            "Grand Total (ADD - LESS)",
            &add_subtotal.tax - &less_subtotal.tax,
        );
        let rcm_payable = buckets.get(Bucket::ReverseCharge).supplier_amount.clone();
        let unreconciled_sheets: Vec<String> = sheets
            .iter()
            .filter(|sheet| !is_reconciled_sheet(&sheet.sheet_name))
            .map(|sheet| sheet.sheet_name.clone())
            .collect();

        tracing::debug!(
            add = %add_subtotal.total,
            less = %less_subtotal.total,
            net = %grand_total.total,
            rcm_payable = %rcm_payable,
            unreconciled = unreconciled_sheets.len(),
            "reconciliation ledger built"
        );

        Self {
            add,
            less,
            add_subtotal,
            less_subtotal,
            grand_total,
            rcm_payable,
            unreconciled_sheets,
        }
    }

    /// Whether the net figure equals ADD minus LESS on every field
    pub fn is_consistent(&self) -> bool {
        let expected = &self.add_subtotal.tax - &self.less_subtotal.tax;
        expected == self.grand_total.tax
            && self.grand_total.total == &self.add_subtotal.total - &self.less_subtotal.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, RowCollections};
    use crate::config::{ColumnMap, EngineConfig};
    use crate::row::InvoiceRow;
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn row(value: Value) -> InvoiceRow {
        InvoiceRow::from_record(value.as_object().unwrap(), &ColumnMap::default())
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn sheet(name: &str, value: Value) -> AnnexureSheet {
        let rows: Vec<_> = value.as_array().unwrap().iter().map(|r| r.as_object().unwrap().clone()).collect();
        let headers: Vec<String> = rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default();
        AnnexureSheet::new(name, headers, rows)
    }

    fn buckets() -> BucketTotals {
        let collections = RowCollections::new(
            vec![
                row(json!({"Invoice Number": "1", "IGST 18%": 180})),
                row(json!({"Invoice Number": "2", "Ledger Name": "Freight [disallow]", "CGST 5%": 25, "SGST 5%": 25})),
            ],
            vec![row(json!({"Invoice Number": "3", "Custom IGST": 40}))],
            vec![row(json!({"Invoice Number": "4", "IGST 5%": 5, "Supplier Amount": 105}))],
            vec![],
        );
        BucketTotals::from_classification(&classify(&collections, &EngineConfig::default()))
    }

    #[test]
    fn test_ledger_sections_and_net() {
        let sheets = vec![
            sheet("B2BA", json!([{"Integrated Tax(Tax Amount)": 20}])),
            sheet("IMPG", json!([{"Integrated Tax(Amount of tax)": 100}])),
            sheet(
                "B2B-CDNR",
                json!([
                    {"Note type": "Debit Note", "Integrated Tax(Tax Amount)": 7},
                    {"Note type": "Credit Note", "Integrated Tax(Tax Amount)": 30}
                ]),
            ),
        ];
        let ledger = ReconciliationLedger::build(&buckets(), &sheets);

        assert_eq!(ledger.add.len(), 6);
        assert_eq!(ledger.add[0].label, "Allowed");
        assert_eq!(ledger.add[0].tax.igst, dec("180"));
        assert_eq!(ledger.add[1].tax.igst, dec("20"));
        assert_eq!(ledger.add[4].tax.igst, dec("100"));
        assert_eq!(ledger.add[5].tax.igst, dec("7"));
        assert_eq!(ledger.add_subtotal.total, dec("307"));

        assert_eq!(ledger.less.len(), 3);
        assert_eq!(ledger.less[0].total, dec("50"));
        assert_eq!(ledger.less[1].tax.igst, dec("40"));
        assert_eq!(ledger.less[2].tax.igst, dec("30"));
        assert_eq!(ledger.less_subtotal.total, dec("120"));

        assert_eq!(ledger.grand_total.total, dec("187"));
        assert!(ledger.is_consistent());
        assert!(ledger.unreconciled_sheets.is_empty());
    }

    #[test]
    fn test_rcm_payable_not_netted() {
        let ledger = ReconciliationLedger::build(&buckets(), &[]);
        assert_eq!(ledger.rcm_payable, dec("105"));
        assert_eq!(ledger.grand_total.total, dec("180") - dec("90"));
    }

    #[test]
    fn test_disallowed_row_lands_on_less_side() {
        let ledger = ReconciliationLedger::build(&buckets(), &[]);
        assert_eq!(ledger.less[0].label, "Disallowed");
        assert_eq!(ledger.less[0].tax.cgst, dec("25"));
        assert!(ledger.add.iter().all(|line| line.tax.cgst == dec("0")));
    }

    #[test]
    fn test_unreconciled_sheets_are_listed() {
        let sheets = vec![
            sheet("ECO", json!([{"Integrated Tax(Tax Amount)": 9}])),
            sheet("IMPGSEZ", json!([{"Integrated Tax(Amount of tax)": 3}])),
        ];
        let ledger = ReconciliationLedger::build(&buckets(), &sheets);
        assert_eq!(ledger.unreconciled_sheets, vec!["ECO".to_string()]);
        assert_eq!(ledger.add[4].tax.igst, dec("3"));
    }
}
