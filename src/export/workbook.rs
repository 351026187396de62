//! In-memory export workbook
//!
//! The workbook is plain data: sheets of typed cells in a fixed order. Turning
//! it into a file format is left to a [`crate::traits::WorkbookRenderer`].

use bigdecimal::BigDecimal;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;

use crate::classify::Classification;
use crate::config::EngineConfig;
use crate::ledger::{LedgerLine, ReconciliationLedger};
use crate::tax::aggregate::TaxSummary;
use crate::tax::gst::CategoryTotals;
use crate::types::{ActionDecision, AnnexureSheet, Bucket, Record};

pub const ORIGINAL_RETURN_SHEET: &str = "OriginalReturn";
pub const MASTER_SHEET: &str = "Master";
pub const NO_DATA: &str = "No data available";

/// Sheet holding the rows of one bucket
pub fn bucket_sheet_name(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Allowed => "TallyProcessed",
        Bucket::MismatchedRejected => "Mismatched",
        Bucket::ReverseCharge => "RCM",
        Bucket::Disallowed => "Disallow",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Cell {
    Empty,
    Text(String),
    /// Section or column heading
    Heading(String),
    Number(BigDecimal),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn heading(value: impl Into<String>) -> Self {
        Cell::Heading(value.into())
    }

    pub fn number(value: &BigDecimal) -> Self {
        Cell::Number(value.clone())
    }

    /// Cell for a raw record value; numbers stay numeric
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::String(s) => Cell::Text(s.clone()),
            Value::Number(n) => BigDecimal::from_str(&n.to_string())
                .map(Cell::Number)
                .unwrap_or_else(|_| Cell::Text(n.to_string())),
            Value::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) | Cell::Heading(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Cell::Number(n) => Some(n),
            _ => None,
        }
    }
}

pub type SheetRow = Vec<Cell>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// A sheet holding only the no-data marker
    pub fn placeholder(name: impl Into<String>) -> Self {
        let mut sheet = Self::new(name);
        sheet.push(vec![Cell::text(NO_DATA)]);
        sheet
    }

    /// Header row plus one row per record, columns in first-seen order
    pub fn from_records(name: impl Into<String>, records: &[Record]) -> Self {
        let headers = union_headers(records);
        Self::from_table(name, &headers, records)
    }

    /// Header row plus one row per record under the given columns.
    /// Without columns or rows the sheet gets the no-data marker.
    pub fn from_table(name: impl Into<String>, headers: &[String], records: &[Record]) -> Self {
        if headers.is_empty() || records.is_empty() {
            return Self::placeholder(name);
        }
        let mut sheet = Self::new(name);
        sheet.push(headers.iter().map(Cell::heading).collect());
        for record in records {
            sheet.push(
                headers
                    .iter()
                    .map(|h| record.get(h).map_or(Cell::Empty, Cell::from_value))
                    .collect(),
            );
        }
        sheet
    }

    pub fn push(&mut self, row: SheetRow) {
        self.rows.push(row);
    }

    pub fn is_placeholder(&self) -> bool {
        self.rows.len() == 1 && self.rows[0] == [Cell::text(NO_DATA)]
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// First row whose leading cell reads `label`
    pub fn find_row(&self, label: &str) -> Option<&SheetRow> {
        self.rows
            .iter()
            .find(|row| row.first().and_then(Cell::as_text) == Some(label))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Column names across records, in first-seen order
pub fn union_headers(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();
    for key in records.iter().flat_map(|r| r.keys()) {
        if seen.insert(key.as_str()) {
            headers.push(key.clone());
        }
    }
    headers
}

const TOTALS_HEADINGS: [&str; 10] = [
    "Category",
    "Rows",
    "Taxable Value",
    "Invoice Value",
    "Supplier Amount",
    "IGST",
    "CGST",
    "SGST",
    "CESS",
    "Total Tax",
];

const LEDGER_HEADINGS: [&str; 6] = ["Particulars", "IGST", "CGST", "SGST", "CESS", "Total"];

/// Assembles the export workbook for one run
pub struct WorkbookBuilder<'a> {
    pub config: &'a EngineConfig,
    pub classification: &'a Classification,
    pub summary: &'a TaxSummary,
    pub ledger: &'a ReconciliationLedger,
    pub original_rows: &'a [Record],
    pub annexures: &'a [AnnexureSheet],
}

impl WorkbookBuilder<'_> {
    /// Sheets in export order: original return, Master, the four bucket
    /// sheets, then every annexure sheet as supplied
    pub fn build(&self) -> Workbook {
        let mut sheets = vec![
            Sheet::from_records(ORIGINAL_RETURN_SHEET, self.original_rows),
            self.master_sheet(),
        ];
        for bucket in Bucket::ALL {
            sheets.push(Sheet::from_records(bucket_sheet_name(bucket), &self.bucket_records(bucket)));
        }
        for annexure in self.annexures {
            sheets.push(Sheet::from_table(&annexure.sheet_name, &annexure.headers, &annexure.rows));
        }
        Workbook { sheets }
    }

    fn bucket_records(&self, bucket: Bucket) -> Vec<Record> {
        self.classification
            .rows(bucket)
            .iter()
            .map(|placed| placed.row.to_record(&self.config.columns))
            .collect()
    }

    /// Category-tagged rows, bucket and action totals, then the ADD/LESS table
    pub fn master_sheet(&self) -> Sheet {
        let tagged: Vec<(Bucket, Record)> = self
            .classification
            .all_rows()
            .map(|placed| (placed.bucket, placed.row.to_record(&self.config.columns)))
            .collect();

        let mut sheet = Sheet::new(MASTER_SHEET);
        if tagged.is_empty() {
            // Totals and the ADD/LESS table are still emitted below
            sheet.push(vec![Cell::text(NO_DATA)]);
        } else {
            let records: Vec<Record> = tagged.iter().map(|(_, record)| record.clone()).collect();
            let headers = union_headers(&records);

            let mut heading_row = vec![Cell::heading("Category")];
            heading_row.extend(headers.iter().map(Cell::heading));
            sheet.push(heading_row);
            for (bucket, record) in &tagged {
                let mut row = vec![Cell::text(bucket.label())];
                row.extend(headers.iter().map(|h| record.get(h).map_or(Cell::Empty, Cell::from_value)));
                sheet.push(row);
            }
        }

        sheet.push(Vec::new());
        self.push_bucket_totals(&mut sheet);
        sheet.push(Vec::new());
        self.push_action_totals(&mut sheet);
        sheet.push(Vec::new());
        self.push_ledger(&mut sheet);
        sheet
    }

    fn push_bucket_totals(&self, sheet: &mut Sheet) {
        sheet.push(TOTALS_HEADINGS.iter().map(|h| Cell::heading(*h)).collect());
        for bucket in Bucket::ALL {
            sheet.push(totals_row(bucket.label(), self.summary.buckets.get(bucket)));
        }
        sheet.push(totals_row("Grand Total", &self.summary.buckets.grand_total));
    }

    fn push_action_totals(&self, sheet: &mut Sheet) {
        sheet.push(vec![Cell::heading("Action"), Cell::heading("Amount")]);
        for decision in ActionDecision::ALL {
            sheet.push(vec![
                Cell::text(decision.label()),
                Cell::number(self.summary.actions.get(decision)),
            ]);
        }
        sheet.push(vec![
            Cell::text("Action Grand Total"),
            Cell::number(&self.summary.actions.grand_total),
        ]);
    }

    fn push_ledger(&self, sheet: &mut Sheet) {
        let ledger = self.ledger;
        sheet.push(LEDGER_HEADINGS.iter().map(|h| Cell::heading(*h)).collect());
        sheet.push(vec![Cell::heading("ADD")]);
        for line in &ledger.add {
            sheet.push(ledger_row(line));
        }
        sheet.push(ledger_row(&ledger.add_subtotal));
        sheet.push(vec![Cell::heading("LESS")]);
        for line in &ledger.less {
            sheet.push(ledger_row(line));
        }
        sheet.push(ledger_row(&ledger.less_subtotal));
        sheet.push(ledger_row(&ledger.grand_total));
        sheet.push(Vec::new());
        sheet.push(vec![Cell::text("RCM Payable"), Cell::number(&ledger.rcm_payable)]);
    }
}

fn totals_row(label: &str, totals: &CategoryTotals) -> SheetRow {
    vec![
        Cell::text(label),
        Cell::Number(BigDecimal::from(totals.rows as u64)),
        Cell::number(&totals.taxable_value),
        Cell::number(&totals.invoice_value),
        Cell::number(&totals.supplier_amount),
        Cell::number(&totals.tax.igst),
        Cell::number(&totals.tax.cgst),
        Cell::number(&totals.tax.sgst),
        Cell::number(&totals.tax.cess),
        Cell::Number(totals.tax.total()),
    ]
}

fn ledger_row(line: &LedgerLine) -> SheetRow {
    vec![
        Cell::text(line.label.clone()),
        Cell::number(&line.tax.igst),
        Cell::number(&line.tax.cgst),
        Cell::number(&line.tax.sgst),
        Cell::number(&line.tax.cess),
        Cell::number(&line.total),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, RowCollections};
    use crate::config::ColumnMap;
    use crate::row::InvoiceRow;
    use serde_json::json;

    fn row(value: Value) -> InvoiceRow {
        InvoiceRow::from_record(value.as_object().unwrap(), &ColumnMap::default())
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn build(collections: &RowCollections, annexures: &[AnnexureSheet]) -> Workbook {
        let config = EngineConfig::default();
        let classification = classify(collections, &config);
        let summary = TaxSummary::from_classification(&classification);
        let ledger = ReconciliationLedger::build(&summary.buckets, annexures);
        WorkbookBuilder {
            config: &config,
            classification: &classification,
            summary: &summary,
            ledger: &ledger,
            original_rows: &[],
            annexures,
        }
        .build()
    }

    #[test]
    fn test_sheet_order() {
        let annexures = vec![
            AnnexureSheet::new("IMPG", vec!["Integrated Tax(Amount of tax)".to_string()], vec![]),
            AnnexureSheet::new("B2BA", vec![], vec![]),
        ];
        let workbook = build(&RowCollections::default(), &annexures);
        assert_eq!(
            workbook.sheet_names(),
            vec!["OriginalReturn", "Master", "TallyProcessed", "Mismatched", "RCM", "Disallow", "IMPG", "B2BA"]
        );
        assert!(workbook
            .sheets
            .iter()
            .filter(|sheet| sheet.name != MASTER_SHEET)
            .all(Sheet::is_placeholder));
    }

    #[test]
    fn test_master_keeps_ledger_without_invoice_rows() {
        let annexures = vec![AnnexureSheet::new(
            "IMPG",
            vec!["Integrated Tax(Amount of tax)".to_string()],
            vec![json!({"Integrated Tax(Amount of tax)": 100}).as_object().unwrap().clone()],
        )];
        let workbook = build(&RowCollections::default(), &annexures);
        let master = workbook.sheet(MASTER_SHEET).unwrap();

        assert!(!master.is_placeholder());
        assert_eq!(master.cell(0, 0), Some(&Cell::text(NO_DATA)));
        let grand = master.find_row("Grand Total").unwrap();
        assert_eq!(grand[1], Cell::Number(BigDecimal::from(0u64)));
        let net = master.find_row("Grand Total (ADD - LESS)").unwrap();
        assert_eq!(net[5], Cell::Number(dec("100")));
        assert!(master.find_row("RCM Payable").is_some());
    }

    #[test]
    fn test_master_layout() {
        let collections = RowCollections::new(
            vec![row(json!({"Invoice Number": "1", "IGST 18%": 18, "Supplier Amount": 118, "Action": "Accept"}))],
            vec![row(json!({"Invoice Number": "2", "Custom CGST": 4, "Custom SGST": 4, "Remarks": "short"}))],
            vec![row(json!({"Invoice Number": "3", "IGST 5%": 5, "Supplier Amount": 105}))],
            vec![],
        );
        let workbook = build(&collections, &[]);
        let master = workbook.sheet(MASTER_SHEET).unwrap();

        assert_eq!(master.cell(0, 0), Some(&Cell::heading("Category")));
        assert_eq!(master.cell(1, 0), Some(&Cell::text("Allowed")));
        assert_eq!(master.cell(2, 0), Some(&Cell::text("Mismatched (Rejected)")));
        assert_eq!(master.cell(3, 0), Some(&Cell::text("RCM")));
        let headings: Vec<&str> = master.rows[0].iter().filter_map(Cell::as_text).collect();
        assert!(headings.contains(&"Remarks"));

        let grand = master.find_row("Grand Total").unwrap();
        assert_eq!(grand[1], Cell::Number(BigDecimal::from(3u64)));
        assert_eq!(grand[5], Cell::Number(dec("23")));

        let accept = master.find_row("Accept").unwrap();
        assert_eq!(accept[1], Cell::Number(dec("118")));

        let net = master.find_row("Grand Total (ADD - LESS)").unwrap();
        assert_eq!(net[5], Cell::Number(dec("10")));

        let rcm = master.find_row("RCM Payable").unwrap();
        assert_eq!(rcm[1], Cell::Number(dec("105")));
    }

    #[test]
    fn test_bucket_sheets_hold_their_rows() {
        let collections = RowCollections::new(
            vec![row(json!({"Invoice Number": "1", "Ledger Name": "Freight [disallow]"}))],
            vec![],
            vec![],
            vec![],
        );
        let workbook = build(&collections, &[]);
        assert!(workbook.sheet("TallyProcessed").unwrap().is_placeholder());
        let disallow = workbook.sheet("Disallow").unwrap();
        assert_eq!(disallow.rows.len(), 2);
        assert!(disallow.rows[1].contains(&Cell::text("Freight [disallow]")));
    }

    #[test]
    fn test_union_headers_first_seen_order() {
        let records: Vec<Record> = vec![
            json!({"a": 1, "b": 2}).as_object().unwrap().clone(),
            json!({"c": 3, "a": 4}).as_object().unwrap().clone(),
        ];
        assert_eq!(union_headers(&records), vec!["a", "b", "c"]);
    }
}
