//! Portal invoice-action feed
//!
//! Every classified row that carries a filing decision becomes one `b2b`
//! entry. Identity and amounts are taken from the original return row the
//! invoice was imported from; when that row cannot be found the entry is
//! built from the classified row itself.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::classify::{Classification, ClassifiedRow};
use crate::config::EngineConfig;
use crate::feed::normalize::*;
use crate::tax::gst::TaxAmounts;
use crate::types::{ActionDecision, Record};
use crate::utils::headers::find_value;
use crate::utils::numeric::{amount_or_zero, to_money_f64, value_to_text};
use crate::utils::validation::is_well_formed_gstin;

macro_rules! header {
    ($name:ident, $pattern:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($pattern).expect("valid header pattern"));
    };
}

header!(STIN_HEADER, r"(?i)gstin");
header!(INUM_HEADER, r"(?i)invoice\s*(number|no)");
header!(IDT_HEADER, r"(?i)invoice\s*date");
header!(INV_TYPE_HEADER, r"(?i)invoice\s*type");
header!(POS_HEADER, r"(?i)place\s*of\s*supply");
header!(VAL_HEADER, r"(?i)invoice\s*value");
header!(TXVAL_HEADER, r"(?i)taxable\s*value");
header!(IGST_HEADER, r"(?i)integrated\s*tax");
header!(CGST_HEADER, r"(?i)central\s*tax");
header!(SGST_HEADER, r"(?i)state\s*(/\s*ut)?\s*tax");
header!(CESS_HEADER, r"(?i)cess");
header!(PERIOD_HEADER, r"(?i)period");
header!(SOURCE_HEADER, r"(?i)^\s*source\s*$");
header!(PREV_STATUS_HEADER, r"(?i)prev(ious)?\.?\s*(action|status)");

/// One invoice in the portal `SAVE` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceActionEntry {
    pub stin: String,
    pub rtnprd: String,
    pub srcform: String,
    pub inum: String,
    pub idt: String,
    pub inv_typ: String,
    pub pos: String,
    pub val: f64,
    pub txval: f64,
    pub iamt: f64,
    pub camt: f64,
    pub samt: f64,
    pub cess: f64,
    pub action: String,
    pub prev_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    pub b2b: Vec<InvoiceActionEntry>,
}

/// The action document submitted to the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFeed {
    pub rtin: String,
    pub reqtyp: String,
    pub invdata: InvoiceData,
}

impl ActionFeed {
    pub fn new(rtin: impl Into<String>) -> Self {
        Self {
            rtin: rtin.into(),
            reqtyp: "SAVE".to_string(),
            invdata: InvoiceData::default(),
        }
    }

    pub fn entries(&self) -> &[InvoiceActionEntry] {
        &self.invdata.b2b
    }

    pub fn len(&self) -> usize {
        self.invdata.b2b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invdata.b2b.is_empty()
    }
}

/// Builds the action feed from classified rows and the original return rows
pub struct ActionFeedBuilder<'a> {
    config: &'a EngineConfig,
    source_rows: &'a [Record],
}

impl<'a> ActionFeedBuilder<'a> {
    pub fn new(config: &'a EngineConfig, source_rows: &'a [Record]) -> Self {
        Self { config, source_rows }
    }

    /// Build the feed. Buckets are visited in export order and the first
    /// occurrence of an invoice wins.
    pub fn build(&self, rtin: &str, classification: &Classification) -> ActionFeed {
        let mut feed = ActionFeed::new(normalize_gstin(rtin));
        let mut seen: HashSet<(Option<usize>, String, String)> = HashSet::new();

        for placed in classification.all_rows() {
            let Some(entry) = self.entry_for(placed) else {
                continue;
            };
            let key = (placed.row.source_position(), entry.stin.clone(), entry.inum.clone());
            if !seen.insert(key) {
                tracing::debug!(inum = %entry.inum, stin = %entry.stin, "duplicate invoice skipped");
                continue;
            }
            feed.invdata.b2b.push(entry);
        }

        tracing::debug!(entries = feed.len(), "action feed built");
        feed
    }

    /// Entry for one row, or `None` when the row has no decision or lacks
    /// an identity
    pub fn entry_for(&self, placed: &ClassifiedRow) -> Option<InvoiceActionEntry> {
        let row = &placed.row;
        let action = row.action_decision().code()?;

        let source = row
            .source_position()
            .and_then(|position| self.source_rows.get(position));
        let entry = match source {
            Some(record) => self.entry_from_source(record, action),
            None => {
                tracing::debug!(
                    origin = placed.origin.name(),
                    position = placed.position,
                    "no source row, using classified row"
                );
                self.entry_from_row(placed, action)
            }
        };

        if entry.stin.is_empty() || entry.inum.is_empty() {
            tracing::debug!(
                origin = placed.origin.name(),
                position = placed.position,
                "row without GSTIN or invoice number left out of feed"
            );
            return None;
        }
        if !is_well_formed_gstin(&entry.stin) {
            tracing::warn!(stin = %entry.stin, inum = %entry.inum, "supplier GSTIN looks malformed");
        }
        Some(entry)
    }

    fn entry_from_source(&self, record: &Record, action: &str) -> InvoiceActionEntry {
        let text = |pattern: &Regex| {
            find_value(record, pattern)
                .and_then(value_to_text)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };
        let money = |pattern: &Regex| to_money_f64(&amount_or_zero(find_value(record, pattern)));

        let srcform = Some(text(&SOURCE_HEADER))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.config.default_source_form.clone());
        let prev_status = ActionDecision::parse(&text(&PREV_STATUS_HEADER))
            .code()
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_prev_status.clone());

        InvoiceActionEntry {
            stin: normalize_gstin(&text(&STIN_HEADER)),
            rtnprd: normalize_return_period(&text(&PERIOD_HEADER)),
            srcform,
            inum: text(&INUM_HEADER),
            idt: normalize_invoice_date(&text(&IDT_HEADER)),
            inv_typ: invoice_type_code(&text(&INV_TYPE_HEADER)).to_string(),
            pos: place_of_supply_code(&text(&POS_HEADER)),
            val: money(&VAL_HEADER),
            txval: money(&TXVAL_HEADER),
            iamt: money(&IGST_HEADER),
            camt: money(&CGST_HEADER),
            samt: money(&SGST_HEADER),
            cess: money(&CESS_HEADER),
            action: action.to_string(),
            prev_status,
        }
    }

    fn entry_from_row(&self, placed: &ClassifiedRow, action: &str) -> InvoiceActionEntry {
        let row = &placed.row;
        let tax: TaxAmounts = row.tax.amounts();
        let trimmed = |value: &Option<String>| value.as_deref().map(str::trim).unwrap_or("").to_string();

        InvoiceActionEntry {
            stin: normalize_gstin(&trimmed(&row.gstin)),
            rtnprd: String::new(),
            srcform: self.config.default_source_form.clone(),
            inum: trimmed(&row.invoice_number),
            idt: normalize_invoice_date(&trimmed(&row.invoice_date)),
            inv_typ: "R".to_string(),
            pos: String::new(),
            val: to_money_f64(&row.invoice_value_for_totals()),
            txval: to_money_f64(&row.taxable_value_for_totals()),
            iamt: to_money_f64(&tax.igst),
            camt: to_money_f64(&tax.cgst),
            samt: to_money_f64(&tax.sgst),
            cess: to_money_f64(&tax.cess),
            action: action.to_string(),
            prev_status: self.config.default_prev_status.clone(),
        }
    }
}
