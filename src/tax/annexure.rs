//! Tax totals of auxiliary annexure sheets
//!
//! Annexure headers are free text flattened from two header rows, e.g.
//! `Integrated Tax(₹)(Tax Amount)` or `Central Tax(Input tax distribution by
//! ISD)`. Which column holds which tax head is decided by the rule table in
//! [`rule_for`]; a tax head no rule can resolve totals to zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tax::gst::{TaxAmounts, TaxHead};
use crate::types::{AnnexureSheet, Record};
use crate::utils::headers::{find_header, find_header_by_candidates};
use crate::utils::numeric::amount_or_zero;
use crate::utils::numeric::value_to_text;

/// Groups of annexure sheets sharing a header layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetFamily {
    /// ISD / ISDA: credit distributed by an input service distributor
    Isd,
    /// IMPG / IMPGSEZ: import of goods
    Import,
    /// B2B-CDNR / B2B-CDNRA: credit and debit notes
    CreditDebitNote,
    /// Everything else (B2BA, ECO, ITC reversal, rejected claims, ...)
    Generic,
}

impl SheetFamily {
    /// Family of a sheet, judged by its name
    pub fn of(sheet_name: &str) -> Self {
        let name = normalize_sheet_name(sheet_name);
        if name.contains("CDN") {
            SheetFamily::CreditDebitNote
        } else if name.starts_with("ISD") {
            SheetFamily::Isd
        } else if name.starts_with("IMPG") || name.contains("IMPORT") {
            SheetFamily::Import
        } else {
            SheetFamily::Generic
        }
    }
}

/// Upper-cased sheet name with everything but letters and digits removed
pub fn normalize_sheet_name(sheet_name: &str) -> String {
    sheet_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// How a tax-head column is looked for, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Header names both the tax head and the family's main heading
    TaxAndMainHeading,
    /// Header names the tax head only; tolerates header-format drift
    TaxOnly,
}

/// Header-matching policy for one sheet family
#[derive(Debug)]
pub struct HeaderRule {
    pub family: SheetFamily,
    pub main_heading: Regex,
    pub strategies: Vec<MatchStrategy>,
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("annexure header pattern is a valid regex")
}

static TAX_HEAD_PATTERNS: Lazy<[(TaxHead, Regex); 4]> = Lazy::new(|| {
    [
        (TaxHead::Igst, pattern(r"(?i)integrated|\bigst\b")),
        (TaxHead::Cgst, pattern(r"(?i)central|\bcgst\b")),
        (TaxHead::Sgst, pattern(r"(?i)state|\but\b|union\s*territory|\bsgst\b|\butgst\b")),
        (TaxHead::Cess, pattern(r"(?i)\bcess\b")),
    ]
});

static HEADER_RULES: Lazy<Vec<HeaderRule>> = Lazy::new(|| {
    let strategies = vec![MatchStrategy::TaxAndMainHeading, MatchStrategy::TaxOnly];
    vec![
        HeaderRule {
            family: SheetFamily::Isd,
            main_heading: pattern(r"(?i)input\s*tax\s*distribution\s*by\s*isd"),
            strategies: strategies.clone(),
        },
        HeaderRule {
            family: SheetFamily::Import,
            main_heading: pattern(r"(?i)amount\s*of\s*tax"),
            strategies: strategies.clone(),
        },
        HeaderRule {
            family: SheetFamily::CreditDebitNote,
            main_heading: pattern(r"(?i)tax\s*amount"),
            strategies: strategies.clone(),
        },
        HeaderRule {
            family: SheetFamily::Generic,
            main_heading: pattern(r"(?i)tax\s*amount"),
            strategies,
        },
    ]
});

/// Note-type column candidates, most specific first
static NOTE_TYPE_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        pattern(r"(?i)^\s*note\s*type\s*$"),
        pattern(r"(?i)note\s*type"),
        pattern(r"(?i)(document|doc)\s*type"),
    ]
});

/// Pattern recognizing a tax head in a header
pub fn tax_head_pattern(head: TaxHead) -> &'static Regex {
    TAX_HEAD_PATTERNS
        .iter()
        .find(|(h, _)| *h == head)
        .map(|(_, regex)| regex)
        .unwrap_or(&TAX_HEAD_PATTERNS[0].1)
}

/// Header rule of a sheet family
pub fn rule_for(family: SheetFamily) -> &'static HeaderRule {
    HEADER_RULES
        .iter()
        .find(|rule| rule.family == family)
        .unwrap_or(&HEADER_RULES[HEADER_RULES.len() - 1])
}

/// Column chosen for a tax head and how it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub head: TaxHead,
    pub header: String,
    pub strategy: MatchStrategy,
}

/// Resolve the column of a tax head, or `None` when nothing matches
pub fn resolve_tax_column(headers: &[String], family: SheetFamily, head: TaxHead) -> Option<ResolvedColumn> {
    let rule = rule_for(family);
    let tax = tax_head_pattern(head);
    rule.strategies.iter().find_map(|strategy| {
        let found = match strategy {
            MatchStrategy::TaxAndMainHeading => find_header(headers, &[tax, &rule.main_heading]),
            MatchStrategy::TaxOnly => find_header(headers, &[tax]),
        };
        found.map(|header| ResolvedColumn {
            head,
            header: header.to_string(),
            strategy: *strategy,
        })
    })
}

/// Locate the note-type column of a credit/debit-note sheet
pub fn resolve_note_type_column(headers: &[String]) -> Option<&str> {
    find_header_by_candidates(headers, &NOTE_TYPE_HEADERS)
}

/// Kind of a credit/debit-note row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Debit,
    Credit,
}

impl NoteKind {
    /// Read the note-type cell (`Debit Note`, `Credit note`, `D`, `CN`, ...)
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        if value.starts_with("debit") || value == "d" || value == "dn" {
            Some(NoteKind::Debit)
        } else if value.starts_with("credit") || value == "c" || value == "cn" {
            Some(NoteKind::Credit)
        } else {
            None
        }
    }
}

fn sum_rows<'a>(rows: impl Iterator<Item = &'a Record>, columns: &[ResolvedColumn]) -> TaxAmounts {
    let mut totals = TaxAmounts::default();
    for row in rows {
        for column in columns {
            *totals.get_mut(column.head) += amount_or_zero(row.get(&column.header));
        }
    }
    totals
}

fn resolve_all(sheet: &AnnexureSheet, family: SheetFamily) -> Vec<ResolvedColumn> {
    TaxHead::ALL
        .iter()
        .filter_map(|head| {
            let resolved = resolve_tax_column(&sheet.headers, family, *head);
            match &resolved {
                Some(column) if column.strategy == MatchStrategy::TaxOnly => {
                    tracing::debug!(
                        sheet = %sheet.sheet_name,
                        head = head.short_name(),
                        header = %column.header,
                        "tax column matched without main heading"
                    );
                }
                None => {
                    tracing::debug!(
                        sheet = %sheet.sheet_name,
                        head = head.short_name(),
                        "no tax column, totalling zero"
                    );
                }
                _ => {}
            }
            resolved
        })
        .collect()
}

/// IGST/CGST/SGST/CESS totals of a sheet across all its rows
pub fn sheet_totals(sheet: &AnnexureSheet) -> TaxAmounts {
    if sheet.is_empty() {
        return TaxAmounts::default();
    }
    let columns = resolve_all(sheet, SheetFamily::of(&sheet.sheet_name));
    sum_rows(sheet.rows.iter(), &columns)
}

/// Debit-note and credit-note totals of a credit/debit-note sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTotals {
    pub debit: TaxAmounts,
    pub credit: TaxAmounts,
}

/// Split a credit/debit-note sheet by note type.
///
/// A sheet without a recognizable note-type column contributes nothing to
/// either side.
pub fn note_totals(sheet: &AnnexureSheet) -> NoteTotals {
    if sheet.is_empty() {
        return NoteTotals::default();
    }
    let Some(note_column) = resolve_note_type_column(&sheet.headers) else {
        tracing::warn!(sheet = %sheet.sheet_name, "no note type column, sheet skipped");
        return NoteTotals::default();
    };
    let columns = resolve_all(sheet, SheetFamily::CreditDebitNote);

    let kind_of = |row: &Record| {
        row.get(note_column)
            .and_then(value_to_text)
            .and_then(|text| NoteKind::parse(&text))
    };
    NoteTotals {
        debit: sum_rows(
            sheet.rows.iter().filter(|row| kind_of(*row) == Some(NoteKind::Debit)),
            &columns,
        ),
        credit: sum_rows(
            sheet.rows.iter().filter(|row| kind_of(*row) == Some(NoteKind::Credit)),
            &columns,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use serde_json::json;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn sheet(name: &str, headers: &[&str], rows: serde_json::Value) -> AnnexureSheet {
        AnnexureSheet::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.as_array()
                .unwrap()
                .iter()
                .map(|r| r.as_object().unwrap().clone())
                .collect(),
        )
    }

    #[test]
    fn test_sheet_family_detection() {
        assert_eq!(SheetFamily::of("ISD"), SheetFamily::Isd);
        assert_eq!(SheetFamily::of("ISDA"), SheetFamily::Isd);
        assert_eq!(SheetFamily::of("IMPGSEZ"), SheetFamily::Import);
        assert_eq!(SheetFamily::of("B2B-CDNR"), SheetFamily::CreditDebitNote);
        assert_eq!(SheetFamily::of("B2BA"), SheetFamily::Generic);
        assert_eq!(SheetFamily::of("B2B (ITC Reversal)"), SheetFamily::Generic);
    }

    #[test]
    fn test_combined_match_preferred_over_tax_only() {
        let headers: Vec<String> = ["Integrated Tax(Rate)", "Integrated Tax(Tax Amount)"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let resolved = resolve_tax_column(&headers, SheetFamily::Generic, TaxHead::Igst).unwrap();
        assert_eq!(resolved.header, "Integrated Tax(Tax Amount)");
        assert_eq!(resolved.strategy, MatchStrategy::TaxAndMainHeading);
    }

    #[test]
    fn test_tax_only_fallback() {
        let headers = vec!["Central Tax(₹)".to_string()];
        let resolved = resolve_tax_column(&headers, SheetFamily::Generic, TaxHead::Cgst).unwrap();
        assert_eq!(resolved.strategy, MatchStrategy::TaxOnly);
        assert!(resolve_tax_column(&headers, SheetFamily::Generic, TaxHead::Cess).is_none());
    }

    #[test]
    fn test_isd_sheet_totals() {
        let s = sheet(
            "ISD",
            &[
                "Integrated Tax(Input tax distribution by ISD)",
                "Central Tax(Input tax distribution by ISD)",
                "State/UT Tax(Input tax distribution by ISD)",
                "Cess(Input tax distribution by ISD)",
            ],
            json!([
                {"Integrated Tax(Input tax distribution by ISD)": 100, "Central Tax(Input tax distribution by ISD)": "10.50",
                 "State/UT Tax(Input tax distribution by ISD)": 10.5, "Cess(Input tax distribution by ISD)": ""},
                {"Integrated Tax(Input tax distribution by ISD)": "1,000", "Central Tax(Input tax distribution by ISD)": null}
            ]),
        );
        let totals = sheet_totals(&s);
        assert_eq!(totals.igst, dec("1100"));
        assert_eq!(totals.cgst, dec("10.50"));
        assert_eq!(totals.sgst, dec("10.5"));
        assert_eq!(totals.cess, dec("0"));
    }

    #[test]
    fn test_import_sheet_uses_amount_of_tax_heading() {
        let s = sheet(
            "IMPG",
            &["Taxable Value(Amount of tax)", "Integrated Tax(Amount of tax)", "Cess(Amount of tax)"],
            json!([{"Taxable Value(Amount of tax)": 1000, "Integrated Tax(Amount of tax)": 180, "Cess(Amount of tax)": 5}]),
        );
        let totals = sheet_totals(&s);
        assert_eq!(totals.igst, dec("180"));
        assert_eq!(totals.cess, dec("5"));
        assert_eq!(totals.cgst, dec("0"));
    }

    #[test]
    fn test_empty_sheet_is_zero() {
        let s = AnnexureSheet::new("B2BA", vec![], vec![]);
        assert_eq!(sheet_totals(&s), TaxAmounts::default());
    }

    #[test]
    fn test_note_totals_split_by_type() {
        let s = sheet(
            "B2B-CDNR",
            &["Note type", "Integrated Tax(Tax Amount)", "Central Tax(Tax Amount)"],
            json!([
                {"Note type": "Credit Note", "Integrated Tax(Tax Amount)": 50, "Central Tax(Tax Amount)": 0},
                {"Note type": "Debit Note", "Integrated Tax(Tax Amount)": 20, "Central Tax(Tax Amount)": 3},
                {"Note type": "credit", "Integrated Tax(Tax Amount)": 5},
                {"Note type": "Other", "Integrated Tax(Tax Amount)": 999}
            ]),
        );
        let totals = note_totals(&s);
        assert_eq!(totals.credit.igst, dec("55"));
        assert_eq!(totals.debit.igst, dec("20"));
        assert_eq!(totals.debit.cgst, dec("3"));
    }

    #[test]
    fn test_note_sheet_without_type_column_is_zero() {
        let s = sheet(
            "B2B-CDNR",
            &["Integrated Tax(Tax Amount)"],
            json!([{"Integrated Tax(Tax Amount)": 50}]),
        );
        assert_eq!(note_totals(&s), NoteTotals::default());
    }

    #[test]
    fn test_note_kind_parse() {
        assert_eq!(NoteKind::parse(" DEBIT NOTE "), Some(NoteKind::Debit));
        assert_eq!(NoteKind::parse("C"), Some(NoteKind::Credit));
        assert_eq!(NoteKind::parse("Refund voucher"), None);
    }
}
