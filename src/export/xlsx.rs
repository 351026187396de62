//! XLSX rendering via rust_xlsxwriter

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use std::collections::HashSet;

use crate::export::workbook::{Cell, Sheet, Workbook};
use crate::traits::WorkbookRenderer;
use crate::types::{ReconError, ReconResult};

/// Excel's limit on worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Renders a workbook to `.xlsx` bytes in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxRenderer;

impl XlsxRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl WorkbookRenderer for XlsxRenderer {
    fn render(&self, workbook: &Workbook) -> ReconResult<Vec<u8>> {
        let mut xlsx = XlsxWorkbook::new();
        let heading = Format::new().set_bold();
        let mut used = HashSet::new();

        for sheet in &workbook.sheets {
            let name = sanitize_sheet_name(&sheet.name, &mut used);
            let worksheet = xlsx
                .add_worksheet()
                .set_name(&name)
                .map_err(|e| render_error(&format!("failed to create sheet '{}'", name), e))?;
            write_sheet(worksheet, sheet, &heading)?;
        }

        let bytes = xlsx
            .save_to_buffer()
            .map_err(|e| render_error("failed to save workbook", e))?;
        tracing::debug!(sheets = workbook.sheets.len(), bytes = bytes.len(), "rendered xlsx workbook");
        Ok(bytes)
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, heading: &Format) -> ReconResult<()> {
    for (r, row) in sheet.rows.iter().enumerate() {
        let r32 = u32::try_from(r).map_err(|_| ReconError::Render(format!("sheet '{}' has too many rows", sheet.name)))?;
        for (c, cell) in row.iter().enumerate() {
            let c16 = u16::try_from(c)
                .map_err(|_| ReconError::Render(format!("sheet '{}' has too many columns", sheet.name)))?;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(r32, c16, s),
                Cell::Heading(s) => worksheet.write_string_with_format(r32, c16, s, heading),
                // Display keeps the exact decimal; f64 parsing then picks the nearest double
                Cell::Number(n) => match n.to_string().parse::<f64>() {
                    Ok(value) => worksheet.write_number(r32, c16, value),
                    Err(_) => worksheet.write_string(r32, c16, n.to_string()),
                },
            };
            written.map_err(|e| render_error(&format!("failed to write cell ({}, {})", r, c), e))?;
        }
    }
    Ok(())
}

fn render_error(context: &str, error: XlsxError) -> ReconError {
    ReconError::Render(format!("{}: {}", context, error))
}

/// Make a sheet name acceptable to Excel and unique within the workbook.
///
/// Forbidden characters become `_`, leading and trailing apostrophes are
/// dropped, names are cut to 31 characters, and clashes (compared ignoring
/// case) get a ` (n)` suffix.
pub fn sanitize_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "Sheet" } else { cleaned };

    let mut candidate = truncate_chars(base, MAX_SHEET_NAME_LEN);
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({})", n);
        candidate = format!("{}{}", truncate_chars(base, MAX_SHEET_NAME_LEN - suffix.len()), suffix);
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_sanitize_sheet_names() {
        let mut used = HashSet::new();
        assert_eq!(sanitize_sheet_name("B2B [Rejected]", &mut used), "B2B _Rejected_");
        assert_eq!(sanitize_sheet_name("'ISD'", &mut used), "ISD");
        assert_eq!(sanitize_sheet_name("  ", &mut used), "Sheet");
        assert_eq!(sanitize_sheet_name("a/b\\c?d*e:f", &mut used), "a_b_c_d_e_f");
    }

    #[test]
    fn test_sanitize_truncates_and_deduplicates() {
        let mut used = HashSet::new();
        let long = "Imports of goods from SEZ units annexure";
        let first = sanitize_sheet_name(long, &mut used);
        assert_eq!(first.chars().count(), 31);
        let second = sanitize_sheet_name(long, &mut used);
        assert!(second.ends_with(" (2)"));
        assert!(second.chars().count() <= 31);
        assert_eq!(sanitize_sheet_name("isd", &mut used), "isd");
        assert_eq!(sanitize_sheet_name("ISD", &mut used), "ISD (2)");
    }

    #[test]
    fn test_render_produces_xlsx_archive() {
        let mut sheet = Sheet::new("Master");
        sheet.push(vec![Cell::heading("Particulars"), Cell::heading("Total")]);
        sheet.push(vec![Cell::text("Allowed"), Cell::Number(BigDecimal::from_str("1234.56").unwrap())]);
        sheet.push(vec![]);
        let workbook = Workbook {
            sheets: vec![sheet, Sheet::placeholder("Master")],
        };

        let bytes = XlsxRenderer::new().render(&workbook).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(XlsxRenderer.extension(), "xlsx");
    }
}
