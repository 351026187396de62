//! Field normalizers for the portal action feed
//!
//! Each normalizer has its own failure policy: dates pass through untouched,
//! periods and places of supply collapse to an empty string, invoice types
//! default to regular.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TWO_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2})\b").expect("valid regex"));

static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));

static ISO_DATETIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})[T ]\d{2}:\d{2}").expect("valid regex"));

static PERIOD_COMPACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{2})(\d{4})$").expect("valid regex"));

static PERIOD_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\s*[/\-.]\s*(\d{4}|\d{2})$").expect("valid regex"));

static PERIOD_YEAR_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\s*[/\-.]\s*(\d{1,2})$").expect("valid regex"));

static PERIOD_NAMED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]{3,9})\.?[\s'’`\-/,]*(\d{4}|\d{2})$").expect("valid regex"));

/// GST state codes by lower-cased state or territory name
static STATE_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("jammu and kashmir", "01"),
        ("jammu & kashmir", "01"),
        ("himachal pradesh", "02"),
        ("punjab", "03"),
        ("chandigarh", "04"),
        ("uttarakhand", "05"),
        ("uttaranchal", "05"),
        ("haryana", "06"),
        ("delhi", "07"),
        ("new delhi", "07"),
        ("rajasthan", "08"),
        ("uttar pradesh", "09"),
        ("bihar", "10"),
        ("sikkim", "11"),
        ("arunachal pradesh", "12"),
        ("nagaland", "13"),
        ("manipur", "14"),
        ("mizoram", "15"),
        ("tripura", "16"),
        ("meghalaya", "17"),
        ("assam", "18"),
        ("west bengal", "19"),
        ("jharkhand", "20"),
        ("odisha", "21"),
        ("orissa", "21"),
        ("chhattisgarh", "22"),
        ("madhya pradesh", "23"),
        ("gujarat", "24"),
        ("daman and diu", "25"),
        ("daman & diu", "25"),
        ("dadra and nagar haveli and daman and diu", "26"),
        ("dadra and nagar haveli", "26"),
        ("maharashtra", "27"),
        ("andhra pradesh (old)", "28"),
        ("karnataka", "29"),
        ("goa", "30"),
        ("lakshadweep", "31"),
        ("kerala", "32"),
        ("tamil nadu", "33"),
        ("puducherry", "34"),
        ("pondicherry", "34"),
        ("andaman and nicobar islands", "35"),
        ("andaman & nicobar islands", "35"),
        ("telangana", "36"),
        ("andhra pradesh", "37"),
        ("ladakh", "38"),
        ("other territory", "97"),
    ]
    .into_iter()
    .collect()
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const FOUR_DIGIT_YEAR_FORMATS: [&str; 5] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%d-%b-%Y"];

const TWO_DIGIT_YEAR_FORMATS: [&str; 3] = ["%d/%m/%y", "%d-%m-%y", "%d-%b-%y"];

/// Trim and upper-case a GSTIN
pub fn normalize_gstin(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Render an invoice date as `DD-MM-YYYY`.
///
/// Accepts day-first dates with `/`, `-` or `.` separators, ISO dates and
/// ISO date-times. Anything else is returned trimmed but otherwise unchanged.
pub fn normalize_invoice_date(raw: &str) -> String {
    let text = raw.trim();
    let date_part = ISO_DATETIME
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str());

    parse_date(date_part)
        .map(|date| date.format("%d-%m-%Y").to_string())
        .unwrap_or_else(|| text.to_string())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    FOUR_DIGIT_YEAR_FORMATS
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .find(|date| date.year() >= 1000)
        .or_else(|| {
            TWO_DIGIT_YEAR_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}

/// Portal invoice type from free text: Regular, SEZ/Credit or Deemed export
pub fn invoice_type_code(raw: &str) -> &'static str {
    match raw.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => "C",
        Some('D') => "D",
        _ => "R",
    }
}

/// Two-digit state code for a place of supply.
///
/// Tries a literal two-digit code (`"29-Karnataka"`), then the state name,
/// then the name with parenthetical qualifiers removed. Unresolved values
/// give an empty string.
pub fn place_of_supply_code(raw: &str) -> String {
    let text = raw.trim();
    if let Some(code) = TWO_DIGITS.captures(text).and_then(|caps| caps.get(1)) {
        return code.as_str().to_string();
    }

    let name = collapse_blanks(&text.to_lowercase());
    if let Some(code) = STATE_CODES.get(name.as_str()) {
        return code.to_string();
    }

    let stripped = collapse_blanks(&PARENTHETICAL.replace_all(&name, " "));
    STATE_CODES
        .get(stripped.as_str())
        .map(|code| code.to_string())
        .unwrap_or_default()
}

fn collapse_blanks(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a return period to `MMYYYY`.
///
/// Accepts `MMYYYY`, `MM/YYYY` (also `-` or `.`), `YYYY-MM` and month names
/// or abbreviations followed by a two or four digit year (`Oct'25`,
/// `October 2025`). Anything else, including an out-of-range month, gives an
/// empty string.
pub fn normalize_return_period(raw: &str) -> String {
    let text = raw.trim();

    let parts = if let Some(caps) = PERIOD_COMPACT.captures(text) {
        month_number(&caps[1]).map(|month| (month, caps[2].to_string()))
    } else if let Some(caps) = PERIOD_NUMERIC.captures(text) {
        month_number(&caps[1]).map(|month| (month, expand_year(&caps[2])))
    } else if let Some(caps) = PERIOD_YEAR_FIRST.captures(text) {
        month_number(&caps[2]).map(|month| (month, caps[1].to_string()))
    } else if let Some(caps) = PERIOD_NAMED.captures(text) {
        month_from_name(&caps[1]).map(|month| (month, expand_year(&caps[2])))
    } else {
        None
    };

    parts
        .map(|(month, year)| format!("{:02}{}", month, year))
        .unwrap_or_default()
}

fn month_number(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| lower.len() >= 3 && month.starts_with(lower.as_str()))
        .map(|index| index as u32 + 1)
}

fn expand_year(year: &str) -> String {
    if year.len() == 2 {
        format!("20{}", year)
    } else {
        year.to_string()
    }
}
