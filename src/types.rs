//! Core types and data structures for the reconciliation engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw, dynamically-keyed spreadsheet row. Key order is preserved.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The four mutually exclusive categories every invoice row ends up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    /// Input tax credit is claimed - the row goes to Tally as processed
    Allowed,
    /// Mismatched against books and credit was not accepted
    MismatchedRejected,
    /// Reverse-charge purchase, tax is paid directly by the filer
    ReverseCharge,
    /// Credit is not available or explicitly disallowed
    Disallowed,
}

impl Bucket {
    /// All buckets in export order
    pub const ALL: [Bucket; 4] = [
        Bucket::Allowed,
        Bucket::MismatchedRejected,
        Bucket::ReverseCharge,
        Bucket::Disallowed,
    ];

    /// Claim priority; lower wins when two collections hold the same signature
    pub fn priority(self) -> u8 {
        match self {
            Bucket::Disallowed => 0,
            Bucket::ReverseCharge => 1,
            Bucket::Allowed => 2,
            Bucket::MismatchedRejected => 3,
        }
    }

    /// Position of this bucket inside [`Bucket::ALL`]
    pub fn index(self) -> usize {
        match self {
            Bucket::Allowed => 0,
            Bucket::MismatchedRejected => 1,
            Bucket::ReverseCharge => 2,
            Bucket::Disallowed => 3,
        }
    }

    /// Default category label used on the Master sheet
    pub fn label(self) -> &'static str {
        match self {
            Bucket::Allowed => "Allowed",
            Bucket::MismatchedRejected => "Mismatched (Rejected)",
            Bucket::ReverseCharge => "RCM",
            Bucket::Disallowed => "Disallowed",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The input collection a row was supplied in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Rows matched against the books on import
    Processed,
    /// Rows that failed matching
    Mismatched,
    /// Reverse-charge rows
    ReverseCharge,
    /// Rows the user moved to the disallow list
    Disallow,
}

impl Origin {
    /// All origins in the order their collections are scanned
    pub const ALL: [Origin; 4] = [
        Origin::Processed,
        Origin::Mismatched,
        Origin::ReverseCharge,
        Origin::Disallow,
    ];

    /// Collection name used in error messages and logs
    pub fn name(self) -> &'static str {
        match self {
            Origin::Processed => "processed",
            Origin::Mismatched => "mismatched",
            Origin::ReverseCharge => "reverse_charge",
            Origin::Disallow => "disallow",
        }
    }
}

/// Filing decision recorded against a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionDecision {
    Accept,
    Reject,
    Pending,
    /// Blank or unrecognised action
    None,
}

impl ActionDecision {
    /// All decisions in reporting order
    pub const ALL: [ActionDecision; 4] = [
        ActionDecision::Accept,
        ActionDecision::Reject,
        ActionDecision::Pending,
        ActionDecision::None,
    ];

    /// Normalize free text: case-insensitive exact match, anything else is `None`
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        if value.eq_ignore_ascii_case("accept") {
            ActionDecision::Accept
        } else if value.eq_ignore_ascii_case("reject") {
            ActionDecision::Reject
        } else if value.eq_ignore_ascii_case("pending") {
            ActionDecision::Pending
        } else {
            ActionDecision::None
        }
    }

    /// Single-letter portal code
    pub fn code(self) -> Option<&'static str> {
        match self {
            ActionDecision::Accept => Some("A"),
            ActionDecision::Reject => Some("R"),
            ActionDecision::Pending => Some("P"),
            ActionDecision::None => None,
        }
    }

    /// Label used in the action totals block
    pub fn label(self) -> &'static str {
        match self {
            ActionDecision::Accept => "Accept",
            ActionDecision::Reject => "Reject",
            ActionDecision::Pending => "Pending",
            ActionDecision::None => "No action",
        }
    }
}

/// Tri-state Yes/No flag as typed into a dropdown cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Yes,
    No,
    Unset,
}

impl Flag {
    /// Only an explicit "Yes"/"No" (any case, surrounding blanks ignored) is set
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("yes") => Flag::Yes,
            Some(v) if v.eq_ignore_ascii_case("no") => Flag::No,
            _ => Flag::Unset,
        }
    }
}

/// An auxiliary annexure table of the return (B2BA, ISD, IMPG, CDNR, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnexureSheet {
    /// Sheet name as it appears in the return workbook
    pub sheet_name: String,
    /// Flattened free-text headers, e.g. `Integrated Tax(Tax Amount)`
    #[serde(default)]
    pub headers: Vec<String>,
    /// Data rows keyed by header
    #[serde(default)]
    pub rows: Vec<Record>,
}

impl AnnexureSheet {
    /// Create a new annexure sheet
    pub fn new(sheet_name: impl Into<String>, headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            headers,
            rows,
        }
    }

    /// A sheet with no headers or no rows carries no data
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// Errors surfaced to the caller. Per-row data problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Invalid collection '{collection}': {reason}")]
    InvalidCollection { collection: String, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for engine operations
pub type ReconResult<T> = Result<T, ReconError>;
