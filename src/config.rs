//! Engine configuration
//!
//! Everything here has a sensible default; a TOML document only needs to name
//! the values it changes:
//!
//! ```toml
//! disallow_markers = ["[disallow]", "[blocked]"]
//! default_source_form = "R1"
//!
//! [columns]
//! ledger_name = ["Ledger Name", "Tally Ledger"]
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ReconError, ReconResult};

/// Policy values for one engine invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ledger-name tokens that force a row into the Disallowed bucket
    pub disallow_markers: Vec<String>,
    /// `srcform` used when the source row does not say where it came from
    pub default_source_form: String,
    /// `prev_status` used when the source row carries no previous action
    pub default_prev_status: String,
    /// Recognized column aliases
    pub columns: ColumnMap,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disallow_markers: vec!["[disallow]".to_string()],
            default_source_form: "R1".to_string(),
            default_prev_status: "N".to_string(),
            columns: ColumnMap::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> ReconResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ReconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would silently change classification
    pub fn validate(&self) -> ReconResult<()> {
        if self.disallow_markers.is_empty() {
            return Err(ReconError::Config(
                "at least one disallow marker is required".to_string(),
            ));
        }
        if self.disallow_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(ReconError::Config(
                "disallow markers cannot be blank".to_string(),
            ));
        }
        if self.default_source_form.trim().is_empty() {
            return Err(ReconError::Config(
                "default_source_form cannot be blank".to_string(),
            ));
        }
        if !matches!(self.default_prev_status.as_str(), "A" | "R" | "P" | "N") {
            return Err(ReconError::Config(format!(
                "default_prev_status must be one of A, R, P, N; got '{}'",
                self.default_prev_status
            )));
        }
        self.columns.validate()
    }

    /// Whether a ledger name carries one of the disallow markers
    pub fn is_disallow_ledger(&self, ledger_name: &str) -> bool {
        let ledger = ledger_name.to_lowercase();
        self.disallow_markers
            .iter()
            .any(|marker| ledger.contains(&marker.to_lowercase()))
    }
}

/// Column-name aliases for the recognized row fields, tried in order.
/// Matching ignores case and surrounding blanks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub reference_no: Vec<String>,
    pub supplier_name: Vec<String>,
    pub gstin: Vec<String>,
    pub invoice_number: Vec<String>,
    pub invoice_date: Vec<String>,
    pub taxable_value: Vec<String>,
    pub invoice_value: Vec<String>,
    pub supplier_amount: Vec<String>,
    pub cess: Vec<String>,
    pub ledger_name: Vec<String>,
    pub accept_credit: Vec<String>,
    pub itc_availability: Vec<String>,
    pub action: Vec<String>,
    pub action_reason: Vec<String>,
    pub narration: Vec<String>,
    pub taxable_value_snapshot: Vec<String>,
    pub invoice_value_snapshot: Vec<String>,
    pub source_index: Vec<String>,
    pub serial_no: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            reference_no: aliases(&["Reference No", "Reference No.", "Vch No", "Voucher No"]),
            supplier_name: aliases(&["Supplier Name", "Trade/Legal name", "Party Name"]),
            gstin: aliases(&["GSTIN", "GSTIN of supplier", "Supplier GSTIN"]),
            invoice_number: aliases(&["Invoice Number", "Invoice No", "Invoice No."]),
            invoice_date: aliases(&["Invoice Date"]),
            taxable_value: aliases(&["Taxable Value"]),
            invoice_value: aliases(&["Invoice Value"]),
            supplier_amount: aliases(&["Supplier Amount", "Amount"]),
            cess: aliases(&["Cess", "CESS"]),
            ledger_name: aliases(&["Ledger Name"]),
            accept_credit: aliases(&["Accept Credit"]),
            itc_availability: aliases(&["ITC Availability"]),
            action: aliases(&["Action"]),
            action_reason: aliases(&["Action Reason"]),
            narration: aliases(&["Narration"]),
            taxable_value_snapshot: aliases(&["_taxableValue", "Snapshot Taxable Value"]),
            invoice_value_snapshot: aliases(&["_invoiceValue", "Snapshot Invoice Value"]),
            source_index: aliases(&["_sourceIndex", "Source Row"]),
            serial_no: aliases(&["Sr No", "Sr. No.", "S.No"]),
        }
    }
}

impl ColumnMap {
    /// Every alias list with the field it belongs to
    pub fn fields(&self) -> [(&'static str, &[String]); 19] {
        [
            ("reference_no", self.reference_no.as_slice()),
            ("supplier_name", self.supplier_name.as_slice()),
            ("gstin", self.gstin.as_slice()),
            ("invoice_number", self.invoice_number.as_slice()),
            ("invoice_date", self.invoice_date.as_slice()),
            ("taxable_value", self.taxable_value.as_slice()),
            ("invoice_value", self.invoice_value.as_slice()),
            ("supplier_amount", self.supplier_amount.as_slice()),
            ("cess", self.cess.as_slice()),
            ("ledger_name", self.ledger_name.as_slice()),
            ("accept_credit", self.accept_credit.as_slice()),
            ("itc_availability", self.itc_availability.as_slice()),
            ("action", self.action.as_slice()),
            ("action_reason", self.action_reason.as_slice()),
            ("narration", self.narration.as_slice()),
            ("taxable_value_snapshot", self.taxable_value_snapshot.as_slice()),
            ("invoice_value_snapshot", self.invoice_value_snapshot.as_slice()),
            ("source_index", self.source_index.as_slice()),
            ("serial_no", self.serial_no.as_slice()),
        ]
    }

    fn validate(&self) -> ReconResult<()> {
        match self.fields().iter().find(|(_, names)| names.is_empty()) {
            Some((field, _)) => Err(ReconError::Config(format!(
                "column '{}' needs at least one alias",
                field
            ))),
            None => Ok(()),
        }
    }
}
