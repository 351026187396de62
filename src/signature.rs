//! Composite identity keys used to match rows across collections

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::row::InvoiceRow;

/// ASCII unit separator; never typed into a spreadsheet cell
pub const SIGNATURE_DELIMITER: char = '\u{1f}';

/// Identity of a row: reference number, supplier, GSTIN, invoice number and
/// amount, in that order.
///
/// Missing fields are empty strings and surrounding blanks are ignored. The
/// amount is compared in normalized decimal form so `100`, `100.0` and
/// `"100.00"` all agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Signature {
    reference_no: String,
    supplier_name: String,
    gstin: String,
    invoice_number: String,
    amount: String,
}

fn part(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

impl Signature {
    /// Derive the signature of a row
    pub fn of(row: &InvoiceRow) -> Self {
        Self {
            reference_no: part(&row.reference_no),
            supplier_name: part(&row.supplier_name),
            gstin: part(&row.gstin),
            invoice_number: part(&row.invoice_number),
            amount: row
                .amount()
                .map(|a| a.normalized().to_string())
                .unwrap_or_default(),
        }
    }

    /// Flat string form, fields joined by [`SIGNATURE_DELIMITER`]
    pub fn as_key(&self) -> String {
        [
            self.reference_no.as_str(),
            self.supplier_name.as_str(),
            self.gstin.as_str(),
            self.invoice_number.as_str(),
            self.amount.as_str(),
        ]
        .join(&SIGNATURE_DELIMITER.to_string())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Membership set of the signatures in one input collection
#[derive(Debug, Clone, Default)]
pub struct SignatureSet {
    signatures: HashSet<Signature>,
}

impl SignatureSet {
    pub fn from_rows(rows: &[InvoiceRow]) -> Self {
        Self {
            signatures: rows.iter().map(Signature::of).collect(),
        }
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.signatures.contains(signature)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnMap;
    use serde_json::json;

    fn row(value: serde_json::Value) -> InvoiceRow {
        InvoiceRow::from_record(value.as_object().unwrap(), &ColumnMap::default())
    }

    #[test]
    fn test_identical_content_gives_identical_signature() {
        let a = row(json!({"GSTIN": "29AAA", "Invoice Number": "INV-1", "Supplier Amount": 100}));
        let b = row(json!({"GSTIN": " 29AAA ", "Invoice Number": "INV-1", "Supplier Amount": "100.00", "Remarks": "x"}));
        assert_eq!(Signature::of(&a), Signature::of(&b));
    }

    #[test]
    fn test_field_order_matters() {
        let a = row(json!({"Reference No": "A", "Supplier Name": "B"}));
        let b = row(json!({"Reference No": "B", "Supplier Name": "A"}));
        assert_ne!(Signature::of(&a), Signature::of(&b));
    }

    #[test]
    fn test_delimiter_prevents_concatenation_collisions() {
        let a = row(json!({"Reference No": "AB", "Supplier Name": "C"}));
        let b = row(json!({"Reference No": "A", "Supplier Name": "BC"}));
        assert_ne!(Signature::of(&a).as_key(), Signature::of(&b).as_key());
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let key = Signature::of(&row(json!({}))).as_key();
        assert_eq!(key, SIGNATURE_DELIMITER.to_string().repeat(4));
    }

    #[test]
    fn test_signature_set_membership() {
        let rows = vec![row(json!({"GSTIN": "1"})), row(json!({"GSTIN": "2"})), row(json!({"GSTIN": "1"}))];
        let set = SignatureSet::from_rows(&rows);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Signature::of(&rows[1])));
    }
}
