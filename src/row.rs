//! Typed invoice rows with a pass-through map for display-only columns

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::config::ColumnMap;
use crate::tax::gst::{RateSlab, TaxAmounts, TaxHead};
use crate::types::*;
use crate::utils::headers::get_ignore_case;
use crate::utils::numeric::{value_to_amount, value_to_text};
use crate::utils::validation::validate_collection;

/// IGST/CGST/SGST columns of one slab (or of the custom rate)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSplit {
    pub igst: Option<BigDecimal>,
    pub cgst: Option<BigDecimal>,
    pub sgst: Option<BigDecimal>,
}

impl TaxSplit {
    pub fn get(&self, head: TaxHead) -> Option<&BigDecimal> {
        match head {
            TaxHead::Igst => self.igst.as_ref(),
            TaxHead::Cgst => self.cgst.as_ref(),
            TaxHead::Sgst => self.sgst.as_ref(),
            TaxHead::Cess => None,
        }
    }

    fn set(&mut self, head: TaxHead, value: Option<BigDecimal>) {
        match head {
            TaxHead::Igst => self.igst = value,
            TaxHead::Cgst => self.cgst = value,
            TaxHead::Sgst => self.sgst = value,
            TaxHead::Cess => {}
        }
    }

    fn is_empty(&self) -> bool {
        self.igst.is_none() && self.cgst.is_none() && self.sgst.is_none()
    }
}

/// Tax columns of a row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowTax {
    /// Only slabs with at least one populated column are present
    pub slabs: BTreeMap<RateSlab, TaxSplit>,
    /// Amounts at a rate outside the standard slabs
    pub custom: Option<TaxSplit>,
    pub cess: Option<BigDecimal>,
}

impl RowTax {
    /// Effective amounts: slab columns when the row has any, otherwise the
    /// custom-rate columns.
    pub fn amounts(&self) -> TaxAmounts {
        let mut amounts = TaxAmounts::default();
        for head in TaxHead::SPLIT {
            let total = amounts.get_mut(head);
            if self.slabs.is_empty() {
                if let Some(value) = self.custom.as_ref().and_then(|c| c.get(head)) {
                    *total += value;
                }
            } else {
                for split in self.slabs.values() {
                    if let Some(value) = split.get(head) {
                        *total += value;
                    }
                }
            }
        }
        if let Some(cess) = &self.cess {
            amounts.cess += cess;
        }
        amounts
    }
}

/// One invoice row as edited by the user.
///
/// Recognized columns are lifted into typed fields; every other column is
/// kept verbatim in `extra` so the export can reproduce it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub reference_no: Option<String>,
    pub supplier_name: Option<String>,
    pub gstin: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub taxable_value: Option<BigDecimal>,
    pub invoice_value: Option<BigDecimal>,
    pub supplier_amount: Option<BigDecimal>,
    pub tax: RowTax,
    pub ledger_name: Option<String>,
    pub accept_credit: Option<String>,
    pub itc_availability: Option<String>,
    pub action: Option<String>,
    pub action_reason: Option<String>,
    pub narration: Option<String>,
    /// Taxable value fixed by the matching step; trusted over recomputation
    pub taxable_value_snapshot: Option<BigDecimal>,
    /// Invoice value fixed by the matching step
    pub invoice_value_snapshot: Option<BigDecimal>,
    /// Zero-based index into the original return rows
    pub source_index: Option<usize>,
    /// One-based serial number of the original return row
    pub serial_no: Option<usize>,
    pub extra: Record,
}

/// Tracks which keys of a record were lifted into typed fields
struct FieldReader<'a> {
    record: &'a Record,
    consumed: HashSet<&'a str>,
}

impl<'a> FieldReader<'a> {
    fn new(record: &'a Record) -> Self {
        Self {
            record,
            consumed: HashSet::new(),
        }
    }

    fn value(&mut self, aliases: &[String]) -> Option<&'a Value> {
        let (key, value) = get_ignore_case(self.record, aliases)?;
        self.consumed.insert(key);
        Some(value)
    }

    fn text(&mut self, aliases: &[String]) -> Option<String> {
        self.value(aliases).and_then(value_to_text)
    }

    fn amount(&mut self, aliases: &[String]) -> Option<BigDecimal> {
        self.value(aliases).and_then(value_to_amount)
    }

    fn index(&mut self, aliases: &[String]) -> Option<usize> {
        self.amount(aliases).and_then(|n| n.to_usize())
    }

    fn remainder(&self) -> Record {
        self.record
            .iter()
            .filter(|(key, _)| !self.consumed.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl InvoiceRow {
    /// Lift a raw record into a typed row
    pub fn from_record(record: &Record, columns: &ColumnMap) -> Self {
        let mut reader = FieldReader::new(record);

        let mut tax = RowTax::default();
        for slab in RateSlab::ALL {
            let mut split = TaxSplit::default();
            for head in TaxHead::SPLIT {
                split.set(head, reader.amount(&[slab.column(head)]));
            }
            if !split.is_empty() {
                tax.slabs.insert(slab, split);
            }
        }
        let mut custom = TaxSplit::default();
        for head in TaxHead::SPLIT {
            custom.set(head, reader.amount(&[head.custom_column()]));
        }
        if !custom.is_empty() {
            tax.custom = Some(custom);
        }
        tax.cess = reader.amount(&columns.cess);

        Self {
            reference_no: reader.text(&columns.reference_no),
            supplier_name: reader.text(&columns.supplier_name),
            gstin: reader.text(&columns.gstin),
            invoice_number: reader.text(&columns.invoice_number),
            invoice_date: reader.text(&columns.invoice_date),
            taxable_value: reader.amount(&columns.taxable_value),
            invoice_value: reader.amount(&columns.invoice_value),
            supplier_amount: reader.amount(&columns.supplier_amount),
            tax,
            ledger_name: reader.text(&columns.ledger_name),
            accept_credit: reader.text(&columns.accept_credit),
            itc_availability: reader.text(&columns.itc_availability),
            action: reader.text(&columns.action),
            action_reason: reader.text(&columns.action_reason),
            narration: reader.text(&columns.narration),
            taxable_value_snapshot: reader.amount(&columns.taxable_value_snapshot),
            invoice_value_snapshot: reader.amount(&columns.invoice_value_snapshot),
            source_index: reader.index(&columns.source_index),
            serial_no: reader.index(&columns.serial_no),
            extra: reader.remainder(),
        }
    }

    /// Accept-credit dropdown value
    pub fn accept_credit_flag(&self) -> Flag {
        Flag::parse(self.accept_credit.as_deref())
    }

    /// ITC-availability value from the return
    pub fn itc_flag(&self) -> Flag {
        Flag::parse(self.itc_availability.as_deref())
    }

    /// Normalized filing decision
    pub fn action_decision(&self) -> ActionDecision {
        ActionDecision::parse(self.action.as_deref().unwrap_or(""))
    }

    /// Amount used for identity and action totals: the books amount when
    /// present, otherwise the invoice value.
    pub fn amount(&self) -> Option<&BigDecimal> {
        self.supplier_amount
            .as_ref()
            .or(self.invoice_value_snapshot.as_ref())
            .or(self.invoice_value.as_ref())
    }

    /// Taxable value as recorded by the matching step
    pub fn taxable_value_for_totals(&self) -> BigDecimal {
        self.taxable_value_snapshot
            .clone()
            .or_else(|| self.taxable_value.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Invoice value as recorded by the matching step
    pub fn invoice_value_for_totals(&self) -> BigDecimal {
        self.invoice_value_snapshot
            .clone()
            .or_else(|| self.invoice_value.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Position of the original return row, from the stored index or the
    /// one-based serial number.
    pub fn source_position(&self) -> Option<usize> {
        self.source_index
            .or_else(|| self.serial_no.and_then(|n| n.checked_sub(1)))
    }

    /// Re-emit the row: recognized fields under their canonical column names
    /// in a fixed order, followed by pass-through columns in input order.
    pub fn to_record(&self, columns: &ColumnMap) -> Record {
        let mut record = Record::new();
        let serial = self.serial_no.map(|n| BigDecimal::from(n as u64));
        put_amount(&mut record, columns.serial_no.first(), &serial);
        put_text(&mut record, &columns.reference_no, &self.reference_no);
        put_text(&mut record, &columns.supplier_name, &self.supplier_name);
        put_text(&mut record, &columns.gstin, &self.gstin);
        put_text(&mut record, &columns.invoice_number, &self.invoice_number);
        put_text(&mut record, &columns.invoice_date, &self.invoice_date);

        put_amount(&mut record, columns.taxable_value.first(), &self.taxable_value);
        put_amount(&mut record, columns.invoice_value.first(), &self.invoice_value);
        put_amount(&mut record, columns.supplier_amount.first(), &self.supplier_amount);
        for (slab, split) in &self.tax.slabs {
            for head in TaxHead::SPLIT {
                put_amount(&mut record, Some(&slab.column(head)), &split.get(head).cloned());
            }
        }
        if let Some(custom) = &self.tax.custom {
            for head in TaxHead::SPLIT {
                put_amount(&mut record, Some(&head.custom_column()), &custom.get(head).cloned());
            }
        }
        put_amount(&mut record, columns.cess.first(), &self.tax.cess);

        put_text(&mut record, &columns.ledger_name, &self.ledger_name);
        put_text(&mut record, &columns.accept_credit, &self.accept_credit);
        put_text(&mut record, &columns.itc_availability, &self.itc_availability);
        put_text(&mut record, &columns.action, &self.action);
        put_text(&mut record, &columns.action_reason, &self.action_reason);
        put_text(&mut record, &columns.narration, &self.narration);

        for (key, value) in &self.extra {
            record.entry(key.clone()).or_insert_with(|| value.clone());
        }
        record
    }
}

fn put_text(record: &mut Record, names: &[String], value: &Option<String>) {
    if let (Some(name), Some(value)) = (names.first(), value) {
        record.insert(name.clone(), Value::String(value.clone()));
    }
}

fn put_amount(record: &mut Record, name: Option<&String>, value: &Option<BigDecimal>) {
    if let (Some(name), Some(value)) = (name, value) {
        let cell = value
            .normalized()
            .to_string()
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        record.insert(name.clone(), cell);
    }
}

/// Read one input collection from JSON.
///
/// The collection must be an array of objects; anything inside a row is
/// accepted as-is.
pub fn rows_from_value(collection: &str, value: &Value, columns: &ColumnMap) -> ReconResult<Vec<InvoiceRow>> {
    validate_collection(collection, value)?;
    Ok(value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(|record| InvoiceRow::from_record(record, columns))
                .collect()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn row(value: Value) -> InvoiceRow {
        InvoiceRow::from_record(value.as_object().unwrap(), &ColumnMap::default())
    }

    #[test]
    fn test_recognized_fields_are_lifted() {
        let r = row(json!({
            "Supplier Name": "Acme Traders",
            "gstin": "29ABCDE1234F1Z5",
            "Invoice Number": 1042,
            "IGST 18%": "180.00",
            "Ledger Name": "Purchases",
            "Remarks": "call back"
        }));
        assert_eq!(r.supplier_name.as_deref(), Some("Acme Traders"));
        assert_eq!(r.gstin.as_deref(), Some("29ABCDE1234F1Z5"));
        assert_eq!(r.invoice_number.as_deref(), Some("1042"));
        assert_eq!(r.tax.slabs.len(), 1);
        assert_eq!(r.extra.len(), 1);
        assert_eq!(r.extra.get("Remarks"), Some(&json!("call back")));
    }

    #[test]
    fn test_slab_columns_take_precedence_over_custom() {
        let r = row(json!({
            "IGST 5%": 5, "IGST 18%": 18, "Custom IGST": 99, "CGST 12%": "6", "Cess": "1.5"
        }));
        let amounts = r.tax.amounts();
        assert_eq!(amounts.igst, BigDecimal::from(23));
        assert_eq!(amounts.cgst, BigDecimal::from(6));
        assert_eq!(amounts.cess, BigDecimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_custom_rate_used_when_no_slab_columns() {
        let r = row(json!({"Custom IGST": 40, "Custom SGST": "bad"}));
        let amounts = r.tax.amounts();
        assert_eq!(amounts.igst, BigDecimal::from(40));
        assert_eq!(amounts.sgst, BigDecimal::from(0));
    }

    #[test]
    fn test_source_position_prefers_index_then_serial() {
        assert_eq!(row(json!({"_sourceIndex": 4, "Sr No": 9})).source_position(), Some(4));
        assert_eq!(row(json!({"Sr No": "3"})).source_position(), Some(2));
        assert_eq!(row(json!({"Sr No": 0})).source_position(), None);
        assert_eq!(row(json!({})).source_position(), None);
    }

    #[test]
    fn test_amount_falls_back_to_invoice_value() {
        let r = row(json!({"Invoice Value": 118}));
        assert_eq!(r.amount(), Some(&BigDecimal::from(118)));
        let r = row(json!({"Invoice Value": 118, "Supplier Amount": 120}));
        assert_eq!(r.amount(), Some(&BigDecimal::from(120)));
    }

    #[test]
    fn test_to_record_keeps_pass_through_columns() {
        let r = row(json!({"Remarks": "x", "GSTIN": "29AAA", "IGST 18%": 18}));
        let record = r.to_record(&ColumnMap::default());
        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["GSTIN", "IGST 18%", "Remarks"]);
        assert_eq!(record.get("IGST 18%"), Some(&json!(18)));
    }

    #[test]
    fn test_to_record_writes_serial_number_first() {
        let r = row(json!({"GSTIN": "29AAA", "Sr No": 7}));
        let record = r.to_record(&ColumnMap::default());
        assert_eq!(record.keys().next().map(String::as_str), Some("Sr No"));
        assert_eq!(record.get("Sr No"), Some(&json!(7)));
    }

    #[test]
    fn test_loose_header_is_consumed() {
        let r = row(json!({"  invoice number ": "INV-9", "Remarks": "x"}));
        assert_eq!(r.invoice_number.as_deref(), Some("INV-9"));
        assert_eq!(r.extra.keys().collect::<Vec<_>>(), vec!["Remarks"]);
    }

    #[test]
    fn test_rows_from_value_rejects_non_arrays() {
        let columns = ColumnMap::default();
        assert!(rows_from_value("processed", &json!("rows"), &columns).is_err());
        let rows = rows_from_value("processed", &json!([{"GSTIN": "x"}, {}]), &columns).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
