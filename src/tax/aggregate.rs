//! Per-bucket and per-action totals

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::row::InvoiceRow;
use crate::tax::gst::CategoryTotals;
use crate::types::{ActionDecision, Bucket};

/// Contribution of a single row
pub fn row_totals(row: &InvoiceRow) -> CategoryTotals {
    CategoryTotals {
        tax: row.tax.amounts(),
        taxable_value: row.taxable_value_for_totals(),
        invoice_value: row.invoice_value_for_totals(),
        supplier_amount: row.amount().cloned().unwrap_or_else(|| BigDecimal::from(0)),
        rows: 1,
    }
}

/// Totals for each bucket plus their field-wise sum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    per_bucket: [CategoryTotals; 4],
    pub grand_total: CategoryTotals,
}

impl BucketTotals {
    pub fn get(&self, bucket: Bucket) -> &CategoryTotals {
        &self.per_bucket[bucket.index()]
    }

    /// Sum the rows of every bucket
    pub fn from_classification(classification: &Classification) -> Self {
        let mut totals = Self::default();
        for bucket in Bucket::ALL {
            let bucket_total = &mut totals.per_bucket[bucket.index()];
            for placed in classification.rows(bucket) {
                *bucket_total += &row_totals(&placed.row);
            }
        }
        totals.grand_total = totals.per_bucket.iter().sum();
        totals
    }
}

/// Amounts split by filing decision, independent of bucket membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTotals {
    pub accept: BigDecimal,
    pub reject: BigDecimal,
    pub pending: BigDecimal,
    pub no_action: BigDecimal,
    pub grand_total: BigDecimal,
}

impl ActionTotals {
    pub fn get(&self, decision: ActionDecision) -> &BigDecimal {
        match decision {
            ActionDecision::Accept => &self.accept,
            ActionDecision::Reject => &self.reject,
            ActionDecision::Pending => &self.pending,
            ActionDecision::None => &self.no_action,
        }
    }

    fn get_mut(&mut self, decision: ActionDecision) -> &mut BigDecimal {
        match decision {
            ActionDecision::Accept => &mut self.accept,
            ActionDecision::Reject => &mut self.reject,
            ActionDecision::Pending => &mut self.pending,
            ActionDecision::None => &mut self.no_action,
        }
    }

    /// Each row's amount goes to exactly one decision
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a InvoiceRow>) -> Self {
        let mut totals = Self::default();
        for row in rows {
            if let Some(amount) = row.amount() {
                *totals.get_mut(row.action_decision()) += amount;
            }
        }
        totals.grand_total = ActionDecision::ALL
            .iter()
            .map(|decision| totals.get(*decision))
            .sum();
        totals
    }
}

/// Everything the tax aggregator produces for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub buckets: BucketTotals,
    pub actions: ActionTotals,
}

impl TaxSummary {
    pub fn from_classification(classification: &Classification) -> Self {
        Self {
            buckets: BucketTotals::from_classification(classification),
            actions: ActionTotals::from_rows(classification.all_rows().map(|placed| &placed.row)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, RowCollections};
    use crate::config::{ColumnMap, EngineConfig};
    use serde_json::{json, Value};
    use std::str::FromStr;

    fn row(value: Value) -> InvoiceRow {
        InvoiceRow::from_record(value.as_object().unwrap(), &ColumnMap::default())
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_row_totals_trust_snapshots() {
        let r = row(json!({
            "Taxable Value": 100, "_taxableValue": 90,
            "Invoice Value": 118, "_invoiceValue": "106.20",
            "IGST 18%": 16.2
        }));
        let totals = row_totals(&r);
        assert_eq!(totals.taxable_value, dec("90"));
        assert_eq!(totals.invoice_value, dec("106.20"));
        assert_eq!(totals.tax.igst, dec("16.2"));
    }

    #[test]
    fn test_bucket_totals_sum_to_grand_total() {
        let collections = RowCollections::new(
            vec![
                row(json!({"Invoice Number": "1", "IGST 18%": "18.10", "Taxable Value": 100.55})),
                row(json!({"Invoice Number": "2", "CGST 5%": 2.5, "SGST 5%": 2.5, "Cess": "0.33"})),
            ],
            vec![row(json!({"Invoice Number": "3", "Custom IGST": 7.77}))],
            vec![row(json!({"Invoice Number": "4", "IGST 28%": 28, "Supplier Amount": 128}))],
            vec![row(json!({"Invoice Number": "5", "CGST 12%": "x", "Invoice Value": 50}))],
        );
        let classification = classify(&collections, &EngineConfig::default());
        let totals = BucketTotals::from_classification(&classification);

        let mut igst = BigDecimal::from(0);
        let mut taxable = BigDecimal::from(0);
        let mut rows = 0;
        for bucket in Bucket::ALL {
            igst += &totals.get(bucket).tax.igst;
            taxable += &totals.get(bucket).taxable_value;
            rows += totals.get(bucket).rows;
        }
        assert_eq!(igst, totals.grand_total.tax.igst);
        assert_eq!(igst, dec("53.87"));
        assert_eq!(taxable, totals.grand_total.taxable_value);
        assert_eq!(rows, 5);
        assert_eq!(totals.get(Bucket::ReverseCharge).supplier_amount, dec("128"));
        assert_eq!(totals.get(Bucket::MismatchedRejected).tax.igst, dec("7.77"));
    }

    #[test]
    fn test_action_totals_partition_amounts() {
        let rows = vec![
            row(json!({"Supplier Amount": 100, "Action": "Accept"})),
            row(json!({"Supplier Amount": 50, "Action": "REJECT"})),
            row(json!({"Supplier Amount": 25.5, "Action": "pending"})),
            row(json!({"Supplier Amount": 10, "Action": "maybe"})),
            row(json!({"Invoice Value": 5})),
        ];
        let totals = ActionTotals::from_rows(&rows);
        assert_eq!(totals.accept, dec("100"));
        assert_eq!(totals.reject, dec("50"));
        assert_eq!(totals.pending, dec("25.5"));
        assert_eq!(totals.no_action, dec("15"));
        assert_eq!(totals.grand_total, dec("190.5"));
    }

    #[test]
    fn test_itc_no_accept_counts_under_accept() {
        let collections = RowCollections::new(
            vec![row(json!({"Invoice Number": "1", "ITC Availability": "No", "Action": "Accept", "Supplier Amount": 300}))],
            vec![],
            vec![],
            vec![],
        );
        let classification = classify(&collections, &EngineConfig::default());
        let summary = TaxSummary::from_classification(&classification);
        assert_eq!(summary.buckets.get(Bucket::Disallowed).rows, 1);
        assert_eq!(summary.actions.accept, dec("300"));
    }
}
