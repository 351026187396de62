//! GST rate slabs and tax-amount arithmetic

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Standard GST rate slabs that get their own column set on a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RateSlab {
    /// Reduced rate items - 5%
    Reduced,
    /// Standard rate items - 12%
    Standard,
    /// Higher rate items - 18%
    Higher,
    /// Luxury/Sin goods - 28%
    Luxury,
}

impl RateSlab {
    pub const ALL: [RateSlab; 4] = [
        RateSlab::Reduced,
        RateSlab::Standard,
        RateSlab::Higher,
        RateSlab::Luxury,
    ];

    /// Total GST rate percentage for this slab
    pub fn rate(&self) -> u32 {
        match self {
            RateSlab::Reduced => 5,
            RateSlab::Standard => 12,
            RateSlab::Higher => 18,
            RateSlab::Luxury => 28,
        }
    }

    /// Column holding this slab's amount for a tax head, e.g. `IGST 18%`
    pub fn column(&self, head: TaxHead) -> String {
        format!("{} {}%", head.short_name(), self.rate())
    }
}

/// The tax heads carried per row and per annexure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxHead {
    Igst,
    Cgst,
    Sgst,
    Cess,
}

impl TaxHead {
    pub const ALL: [TaxHead; 4] = [TaxHead::Igst, TaxHead::Cgst, TaxHead::Sgst, TaxHead::Cess];

    /// Heads that are split per rate slab
    pub const SPLIT: [TaxHead; 3] = [TaxHead::Igst, TaxHead::Cgst, TaxHead::Sgst];

    pub fn short_name(&self) -> &'static str {
        match self {
            TaxHead::Igst => "IGST",
            TaxHead::Cgst => "CGST",
            TaxHead::Sgst => "SGST",
            TaxHead::Cess => "CESS",
        }
    }

    /// Column used by rows taxed at a rate outside the standard slabs
    pub fn custom_column(&self) -> String {
        format!("Custom {}", self.short_name())
    }
}

/// IGST/CGST/SGST/CESS amounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxAmounts {
    pub igst: BigDecimal,
    pub cgst: BigDecimal,
    pub sgst: BigDecimal,
    pub cess: BigDecimal,
}

impl Default for TaxAmounts {
    fn default() -> Self {
        Self {
            igst: BigDecimal::from(0),
            cgst: BigDecimal::from(0),
            sgst: BigDecimal::from(0),
            cess: BigDecimal::from(0),
        }
    }
}

impl TaxAmounts {
    pub fn new(igst: BigDecimal, cgst: BigDecimal, sgst: BigDecimal, cess: BigDecimal) -> Self {
        Self {
            igst,
            cgst,
            sgst,
            cess,
        }
    }

    pub fn get(&self, head: TaxHead) -> &BigDecimal {
        match head {
            TaxHead::Igst => &self.igst,
            TaxHead::Cgst => &self.cgst,
            TaxHead::Sgst => &self.sgst,
            TaxHead::Cess => &self.cess,
        }
    }

    pub fn get_mut(&mut self, head: TaxHead) -> &mut BigDecimal {
        match head {
            TaxHead::Igst => &mut self.igst,
            TaxHead::Cgst => &mut self.cgst,
            TaxHead::Sgst => &mut self.sgst,
            TaxHead::Cess => &mut self.cess,
        }
    }

    /// IGST + CGST + SGST + CESS
    pub fn total(&self) -> BigDecimal {
        &self.igst + &self.cgst + &self.sgst + &self.cess
    }
}

impl<'a> AddAssign<&'a TaxAmounts> for TaxAmounts {
    fn add_assign(&mut self, other: &'a TaxAmounts) {
        self.igst += &other.igst;
        self.cgst += &other.cgst;
        self.sgst += &other.sgst;
        self.cess += &other.cess;
    }
}

impl<'a> Add<&'a TaxAmounts> for &'a TaxAmounts {
    type Output = TaxAmounts;

    fn add(self, other: &'a TaxAmounts) -> TaxAmounts {
        let mut sum = self.clone();
        sum += other;
        sum
    }
}

impl<'a> Sub<&'a TaxAmounts> for &'a TaxAmounts {
    type Output = TaxAmounts;

    fn sub(self, other: &'a TaxAmounts) -> TaxAmounts {
        TaxAmounts {
            igst: &self.igst - &other.igst,
            cgst: &self.cgst - &other.cgst,
            sgst: &self.sgst - &other.sgst,
            cess: &self.cess - &other.cess,
        }
    }
}

impl<'a> Sum<&'a TaxAmounts> for TaxAmounts {
    fn sum<I: Iterator<Item = &'a TaxAmounts>>(iter: I) -> Self {
        iter.fold(TaxAmounts::default(), |mut acc, amounts| {
            acc += amounts;
            acc
        })
    }
}

/// Aggregate for one bucket (or the grand total)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub tax: TaxAmounts,
    pub taxable_value: BigDecimal,
    pub invoice_value: BigDecimal,
    pub supplier_amount: BigDecimal,
    /// Rows that contributed
    pub rows: usize,
}

impl<'a> AddAssign<&'a CategoryTotals> for CategoryTotals {
    fn add_assign(&mut self, other: &'a CategoryTotals) {
        self.tax += &other.tax;
        self.taxable_value += &other.taxable_value;
        self.invoice_value += &other.invoice_value;
        self.supplier_amount += &other.supplier_amount;
        self.rows += other.rows;
    }
}

impl<'a> Sum<&'a CategoryTotals> for CategoryTotals {
    fn sum<I: Iterator<Item = &'a CategoryTotals>>(iter: I) -> Self {
        iter.fold(CategoryTotals::default(), |mut acc, totals| {
            acc += totals;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_slab_columns() {
        assert_eq!(RateSlab::Higher.column(TaxHead::Igst), "IGST 18%");
        assert_eq!(RateSlab::Reduced.column(TaxHead::Sgst), "SGST 5%");
        assert_eq!(TaxHead::Cgst.custom_column(), "Custom CGST");
    }

    #[test]
    fn test_tax_amount_arithmetic() {
        let a = TaxAmounts::new(dec("10.50"), dec("1"), dec("1"), dec("0.25"));
        let b = TaxAmounts::new(dec("4.50"), dec("2"), dec("2"), dec("0.75"));
        let sum = &a + &b;
        assert_eq!(sum.igst, dec("15"));
        assert_eq!(sum.total(), dec("22"));
        let diff = &sum - &b;
        assert_eq!(diff, a);
    }

    #[test]
    fn test_category_totals_sum() {
        let one = CategoryTotals {
            tax: TaxAmounts::new(dec("9"), dec("0"), dec("0"), dec("0")),
            taxable_value: dec("50"),
            invoice_value: dec("59"),
            supplier_amount: dec("59"),
            rows: 1,
        };
        let total: CategoryTotals = [one.clone(), one].iter().sum();
        assert_eq!(total.rows, 2);
        assert_eq!(total.invoice_value, dec("118"));
        assert_eq!(total.tax.igst, dec("18"));
    }
}
