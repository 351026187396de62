//! # GST Reconciliation Core
//!
//! Reconciliation, categorization and aggregation engine for Indian GST
//! purchase returns. It turns independently edited invoice collections and
//! the return's annexure sheets into a categorized export workbook with exact
//! tax totals, and into a portal-compatible invoice-action feed.
//!
//! ## Features
//!
//! - **Classification**: every invoice lands in exactly one of Allowed, Mismatched (Rejected), RCM or Disallowed
//! - **Tax aggregation**: exact per-bucket and per-action totals over rate-slab and custom-rate columns
//! - **Annexure totals**: header-pattern rule table for B2BA, ISD, IMPG and credit/debit-note sheets
//! - **Reconciliation ledger**: ADD/LESS table, net credit and RCM payable
//! - **Action feed**: portal `SAVE` document with normalized dates, periods and state codes
//! - **Export**: fixed-order workbook model with an in-memory XLSX renderer
//!
//! ## Quick Start
//!
//! ```rust
//! use gst_recon_core::{ReconciliationEngine, Bucket};
//! use serde_json::json;
//!
//! let engine = ReconciliationEngine::new();
//! let output = engine
//!     .run_json(json!({
//!         "rtin": "29AAAAA0000A1Z5",
//!         "processed": [
//!             {"GSTIN": "29ABCDE1234F1Z5", "Invoice Number": "INV-1", "IGST 18%": 18, "Action": "Accept"}
//!         ],
//!         "reverseCharge": [
//!             {"GSTIN": "27ABCDE1234F1Z5", "Invoice Number": "RC-1", "IGST 5%": 5, "Supplier Amount": 105}
//!         ]
//!     }))
//!     .unwrap();
//!
//! assert_eq!(output.classification.rows(Bucket::Allowed).len(), 1);
//! assert_eq!(output.ledger.rcm_payable.to_string(), "105");
//! assert_eq!(output.feed.invdata.b2b.len(), 1);
//! ```

pub mod classify;
pub mod config;
pub mod export;
pub mod feed;
pub mod ledger;
pub mod reconciliation;
pub mod row;
pub mod signature;
pub mod tax;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use classify::{classify, classify_row, Classification, ClassifiedRow, RowCollections};
pub use config::{ColumnMap, EngineConfig};
pub use export::{Cell, Sheet, Workbook, XlsxRenderer};
pub use feed::{ActionFeed, ActionFeedBuilder, InvoiceActionEntry};
pub use ledger::{LedgerLine, ReconciliationLedger};
pub use reconciliation::*;
pub use row::InvoiceRow;
pub use signature::{Signature, SignatureSet};
pub use tax::{ActionTotals, BucketTotals, CategoryTotals, TaxAmounts, TaxSummary};
pub use traits::*;
pub use types::*;
