//! Reconciliation engine
//!
//! Runs one batch end to end: classify the four row collections, aggregate
//! tax, reconcile against the return's annexures, assemble the export
//! workbook and build the portal action feed. Nothing is retained between
//! runs; the same input always produces the same output.

use serde::Deserialize;
use serde_json::Value;

use crate::classify::{classify, Classification, RowCollections};
use crate::config::EngineConfig;
use crate::export::{Workbook, WorkbookBuilder};
use crate::feed::{ActionFeed, ActionFeedBuilder};
use crate::ledger::ReconciliationLedger;
use crate::row::rows_from_value;
use crate::tax::aggregate::TaxSummary;
use crate::traits::*;
use crate::types::*;
use crate::utils::DefaultCollectionValidator;

/// Typed input of one run
#[derive(Debug, Clone, Default)]
pub struct ReconciliationInput {
    /// Return-filer GSTIN
    pub rtin: String,
    pub collections: RowCollections,
    pub annexures: Vec<AnnexureSheet>,
    /// Rows of the original return, addressed by source index
    pub source_rows: Vec<Record>,
}

/// Raw JSON input of one run, as sent by the edit layer.
///
/// A missing collection reads as empty; a present one must be an array of
/// row objects.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationRequest {
    pub rtin: String,
    pub processed: Value,
    pub mismatched: Value,
    pub reverse_charge: Value,
    pub disallow: Value,
    pub annexures: Vec<AnnexureSheet>,
    pub source_rows: Vec<Record>,
}

impl ReconciliationRequest {
    fn collection(&self, origin: Origin) -> &Value {
        match origin {
            Origin::Processed => &self.processed,
            Origin::Mismatched => &self.mismatched,
            Origin::ReverseCharge => &self.reverse_charge,
            Origin::Disallow => &self.disallow,
        }
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct ReconciliationOutput {
    pub classification: Classification,
    pub summary: TaxSummary,
    pub ledger: ReconciliationLedger,
    pub workbook: Workbook,
    pub feed: ActionFeed,
}

impl ReconciliationOutput {
    /// Serialize the export workbook, e.g. with [`crate::export::XlsxRenderer`]
    pub fn render_workbook(&self, renderer: &dyn WorkbookRenderer) -> ReconResult<Vec<u8>> {
        renderer.render(&self.workbook)
    }
}

/// Batch reconciliation engine
pub struct ReconciliationEngine {
    config: EngineConfig,
    validator: Box<dyn CollectionValidator>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            validator: Box::new(DefaultCollectionValidator),
        }
    }

    /// Engine with a custom configuration
    pub fn with_config(config: EngineConfig) -> ReconResult<Self> {
        Self::with_validator(config, Box::new(DefaultCollectionValidator))
    }

    /// Engine with a custom configuration and collection validator
    pub fn with_validator(config: EngineConfig, validator: Box<dyn CollectionValidator>) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self { config, validator })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile typed collections
    pub fn run(&self, input: &ReconciliationInput) -> ReconciliationOutput {
        tracing::info!(
            rows = input.collections.len(),
            annexures = input.annexures.len(),
            source_rows = input.source_rows.len(),
            "starting reconciliation"
        );

        let classification = classify(&input.collections, &self.config);
        let summary = TaxSummary::from_classification(&classification);
        let ledger = ReconciliationLedger::build(&summary.buckets, &input.annexures);
        let workbook = WorkbookBuilder {
            config: &self.config,
            classification: &classification,
            summary: &summary,
            ledger: &ledger,
            original_rows: &input.source_rows,
            annexures: &input.annexures,
        }
        .build();
        let feed = ActionFeedBuilder::new(&self.config, &input.source_rows).build(&input.rtin, &classification);

        tracing::info!(
            placed = classification.placed_rows(),
            net_credit = %ledger.grand_total.total,
            rcm_payable = %ledger.rcm_payable,
            feed_entries = feed.len(),
            "reconciliation complete"
        );

        ReconciliationOutput {
            classification,
            summary,
            ledger,
            workbook,
            feed,
        }
    }

    /// Validate and read raw JSON collections, then reconcile them
    pub fn run_request(&self, request: &ReconciliationRequest) -> ReconResult<ReconciliationOutput> {
        let input = self.read_request(request)?;
        Ok(self.run(&input))
    }

    /// Parse a JSON request document and reconcile it
    pub fn run_json(&self, request: Value) -> ReconResult<ReconciliationOutput> {
        let request: ReconciliationRequest =
            serde_json::from_value(request).map_err(|e| ReconError::InvalidCollection {
                collection: "request".to_string(),
                reason: e.to_string(),
            })?;
        self.run_request(&request)
    }

    fn read_request(&self, request: &ReconciliationRequest) -> ReconResult<ReconciliationInput> {
        let empty = Value::Array(Vec::new());
        let mut collections = RowCollections::default();
        for origin in Origin::ALL {
            let value = match request.collection(origin) {
                Value::Null => &empty,
                value => value,
            };
            self.validator.validate(origin.name(), value)?;
            let rows = rows_from_value(origin.name(), value, &self.config.columns)?;
            match origin {
                Origin::Processed => collections.processed = rows,
                Origin::Mismatched => collections.mismatched = rows,
                Origin::ReverseCharge => collections.reverse_charge = rows,
                Origin::Disallow => collections.disallow = rows,
            }
        }

        Ok(ReconciliationInput {
            rtin: request.rtin.clone(),
            collections,
            annexures: request.annexures.clone(),
            source_rows: request.source_rows.clone(),
        })
    }
}
