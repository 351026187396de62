//! Row classification into Allowed / Mismatched / RCM / Disallowed buckets
//!
//! Every row is passed once through [`classify_row`], a pure priority cascade
//! that returns the bucket the row claims (or `None` when another collection
//! owns its signature). Claims are then resolved per signature, keeping the
//! highest-priority bucket, so each signature lands in exactly one bucket.
//!
//! The ITC-availability "No" override applies to rows from every collection,
//! reverse-charge rows included.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::{ColumnMap, EngineConfig};
use crate::row::{rows_from_value, InvoiceRow};
use crate::signature::{Signature, SignatureSet};
use crate::types::*;

/// The four independently edited input collections
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RowCollections {
    pub processed: Vec<InvoiceRow>,
    pub mismatched: Vec<InvoiceRow>,
    pub reverse_charge: Vec<InvoiceRow>,
    pub disallow: Vec<InvoiceRow>,
}

impl RowCollections {
    pub fn new(
        processed: Vec<InvoiceRow>,
        mismatched: Vec<InvoiceRow>,
        reverse_charge: Vec<InvoiceRow>,
        disallow: Vec<InvoiceRow>,
    ) -> Self {
        Self {
            processed,
            mismatched,
            reverse_charge,
            disallow,
        }
    }

    /// Read all four collections from JSON arrays of row objects
    pub fn from_values(
        processed: &Value,
        mismatched: &Value,
        reverse_charge: &Value,
        disallow: &Value,
        columns: &ColumnMap,
    ) -> ReconResult<Self> {
        Ok(Self {
            processed: rows_from_value(Origin::Processed.name(), processed, columns)?,
            mismatched: rows_from_value(Origin::Mismatched.name(), mismatched, columns)?,
            reverse_charge: rows_from_value(Origin::ReverseCharge.name(), reverse_charge, columns)?,
            disallow: rows_from_value(Origin::Disallow.name(), disallow, columns)?,
        })
    }

    pub fn get(&self, origin: Origin) -> &[InvoiceRow] {
        match origin {
            Origin::Processed => &self.processed,
            Origin::Mismatched => &self.mismatched,
            Origin::ReverseCharge => &self.reverse_charge,
            Origin::Disallow => &self.disallow,
        }
    }

    /// Total rows across the four collections
    pub fn len(&self) -> usize {
        Origin::ALL.iter().map(|o| self.get(*o).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Signature sets of the collections a processed row defers to
#[derive(Debug, Clone, Default)]
pub struct Membership {
    pub disallow: SignatureSet,
    pub reverse_charge: SignatureSet,
    pub mismatched: SignatureSet,
}

impl Membership {
    pub fn from_collections(collections: &RowCollections) -> Self {
        Self {
            disallow: SignatureSet::from_rows(&collections.disallow),
            reverse_charge: SignatureSet::from_rows(&collections.reverse_charge),
            mismatched: SignatureSet::from_rows(&collections.mismatched),
        }
    }

    fn owned_elsewhere(&self, signature: &Signature) -> bool {
        self.disallow.contains(signature)
            || self.reverse_charge.contains(signature)
            || self.mismatched.contains(signature)
    }
}

/// Priority cascade for a single row.
///
/// 1. Disallowed: disallow-marker ledger, ITC "No", or the explicit disallow list
/// 2. ReverseCharge: from the reverse-charge collection
/// 3. Allowed: processed and not held by another collection, or mismatched
///    with credit accepted
/// 4. MismatchedRejected: mismatched with credit not accepted
///
/// Returns `None` for a processed row whose signature another collection owns.
pub fn classify_row(
    row: &InvoiceRow,
    origin: Origin,
    signature: &Signature,
    membership: &Membership,
    config: &EngineConfig,
) -> Option<Bucket> {
    let marked = row
        .ledger_name
        .as_deref()
        .is_some_and(|ledger| config.is_disallow_ledger(ledger));
    if marked || row.itc_flag() == Flag::No || origin == Origin::Disallow {
        return Some(Bucket::Disallowed);
    }

    match origin {
        Origin::ReverseCharge => Some(Bucket::ReverseCharge),
        Origin::Mismatched if row.accept_credit_flag() == Flag::Yes => Some(Bucket::Allowed),
        Origin::Mismatched => Some(Bucket::MismatchedRejected),
        Origin::Processed if membership.owned_elsewhere(signature) => None,
        Origin::Processed => Some(Bucket::Allowed),
        Origin::Disallow => Some(Bucket::Disallowed),
    }
}

/// A row as placed in its final bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRow {
    pub bucket: Bucket,
    pub origin: Origin,
    /// Position of the row inside its input collection
    pub position: usize,
    pub signature: Signature,
    pub row: InvoiceRow,
}

#[derive(Debug, Clone)]
struct Claim {
    bucket: Bucket,
    origin: Origin,
    position: usize,
}

/// Result of classifying all four collections
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    buckets: [Vec<ClassifiedRow>; 4],
    #[serde(skip)]
    resolved: HashMap<Signature, Bucket>,
    #[serde(skip)]
    placements: HashMap<(Origin, usize), Signature>,
}

impl Classification {
    /// Rows in a bucket, in input order
    pub fn rows(&self, bucket: Bucket) -> &[ClassifiedRow] {
        &self.buckets[bucket.index()]
    }

    /// Every placed row, bucket by bucket
    pub fn all_rows(&self) -> impl Iterator<Item = &ClassifiedRow> {
        Bucket::ALL.into_iter().flat_map(move |b| self.rows(b).iter())
    }

    /// Bucket an input row resolved to, including rows whose signature was
    /// placed through a copy in another collection
    pub fn bucket_of(&self, origin: Origin, position: usize) -> Option<Bucket> {
        self.placements
            .get(&(origin, position))
            .and_then(|signature| self.resolved.get(signature).copied())
    }

    /// Number of input rows that were classified
    pub fn input_rows(&self) -> usize {
        self.placements.len()
    }

    /// Number of distinct signatures placed
    pub fn placed_rows(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Partition the collections into buckets
pub fn classify(collections: &RowCollections, config: &EngineConfig) -> Classification {
    let membership = Membership::from_collections(collections);
    let mut claims: HashMap<Signature, Claim> = HashMap::new();
    let mut deferred: Vec<(Signature, usize)> = Vec::new();
    let mut placements = HashMap::with_capacity(collections.len());

    for origin in Origin::ALL {
        for (position, row) in collections.get(origin).iter().enumerate() {
            let signature = Signature::of(row);
            match classify_row(row, origin, &signature, &membership, config) {
                Some(bucket) => {
                    let claim = Claim {
                        bucket,
                        origin,
                        position,
                    };
                    claims
                        .entry(signature.clone())
                        .and_modify(|existing| {
                            if bucket.priority() < existing.bucket.priority() {
                                *existing = claim.clone();
                            }
                        })
                        .or_insert(claim);
                }
                None => deferred.push((signature.clone(), position)),
            }
            placements.insert((origin, position), signature);
        }
    }

    // A deferred processed row always has an owner, so this only guards
    // against a signature set built from different rows than were scanned.
    for (signature, position) in deferred {
        claims.entry(signature).or_insert(Claim {
            bucket: Bucket::Allowed,
            origin: Origin::Processed,
            position,
        });
    }

    let mut winners: Vec<(Signature, Claim)> = claims.into_iter().collect();
    winners.sort_by_key(|(_, claim)| (origin_rank(claim.origin), claim.position));

    let mut classification = Classification::default();
    for (signature, claim) in winners {
        let row = collections.get(claim.origin)[claim.position].clone();
        classification.resolved.insert(signature.clone(), claim.bucket);
        classification.buckets[claim.bucket.index()].push(ClassifiedRow {
            bucket: claim.bucket,
            origin: claim.origin,
            position: claim.position,
            signature,
            row,
        });
    }
    classification.placements = placements;

    tracing::debug!(
        input_rows = classification.input_rows(),
        allowed = classification.rows(Bucket::Allowed).len(),
        mismatched_rejected = classification.rows(Bucket::MismatchedRejected).len(),
        reverse_charge = classification.rows(Bucket::ReverseCharge).len(),
        disallowed = classification.rows(Bucket::Disallowed).len(),
        "classified rows"
    );

    classification
}

fn origin_rank(origin: Origin) -> usize {
    Origin::ALL.iter().position(|o| *o == origin).unwrap_or(usize::MAX)
}
