//! Extension points of the reconciliation engine
//!
//! The engine works on in-memory data only. Checking incoming collections and
//! turning the finished workbook into bytes are both pluggable, so callers can
//! tighten validation or swap the output format without touching the core.

use serde_json::Value;

use crate::export::Workbook;
use crate::types::ReconResult;

/// Structural check applied to every raw input collection before it is read.
///
/// Implementations must be pure: the same input always yields the same
/// verdict, and a rejected collection aborts the whole run.
pub trait CollectionValidator: Send + Sync {
    /// Validate one named collection
    fn validate(&self, collection: &str, value: &Value) -> ReconResult<()>;
}

/// Serializes an export workbook into a file format
pub trait WorkbookRenderer: Send + Sync {
    /// Render every sheet in order, returning the file contents
    fn render(&self, workbook: &Workbook) -> ReconResult<Vec<u8>>;

    /// Conventional file extension, without the dot
    fn extension(&self) -> &'static str;
}
