//! Deriving line-item records from plain text.

mod matcher;

pub use matcher::LineMatcher;

use crate::models::record::ExtractedRecord;

/// Trait for turning document text into records.
pub trait RecordDeriver: Send + Sync {
    /// Derive records from text, in order of appearance.
    fn derive(&self, text: &str) -> Vec<ExtractedRecord>;
}
