//! Keyword line matcher.

use tracing::{debug, trace};

use super::RecordDeriver;
use crate::models::record::ExtractedRecord;

/// Emits one placeholder record per line containing a keyword.
///
/// Lines are split on `\n` only and the keyword test is case-insensitive.
/// The record description is the matched line with surrounding whitespace
/// removed.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    /// Keyword in lowercase.
    keyword: String,
}

impl LineMatcher {
    /// Create a matcher for the default keyword `item`.
    pub fn new() -> Self {
        Self::with_keyword("item")
    }

    /// Create a matcher for a custom keyword.
    pub fn with_keyword(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
        }
    }

    /// The lowercase keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Whether a single line matches.
    pub fn is_match(&self, line: &str) -> bool {
        line.to_lowercase().contains(&self.keyword)
    }
}

impl Default for LineMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDeriver for LineMatcher {
    fn derive(&self, text: &str) -> Vec<ExtractedRecord> {
        let mut records = Vec::new();

        for (index, line) in text.split('\n').enumerate() {
            if self.is_match(line) {
                trace!("Line {} matched: {:?}", index + 1, line.trim());
                records.push(ExtractedRecord::placeholder(line));
            }
        }

        debug!("Derived {} records for keyword {:?}", records.len(), self.keyword);
        records
    }
}
