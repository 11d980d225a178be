//! Extracted line-item records.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock code assigned to every derived record.
pub const PLACEHOLDER_STOCK_CODE: &str = "123ABC";

/// Quantity assigned to every derived record.
pub const PLACEHOLDER_QUANTITY: &str = "1";

/// Unit price assigned to every derived record.
pub const PLACEHOLDER_UNIT_PRICE: &str = "10.00";

/// A single line item derived from document text.
///
/// All fields are strings on the wire. `quantity` holds an integer and
/// `unit_price` a decimal, but they are not parsed until someone needs
/// arithmetic (see [`ExtractedRecord::line_value`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedRecord {
    /// Product code.
    pub stock_code: String,

    /// The matched source line, trimmed.
    pub description: String,

    /// Quantity (integer, string-typed).
    pub quantity: String,

    /// Unit price (decimal, string-typed).
    pub unit_price: String,
}

impl ExtractedRecord {
    /// Build a record for a matched line using the placeholder business fields.
    pub fn placeholder(line: &str) -> Self {
        Self {
            stock_code: PLACEHOLDER_STOCK_CODE.to_string(),
            description: line.trim().to_string(),
            quantity: PLACEHOLDER_QUANTITY.to_string(),
            unit_price: PLACEHOLDER_UNIT_PRICE.to_string(),
        }
    }

    /// Quantity times unit price, if both fields parse.
    pub fn line_value(&self) -> Option<Decimal> {
        let quantity = Decimal::from_str(self.quantity.trim()).ok()?;
        let price = Decimal::from_str(self.unit_price.trim()).ok()?;
        Some(quantity * price)
    }

    /// Case-insensitive identity over all four fields.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.stock_code.to_lowercase(),
            self.description.to_lowercase(),
            self.quantity.to_lowercase(),
            self.unit_price.to_lowercase()
        )
    }
}

/// Drop records whose [`ExtractedRecord::dedup_key`] was already seen,
/// keeping the first occurrence and the original order.
pub fn remove_duplicates(items: Vec<ExtractedRecord>) -> Vec<ExtractedRecord> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}

/// Ordered records derived from one document.
///
/// Serializes to exactly `{"items": [...]}`. Diagnostics ride along for
/// logging and the command line summary but never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Records in order of appearance in the text.
    pub items: Vec<ExtractedRecord>,

    /// Number of pages in the source document.
    #[serde(skip)]
    pub page_count: u32,

    /// Length of the extracted text in bytes, surrounding whitespace excluded.
    #[serde(skip)]
    pub text_len: usize,

    /// Processing time in milliseconds.
    #[serde(skip)]
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// Wrap records without diagnostics.
    pub fn from_items(items: Vec<ExtractedRecord>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no line matched.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the text engine produced nothing but whitespace.
    pub fn text_was_empty(&self) -> bool {
        self.text_len == 0
    }

    /// Sum of all parseable line values.
    pub fn total_value(&self) -> Decimal {
        self.items.iter().filter_map(ExtractedRecord::line_value).sum()
    }

    /// Combine several results into one de-duplicated result.
    pub fn merge<'a, I>(results: I) -> MergedResult
    where
        I: IntoIterator<Item = &'a ExtractionResult>,
    {
        let mut combined = ExtractionResult::default();
        for result in results {
            combined.items.extend(result.items.iter().cloned());
            combined.page_count += result.page_count;
            combined.text_len += result.text_len;
            combined.processing_time_ms += result.processing_time_ms;
        }

        let total_items = combined.items.len();
        combined.items = remove_duplicates(combined.items);
        MergedResult {
            result: combined,
            total_items,
        }
    }
}

/// Records combined from several documents.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedResult {
    /// Unique records, first occurrence wins.
    pub result: ExtractionResult,

    /// Records found before duplicates were removed.
    pub total_items: usize,
}

impl MergedResult {
    /// Records left after removing duplicates.
    pub fn unique_items(&self) -> usize {
        self.result.len()
    }

    /// Records dropped as duplicates.
    pub fn duplicates(&self) -> usize {
        self.total_items - self.unique_items()
    }
}
