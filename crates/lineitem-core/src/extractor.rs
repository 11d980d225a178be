//! End-to-end pipeline: bytes → document → text → records.

use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::models::config::LineitemConfig;
use crate::models::record::ExtractionResult;
use crate::pdf::{PdfDocument, PdfExtractEngine, TextEngine};
use crate::records::{LineMatcher, RecordDeriver};

/// Extracts records from PDF bytes.
///
/// Holds no per-document state, so one instance can serve any number of
/// concurrent callers.
pub struct DocumentExtractor {
    engine: Box<dyn TextEngine>,
    deriver: Box<dyn RecordDeriver>,
    decrypt_empty_password: bool,
}

impl DocumentExtractor {
    /// Create an extractor with the pdf-extract engine and the `item` matcher.
    pub fn new() -> Self {
        Self {
            engine: Box::new(PdfExtractEngine),
            deriver: Box::new(LineMatcher::new()),
            decrypt_empty_password: true,
        }
    }

    /// Build an extractor from configuration.
    pub fn from_config(config: &LineitemConfig) -> Self {
        Self {
            engine: config.pdf.engine.build(),
            deriver: Box::new(LineMatcher::with_keyword(&config.extraction.keyword)),
            decrypt_empty_password: config.pdf.decrypt_empty_password,
        }
    }

    /// Replace the text engine.
    pub fn with_engine(mut self, engine: Box<dyn TextEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Replace the record deriver.
    pub fn with_deriver(mut self, deriver: Box<dyn RecordDeriver>) -> Self {
        self.deriver = deriver;
        self
    }

    /// Name of the configured text engine.
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Load a document, extract its text and derive records.
    ///
    /// The document handle is dropped before returning on every path.
    pub fn extract(&self, data: &[u8]) -> Result<ExtractionResult> {
        let start = Instant::now();

        let document = PdfDocument::load_with(data, self.decrypt_empty_password)?;
        let page_count = document.page_count();
        let text = self.engine.extract_text(&document)?;
        drop(document);

        let mut result = self.extract_from_text(&text);
        result.page_count = page_count;
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Extracted {} records from {} pages with {} in {}ms",
            result.len(),
            page_count,
            self.engine.name(),
            result.processing_time_ms
        );
        Ok(result)
    }

    /// Derive records from text that has already been extracted.
    pub fn extract_from_text(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::from_items(self.deriver.derive(text));
        result.text_len = text.trim().len();
        result
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}
