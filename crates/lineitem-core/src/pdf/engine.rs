//! Text engines backed by pdf-extract and lopdf.

use tracing::{debug, trace};

use super::{guard_panic, PdfDocument, Result, TextEngine};
use crate::error::PdfError;

/// Layout-aware text extraction with `pdf-extract`.
///
/// Emits a line break whenever glyph positions move down the page, so table
/// rows come out as separate lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractEngine;

impl TextEngine for PdfExtractEngine {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract_text(&self, document: &PdfDocument) -> Result<String> {
        let text = guard_panic(|| {
            pdf_extract::extract_text_from_mem(document.raw_data())
                .map_err(|e| PdfError::TextExtraction(e.to_string()))
        })?;
        debug!("pdf-extract produced {} chars", text.len());
        Ok(text)
    }
}

/// Text extraction straight from content-stream operators with `lopdf`.
///
/// Cheaper than [`PdfExtractEngine`] but only breaks lines at text-object
/// boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfEngine;

impl TextEngine for LopdfEngine {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_text(&self, document: &PdfDocument) -> Result<String> {
        let pages = document.page_numbers();
        trace!("lopdf extracting pages {:?}", pages);

        let text = guard_panic(|| {
            document
                .document()
                .extract_text(&pages)
                .map_err(|e| PdfError::TextExtraction(e.to_string()))
        })?;
        debug!("lopdf produced {} chars", text.len());
        Ok(text)
    }
}
