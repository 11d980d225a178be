//! Loaded PDF document handle.

use lopdf::Document;
use tracing::{debug, trace};

use super::{guard_panic, Result};
use crate::error::PdfError;

/// An open, in-memory PDF.
///
/// Owns both the parsed object tree and the (possibly decrypted) bytes the
/// text engines read from. Dropping the handle releases both.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from bytes, trying an empty password on encrypted files.
    pub fn load(data: &[u8]) -> Result<Self> {
        Self::load_with(data, true)
    }

    /// Load a PDF from bytes.
    pub fn load_with(data: &[u8], decrypt_empty_password: bool) -> Result<Self> {
        let mut doc = guard_panic(|| {
            Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))
        })?;

        let raw_data = if doc.is_encrypted() {
            if !decrypt_empty_password || doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract reads bytes, not the object tree
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        // An empty page tree is valid and simply has no text.
        debug!(
            "Loaded PDF with {} pages ({} bytes)",
            doc.get_pages().len(),
            raw_data.len()
        );
        Ok(Self {
            document: doc,
            raw_data,
        })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Page numbers in document order (1-indexed).
    pub fn page_numbers(&self) -> Vec<u32> {
        self.document.get_pages().keys().copied().collect()
    }

    /// Parsed object tree.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Document bytes, decrypted if the source was encrypted.
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }
}

impl Drop for PdfDocument {
    fn drop(&mut self) {
        trace!("Released PDF document ({} bytes)", self.raw_data.len());
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.page_count())
            .field("bytes", &self.raw_data.len())
            .finish()
    }
}
