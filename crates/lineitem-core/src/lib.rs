//! Core library for PDF line-item extraction.
//!
//! This crate provides:
//! - PDF loading into a scoped document handle (lopdf)
//! - Pluggable text engines (pdf-extract, lopdf)
//! - Record derivation from extracted text
//! - Dictionary translation of record descriptions
//! - Configuration shared by the server and command line front-ends

pub mod error;
pub mod extractor;
pub mod models;
pub mod pdf;
pub mod records;
pub mod translate;

pub use error::{LineitemError, PdfError, Result};
pub use extractor::DocumentExtractor;
pub use models::config::{LineitemConfig, TranslationConfig};
pub use models::record::{remove_duplicates, ExtractedRecord, ExtractionResult, MergedResult};
pub use pdf::{EngineKind, PdfDocument, TextEngine};
pub use records::{LineMatcher, RecordDeriver};
