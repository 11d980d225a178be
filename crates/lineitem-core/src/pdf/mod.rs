//! PDF loading and text extraction.

mod document;
mod engine;
#[cfg(any(test, feature = "test-util"))]
pub mod fixture;

pub use document::PdfDocument;
pub use engine::{LopdfEngine, PdfExtractEngine};

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Anything that turns a loaded document into one blob of plain text.
pub trait TextEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Extract the full text of every page.
    fn extract_text(&self, document: &PdfDocument) -> Result<String>;
}

/// Available text engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    /// Layout-aware extraction via `pdf-extract`.
    #[default]
    PdfExtract,
    /// Content-stream text operators via `lopdf`.
    Lopdf,
}

impl EngineKind {
    /// Instantiate the engine.
    pub fn build(self) -> Box<dyn TextEngine> {
        match self {
            Self::PdfExtract => Box::new(PdfExtractEngine),
            Self::Lopdf => Box::new(LopdfEngine),
        }
    }
}

/// Run a parser call, turning a panic into [`PdfError::EnginePanic`].
///
/// Both PDF crates panic on some malformed inputs instead of returning errors.
pub(crate) fn guard_panic<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PdfError::EnginePanic(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_names() {
        assert_eq!(EngineKind::PdfExtract.build().name(), "pdf-extract");
        assert_eq!(EngineKind::Lopdf.build().name(), "lopdf");
        assert_eq!(
            serde_json::to_string(&EngineKind::PdfExtract).unwrap(),
            "\"pdf-extract\""
        );
    }

    #[test]
    fn test_guard_panic_converts_panic() {
        let result: Result<()> = guard_panic(|| panic!("bad xref"));
        match result {
            Err(PdfError::EnginePanic(msg)) => assert_eq!(msg, "bad xref"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_guard_panic_passes_errors_through() {
        let result: Result<()> = guard_panic(|| Err(PdfError::Encrypted));
        assert!(matches!(result, Err(PdfError::Encrypted)));
    }
}
