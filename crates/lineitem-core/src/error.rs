//! Error types for the lineitem-core library.

use thiserror::Error;

/// Main error type for the lineitem library.
#[derive(Error, Debug)]
pub enum LineitemError {
    /// PDF loading or text extraction error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
///
/// Every variant is an extraction failure from the caller's point of view;
/// the split only exists so logs say what went wrong.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The text engine returned an error.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The text engine panicked on malformed input.
    #[error("text engine panicked: {0}")]
    EnginePanic(String),
}

impl LineitemError {
    /// Whether this error came from reading or decoding the document itself.
    pub fn is_document_error(&self) -> bool {
        matches!(self, Self::Pdf(_) | Self::Io(_))
    }
}

/// Result type for the lineitem library.
pub type Result<T> = std::result::Result<T, LineitemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_error_converts() {
        let err: LineitemError = PdfError::Encrypted.into();
        assert!(err.is_document_error());
        assert_eq!(err.to_string(), "PDF error: PDF is encrypted");
    }

    #[test]
    fn test_config_error_is_not_document_error() {
        let err = LineitemError::Config("bad engine".to_string());
        assert!(!err.is_document_error());
    }
}
