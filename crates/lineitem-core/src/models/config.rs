//! Configuration structures for the extraction service.

use serde::{Deserialize, Serialize};

use crate::error::{LineitemError, Result};
use crate::pdf::EngineKind;

/// Main configuration for lineitem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineitemConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// PDF loading configuration.
    pub pdf: PdfConfig,

    /// Record derivation configuration.
    pub extraction: ExtractionConfig,

    /// Description translation configuration.
    pub translation: TranslationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,

    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,

    /// Upper bound for loading and extracting one document (0 = unlimited).
    pub extraction_timeout_ms: u64,

    /// Send permissive CORS headers so a browser front-end can post uploads.
    pub allow_any_origin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            extraction_timeout_ms: 30_000,
            allow_any_origin: true,
        }
    }
}

/// PDF loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Text engine used to render the document as plain text.
    pub engine: EngineKind,

    /// Try an empty user password on encrypted documents.
    pub decrypt_empty_password: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::PdfExtract,
            decrypt_empty_password: true,
        }
    }
}

/// Record derivation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Substring (matched case-insensitively) that marks a line as an item.
    pub keyword: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            keyword: "item".to_string(),
        }
    }
}

/// Description translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// MyMemory-compatible endpoint used when the dictionary falls short.
    pub api_url: String,

    /// Ask the remote API at all; when false only the dictionary is used.
    pub api_enabled: bool,

    /// Minimum spacing between two API requests.
    pub request_delay_ms: u64,

    /// Timeout for a single API request.
    pub timeout_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.mymemory.translated.net/get".to_string(),
            api_enabled: true,
            request_delay_ms: 500,
            timeout_ms: 10_000,
        }
    }
}

impl LineitemConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LineitemError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LineitemError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.keyword.trim().is_empty() {
            return Err(LineitemError::Config(
                "extraction.keyword must not be empty".to_string(),
            ));
        }
        if self.translation.api_enabled && self.translation.api_url.trim().is_empty() {
            return Err(LineitemError::Config(
                "translation.api_url must not be empty".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(LineitemError::Config(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Extraction timeout, or `None` when unlimited.
    pub fn extraction_timeout(&self) -> Option<std::time::Duration> {
        match self.server.extraction_timeout_ms {
            0 => None,
            ms => Some(std::time::Duration::from_millis(ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = LineitemConfig::default();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.pdf.engine, EngineKind::PdfExtract);
        assert_eq!(config.extraction.keyword, "item");
        assert!(config.translation.api_enabled);
        assert_eq!(config.translation.request_delay_ms, 500);
        assert_eq!(
            config.extraction_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"pdf": {"engine": "lopdf"}}"#).unwrap();

        let config = LineitemConfig::from_file(&path).unwrap();
        assert_eq!(config.pdf.engine, EngineKind::Lopdf);
        assert!(config.pdf.decrypt_empty_password);
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = LineitemConfig::default();
        config.server.bind = "127.0.0.1:9000".to_string();
        config.server.extraction_timeout_ms = 0;
        config.save(&path).unwrap();

        let loaded = LineitemConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:9000");
        assert_eq!(loaded.extraction_timeout(), None);
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"extraction": {"keyword": "  "}}"#).unwrap();

        let err = LineitemConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, LineitemError::Config(_)));
    }

    #[test]
    fn test_empty_api_url_rejected_only_when_enabled() {
        let mut config = LineitemConfig::default();
        config.translation.api_url = String::new();
        assert!(config.validate().is_err());

        config.translation.api_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = LineitemConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, LineitemError::Config(_)));
    }
}
