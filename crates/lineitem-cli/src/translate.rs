//! Chinese translation of record descriptions.
//!
//! The term dictionary answers first; anything it cannot fully translate goes
//! to a MyMemory-compatible API. Failures fall back to the original text.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use lineitem_core::translate::translate_with_dictionary;
use lineitem_core::{ExtractionResult, TranslationConfig};

const LANGUAGE_PAIR: &str = "en|zh";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    response_status: serde_json::Value,
    response_data: Option<ApiResponseData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponseData {
    translated_text: Option<String>,
}

impl ApiResponse {
    fn into_translation(self) -> Option<String> {
        let ok = match &self.response_status {
            serde_json::Value::Number(n) => n.as_u64() == Some(200),
            serde_json::Value::String(s) => s == "200",
            _ => false,
        };
        if !ok {
            return None;
        }
        self.response_data
            .and_then(|data| data.translated_text)
            .filter(|text| !text.is_empty())
    }
}

/// Translates descriptions, caching API answers for the lifetime of the value.
pub struct Translator {
    client: reqwest::Client,
    config: TranslationConfig,
    cache: HashMap<String, String>,
    last_request: Option<Instant>,
}

impl Translator {
    pub fn new(config: &TranslationConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("lineitem/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            cache: HashMap::new(),
            last_request: None,
        })
    }

    /// Translate one description.
    pub async fn translate(&mut self, text: &str) -> String {
        if let Some(translated) = translate_with_dictionary(text) {
            return translated;
        }
        if !self.config.api_enabled {
            debug!("Translation API disabled, keeping {:?}", text);
            return text.to_string();
        }
        if let Some(cached) = self.cache.get(text) {
            return cached.clone();
        }

        match self.request(text).await {
            Ok(Some(translated)) => {
                self.cache.insert(text.to_string(), translated.clone());
                translated
            }
            Ok(None) => {
                warn!("Translation failed for {:?}", text);
                text.to_string()
            }
            Err(e) => {
                warn!("Translation request failed for {:?}: {}", text, e);
                text.to_string()
            }
        }
    }

    /// Rewrite every description in `result`.
    pub async fn translate_result(&mut self, result: &mut ExtractionResult) {
        for item in &mut result.items {
            item.description = self.translate(&item.description).await;
        }
    }

    async fn request(&mut self, text: &str) -> anyhow::Result<Option<String>> {
        self.wait_for_slot().await;

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("q", text), ("langpair", LANGUAGE_PAIR)])
            .send()
            .await?;
        self.last_request = Some(Instant::now());

        if !response.status().is_success() {
            anyhow::bail!("HTTP {}", response.status());
        }

        let body: ApiResponse = response.json().await?;
        Ok(body.into_translation())
    }

    // Space out consecutive API requests.
    async fn wait_for_slot(&self) {
        let delay = Duration::from_millis(self.config.request_delay_ms);
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
    }
}
