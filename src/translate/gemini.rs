//! Gemini-based translation using the Generative AI API.

use crate::error::{Result, SubtransError};
use crate::subtitle::SubtitleEntry;
use crate::translate::{build_prompt, extract_translations, TranslationSettings, Translator};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Public Generative Language API root.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// Translator using Google Gemini API.
pub struct GeminiTranslator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl GeminiTranslator {
    /// Create a new Gemini translator with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE.to_string(),
            max_retries: 0,
        }
    }

    /// Set a different model (e.g., "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at a different API root, e.g. a proxy or a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Retry transport failures and 5xx responses up to `retries` extra times.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    /// POST the request, returning the body of the first 2xx response.
    async fn send(&self, request: &GenerateContentRequest) -> Result<String> {
        let url = self.endpoint();
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            match self.client.post(&url).json(request).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    debug!("Gemini API response status: {}", status);
                    let body = resp.text().await?;

                    if status.is_success() {
                        return Ok(body);
                    }

                    // Client errors are never retried
                    if !status.is_server_error() || attempt >= self.max_retries {
                        return Err(SubtransError::RemoteCallFailed {
                            status: status.as_u16(),
                            body,
                        });
                    }

                    warn!("Gemini API server error ({}): {}", status, body);
                }
                Err(e) => {
                    let e = e.without_url();
                    if attempt >= self.max_retries {
                        return Err(e.into());
                    }
                    warn!("Gemini API request failed: {}", e);
                }
            }

            attempt += 1;
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    candidate_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_p: 0.95,
            top_k: 40,
            candidate_count: 1,
        }
    }
}

#[async_trait]
impl Translator for GeminiTranslator {
    async fn translate_batch(
        &self,
        batch: &[SubtitleEntry],
        settings: &TranslationSettings,
    ) -> Result<BTreeMap<u32, String>> {
        if batch.is_empty() {
            return Ok(BTreeMap::new());
        }

        debug!(
            "Translating {} line(s) {} -> {} with {}",
            batch.len(),
            settings.source_lang,
            settings.target_lang,
            self.model
        );

        let prompt = build_prompt(
            batch,
            &settings.source_lang,
            &settings.target_lang,
            settings.preserve_formatting,
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let body = self.send(&request).await?;
        Ok(extract_translations(&body, batch)?)
    }

    fn name(&self) -> &'static str {
        "Google Gemini"
    }
}
