pub mod extract;
pub mod gemini;
pub mod orchestrator;
pub mod prompt;
pub mod resume;

pub use extract::{extract_translations, strip_code_fence};
pub use gemini::GeminiTranslator;
pub use orchestrator::{
    translate_entries, BatchOrchestrator, EntryChange, ProgressEvent, RunOutcome, BATCH_SIZE,
};
pub use prompt::build_prompt;
pub use resume::{autosave_path, try_apply_existing, ResumeStatus};

use crate::config::Config;
use crate::error::{Result, SubtransError};
use crate::subtitle::SubtitleEntry;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Language pair and prompt flags shared by every batch of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSettings {
    pub source_lang: String,
    pub target_lang: String,
    pub preserve_formatting: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "ko".to_string(),
            preserve_formatting: true,
        }
    }
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one batch, returning a text for every index in `batch`.
    async fn translate_batch(
        &self,
        batch: &[SubtitleEntry],
        settings: &TranslationSettings,
    ) -> Result<BTreeMap<u32, String>>;

    fn name(&self) -> &'static str;
}

/// Build the Gemini translator described by `config`.
pub fn create_translator(config: &Config) -> Result<GeminiTranslator> {
    config.validate()?;

    let api_key = config
        .gemini_api_key
        .clone()
        .ok_or_else(|| SubtransError::Config("Gemini API key not set".to_string()))?;

    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(GeminiTranslator::new(api_key)
        .with_client(builder.build()?)
        .with_model(config.model.clone())
        .with_base_url(config.api_base.clone())
        .with_retries(config.max_retries))
}
