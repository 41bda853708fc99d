use crate::error::Result;
use crate::subtitle::{sort_by_index, srt, SubtitleEntry};
use crate::translate::{GeminiTranslator, TranslationSettings, Translator};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

/// Cues sent per request.
pub const BATCH_SIZE: usize = 8;

/// How a translation run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every cue already had a translation; no request was made.
    NothingToDo,
    Completed {
        /// Cues that came back with non-blank text.
        translated: usize,
        total: usize,
        batches: usize,
    },
    Cancelled {
        processed: usize,
        total: usize,
        batches: usize,
    },
}

impl RunOutcome {
    /// True if at least one batch went to the remote endpoint.
    pub fn any_batch_sent(&self) -> bool {
        match self {
            RunOutcome::NothingToDo => false,
            RunOutcome::Completed { batches, .. } | RunOutcome::Cancelled { batches, .. } => {
                *batches > 0
            }
        }
    }
}

/// One cue whose translated text was replaced by a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChange {
    pub index: u32,
    pub old: Option<String>,
    pub new: String,
}

/// Emitted after each merged batch.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub batch: usize,
    pub batches: usize,
    pub processed: usize,
    pub total: usize,
    pub changes: Vec<EntryChange>,
}

impl ProgressEvent {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Runs batches through a translator one at a time.
pub struct BatchOrchestrator {
    translator: Box<dyn Translator>,
    auto_save_path: Option<PathBuf>,
    events: Option<UnboundedSender<ProgressEvent>>,
    show_progress: bool,
}

impl BatchOrchestrator {
    pub fn new(translator: Box<dyn Translator>) -> Self {
        Self {
            translator,
            auto_save_path: None,
            events: None,
            show_progress: false,
        }
    }

    /// Rewrite this file with all entries after every batch.
    pub fn with_auto_save(mut self, path: Option<PathBuf>) -> Self {
        self.auto_save_path = path;
        self
    }

    /// Send a [`ProgressEvent`] per batch on this channel.
    pub fn with_events(mut self, events: UnboundedSender<ProgressEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Enable or disable progress bar display.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Translate every entry that still needs it.
    ///
    /// `entries` is sorted by index in place. The cancellation flag is read
    /// before each batch; a request already in flight is allowed to finish.
    /// Batches merged before a failure or cancellation stay merged, and are on
    /// disk when auto-save is enabled.
    pub async fn run(
        &self,
        entries: &mut [SubtitleEntry],
        settings: &TranslationSettings,
        cancelled: &AtomicBool,
    ) -> Result<RunOutcome> {
        sort_by_index(entries);

        let pending: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.needs_translation())
            .map(|(pos, _)| pos)
            .collect();

        if pending.is_empty() {
            info!("All {} entries already translated, nothing to do", entries.len());
            return Ok(RunOutcome::NothingToDo);
        }

        let total = pending.len();
        let batches = total.div_ceil(BATCH_SIZE);

        info!(
            "Translating {} of {} entries in {} batch(es) using {}",
            total,
            entries.len(),
            batches,
            self.translator.name()
        );

        let progress_bar = if self.show_progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut processed = 0;
        let mut translated = 0;

        for (batch_no, positions) in pending.chunks(BATCH_SIZE).enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                info!("Cancelled after {}/{} entries", processed, total);
                if let Some(pb) = progress_bar {
                    pb.abandon_with_message("Cancelled");
                }
                return Ok(RunOutcome::Cancelled {
                    processed,
                    total,
                    batches: batch_no,
                });
            }

            let batch: Vec<SubtitleEntry> = positions.iter().map(|&p| entries[p].clone()).collect();
            debug!(
                "Batch {}/{}: indices {}..={}",
                batch_no + 1,
                batches,
                batch[0].index,
                batch[batch.len() - 1].index
            );

            let translations = match self.translator.translate_batch(&batch, settings).await {
                Ok(t) => t,
                Err(e) => {
                    if let Some(pb) = progress_bar {
                        pb.abandon_with_message("Failed");
                    }
                    return Err(e);
                }
            };

            let mut changes = Vec::with_capacity(positions.len());
            for &pos in positions {
                let entry = &mut entries[pos];
                if let Some(text) = translations.get(&entry.index) {
                    let new = text.trim().to_string();
                    if !new.is_empty() {
                        translated += 1;
                    }
                    let old = entry.translated_text.replace(new.clone());
                    changes.push(EntryChange {
                        index: entry.index,
                        old,
                        new,
                    });
                }
            }

            processed += positions.len();

            if let Some(ref pb) = progress_bar {
                pb.inc(positions.len() as u64);
            }

            if let Some(ref events) = self.events {
                let _ = events.send(ProgressEvent {
                    batch: batch_no + 1,
                    batches,
                    processed,
                    total,
                    changes,
                });
            }

            if let Some(ref path) = self.auto_save_path {
                srt::write_file(path, entries, true)?;
                debug!("Auto-saved to {:?}", path);
            }
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("Translation complete");
        }

        info!(
            "Translation complete: {}/{} entries translated",
            translated, total
        );

        Ok(RunOutcome::Completed {
            translated,
            total,
            batches,
        })
    }
}

/// Translate `entries` with Gemini, without progress output.
pub async fn translate_entries(
    entries: &mut [SubtitleEntry],
    api_key: &str,
    model: &str,
    settings: &TranslationSettings,
    auto_save_path: Option<&Path>,
    cancelled: &AtomicBool,
) -> Result<RunOutcome> {
    let translator = GeminiTranslator::new(api_key.to_string()).with_model(model);
    BatchOrchestrator::new(Box::new(translator))
        .with_auto_save(auto_save_path.map(Path::to_path_buf))
        .run(entries, settings, cancelled)
        .await
}
