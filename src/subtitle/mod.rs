pub mod srt;

use std::time::Duration;

/// One timed subtitle cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    pub index: u32,
    pub start: Duration,
    pub end: Duration,
    pub source_text: String,
    pub translated_text: Option<String>,
}

impl SubtitleEntry {
    pub fn new(index: u32, start: Duration, end: Duration, source_text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            source_text: normalize_newlines(&source_text.into()),
            translated_text: None,
        }
    }

    /// Text to write out: the translation when it has content, else the source.
    pub fn display_text(&self, use_translated: bool) -> &str {
        match self.translated_text.as_deref() {
            Some(t) if use_translated && !t.trim().is_empty() => t,
            _ => &self.source_text,
        }
    }

    /// True while the cue has no translation, or only a pass-through copy of the source.
    pub fn needs_translation(&self) -> bool {
        match self.translated_text.as_deref() {
            None => true,
            Some(t) if t.trim().is_empty() => true,
            Some(t) => t.trim() == self.source_text.trim(),
        }
    }
}

/// Sort cues by index; the order every run and every write works in.
pub fn sort_by_index(entries: &mut [SubtitleEntry]) {
    entries.sort_by_key(|e| e.index);
}

/// Collapse `\r\n` and lone `\r` into `\n`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
