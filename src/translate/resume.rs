//! Picking up where an earlier run left off.

use crate::subtitle::{srt, SubtitleEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What the resume probe found. Never an error: the run proceeds either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeStatus {
    NoPriorFile,
    Applied { imported: usize },
    Unreadable(String),
}

/// Auto-save location for `source` translated into `target_lang`.
///
/// `dir/movie.srt` with `ko` becomes `dir/movie.ko.srt`. A source without an
/// extension gets `.srt`; a blank language tag becomes `translated`.
pub fn autosave_path(source: &Path, target_lang: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_else(|| "srt".into());
    let tag = match target_lang.trim() {
        "" => "translated",
        t => t,
    };

    source.with_file_name(format!("{}.{}.{}", stem, tag, extension))
}

/// Import translations from a previous auto-save of `source` into `entries`.
///
/// A cue is imported only when the saved text differs from its current
/// source text, so pass-through copies are not mistaken for translations.
pub fn try_apply_existing(
    entries: &mut [SubtitleEntry],
    source: &Path,
    target_lang: &str,
) -> ResumeStatus {
    let path = autosave_path(source, target_lang);
    if !path.exists() {
        debug!("No previous output at {:?}", path);
        return ResumeStatus::NoPriorFile;
    }

    let existing = match srt::parse_file(&path) {
        Ok(existing) => existing,
        Err(e) => {
            warn!("Ignoring unreadable previous output {:?}: {}", path, e);
            return ResumeStatus::Unreadable(e.to_string());
        }
    };

    let saved: HashMap<u32, String> = existing
        .into_iter()
        .map(|e| (e.index, e.source_text))
        .collect();

    let mut imported = 0;
    for entry in entries.iter_mut() {
        let Some(text) = saved.get(&entry.index) else {
            continue;
        };
        if text.trim().is_empty() || text.trim() == entry.source_text.trim() {
            continue;
        }
        entry.translated_text = Some(text.clone());
        imported += 1;
    }

    info!("Resumed {} translated entries from {:?}", imported, path);
    ResumeStatus::Applied { imported }
}
