// SRT subtitle format
use super::{normalize_newlines, SubtitleEntry};
use crate::error::Result;
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::debug;

/// `HH:MM:SS,fff`, also accepting `;` before the milliseconds. Hours may
/// run past two digits for very long media.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2,}):([0-5]\d):([0-5]\d)[,;](\d{3})$").expect("Invalid regex")
});

/// Read and parse an SRT file.
pub fn parse_file(path: &Path) -> Result<Vec<SubtitleEntry>> {
    let bytes = fs::read(path)?;
    Ok(parse_str(&String::from_utf8_lossy(&bytes)))
}

/// Parse SRT content into entries, in file order.
///
/// Blocks with a non-numeric index or an unreadable timing line are dropped
/// and parsing resumes at the next blank line.
pub fn parse_str(content: &str) -> Vec<SubtitleEntry> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();
    let mut entries = Vec::new();

    loop {
        let Some(index_line) = next_non_blank(&mut lines) else {
            break;
        };
        let Ok(index) = index_line.parse::<u32>() else {
            debug!("Skipping block with malformed index line: {:?}", index_line);
            skip_block(&mut lines);
            continue;
        };

        let timing_line = lines.next().unwrap_or_default();
        let Some((start, end)) = parse_timing(timing_line) else {
            debug!("Skipping block {} with malformed timing: {:?}", index, timing_line);
            if !timing_line.trim().is_empty() {
                skip_block(&mut lines);
            }
            continue;
        };

        let text = lines
            .by_ref()
            .take_while(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        entries.push(SubtitleEntry::new(index, start, end, text));
    }

    entries
}

/// Render entries as SRT, sorted by index, always with comma separators.
pub fn format(entries: &[SubtitleEntry], use_translated: bool) -> String {
    let mut sorted: Vec<&SubtitleEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.index);

    sorted
        .iter()
        .map(|entry| {
            format!(
                "{}\n{} --> {}\n{}\n",
                entry.index,
                format_timestamp(entry.start),
                format_timestamp(entry.end),
                cue_body(entry.display_text(use_translated))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace the file at `path` with the rendered entries.
///
/// Content goes to a temp file beside the target first, then is renamed over
/// it, so readers never observe a half-written file.
pub fn write_file(path: &Path, entries: &[SubtitleEntry], use_translated: bool) -> Result<()> {
    let content = format(entries, use_translated);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;

    let permissions = fs::metadata(path)
        .map(|m| m.permissions())
        .ok()
        .or_else(default_permissions);
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    debug!("Wrote {} entries to {:?}", entries.len(), path);
    Ok(())
}

/// Cue text without blank lines, which would end the block early.
fn cue_body(text: &str) -> String {
    normalize_newlines(text)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mode for a freshly created output file; temp files start out owner-only.
#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

fn next_non_blank<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<&'a str> {
    lines.map(str::trim).find(|l| !l.is_empty())
}

fn skip_block<'a>(lines: &mut impl Iterator<Item = &'a str>) {
    for line in lines {
        if line.trim().is_empty() {
            break;
        }
    }
}

fn parse_timing(line: &str) -> Option<(Duration, Duration)> {
    let parts: Vec<&str> = line.split("-->").map(str::trim).collect();
    if parts.len() != 2 {
        return None;
    }
    Some((parse_timestamp(parts[0])?, parse_timestamp(parts[1])?))
}

fn parse_timestamp(s: &str) -> Option<Duration> {
    let caps = TIMESTAMP_RE.captures(s)?;
    let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;
    let millis = field(4)?;

    Some(Duration::from_millis(
        (hours * 3600 + minutes * 60 + seconds) * 1000 + millis,
    ))
}

fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
