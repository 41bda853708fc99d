//! Instruction text sent to the model for one batch.

use crate::subtitle::{normalize_newlines, SubtitleEntry};
use serde_json::json;

/// Build the translation instruction for `batch`.
///
/// Language tags are passed through as given; known codes get their English
/// name appended as a hint for the model.
pub fn build_prompt(
    batch: &[SubtitleEntry],
    source_lang: &str,
    target_lang: &str,
    preserve_formatting: bool,
) -> String {
    debug_assert!(!batch.is_empty(), "prompt requested for an empty batch");

    let lines: Vec<_> = batch
        .iter()
        .map(|e| json!({ "index": e.index, "text": normalize_newlines(&e.source_text) }))
        .collect();
    let payload = serde_json::Value::Array(lines);

    let mut prompt = String::new();

    prompt.push_str("You are a professional subtitle translator.\n");
    prompt.push_str(&format!(
        "Translate each subtitle line below from {} to {}.\n\n",
        describe_language(source_lang),
        describe_language(target_lang)
    ));

    prompt.push_str("Respond with strict JSON only: a single object with a \"translations\" array. ");
    prompt.push_str("Each item must be {\"index\": <integer>, \"text\": \"<translated text>\"}, ");
    prompt.push_str("using the same index values as the input. ");
    prompt.push_str("Do not add explanations, comments, or any text outside the JSON object.\n");

    if preserve_formatting {
        prompt.push_str(
            "Preserve line breaks (\\n) and inline markup such as tags, brackets and punctuation \
             exactly as they appear in the source text.\n",
        );
    }

    prompt.push_str("\nSubtitles:\n");
    prompt.push_str(&payload.to_string());
    prompt.push_str("\n\nExample of the expected output format:\n");
    prompt.push_str(
        r#"{"translations":[{"index":1,"text":"<translation of line 1>"},{"index":2,"text":"<translation of line 2>"}]}"#,
    );

    prompt
}

fn describe_language(tag: &str) -> String {
    match language_code_to_name(tag) {
        Some(name) => format!("{} ({})", tag, name),
        None => tag.to_string(),
    }
}

/// Convert language code to human-readable name for better prompting.
fn language_code_to_name(code: &str) -> Option<&'static str> {
    let lowercase = code.trim().to_lowercase();
    let name = match lowercase.as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        "ms" => "Malay",
        "tl" => "Tagalog",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        "uk" => "Ukrainian",
        "cs" => "Czech",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "no" => "Norwegian",
        "el" => "Greek",
        "he" => "Hebrew",
        "hu" => "Hungarian",
        "ro" => "Romanian",
        "bg" => "Bulgarian",
        "hr" => "Croatian",
        "sk" => "Slovak",
        "sl" => "Slovenian",
        "lt" => "Lithuanian",
        "lv" => "Latvian",
        "et" => "Estonian",
        "bn" => "Bengali",
        _ => return None,
    };
    Some(name)
}
