//! Pulls per-index translations out of a `generateContent` response body.
//!
//! The body is parsed twice: once for the API envelope, then again for the
//! JSON the model produced inside `candidates[0].content.parts[0].text`.

use crate::error::{snippet, ProtocolError};
use crate::subtitle::SubtitleEntry;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Map each index of `batch` to its translated text.
///
/// Indices the model left out map to an empty string, so the result always
/// covers the whole batch.
pub fn extract_translations(
    body: &str,
    batch: &[SubtitleEntry],
) -> Result<BTreeMap<u32, String>, ProtocolError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|_| ProtocolError::invalid_envelope(body))?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProtocolError::no_candidates(body))?;

    let part = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .ok_or_else(|| ProtocolError::malformed_content(body))?;

    let text = part.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProtocolError::empty_response_text(body));
    }

    let inner = strip_code_fence(&text);
    debug!("Model output: {}", snippet(inner));

    let payload: Value =
        serde_json::from_str(inner).map_err(|_| ProtocolError::unexpected_shape(inner))?;

    let items = match &payload {
        Value::Object(map) => map.get("translations").and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    }
    .ok_or_else(|| ProtocolError::unexpected_shape(inner))?;

    let mut translations = BTreeMap::new();
    for item in items {
        let Some(index) = item.get("index").and_then(index_value) else {
            warn!("Ignoring translation item without an integer index: {}", item);
            continue;
        };

        let text = item
            .get("text")
            .and_then(Value::as_str)
            .or_else(|| item.get("translation").and_then(Value::as_str))
            .unwrap_or_default();

        translations.insert(index, text.to_string());
    }

    for entry in batch {
        translations.entry(entry.index).or_insert_with(|| {
            debug!("Model omitted index {}", entry.index);
            String::new()
        });
    }

    Ok(translations)
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if !text.starts_with("```") {
        return text;
    }

    let body = match text.find('\n') {
        Some(newline) => &text[newline + 1..],
        None => &text[3..],
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

fn index_value(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}
