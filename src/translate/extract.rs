use std::sync::OnceLock;

use regex::Regex;
use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::core::{
    http::truncate_chars,
    Side,
    TranslationResult,
};

const SNIPPET_LIMIT: usize = 200;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Malformed response: {snippet:?}")]
    MalformedResponse { snippet: String },
}

fn fence_open() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(```+|~~~+)\s*[\w.+#-]*\s*$").unwrap())
}

fn fence_close() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(```+|~~~+)\s*$").unwrap())
}

/// Removes one enclosing fenced block, whatever its language tag.
fn strip_fence(text: &str) -> &str {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return text;
    }

    let (first, last) = (lines[0], lines[lines.len() - 1]);
    if !fence_open().is_match(first) || !fence_close().is_match(last) {
        return text;
    }

    // Slice between the end of the first line and the start of the last one.
    let start = first.len();
    let end = text.len() - last.len();
    if start >= end {
        return "";
    }
    text[start..end].trim()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Finds the JSON object in a model response and takes the requested sides
/// from it.
///
/// A requested side whose key is missing, not a string or blank simply yields
/// no translation; only when none of the requested sides yields text is the
/// response rejected.
pub fn extract(raw: &str, requested: &[Side]) -> Result<TranslationResult, ExtractError> {
    let malformed = || ExtractError::MalformedResponse {
        snippet: truncate_chars(raw.trim(), SNIPPET_LIMIT),
    };

    let body = strip_fence(raw.trim());
    let object = parse_object(body)
        .or_else(|| {
            let start = body.find('{')?;
            let end = body.rfind('}')?;
            (start < end).then(|| parse_object(&body[start..=end])).flatten()
        })
        .ok_or_else(malformed)?;

    let mut result = TranslationResult::default();
    for side in requested {
        let text = object.get(side.key()).and_then(Value::as_str).map(str::trim);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            result.set_side(*side, text.to_string());
        }
    }

    if result.is_empty() {
        return Err(malformed());
    }
    Ok(result)
}
