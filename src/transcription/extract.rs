//! Plain-text extraction from stored transcript payloads.
//!
//! A payload is tried against an ordered list of parsers. Each parser either
//! produces text, fails definitively, or declines and lets the next one try.

use super::models::{MinimalTranscript, TranscriptResult};
use crate::error::{HuskError, Result};
use tracing::debug;

enum Attempt {
    Text(String),
    Fail(&'static str),
    Decline,
}

type Parser = fn(&str) -> Attempt;

const PARSERS: [(&str, Parser); 3] = [
    ("structured", parse_structured),
    ("minimal", parse_minimal),
    ("raw", parse_raw),
];

/// Extract plain text from a transcript payload.
///
/// 1. A structured transcript returns its `text` when non-empty, otherwise its
///    non-empty segment texts joined by a space; with neither it fails.
/// 2. If the structured shape does not decode, a top-level `text` alone is accepted.
/// 3. A payload that does not start with `{` is returned unchanged as plain text.
pub fn extract_text(payload: &str) -> Result<String> {
    for (name, parser) in PARSERS {
        match parser(payload) {
            Attempt::Text(text) => {
                debug!(parser = name, chars = text.len(), "Extracted transcript text");
                return Ok(text);
            }
            Attempt::Fail(reason) => return Err(HuskError::Extraction(reason.to_string())),
            Attempt::Decline => {}
        }
    }

    Err(HuskError::Extraction(
        "unable to extract text from transcript".to_string(),
    ))
}

fn parse_structured(payload: &str) -> Attempt {
    // Only objects (or a bare null) decode into a transcript; arrays and scalars are text.
    let trimmed = payload.trim();
    if !trimmed.starts_with('{') && trimmed != "null" {
        return Attempt::Decline;
    }

    let Ok(result) = serde_json::from_str::<Option<TranscriptResult>>(payload) else {
        return Attempt::Decline;
    };
    let result = result.unwrap_or_default();

    if !result.text().is_empty() {
        return Attempt::Text(result.text().to_string());
    }
    if !result.segments.is_empty() {
        return Attempt::Text(result.joined_segments());
    }
    Attempt::Fail("no text found in transcript result")
}

fn parse_minimal(payload: &str) -> Attempt {
    match serde_json::from_str::<MinimalTranscript>(payload) {
        Ok(MinimalTranscript { text: Some(text) }) if !text.is_empty() => Attempt::Text(text),
        _ => Attempt::Decline,
    }
}

fn parse_raw(payload: &str) -> Attempt {
    if payload.trim_start().starts_with('{') {
        Attempt::Decline
    } else {
        Attempt::Text(payload.to_string())
    }
}
