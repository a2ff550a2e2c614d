//! Data models for completed transcripts.

use serde::{Deserialize, Serialize};

/// A completed transcript as produced by the transcription engine.
///
/// Every field is optional on the wire; missing fields decode as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Full transcript text, when the engine provides one.
    #[serde(default)]
    pub text: Option<String>,
    /// Ordered transcript segments.
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    /// Detected language, if reported.
    #[serde(default)]
    pub language: Option<String>,
}

impl TranscriptResult {
    /// The top-level text, treating an absent field as empty.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Non-empty segment texts joined by a single space, in segment order.
    pub fn joined_segments(&self) -> String {
        self.segments
            .iter()
            .map(TranscriptSegment::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    #[serde(default)]
    pub start: Option<f64>,
    /// End time in seconds.
    #[serde(default)]
    pub end: Option<f64>,
    /// Transcribed text content.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub speaker: Option<String>,
}

impl TranscriptSegment {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Legacy transcript shape carrying only a top-level `text`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MinimalTranscript {
    #[serde(default)]
    pub text: Option<String>,
}
