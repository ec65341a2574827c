//! Canonical result types for murmur-asr.
//!
//! Both backends normalize their output into these types; the serialized
//! shape is stable regardless of which backend produced it.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A single transcription request, immutable for its duration.
///
/// The model size is carried as the raw string from the command line and is
/// only interpreted by the model provider; an unsupported value surfaces as
/// a model construction failure rather than an argument error.
#[derive(Clone, Debug)]
pub struct TranscriptionRequest {
    /// Path to the input audio file
    pub audio: PathBuf,
    /// Requested Whisper model size (tiny, base, small, medium, large)
    pub model_size: String,
}

/// Whisper model sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
            ModelSize::Large => "large",
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(ModelSize::Tiny),
            "base" => Ok(ModelSize::Base),
            "small" => Ok(ModelSize::Small),
            "medium" => Ok(ModelSize::Medium),
            "large" => Ok(ModelSize::Large),
            _ => Err(()),
        }
    }
}

/// Which inference backend produced a result.
///
/// Serialized wire names match the original consumer contract:
/// the fast quantized backend reports as `faster-whisper`, the
/// full-precision reference backend as `whisper`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    #[serde(rename = "faster-whisper")]
    Fast,
    #[serde(rename = "whisper")]
    Reference,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Fast => "faster-whisper",
            BackendKind::Reference => "whisper",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single word with timing and confidence.
#[derive(Clone, Debug, Serialize)]
pub struct Word {
    pub word: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub probability: f32,
}

/// A contiguous span of transcribed speech.
///
/// `id` is a dense 0-based sequence matching the segment's position in
/// temporal order; `seek` is the start time in centiseconds.
#[derive(Clone, Debug, Serialize)]
pub struct Segment {
    pub id: usize,
    pub seek: i64,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
    /// Raw token ids; empty when the backend does not expose them
    pub tokens: Vec<i32>,
    pub temperature: f32,
    pub avg_logprob: f32,
    pub compression_ratio: f32,
    pub no_speech_prob: f32,
    pub words: Vec<Word>,
}

/// Canonical transcription result, identical in shape for both backends.
#[derive(Clone, Debug, Serialize)]
pub struct TranscriptionResult {
    /// Trimmed concatenation of all segment texts
    pub text: String,
    pub language: String,
    pub language_probability: f32,
    /// Audio duration in seconds
    pub duration: f64,
    pub segments: Vec<Segment>,
    /// Attached by the orchestrator once the pipeline completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_metadata: Option<ProcessingMetadata>,
}

/// Per-request processing metadata attached on completion.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessingMetadata {
    /// Wall-clock transcription time in seconds
    pub processing_time: f64,
    pub model_type: BackendKind,
    pub model_size: String,
    pub preprocessing_applied: bool,
    /// Process uptime in seconds at completion
    pub process_uptime: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_sizes() {
        assert_eq!("tiny".parse(), Ok(ModelSize::Tiny));
        assert_eq!("base".parse(), Ok(ModelSize::Base));
        assert_eq!("large".parse(), Ok(ModelSize::Large));
        assert!("turbo".parse::<ModelSize>().is_err());
        assert!("Base".parse::<ModelSize>().is_err());
    }

    #[test]
    fn backend_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&BackendKind::Fast).unwrap(),
            "\"faster-whisper\""
        );
        assert_eq!(
            serde_json::to_string(&BackendKind::Reference).unwrap(),
            "\"whisper\""
        );
    }

    #[test]
    fn result_serializes_compact_without_metadata() {
        let result = TranscriptionResult {
            text: String::new(),
            language: "en".to_string(),
            language_probability: 1.0,
            duration: 0.0,
            segments: vec![],
            processing_metadata: None,
        };

        let json = serde_json::to_string(&result).unwrap();

        assert!(json.starts_with("{\"text\":\"\""));
        assert!(!json.contains("processing_metadata"));
        assert!(!json.contains(' '));
    }

    #[test]
    fn metadata_serializes_backend_wire_name() {
        let metadata = ProcessingMetadata {
            processing_time: 1.5,
            model_type: BackendKind::Reference,
            model_size: "base".to_string(),
            preprocessing_applied: false,
            process_uptime: 2.0,
        };

        let json = serde_json::to_string(&metadata).unwrap();

        assert!(json.contains("\"model_type\":\"whisper\""));
        assert!(json.contains("\"model_size\":\"base\""));
    }
}
