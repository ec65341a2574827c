//! Error types for murmur-asr organized by pipeline stage.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline error variants organized by stage.
///
/// Preprocessing and resource-management failures never appear here; those
/// stages recover locally and degrade to a no-op.
#[derive(Debug, Error)]
pub enum Error {
    /// Input validation stage error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Audio decoding stage error
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Model acquisition stage error
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Inference stage error
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
}

/// Input file validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// File does not exist or is not a regular file
    #[error("audio file not found: {}", path.display())]
    Missing { path: PathBuf },

    /// File exists but has zero length
    #[error("empty audio file: {}", path.display())]
    Empty { path: PathBuf },

    /// File exceeds the size ceiling
    #[error("audio file too large: {size_mb:.1}MB (limit {limit_mb}MB)")]
    TooLarge { size_mb: f64, limit_mb: u64 },
}

/// Audio decoding errors.
#[derive(Debug, Error)]
pub enum AudioError {
    /// IO error during audio loading
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV container error
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// Model acquisition errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The forwarded model size string is not a known size
    #[error("unsupported model size: {0}")]
    UnknownSize(String),

    /// Model file could not be fetched from the hub
    #[error("failed to fetch model file {file}: {source}")]
    Fetch {
        file: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    /// Engine failed to build a context from the model file
    #[error(transparent)]
    Engine(#[from] whisper_rs::WhisperError),

    /// Every backend in the fallback chain failed; carries the last cause
    #[error("Failed to load any Whisper model: {0}")]
    NoBackend(#[source] Box<ModelError>),
}

/// Inference errors.
#[derive(Debug, Error)]
pub enum TranscribeError {
    /// Engine inference call failed
    #[error("inference failed: {0}")]
    Engine(#[from] whisper_rs::WhisperError),
}

/// Result type alias for murmur-asr operations.
pub type Result<T> = std::result::Result<T, Error>;

// Nested From implementations for automatic error conversion chains

// hound::Error → AudioError → Error
impl From<hound::Error> for Error {
    fn from(e: hound::Error) -> Self {
        Error::Audio(AudioError::Wav(e))
    }
}

// std::io::Error → AudioError → Error
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Audio(AudioError::Io(e))
    }
}
