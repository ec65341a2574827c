//! CLI argument definitions using clap.

use clap::Parser;
use murmur_asr::types::TranscriptionRequest;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "murmur")]
#[command(about = "Transcribe an audio file to timestamped JSON")]
#[command(version)]
pub struct Cli {
    /// Path to the audio file to transcribe
    pub audio: Option<PathBuf>,

    /// Whisper model size; forwarded to the model provider unvalidated
    #[arg(default_value = "base")]
    pub model_size: String,
}

impl Cli {
    /// Resolve into a request. `None` means no audio path was given, which
    /// the caller reports through the JSON envelope contract rather than
    /// a usage trace.
    pub fn into_request(self) -> Option<TranscriptionRequest> {
        let audio = self.audio?;
        Some(TranscriptionRequest {
            audio,
            model_size: self.model_size,
        })
    }
}
