//! Orchestrates the transcription pipeline for a single request.
//!
//! Stages run strictly in sequence: validate, evict under pressure,
//! preprocess, acquire model, transcribe, clean up, annotate metadata.
//! Any stage failure maps to a uniform JSON error envelope on stdout;
//! diagnostics stay on stderr.

use murmur_asr::cache::ModelCache;
use murmur_asr::error::Error;
use murmur_asr::types::{ProcessingMetadata, TranscriptionRequest, TranscriptionResult};
use murmur_asr::{audio, memory, provider, transcribe, validate};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Envelope message when the binary is invoked without an audio path.
pub const NO_AUDIO_MESSAGE: &str = "No audio file path provided";

/// Uniform failure payload written to stdout.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_uptime: Option<f64>,
}

/// Serialize a failure envelope to one JSON line.
pub fn error_envelope(message: &str, process_uptime: Option<f64>) -> String {
    let envelope = ErrorEnvelope {
        error: message,
        process_uptime,
    };

    serde_json::to_string(&envelope)
        .unwrap_or_else(|_| r#"{"error":"failed to serialize error envelope"}"#.to_string())
}

/// Envelope for the zero-argument invocation; carries no uptime.
pub fn usage_envelope() -> String {
    error_envelope(NO_AUDIO_MESSAGE, None)
}

/// Map a pipeline failure to its envelope message. Validation failures get
/// the pinned path-bearing message; everything downstream is reported as a
/// transcription failure with its cause.
pub fn failure_message(err: &Error, request: &TranscriptionRequest) -> String {
    match err {
        Error::Validation(_) => format!(
            "Invalid or inaccessible audio file: {}",
            request.audio.display()
        ),
        other => format!("Whisper transcription failed: {other}"),
    }
}

/// Serialize a pipeline failure to its envelope. Validation failures carry
/// no uptime; failures past validation report uptime at the point of
/// failure.
pub fn failure_envelope(err: &Error, request: &TranscriptionRequest, uptime: f64) -> String {
    let message = failure_message(err, request);
    let uptime = match err {
        Error::Validation(_) => None,
        _ => Some(uptime),
    };
    error_envelope(&message, uptime)
}

/// Run the full pipeline for one request.
///
/// Validation failure is terminal before any model work. Preprocessing and
/// eviction are best-effort and cannot fail the request. The preprocessed
/// artifact is deleted once transcription succeeds.
pub fn execute(
    cache: &mut ModelCache,
    request: &TranscriptionRequest,
    process_start: Instant,
) -> Result<TranscriptionResult, Error> {
    validate::validate(&request.audio)?;

    memory::evict_under_pressure(cache);

    let pipeline_start = Instant::now();

    let processed = audio::preprocess(&request.audio);
    let preprocessing_applied = processed != request.audio;

    let (handle, kind) = provider::acquire(cache, &request.model_size, true)?;

    memory::checkpoint("before_transcription");
    let mut result = transcribe::transcribe(&handle, &processed)?;
    memory::checkpoint("after_transcription");

    if preprocessing_applied {
        cleanup_artifact(&processed);
    }

    let processing_time = pipeline_start.elapsed().as_secs_f64();
    result.processing_metadata = Some(ProcessingMetadata {
        processing_time,
        model_type: kind,
        model_size: request.model_size.clone(),
        preprocessing_applied,
        process_uptime: process_start.elapsed().as_secs_f64(),
    });

    tracing::info!(
        duration = %format_secs(processing_time),
        segments = result.segments.len(),
        "transcription completed"
    );

    Ok(result)
}

/// Format seconds as a string with two decimal places.
fn format_secs(secs: f64) -> String {
    format!("{secs:.2}s")
}

fn cleanup_artifact(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed preprocessed artifact"),
        Err(err) => tracing::warn!(error = %err, "failed to remove preprocessed artifact"),
    }
}
