//! Backend-specific transcription adapters.
//!
//! Both adapters drive the same decoding parameters and compute
//! avg_logprob from the token log-probabilities the engine supplies; only
//! the reference adapter additionally emits raw token ids. Metrics the
//! engine does not surface at all resolve to fixed defaults during
//! normalization. The reference output defines the canonical shape.

use crate::audio;
use crate::error::{Error, TranscribeError};
use crate::provider::ModelHandle;
use crate::types::{BackendKind, Segment, TranscriptionResult, Word};
use std::path::Path;
use whisper_rs::{FullParams, SamplingStrategy};

const BEAM_SIZE: i32 = 5;
const PATIENCE: f32 = 1.0;
const LENGTH_PENALTY: f32 = 1.0;
const TEMPERATURE: f32 = 0.0;
/// whisper.cpp uses token entropy as its compression-ratio gate
const COMPRESSION_RATIO_THRESHOLD: f32 = 2.4;
const LOGPROB_THRESHOLD: f32 = -1.0;
const NO_SPEECH_THRESHOLD: f32 = 0.6;

// Fallback constants for metrics the engine does not supply
const DEFAULT_AVG_LOGPROB: f32 = -0.5;
const DEFAULT_COMPRESSION_RATIO: f32 = 2.0;
const DEFAULT_NO_SPEECH_PROB: f32 = 0.1;
const DEFAULT_LANGUAGE_PROBABILITY: f32 = 1.0;

/// Below this many 16kHz samples (100ms) the engine has nothing to decode;
/// a fully trimmed silent input lands here with zero samples.
const MIN_ENGINE_SAMPLES: usize = audio::SAMPLE_RATE as usize / 10;

/// Transcribe an audio file with the adapter matching the handle's
/// backend kind.
pub fn transcribe(handle: &ModelHandle, path: &Path) -> Result<TranscriptionResult, Error> {
    match handle.kind {
        BackendKind::Fast => transcribe_fast(handle, path),
        BackendKind::Reference => transcribe_reference(handle, path),
    }
}

/// Fast-backend adapter: quantized engine, empty token lists, synthesized
/// seek offsets.
pub fn transcribe_fast(handle: &ModelHandle, path: &Path) -> Result<TranscriptionResult, Error> {
    tracing::info!(path = %path.display(), "transcribing with fast backend");

    let samples = audio::load_mono_16k(path)?;
    let duration = samples.len() as f64 / audio::SAMPLE_RATE as f64;

    if samples.len() < MIN_ENGINE_SAMPLES {
        tracing::info!("audio too short for inference, returning empty result");
        return Ok(empty_result(duration));
    }

    let output = run_engine(handle, &samples, decode_params(handle), false)
        .map_err(Error::Transcribe)?;

    Ok(normalize(output, duration))
}

/// Reference-backend adapter: full-precision engine, raw token ids, token
/// log-probabilities folded into avg_logprob.
pub fn transcribe_reference(
    handle: &ModelHandle,
    path: &Path,
) -> Result<TranscriptionResult, Error> {
    tracing::info!(path = %path.display(), "transcribing with reference backend");

    let samples = audio::load_mono_16k(path)?;
    let duration = samples.len() as f64 / audio::SAMPLE_RATE as f64;

    if samples.len() < MIN_ENGINE_SAMPLES {
        tracing::info!("audio too short for inference, returning empty result");
        return Ok(empty_result(duration));
    }

    let output = run_engine(handle, &samples, decode_params(handle), true)
        .map_err(Error::Transcribe)?;

    Ok(normalize(output, duration))
}

/// Shared decoding parameters: beam search with word-level timestamps,
/// greedy temperature, conditioning on prior text, auto language
/// detection, transcription task only, and the engine's non-speech token
/// suppression standing in for voice-activity filtering.
fn decode_params(handle: &ModelHandle) -> FullParams<'static, 'static> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: BEAM_SIZE,
        patience: PATIENCE,
    });

    params.set_n_threads(handle.threads);
    params.set_temperature(TEMPERATURE);
    params.set_length_penalty(LENGTH_PENALTY);
    params.set_entropy_thold(COMPRESSION_RATIO_THRESHOLD);
    params.set_logprob_thold(LOGPROB_THRESHOLD);
    params.set_no_speech_thold(NO_SPEECH_THRESHOLD);
    params.set_token_timestamps(true);
    params.set_translate(false);
    params.set_language(None);
    params.set_no_context(false);
    params.set_suppress_blank(true);
    params.set_suppress_non_speech_tokens(true);
    params.set_print_special(false);
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    params
}

/// Backend-agnostic segment data as pulled from the engine, before
/// canonical-schema resolution.
#[derive(Debug, Default)]
struct RawSegment {
    text: String,
    /// Start/end in centiseconds, the engine's native resolution
    start_cs: i64,
    end_cs: i64,
    tokens: Vec<i32>,
    avg_logprob: Option<f32>,
    compression_ratio: Option<f32>,
    no_speech_prob: Option<f32>,
    words: Vec<Word>,
}

#[derive(Debug)]
struct EngineOutput {
    segments: Vec<RawSegment>,
    language: String,
}

/// Run inference and pull segments out of the engine state.
///
/// `expose_tokens` selects the reference adapter's richer view with raw
/// token ids; avg_logprob is computed from token log-probabilities for
/// both adapters.
fn run_engine(
    handle: &ModelHandle,
    samples: &[f32],
    params: FullParams,
    expose_tokens: bool,
) -> Result<EngineOutput, TranscribeError> {
    let mut state = handle.ctx.create_state()?;
    state.full(params, samples)?;

    let eot = handle.ctx.token_eot();
    let n_segments = state.full_n_segments()?;
    let mut segments = Vec::with_capacity(n_segments as usize);

    for i in 0..n_segments {
        let mut segment = RawSegment {
            text: state.full_get_segment_text(i)?,
            start_cs: state.full_get_segment_t0(i)?,
            end_cs: state.full_get_segment_t1(i)?,
            ..RawSegment::default()
        };

        let mut logprob_sum = 0.0f32;
        let mut logprob_count = 0usize;

        for j in 0..state.full_n_tokens(i)? {
            let data = state.full_get_token_data(i, j)?;

            if expose_tokens {
                segment.tokens.push(data.id);
            }

            // special tokens carry no word timing
            if data.id >= eot {
                continue;
            }

            logprob_sum += data.plog;
            logprob_count += 1;

            // tokens split mid-codepoint cannot be rendered as text
            if let Ok(word) = state.full_get_token_text(i, j) {
                segment.words.push(Word {
                    word,
                    start: data.t0 as f64 / 100.0,
                    end: data.t1 as f64 / 100.0,
                    probability: data.p,
                });
            }
        }

        segment.avg_logprob = average_logprob(logprob_sum, logprob_count);

        segments.push(segment);
    }

    let language = state
        .full_lang_id_from_state()
        .ok()
        .and_then(whisper_rs::get_lang_str)
        .unwrap_or("unknown")
        .to_string();

    Ok(EngineOutput { segments, language })
}

/// Mean token log-probability, or `None` when no text tokens were decoded
/// and the metric must fall back to its default.
fn average_logprob(sum: f32, count: usize) -> Option<f32> {
    if count > 0 {
        Some(sum / count as f32)
    } else {
        None
    }
}

fn empty_result(duration: f64) -> TranscriptionResult {
    normalize(
        EngineOutput {
            segments: Vec::new(),
            language: "unknown".to_string(),
        },
        duration,
    )
}

/// Resolve engine output into the canonical schema: dense 0-based ids in
/// temporal order, seek offsets at start × 100, fixed defaults for any
/// metric the engine did not supply, and full text as the trimmed
/// concatenation of segment texts.
fn normalize(output: EngineOutput, duration: f64) -> TranscriptionResult {
    let mut full_text = String::new();
    let mut segments = Vec::with_capacity(output.segments.len());

    for (id, raw) in output.segments.into_iter().enumerate() {
        full_text.push_str(&raw.text);

        segments.push(Segment {
            id,
            seek: raw.start_cs,
            start: raw.start_cs as f64 / 100.0,
            end: raw.end_cs as f64 / 100.0,
            text: raw.text,
            tokens: raw.tokens,
            temperature: TEMPERATURE,
            avg_logprob: raw.avg_logprob.unwrap_or(DEFAULT_AVG_LOGPROB),
            compression_ratio: raw.compression_ratio.unwrap_or(DEFAULT_COMPRESSION_RATIO),
            no_speech_prob: raw.no_speech_prob.unwrap_or(DEFAULT_NO_SPEECH_PROB),
            words: raw.words,
        });
    }

    TranscriptionResult {
        text: full_text.trim().to_string(),
        language: output.language,
        language_probability: DEFAULT_LANGUAGE_PROBABILITY,
        duration,
        segments,
        processing_metadata: None,
    }
}
