//! Audio loading and best-effort preprocessing.
//!
//! The preprocessor resamples to the model's native 16kHz, trims
//! leading/trailing silence, and peak-normalizes. It is an enhancement,
//! never a hard dependency: any failure degrades to the original file.

use crate::error::AudioError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

/// Sample rate the inference models are trained against (16kHz).
pub const SAMPLE_RATE: u32 = 16000;

/// Energy threshold for silence trimming, in dB below peak.
const TRIM_TOP_DB: f32 = 20.0;

/// A preprocessed artifact is only written when trimming removed more than
/// 5% of the samples.
const KEEP_RATIO: f64 = 0.95;

/// Load a WAV file as mono f32 samples at its native rate.
///
/// Multi-channel audio is downmixed by averaging each frame.
pub fn load_samples(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    Ok((downmix(samples, spec.channels), spec.sample_rate))
}

/// Load a WAV file as mono f32 samples resampled to 16kHz.
///
/// This is the hard load used to feed the inference engine; unlike
/// preprocessing, its errors propagate.
pub fn load_mono_16k(path: &Path) -> Result<Vec<f32>, AudioError> {
    let (samples, rate) = load_samples(path)?;
    Ok(resample_linear(&samples, rate, SAMPLE_RATE))
}

/// Preprocess audio for better transcription quality.
///
/// Returns the path to use for inference: a `_preprocessed.wav` artifact
/// beside the original when trimming removed enough material, otherwise
/// the original path. Never fails; errors are logged and the original
/// path is returned unchanged.
pub fn preprocess(path: &Path) -> PathBuf {
    tracing::info!(path = %path.display(), "preprocessing audio");

    match try_preprocess(path) {
        Ok(processed) => processed,
        Err(err) => {
            tracing::warn!(error = %err, "preprocessing failed, using original audio");
            path.to_path_buf()
        }
    }
}

fn try_preprocess(path: &Path) -> Result<PathBuf, AudioError> {
    let (samples, rate) = load_samples(path)?;
    let samples = resample_linear(&samples, rate, SAMPLE_RATE);

    let total = samples.len();
    let trimmed = trim_silence(&samples, TRIM_TOP_DB);

    if (trimmed.len() as f64) >= total as f64 * KEEP_RATIO {
        tracing::debug!("audio already clean, skipping artifact");
        return Ok(path.to_path_buf());
    }

    let mut out = trimmed.to_vec();
    peak_normalize(&mut out);

    let artifact = preprocessed_path(path);
    write_wav_mono_16k(&artifact, &out)?;

    tracing::info!(
        path = %artifact.display(),
        trimmed = total - out.len(),
        "saved preprocessed audio"
    );

    Ok(artifact)
}

/// Derived artifact name: the original path with `_preprocessed.wav`
/// appended, so the artifact lands beside the input.
fn preprocessed_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}_preprocessed.wav", path.display()))
}

fn downmix(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linear-interpolation resampling. Adequate for speech fed to models that
/// were trained on far noisier input pipelines.
fn resample_linear(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from as f64 / to as f64;
    let out_len = (samples.len() as f64 / ratio).round() as usize;

    (0..out_len)
        .map(|i| {
            let src = i as f64 * ratio;
            let idx = src as usize;
            let frac = (src - idx as f64) as f32;

            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Trim leading and trailing regions quieter than `top_db` below peak.
fn trim_silence(samples: &[f32], top_db: f32) -> &[f32] {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak == 0.0 {
        return &samples[..0];
    }

    let threshold = peak * 10.0f32.powf(-top_db / 20.0);

    let first = samples.iter().position(|s| s.abs() >= threshold);
    let last = samples.iter().rposition(|s| s.abs() >= threshold);

    match (first, last) {
        (Some(first), Some(last)) => &samples[first..=last],
        _ => &samples[..0],
    }
}

/// Scale samples so the peak amplitude is 1.0.
fn peak_normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
    if peak > 0.0 {
        for s in samples.iter_mut() {
            *s /= peak;
        }
    }
}

fn write_wav_mono_16k(path: &Path, samples: &[f32]) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}
