//! Integration tests for the murmur CLI pipeline.

use murmur::run;
use murmur_asr::cache::ModelCache;
use murmur_asr::error::Error;
use murmur_asr::types::TranscriptionRequest;
use std::path::{Path, PathBuf};
use std::time::Instant;

fn request(path: impl Into<PathBuf>, model_size: &str) -> TranscriptionRequest {
    TranscriptionRequest {
        audio: path.into(),
        model_size: model_size.to_string(),
    }
}

fn write_silent_wav(path: &Path, seconds: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(seconds * 16000) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn missing_file_maps_to_pinned_envelope_message() {
    let mut cache = ModelCache::new();
    let request = request("/no/such/file.wav", "base");

    let err = run::execute(&mut cache, &request, Instant::now()).unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(
        run::failure_message(&err, &request),
        "Invalid or inaccessible audio file: /no/such/file.wav"
    );
    assert_eq!(
        run::failure_envelope(&err, &request, 0.5),
        r#"{"error":"Invalid or inaccessible audio file: /no/such/file.wav"}"#
    );
    assert!(cache.is_empty());
}

#[test]
fn empty_file_fails_validation_without_model_load() {
    let path = std::env::temp_dir().join("murmur_it_empty.wav");
    std::fs::write(&path, []).unwrap();

    let mut cache = ModelCache::new();
    let err = run::execute(&mut cache, &request(&path, "base"), Instant::now()).unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(cache.is_empty());
    std::fs::remove_file(path).ok();
}

#[test]
#[ignore = "network I/O and model download required"]
fn silent_wav_transcribes_to_empty_text() {
    let path = std::env::temp_dir().join("murmur_it_silent.wav");
    write_silent_wav(&path, 10);
    let original_bytes = std::fs::read(&path).unwrap();

    let mut cache = ModelCache::new();
    let result = run::execute(&mut cache, &request(&path, "tiny"), Instant::now()).unwrap();

    assert_eq!(result.text, "");
    assert!(result.segments.is_empty());
    assert!(result.duration >= 0.0);

    let metadata = result.processing_metadata.expect("metadata attached");
    assert_eq!(metadata.model_size, "tiny");
    assert!(metadata.process_uptime >= metadata.processing_time);

    // preprocessed artifact cleaned up, original untouched
    let artifact = PathBuf::from(format!("{}_preprocessed.wav", path.display()));
    assert!(!artifact.exists());
    assert_eq!(std::fs::read(&path).unwrap(), original_bytes);

    std::fs::remove_file(path).ok();
}

#[test]
#[ignore = "network I/O and model download required"]
fn second_acquire_hits_the_cache() {
    let path = std::env::temp_dir().join("murmur_it_cached.wav");
    write_silent_wav(&path, 1);

    let mut cache = ModelCache::new();
    run::execute(&mut cache, &request(&path, "tiny"), Instant::now()).unwrap();
    assert_eq!(cache.len(), 1);

    run::execute(&mut cache, &request(&path, "tiny"), Instant::now()).unwrap();
    assert_eq!(cache.len(), 1);

    std::fs::remove_file(path).ok();
}
