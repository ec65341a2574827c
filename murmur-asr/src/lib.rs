//! murmur-asr: whisper transcription with backend fallback and caching.
//!
//! The pipeline prefers a fast quantized whisper backend and transparently
//! falls back to the full-precision reference backend; both normalize
//! their output into one canonical, serializable result schema. Loaded
//! models are cached per process and evicted under memory pressure.
//!
//! # Quick Start
//!
//! ```ignore
//! use murmur_asr::{cache::ModelCache, provider, transcribe};
//!
//! let mut cache = ModelCache::new();
//! let (handle, _kind) = provider::acquire(&mut cache, "base", true)?;
//! let result = transcribe::transcribe(&handle, "audio.wav".as_ref())?;
//! println!("{}", result.text);
//! ```

pub mod audio;
pub mod cache;
pub mod error;
pub mod memory;
pub mod provider;
pub mod transcribe;
pub mod types;
pub mod validate;
