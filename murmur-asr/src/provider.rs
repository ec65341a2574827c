//! Model acquisition with backend fallback and caching.
//!
//! The provider prefers the fast quantized backend and transparently falls
//! back to the full-precision reference backend when the quantized model
//! cannot be fetched or constructed. Loaded contexts are cached for the
//! lifetime of the process; model loading dominates cold-start latency, so
//! a cache hit is the primary performance optimization here.

use crate::cache::ModelCache;
use crate::error::ModelError;
use crate::memory;
use crate::types::{BackendKind, ModelSize};
use hf_hub::api::sync::Api;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use whisper_rs::{WhisperContext, WhisperContextParameters};

/// Hugging Face repository hosting the GGML whisper models.
pub const MODEL_REPO: &str = "ggerganov/whisper.cpp";

/// A loaded inference engine instance.
///
/// Shared read-only across transcription calls; never mutated after
/// construction.
pub struct ModelHandle {
    pub ctx: WhisperContext,
    pub kind: BackendKind,
    pub size: ModelSize,
    /// Thread budget for the engine's internal pool
    pub threads: i32,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("threads", &self.threads)
            .finish_non_exhaustive()
    }
}

/// Quantization profile for the fast backend, trading memory for accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuantProfile {
    /// Most memory-conservative profile
    Q5_1,
    /// Higher-fidelity profile for machines with headroom
    Q8_0,
}

impl QuantProfile {
    /// Pick a profile from currently available system memory. An unknown
    /// reading (0) selects the conservative profile.
    pub fn for_available(available: u64) -> Self {
        if available >= memory::LOW_MEMORY_BYTES {
            QuantProfile::Q8_0
        } else {
            QuantProfile::Q5_1
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            QuantProfile::Q5_1 => "q5_1",
            QuantProfile::Q8_0 => "q8_0",
        }
    }
}

/// Obtain a ready model handle for the requested size, preferring the fast
/// backend. The returned kind reflects the backend that actually loaded.
///
/// The model size arrives as the raw CLI string; an unknown value is a
/// construction failure, not an argument error.
pub fn acquire(
    cache: &mut ModelCache,
    model_size: &str,
    prefer_fast: bool,
) -> Result<(Arc<ModelHandle>, BackendKind), ModelError> {
    let size: ModelSize = model_size
        .parse()
        .map_err(|_| ModelError::UnknownSize(model_size.to_string()))?;

    let requested = if prefer_fast {
        BackendKind::Fast
    } else {
        BackendKind::Reference
    };

    if let Some(handle) = cache.get(&(size, requested)) {
        tracing::info!(size = %size, backend = %requested, "using cached model");
        return Ok((handle, requested));
    }

    memory::checkpoint("before_model_load");

    let mut preferred: Attempts<'_, ModelHandle, ModelError> = Vec::new();
    if prefer_fast {
        preferred.push((BackendKind::Fast, Box::new(move || load_fast(size))));
    }
    let last_resort: Attempt<'_, ModelHandle, ModelError> =
        (BackendKind::Reference, Box::new(move || load_reference(size)));

    let (handle, kind) = first_available(preferred, last_resort)
        .map_err(|err| ModelError::NoBackend(Box::new(err)))?;

    memory::checkpoint("after_model_load");

    let handle = Arc::new(handle);
    cache.insert((size, kind), Arc::clone(&handle));

    Ok((handle, kind))
}

type Attempt<'a, H, E> = (BackendKind, Box<dyn FnOnce() -> Result<H, E> + 'a>);
type Attempts<'a, H, E> = Vec<Attempt<'a, H, E>>;

/// Try backend loaders in priority order. A failure of any preferred
/// loader is logged and superseded by the next attempt; only the last
/// resort's error propagates.
fn first_available<'a, H, E: std::fmt::Display>(
    preferred: Attempts<'a, H, E>,
    last_resort: Attempt<'a, H, E>,
) -> Result<(H, BackendKind), E> {
    for (kind, load) in preferred {
        match load() {
            Ok(handle) => return Ok((handle, kind)),
            Err(err) => {
                tracing::warn!(backend = %kind, error = %err, "backend unavailable, falling back");
            }
        }
    }

    let (kind, load) = last_resort;
    load().map(|handle| (handle, kind))
}

fn load_fast(size: ModelSize) -> Result<ModelHandle, ModelError> {
    let profile = QuantProfile::for_available(memory::available_memory());
    let file = quantized_file(size, profile);

    tracing::info!(size = %size, profile = ?profile, file = %file, "loading fast whisper backend");

    let path = fetch_model(&file)?;
    let ctx = build_context(&path)?;

    Ok(ModelHandle {
        ctx,
        kind: BackendKind::Fast,
        size,
        threads: engine_threads(),
    })
}

fn load_reference(size: ModelSize) -> Result<ModelHandle, ModelError> {
    let file = reference_file(size);

    tracing::info!(size = %size, file = %file, "loading reference whisper backend");

    let path = fetch_model(&file)?;
    let ctx = build_context(&path)?;

    Ok(ModelHandle {
        ctx,
        kind: BackendKind::Reference,
        size,
        threads: engine_threads(),
    })
}

/// GGML file name for the full-precision reference model.
fn reference_file(size: ModelSize) -> String {
    format!("ggml-{}.bin", repo_size_name(size))
}

/// GGML file name for the quantized fast model. The large model is only
/// published with a q5_0 quantization, so the profile collapses there.
fn quantized_file(size: ModelSize, profile: QuantProfile) -> String {
    match size {
        ModelSize::Large => format!("ggml-{}-q5_0.bin", repo_size_name(size)),
        _ => format!("ggml-{}-{}.bin", repo_size_name(size), profile.suffix()),
    }
}

/// The hub stopped publishing an unversioned "large" file; v3 is current.
fn repo_size_name(size: ModelSize) -> &'static str {
    match size {
        ModelSize::Large => "large-v3",
        other => other.as_str(),
    }
}

/// Fetch a model file from the Hugging Face Hub, hitting the local hub
/// cache first.
fn fetch_model(file: &str) -> Result<PathBuf, ModelError> {
    let fetch_err = |source| ModelError::Fetch {
        file: file.to_string(),
        source,
    };

    let api = Api::new().map_err(fetch_err)?;
    api.model(MODEL_REPO.to_string()).get(file).map_err(fetch_err)
}

fn build_context(path: &Path) -> Result<WhisperContext, ModelError> {
    let ctx =
        WhisperContext::new_with_params(&path.to_string_lossy(), WhisperContextParameters::default())?;
    Ok(ctx)
}

/// Engine thread budget: at most 4, bounded by the machine's core count.
fn engine_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(4) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> Result<u32, ModelError> {
        Err(ModelError::UnknownSize("stub".to_string()))
    }

    fn reference_ok() -> Attempt<'static, u32, ModelError> {
        (BackendKind::Reference, Box::new(|| Ok(2)))
    }

    #[test]
    fn fast_success_wins() {
        let preferred: Attempts<'_, u32, ModelError> =
            vec![(BackendKind::Fast, Box::new(|| Ok(1)))];

        let (handle, kind) = first_available(preferred, reference_ok()).unwrap();

        assert_eq!(handle, 1);
        assert_eq!(kind, BackendKind::Fast);
    }

    #[test]
    fn fast_failure_is_superseded_by_reference() {
        let preferred: Attempts<'_, u32, ModelError> =
            vec![(BackendKind::Fast, Box::new(unavailable))];

        let (handle, kind) = first_available(preferred, reference_ok()).unwrap();

        assert_eq!(handle, 2);
        assert_eq!(kind, BackendKind::Reference);
    }

    #[test]
    fn all_failures_propagate_last_error() {
        let preferred: Attempts<'_, u32, ModelError> =
            vec![(BackendKind::Fast, Box::new(unavailable))];

        let result = first_available(preferred, (BackendKind::Reference, Box::new(unavailable)));

        assert!(result.is_err());
    }

    #[test]
    fn unknown_size_is_a_model_error() {
        let mut cache = ModelCache::new();
        let result = acquire(&mut cache, "enormous", true);

        assert!(matches!(result, Err(ModelError::UnknownSize(ref s)) if s == "enormous"));
        assert!(cache.is_empty());
    }

    #[test]
    fn profile_tracks_available_memory() {
        assert_eq!(QuantProfile::for_available(0), QuantProfile::Q5_1);
        assert_eq!(
            QuantProfile::for_available(memory::LOW_MEMORY_BYTES - 1),
            QuantProfile::Q5_1
        );
        assert_eq!(
            QuantProfile::for_available(memory::LOW_MEMORY_BYTES),
            QuantProfile::Q8_0
        );
    }

    #[test]
    fn model_file_names() {
        assert_eq!(reference_file(ModelSize::Base), "ggml-base.bin");
        assert_eq!(reference_file(ModelSize::Large), "ggml-large-v3.bin");
        assert_eq!(
            quantized_file(ModelSize::Base, QuantProfile::Q8_0),
            "ggml-base-q8_0.bin"
        );
        assert_eq!(
            quantized_file(ModelSize::Tiny, QuantProfile::Q5_1),
            "ggml-tiny-q5_1.bin"
        );
        assert_eq!(
            quantized_file(ModelSize::Large, QuantProfile::Q8_0),
            "ggml-large-v3-q5_0.bin"
        );
    }

    #[test]
    fn thread_budget_is_bounded() {
        let threads = engine_threads();
        assert!((1..=4).contains(&threads));
    }
}
