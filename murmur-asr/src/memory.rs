//! Process memory monitoring and pressure-driven cache eviction.
//!
//! Everything here is advisory: a failed sample or a failed eviction is
//! logged and swallowed, never propagated.

use crate::cache::Cache;
use sysinfo::{ProcessesToUpdate, System};

/// Available-memory floor below which the model cache is evicted (2 GiB).
pub const EVICTION_THRESHOLD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Available-memory floor below which the fast backend falls back to its
/// most memory-conservative quantization profile (4 GiB).
pub const LOW_MEMORY_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Log current process resident memory for the given pipeline stage.
/// Purely observational; no decision is tied to the sample.
pub fn checkpoint(stage: &str) {
    match process_rss() {
        Some(rss) => {
            tracing::info!(
                stage,
                rss_mb = rss as f64 / (1024.0 * 1024.0),
                "memory checkpoint"
            );
        }
        None => tracing::debug!(stage, "process memory unavailable"),
    }
}

/// Sample currently available system memory in bytes. Returns 0 when the
/// platform reports nothing useful.
pub fn available_memory() -> u64 {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.available_memory()
}

/// Evict cached models when available system memory is low.
///
/// Runs once per request, before model acquisition. Keeps only the
/// most-recently-inserted entry; dropping the evicted handles releases
/// their model memory immediately.
pub fn evict_under_pressure<H>(cache: &mut Cache<H>) {
    let available = available_memory();
    evict_if_low(cache, available);
}

fn evict_if_low<H>(cache: &mut Cache<H>, available: u64) {
    // available == 0 means the sample failed; do not evict blind
    if available == 0 || available >= EVICTION_THRESHOLD_BYTES {
        return;
    }

    if cache.len() > 1 {
        tracing::info!(
            available_gb = available as f64 / (1024.0 * 1024.0 * 1024.0),
            "low memory, evicting model cache"
        );

        let evicted = cache.evict_to_most_recent();
        tracing::info!(evicted, retained = cache.len(), "model cache evicted");
        checkpoint("after_model_cleanup");
    }
}

fn process_rss() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    sys.process(pid).map(|p| p.memory())
}
