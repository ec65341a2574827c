//! murmur: single-shot audio transcription CLI.
//!
//! Exposed as a library so the orchestrator and argument handling can be
//! exercised by integration tests.

pub mod cli;
pub mod run;
