//! murmur CLI - transcribe one audio file to a single JSON line on stdout.

use clap::Parser;
use murmur::cli::Cli;
use murmur::run;
use murmur_asr::cache::ModelCache;
use murmur_asr::memory;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let process_start = Instant::now();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    memory::checkpoint("process_start");

    let Some(request) = Cli::parse().into_request() else {
        println!("{}", run::usage_envelope());
        return ExitCode::from(1);
    };

    tracing::info!(
        path = %request.audio.display(),
        model_size = %request.model_size,
        "starting transcription"
    );

    let mut cache = ModelCache::new();

    match run::execute(&mut cache, &request, process_start) {
        Ok(result) => match serde_json::to_string(&result) {
            Ok(line) => {
                println!("{line}");
                tracing::info!("transcription successful");
                ExitCode::SUCCESS
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize result");
                let uptime = process_start.elapsed().as_secs_f64();
                println!(
                    "{}",
                    run::error_envelope("Failed to serialize transcription result", Some(uptime))
                );
                ExitCode::from(1)
            }
        },
        Err(err) => {
            tracing::error!(error = %err, "fatal error");
            let uptime = process_start.elapsed().as_secs_f64();
            println!("{}", run::failure_envelope(&err, &request, uptime));
            ExitCode::from(1)
        }
    }
}
