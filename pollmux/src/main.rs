//! Pollmux binary
//!
//! Runs the scheduler against a demo backend on the real clock and prints
//! merged results to stdout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use eyre::Result;
use rand::Rng;
use tracing::info;

use pollmux::cli::Cli;
use pollmux::{
    Pipeline, PollConfig, PollStream, QueryError, QueryInvoker, QueryResult, SourceId, SystemClock,
};

/// Demo backend: answers `"<id>: result"` after a short random delay
///
/// The jitter makes the merged stream's completion-order behavior visible
/// on the console.
struct DemoInvoker {
    max_latency: Duration,
}

#[async_trait]
impl QueryInvoker for DemoInvoker {
    async fn invoke(&self, source_id: &SourceId) -> Result<String, QueryError> {
        let max_millis = self.max_latency.as_millis() as u64;
        if max_millis > 0 {
            let millis = rand::rng().random_range(0..max_millis);
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        Ok(format!("{source_id}: result"))
    }
}

fn setup_logging(cli_log_level: Option<&str>) {
    let level = match cli_log_level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn build_config(cli: &Cli) -> Result<PollConfig> {
    if let Some(path) = &cli.config {
        return PollConfig::load(path);
    }

    Ok(PollConfig {
        repeat_after_ms: cli.repeat_after_ms,
        padding_ms: cli.padding_ms,
        ..PollConfig::new(cli.sources.iter().map(String::as_str))
    })
}

fn print_result(result: &QueryResult) {
    match &result.outcome {
        Ok(payload) => println!("{payload}"),
        Err(error) => println!("{}: error: {error}", result.source_id),
    }
}

/// Print results until interrupted
async fn run_until_interrupt(results: &mut PollStream) {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            result = results.recv() => match result {
                Some(result) => print_result(&result),
                None => break,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let config = build_config(&cli)?;
    let invoker = Arc::new(DemoInvoker {
        max_latency: Duration::from_millis(cli.max_latency_ms),
    });

    let pipeline = Pipeline::new(config, Arc::new(SystemClock), invoker)?;
    let (mut results, handle) = pipeline.start();

    match cli.take {
        Some(n) => {
            for result in results.take(n).await {
                print_result(&result);
            }
        }
        None => run_until_interrupt(&mut results).await,
    }

    handle.shutdown().await?;
    Ok(())
}
