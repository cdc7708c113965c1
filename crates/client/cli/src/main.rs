//! Terminal entry point: plays a scripted skirmish and prints every runtime
//! event as a JSON line.
mod config;
mod presentation;
mod scenario;

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use combat_runtime::{Runtime, Topic, TracingDamageListener};

use config::CliConfig;
use presentation::TerminalPresentation;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    setup_logging();

    let runtime = Runtime::builder()
        .config(config.runtime.clone())
        .roster(scenario::roster())
        .positioning(scenario::arena())
        .presentation(TerminalPresentation::new(config.animation_delay))
        .listener(Arc::new(TracingDamageListener))
        .build()
        .await?;
    let handle = runtime.handle();

    let mut receivers = handle.subscribe_multiple(&Topic::ALL);
    let printers: Vec<_> = receivers
        .drain()
        .map(|(_, mut rx)| {
            tokio::spawn(async move {
                while let Ok(event) = rx.recv().await {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{line}"),
                        Err(err) => tracing::warn!("failed to encode event: {err}"),
                    }
                }
            })
        })
        .collect();

    let outcome = scenario::play(&handle, config.max_rounds).await?;
    tracing::info!(
        winner = ?outcome.winner,
        rounds = outcome.rounds,
        "battle finished"
    );

    drop(handle);
    runtime.shutdown().await?;
    for printer in printers {
        let _ = printer.await;
    }

    Ok(())
}

/// Logs to stderr so stdout stays a clean event stream.
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
