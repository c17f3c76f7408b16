//! `todoshare` daemon: runs the reminder scanner over an in-memory engine.
//!
//! # Usage
//!
//! ```bash
//! # Scan every minute with a 30 minute window
//! cargo run --bin todoshare
//!
//! # Load a fixture and run a single scan
//! cargo run --bin todoshare -- --seed todoshare/fixtures/demo.json --once
//!
//! # Or via environment variables
//! TODOSHARE_SEED=todoshare/fixtures/demo.json TODOSHARE_LOG=debug cargo run --bin todoshare
//! ```

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use todoshare::Engine;
use todoshare::config::{CliArgs, EngineConfig};
use todoshare::directory::InMemoryDirectory;
use todoshare::reminders::LogNotifier;
use todoshare::seed::Seed;
use todoshare::store::InMemoryTaskStore;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    let config = match EngineConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let engine = Engine::new(
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(InMemoryDirectory::new()),
        config.reminders,
    );

    if let Some(path) = &config.seed_path {
        let applied = match Seed::load(path) {
            Ok(seed) => seed.apply(&engine, Utc::now()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = applied {
            tracing::error!(path = %path.display(), error = %e, "failed to load seed");
            std::process::exit(1);
        }
    }

    if config.run_once {
        match engine.scanner(LogNotifier).scan_once(Utc::now()).await {
            Ok(report) => tracing::info!(
                candidates = report.candidates,
                fired = report.fired.len(),
                suppressed = report.suppressed,
                failed = report.failed,
                "single scan finished"
            ),
            Err(e) => {
                tracing::error!(error = %e, "reminder scan failed");
                std::process::exit(1);
            }
        }
        return;
    }

    let handle = engine.start_scanner(LogNotifier);
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
    handle.stop().await;
}
