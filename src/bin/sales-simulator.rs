//! Synthetic sales stream simulator
//!
//! Run with: `cargo run --bin sales-simulator`
//!
//! Generates a batch of synthetic sales records on a fixed interval and
//! uploads each batch to the sales store in one transaction. Stops cleanly
//! on ctrl-c; an in-flight batch always completes first.

use sales_forecast::{run_simulator, AppConfig, SalesGenerator, SimulatorConfig, SqliteSalesStore};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let store = SqliteSalesStore::new(&config.db_path)?;
    let generator = SalesGenerator::new();
    let simulator_config = SimulatorConfig::new(
        config.batch_size,
        Duration::from_secs(config.interval_secs),
    );

    println!("🚀 Sales simulator started");
    println!("   Database: {}", config.db_path);
    println!(
        "   Streaming {} records every {} seconds (ctrl-c to stop)",
        simulator_config.batch_size,
        config.interval_secs
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
        }
    };
    run_simulator(generator, &store, &simulator_config, shutdown).await;

    println!("Simulator stopped.");
    Ok(())
}
