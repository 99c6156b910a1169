use crate::generate::SalesGenerator;
use crate::store::{SalesStore, UploadError};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Configuration for the ingestion simulator loop.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Records generated and uploaded per cycle (default: 5)
    pub batch_size: usize,
    /// Time between cycle starts (default: 10s)
    pub interval: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            batch_size: 5,
            interval: Duration::from_secs(10),
        }
    }
}

impl SimulatorConfig {
    /// Creates a new simulator configuration.
    pub fn new(batch_size: usize, interval: Duration) -> Self {
        SimulatorConfig {
            batch_size,
            interval,
        }
    }
}

/// Runs one generate-and-upload cycle.
///
/// Pure with respect to scheduling: generates `batch_size` records and writes
/// them as a single transactional batch.
///
/// # Returns
/// Returns the number of rows written.
///
/// # Errors
/// Returns `UploadError` if the batch insert fails; the whole batch is then
/// considered lost and the caller moves on to the next cycle.
pub fn run_cycle<S: SalesStore + ?Sized>(
    generator: &mut SalesGenerator,
    store: &S,
    batch_size: usize,
) -> Result<usize, UploadError> {
    let records = generator.generate(batch_size);
    store.insert_records(&records)
}

/// Drives `run_cycle` on a fixed interval until `shutdown` resolves.
///
/// Cycles never overlap: the next tick is not observed until the current
/// cycle's upload has completed, so back-pressure holds by construction. A
/// failed cycle is logged and the loop continues with the next independent
/// batch. Shutdown is only observed between cycles, which means an in-flight
/// batch always commits or fails atomically before the loop exits.
pub async fn run_simulator<S, F>(
    mut generator: SalesGenerator,
    store: &S,
    config: &SimulatorConfig,
    shutdown: F,
) where
    S: SalesStore + ?Sized,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(
        batch_size = config.batch_size,
        interval_secs = config.interval.as_secs_f64(),
        "sales simulator started"
    );

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("sales simulator shutting down");
                break;
            }
            _ = ticker.tick() => {
                match run_cycle(&mut generator, store, config.batch_size) {
                    Ok(written) => tracing::info!(rows = written, "uploaded sales batch"),
                    Err(e) => tracing::warn!(error = %e, "upload cycle failed, batch lost"),
                }
            }
        }
    }
}
