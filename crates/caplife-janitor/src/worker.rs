//! Background worker for continuous Janitor operation

use crate::{Janitor, JanitorError, JanitorMetrics};
use crate::health::HealthReport;
use caplife_domain::CaptureStore;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Background worker that runs the archiver and the sweeper on their schedules
///
/// Two independent tick loops share one [`Janitor`]; its per-class locks keep
/// them from touching the same class at the same time.
///
/// # Examples
///
/// ```no_run
/// use caplife_janitor::{Janitor, JanitorConfig, JanitorWorker};
/// use caplife_store::FsStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = JanitorConfig::from_file("caplife.toml")?;
///     let janitor = Janitor::new(FsStore::new(&config.root), config)?;
///     let worker = JanitorWorker::new(janitor);
///
///     // Run until Ctrl+C
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker<S> {
    janitor: Janitor<S>,
    archive_interval: Duration,
    sweep_interval: Duration,
    health_file: Option<PathBuf>,
}

impl<S: CaptureStore> JanitorWorker<S> {
    /// Create a worker driving `janitor` at its configured intervals
    pub fn new(janitor: Janitor<S>) -> Self {
        let archive_interval = janitor.config().archive_interval();
        let sweep_interval = janitor.config().sweep_interval();
        Self {
            janitor,
            archive_interval,
            sweep_interval,
            health_file: None,
        }
    }

    /// Mirror the health report to a JSON file after every pass
    pub fn with_health_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.health_file = Some(path.into());
        self
    }

    /// The janitor being driven
    pub fn janitor(&self) -> &Janitor<S> {
        &self.janitor
    }

    /// Get the janitor's current metrics
    pub fn metrics(&self) -> JanitorMetrics {
        self.janitor.metrics()
    }

    /// Reset the janitor's metrics counters
    pub fn reset_metrics(&self) {
        self.janitor.reset_metrics();
    }

    /// Run until Ctrl+C or [`Janitor::request_shutdown`]
    ///
    /// In-flight passes stop at the next file boundary; a rename that has
    /// started always completes.
    pub async fn run(&self) -> Result<(), JanitorError> {
        tracing::info!(
            "Janitor worker started (archive every {:?}, sweep every {:?})",
            self.archive_interval,
            self.sweep_interval
        );

        let archive = tokio::spawn(archive_loop(
            self.janitor.clone(),
            self.archive_interval,
            self.health_file.clone(),
        ));
        let sweep = tokio::spawn(sweep_loop(
            self.janitor.clone(),
            self.sweep_interval,
            self.health_file.clone(),
        ));

        let mut shutdown = self.janitor.shutdown_signal();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping janitor");
                self.janitor.request_shutdown();
            }
            _ = wait_for_shutdown(&mut shutdown) => {}
        }

        archive.await.map_err(|e| JanitorError::Worker(e.to_string()))?;
        sweep.await.map_err(|e| JanitorError::Worker(e.to_string()))?;

        tracing::info!("Janitor stopped. Final metrics:\n{}", self.janitor.metrics().summary());
        Ok(())
    }

    /// Run a fixed number of archive + sweep cycles back to back (useful for testing)
    ///
    /// # Errors
    ///
    /// Returns the first class error encountered.
    pub async fn run_cycles(&self, cycles: usize) -> Result<(), JanitorError> {
        let mut ticker = interval(self.archive_interval);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.archive_interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting cycle {}/{}", cycle + 1, cycles);

            let archived = self.janitor.archive_all().await;
            let swept = self.janitor.sweep_all().await;
            publish(&self.janitor, self.health_file.as_ref()).await;

            if let Some((_, e)) = archived.errors.into_iter().chain(swept.errors).next() {
                tracing::error!("Cycle {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Janitor finished {} cycles. Final metrics:\n{}",
            cycles,
            self.janitor.metrics().summary()
        );
        Ok(())
    }
}

async fn archive_loop<S: CaptureStore>(janitor: Janitor<S>, period: Duration, health_file: Option<PathBuf>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = janitor.shutdown_signal();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = janitor.archive_all().await;
                tracing::debug!(classes = cycle.reports.len(), "Archive tick done");
                publish(&janitor, health_file.as_ref()).await;
            }
            _ = wait_for_shutdown(&mut shutdown) => break,
        }
    }
}

async fn sweep_loop<S: CaptureStore>(janitor: Janitor<S>, period: Duration, health_file: Option<PathBuf>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = janitor.shutdown_signal();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let cycle = janitor.sweep_all().await;
                tracing::debug!(classes = cycle.reports.len(), "Sweep tick done");
                publish(&janitor, health_file.as_ref()).await;
            }
            _ = wait_for_shutdown(&mut shutdown) => break,
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

/// Write the latest health report, bounded by the operation timeout
async fn publish<S: CaptureStore>(janitor: &Janitor<S>, health_file: Option<&PathBuf>) {
    let Some(path) = health_file.cloned() else {
        return;
    };
    let report: HealthReport = janitor.health().borrow().clone();
    let write = tokio::task::spawn_blocking(move || report.write_to(&path));
    match tokio::time::timeout(janitor.config().operation_timeout(), write).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Failed to write health file"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Health file task failed"),
        Err(_) => tracing::warn!("Writing health file timed out"),
    }
}
