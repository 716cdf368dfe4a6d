//! Core Janitor: per-class archive and sweep passes with serialization

use crate::health::{Alert, HealthReport};
use crate::runner::BlockingStore;
use crate::{ArchiveReport, Archiver, JanitorConfig, JanitorError, JanitorMetrics, RetentionSweeper, SweepReport};
use caplife_domain::{ArtifactClass, CaptureStore, Clock, Mode, SystemClock};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{watch, Mutex as AsyncMutex, MutexGuard};
use tokio::task::JoinSet;

/// One execution lock per class
///
/// The archiver and the sweeper both hold a class's lock for their whole pass,
/// so the sweeper never deletes a bucket the archiver is writing into.
struct ClassLocks {
    locks: [AsyncMutex<()>; 4],
}

impl ClassLocks {
    fn new() -> Self {
        Self {
            locks: Default::default(),
        }
    }

    async fn lock(&self, class: ArtifactClass) -> MutexGuard<'_, ()> {
        self.locks[class as usize].lock().await
    }
}

/// Per-class results of one archive or sweep tick
#[derive(Debug)]
pub struct Cycle<R> {
    /// Reports of the classes that completed
    pub reports: Vec<R>,
    /// Classes whose pass was aborted
    pub errors: Vec<(ArtifactClass, JanitorError)>,
}

impl<R> Cycle<R> {
    /// True if every class completed
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Janitor service for the hot/cold capture lifecycle
///
/// Owns the archiver and the retention sweeper for one capture root, the
/// per-class locks that serialize them, and the shared metrics and health.
/// Cheap to clone; clones share all state.
///
/// # Examples
///
/// ```no_run
/// use caplife_janitor::{Janitor, JanitorConfig};
/// use caplife_store::FsStore;
///
/// # async fn example() -> Result<(), caplife_janitor::JanitorError> {
/// let config = JanitorConfig::default();
/// let janitor = Janitor::new(FsStore::new(&config.root), config)?;
///
/// let cycle = janitor.archive_all().await;
/// println!("{} classes archived", cycle.reports.len());
/// println!("{}", janitor.metrics().summary());
/// # Ok(())
/// # }
/// ```
pub struct Janitor<S> {
    config: Arc<JanitorConfig>,
    archiver: Arc<Archiver<S>>,
    sweeper: Arc<RetentionSweeper<S>>,
    clock: Arc<dyn Clock>,
    locks: Arc<ClassLocks>,
    metrics: Arc<Mutex<JanitorMetrics>>,
    health: Arc<watch::Sender<HealthReport>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<S> Clone for Janitor<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            archiver: Arc::clone(&self.archiver),
            sweeper: Arc::clone(&self.sweeper),
            clock: Arc::clone(&self.clock),
            locks: Arc::clone(&self.locks),
            metrics: Arc::clone(&self.metrics),
            health: Arc::clone(&self.health),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S: CaptureStore> Janitor<S> {
    /// Create a Janitor using the system clock
    ///
    /// # Errors
    ///
    /// Returns [`JanitorError::Config`] if the configuration is invalid.
    pub fn new(store: S, config: JanitorConfig) -> Result<Self, JanitorError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create a Janitor with an injected clock
    pub fn with_clock(store: S, config: JanitorConfig, clock: Arc<dyn Clock>) -> Result<Self, JanitorError> {
        config.validate()?;

        let runner = BlockingStore::new(Arc::new(store), config.operation_timeout());
        let mode = Mode::from_dry_run(config.dry_run);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (health, _) = watch::channel(HealthReport::default());

        let archiver = Archiver::new(runner.clone(), config.bucket_clock.into(), mode, shutdown_rx.clone());
        let sweeper = RetentionSweeper::new(
            runner,
            Arc::clone(&clock),
            config.collision_policy,
            mode,
            shutdown_rx,
        );

        Ok(Self {
            config: Arc::new(config),
            archiver: Arc::new(archiver),
            sweeper: Arc::new(sweeper),
            clock,
            locks: Arc::new(ClassLocks::new()),
            metrics: Arc::new(Mutex::new(JanitorMetrics::new())),
            health: Arc::new(health),
            shutdown: Arc::new(shutdown),
        })
    }

    /// Validated configuration
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Snapshot of the current metrics
    pub fn metrics(&self) -> JanitorMetrics {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Reset metrics counters
    pub fn reset_metrics(&self) {
        self.metrics.lock().unwrap_or_else(|e| e.into_inner()).reset();
    }

    /// Subscribe to health updates
    pub fn health(&self) -> watch::Receiver<HealthReport> {
        self.health.subscribe()
    }

    /// Ask running passes to stop at the next file boundary
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Subscribe to the shutdown flag
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Run one archive pass for a single class, holding its lock
    pub async fn archive_class(&self, class: ArtifactClass) -> Result<ArchiveReport, JanitorError> {
        let _guard = self.locks.lock(class).await;
        let capacity = self.config.policy(class).hot_capacity;
        self.archiver.run_pass(class, capacity).await
    }

    /// Run one sweep pass for a single class, holding its lock
    pub async fn sweep_class(&self, class: ArtifactClass) -> Result<SweepReport, JanitorError> {
        let _guard = self.locks.lock(class).await;
        let retention = self.config.policy(class).cold_retention();
        self.sweeper.run_pass(class, retention).await
    }

    /// Archive every class concurrently
    ///
    /// Classes share no state, so a failure in one never affects the others.
    pub async fn archive_all(&self) -> Cycle<ArchiveReport> {
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for class in ArtifactClass::ALL {
            let janitor = self.clone();
            tasks.spawn(async move { (class, janitor.archive_class(class).await) });
        }
        let cycle = collect(tasks).await;

        {
            let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
            for report in &cycle.reports {
                metrics.record_archive(report);
            }
            record_errors(&mut metrics, &cycle.errors);
            metrics.record_archive_pass(start.elapsed().as_millis() as u64);
        }

        let now = self.now();
        let alerts = alerts_from("archive", &cycle.errors, now);
        let total_errors = self.metrics().total_errors();
        self.health.send_modify(|health| {
            health.last_archive = Some(now);
            health.archive_alerts = alerts;
            health.total_errors = total_errors;
            health.refresh_state();
        });

        let moved: usize = cycle.reports.iter().map(|r| r.moved).sum();
        tracing::info!(moved, aborted = cycle.errors.len(), "Archive cycle completed");
        cycle
    }

    /// Sweep every class concurrently
    pub async fn sweep_all(&self) -> Cycle<SweepReport> {
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        for class in ArtifactClass::ALL {
            let janitor = self.clone();
            tasks.spawn(async move { (class, janitor.sweep_class(class).await) });
        }
        let cycle = collect(tasks).await;

        {
            let mut metrics = self.metrics.lock().unwrap_or_else(|e| e.into_inner());
            for report in &cycle.reports {
                metrics.record_sweep(report);
            }
            record_errors(&mut metrics, &cycle.errors);
            metrics.record_sweep_pass(start.elapsed().as_millis() as u64);
        }

        let now = self.now();
        let alerts = alerts_from("sweep", &cycle.errors, now);
        let total_errors = self.metrics().total_errors();
        self.health.send_modify(|health| {
            health.last_sweep = Some(now);
            health.sweep_alerts = alerts;
            health.total_errors = total_errors;
            health.refresh_state();
        });

        let purged: usize = cycle.reports.iter().map(|r| r.files_purged).sum();
        tracing::info!(purged, aborted = cycle.errors.len(), "Sweep cycle completed");
        cycle
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.now())
    }
}

async fn collect<R: 'static>(mut tasks: JoinSet<(ArtifactClass, Result<R, JanitorError>)>) -> Cycle<R> {
    let mut cycle = Cycle {
        reports: Vec::new(),
        errors: Vec::new(),
    };
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(report))) => cycle.reports.push(report),
            Ok((class, Err(e))) => cycle.errors.push((class, e)),
            Err(e) => tracing::error!(error = %e, "Class task panicked"),
        }
    }
    cycle
}

fn record_errors(metrics: &mut JanitorMetrics, errors: &[(ArtifactClass, JanitorError)]) {
    for (class, error) in errors {
        if error.is_alert() {
            tracing::error!(class = %class, error = %error, "Class pass aborted");
            metrics.record_alert(*class);
        } else {
            tracing::warn!(class = %class, error = %error, "Class pass deferred");
            metrics.record_deferred_pass(*class);
        }
    }
}

fn alerts_from(task: &str, errors: &[(ArtifactClass, JanitorError)], at: DateTime<Utc>) -> Vec<Alert> {
    errors
        .iter()
        .filter(|(_, e)| e.is_alert())
        .map(|(class, e)| Alert {
            class: class.to_string(),
            task: task.to_string(),
            message: e.to_string(),
            at,
        })
        .collect()
}
