use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use mixerp_auth::Actor;

use super::service::{DedupError, DuplicateDetector};
use super::store::{AlertStore, EntitySource};

/// Config for the background duplicate scan.
#[derive(Debug, Clone)]
pub struct ScanRunner {
    /// Time between scheduled scans. `None` runs only on startup and on trigger.
    pub interval: Option<Duration>,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for ScanRunner {
    fn default() -> Self {
        Self {
            interval: Some(Duration::from_secs(3600)),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
        }
    }
}

/// Handle for a running scan task (trigger + shutdown).
#[derive(Debug)]
pub struct ScanRunnerHandle {
    trigger: Arc<Notify>,
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl ScanRunnerHandle {
    /// Request a scan as soon as possible.
    ///
    /// Triggers are coalesced: several calls while a scan is pending or running produce
    /// at most one extra scan.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Stop the task and wait for it to finish the scan in progress, if any.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.join.await {
            warn!(error = %e, "duplicate scan runner task ended abnormally");
        }
    }
}

impl ScanRunner {
    /// Spawn the scan loop on the current tokio runtime.
    ///
    /// - Runs once on startup, then every `interval`
    /// - `handle.trigger()` requests an extra run
    /// - Failures are logged and retried with bounded exponential backoff; they never
    ///   stop the loop
    pub fn spawn<E, A>(
        &self,
        detector: Arc<DuplicateDetector<E, A>>,
        actor: Actor,
    ) -> ScanRunnerHandle
    where
        E: EntitySource + 'static,
        A: AlertStore + 'static,
    {
        let trigger = Arc::new(Notify::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let join = tokio::spawn(run_loop(
            self.clone(),
            detector,
            actor,
            trigger.clone(),
            shutdown_rx,
        ));

        ScanRunnerHandle {
            trigger,
            shutdown: Some(shutdown_tx),
            join,
        }
    }
}

async fn run_loop<E, A>(
    cfg: ScanRunner,
    detector: Arc<DuplicateDetector<E, A>>,
    actor: Actor,
    trigger: Arc<Notify>,
    mut shutdown: oneshot::Receiver<()>,
) where
    E: EntitySource,
    A: AlertStore,
{
    info!(actor = %actor.display_name, interval = ?cfg.interval, "duplicate scan runner started");

    // Far-future deadline stands in for "no schedule".
    let idle = Duration::from_secs(60 * 60 * 24 * 365);
    let period = cfg.interval.unwrap_or(idle);
    let mut next_tick = Instant::now() + period;
    let mut failures: u32 = 0;
    let mut pending = true; // run once on startup

    loop {
        if pending {
            pending = false;
            match detector.scan(&actor).await {
                Ok(report) => {
                    failures = 0;
                    info!(
                        alerts_created = report.alerts_created,
                        pairs_considered = report.pairs_considered,
                        "scheduled duplicate scan completed"
                    );
                }
                Err(DedupError::Unauthorized(e)) => {
                    // Retrying cannot fix a role problem.
                    warn!(error = %e, "scan actor is not allowed to scan; stopping runner");
                    break;
                }
                Err(e) => {
                    failures += 1;
                    warn!(error = %e, attempt = failures, "duplicate scan failed");
                    if failures <= cfg.max_retries {
                        let wait = backoff(cfg.base_backoff, failures);
                        tokio::select! {
                            _ = &mut shutdown => break,
                            _ = tokio::time::sleep(wait) => {}
                        }
                        pending = true;
                        continue;
                    }
                    failures = 0;
                }
            }
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = trigger.notified() => pending = true,
            _ = sleep_until(next_tick) => {
                pending = true;
                let now = Instant::now();
                // Keep a stable cadence even if we were delayed.
                while next_tick <= now {
                    next_tick += period;
                }
            }
        }
    }

    info!("duplicate scan runner stopped");
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    // base * 2^(attempt-1), capped at 10s.
    let pow = 1u32 << attempt.saturating_sub(1).min(10);
    let ms = base.as_millis().saturating_mul(u128::from(pow));
    Duration::from_millis(u64::try_from(ms.min(10_000)).unwrap_or(10_000))
}
