use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::loader::CatalogLoader;
use crate::state::CatalogCell;

/// Handle for a running refresher (shutdown + trigger hook).
#[derive(Debug)]
pub struct RefresherHandle {
    shutdown: oneshot::Sender<()>,
    trigger: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl RefresherHandle {
    /// Ask for a reload ahead of the next tick.
    ///
    /// Triggers are coalesced: if one is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the refresher and wait for it to finish.
    ///
    /// A reload already in flight is allowed to complete.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.join.await {
            warn!(error = %err, "catalog refresher task ended abnormally");
        }
    }
}

/// Periodically reloads the catalog into a shared cell.
///
/// - Schedule: first reload one `interval` after spawn, then every `interval`
/// - Failures: logged; the cell keeps its previous catalog and the loop goes on
#[derive(Debug)]
pub struct CatalogRefresher;

impl CatalogRefresher {
    pub fn spawn(
        loader: Arc<CatalogLoader>,
        cell: Arc<CatalogCell>,
        interval: Duration,
    ) -> RefresherHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let join = tokio::spawn(refresh_loop(loader, cell, interval, shutdown_rx, trigger_rx));

        RefresherHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join,
        }
    }
}

async fn refresh_loop(
    loader: Arc<CatalogLoader>,
    cell: Arc<CatalogCell>,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut trigger_rx: mpsc::Receiver<()>,
) {
    // interval_at panics on a zero period.
    let period = interval.max(Duration::from_millis(1));
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(source = %loader.source_kind(), interval_ms = millis(period), "catalog refresher started");

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            _ = ticks.tick() => {}
            Some(()) = trigger_rx.recv() => debug!("catalog refresh triggered"),
        }

        match loader.load_into(&cell).await {
            Ok(report) => debug!(products = report.products, generation = report.generation, "catalog refreshed"),
            Err(err) => warn!(error = %err, "catalog refresh failed; keeping previous catalog"),
        }
    }

    info!("catalog refresher stopped");
}

fn millis(period: Duration) -> u64 {
    u64::try_from(period.as_millis()).unwrap_or(u64::MAX)
}
