//! Event loop driving reconciliation
//!
//! Reconciles once at startup, then again on every device hotplug event and
//! on a minimum cadence when the bus stays quiet. Event bursts (one unplug
//! fans out to several udev events) are drained into a single pass.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::config::Settings;
use crate::hotplug::DeviceWatcher;
use crate::reconcile::{ReconcileState, Reconciler};

pub struct Daemon {
    reconciler: Reconciler,
    watcher: DeviceWatcher,
    interval: Duration,
    poll_timeout: Duration,
}

impl Daemon {
    pub fn new(reconciler: Reconciler, watcher: DeviceWatcher, settings: &Settings) -> Self {
        Self {
            reconciler,
            watcher,
            interval: settings.interval,
            poll_timeout: settings.poll_timeout,
        }
    }

    /// Run until the shutdown future resolves or the watcher thread dies.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        info!("watching for MIDI devices");
        let mut state = self.reconciler.run_cycle(ReconcileState::default()).await;
        let mut last_reconcile = Instant::now();

        loop {
            tokio::select! {
                event = self.watcher.next() => {
                    let Some(event) = event else {
                        info!("device watcher closed, stopping");
                        return;
                    };
                    info!("device {}: {}", event.action, event.label);
                    while let Some(extra) = self.watcher.try_next() {
                        debug!("device {}: {} (coalesced)", extra.action, extra.label);
                    }
                    state = self.reconciler.run_cycle(state).await;
                    last_reconcile = Instant::now();
                }
                _ = time::sleep(self.poll_timeout) => {
                    if last_reconcile.elapsed() >= self.interval {
                        state = self.reconciler.run_cycle(state).await;
                        last_reconcile = Instant::now();
                    }
                }
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping event loop");
                    return;
                }
            }
        }
    }
}
