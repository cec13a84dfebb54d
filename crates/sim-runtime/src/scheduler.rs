//! Fixed-period tick loop with background autosave.

use crate::clock::Clock;
use crate::engine::Engine;
use persistence::SnapshotSlot;
use sim_core::GameState;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Drive `engine` at its configured tick period until `shutdown` resolves.
///
/// Due snapshots are handed to a saver task through a watch channel, so a
/// slow slot only ever delays the save, never the next tick, and a newer
/// snapshot replaces one still waiting. On shutdown the engine is
/// checkpointed and saved once more.
pub async fn run<C, S, F>(engine: Arc<Engine<C>>, slot: Arc<S>, shutdown: F)
where
    C: Clock,
    S: SnapshotSlot,
    F: Future<Output = ()>,
{
    let (tx, rx) = watch::channel::<Option<Arc<GameState>>>(None);
    let saver = tokio::spawn(save_loop(Arc::clone(&slot), rx));

    let period = Duration::from_millis(engine.config().tick_period_ms.max(1));
    let mut interval = tokio::time::interval(period);
    // late ticks are caught up from wall-clock time, not replayed
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut shutdown = std::pin::pin!(shutdown);
    info!(period_ms = period.as_millis() as u64, "scheduler started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                let report = engine.tick();
                if let Some(snapshot) = report.save {
                    tx.send_replace(Some(snapshot));
                }
            }
        }
    }

    drop(tx);
    if let Err(e) = saver.await {
        warn!(error = %e, "autosave task ended abnormally");
    }
    let last = engine.checkpoint();
    match persistence::save(slot.as_ref(), &last).await {
        Ok(()) => info!(cash = last.cash, "final snapshot saved"),
        Err(e) => warn!(error = %format!("{e:#}"), "final save failed"),
    }
}

async fn save_loop<S: SnapshotSlot>(slot: Arc<S>, mut rx: watch::Receiver<Option<Arc<GameState>>>) {
    while rx.changed().await.is_ok() {
        let pending = rx.borrow_and_update().clone();
        if let Some(state) = pending {
            if let Err(e) = persistence::save(slot.as_ref(), &state).await {
                warn!(error = %format!("{e:#}"), "autosave failed");
            }
        }
    }
}
