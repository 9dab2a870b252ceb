//! Background overdue sweep
//!
//! Periodically persists `overdue` for loans past their due date. Each run
//! is idempotent, so a missed or doubled tick is harmless.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use biblio_core::Store;

/// Run one sweep against the shared store
pub async fn run_once(store: &Mutex<Store>) -> usize {
    let mut store = store.lock().await;
    match store.refresh_overdue(Utc::now()) {
        Ok(updated) => {
            debug!(updated, "Overdue sweep finished");
            updated
        }
        Err(e) => {
            error!("Overdue sweep failed: {}", e);
            0
        }
    }
}

/// Spawn a task sweeping every `interval`; the first sweep runs immediately
pub fn spawn(store: Arc<Mutex<Store>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_once(&store).await;
        }
    })
}
