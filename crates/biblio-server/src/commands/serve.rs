//! Serve command handler

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;

use biblio_core::{Config, Store};
use biblio_server::{api, sweep, ApiState};

/// Open the store and run the HTTP API until interrupted
pub async fn run(config: Config, bind: Option<String>) -> Result<()> {
    let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
    let sweep_interval = config.sweep_interval_secs;

    let store = Store::open_with_config(config).context("Failed to open database")?;
    let store = Arc::new(Mutex::new(store));

    if sweep_interval > 0 {
        info!(interval_secs = sweep_interval, "Starting overdue sweep");
        sweep::spawn(Arc::clone(&store), Duration::from_secs(sweep_interval));
    }

    let state = Arc::new(ApiState::shared(store));
    api::serve(state, &bind_addr).await
}
