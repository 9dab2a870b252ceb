//! One-off overdue sweep

use anyhow::{Context, Result};
use chrono::Utc;

use biblio_core::{Config, Store};

use crate::output::Output;

pub fn run(config: Config, output: &Output) -> Result<()> {
    let mut store = Store::open_with_config(config).context("Failed to open database")?;
    let updated = store.refresh_overdue(Utc::now())?;

    output.success(&format!("Marked {} loan(s) overdue", updated));
    Ok(())
}
