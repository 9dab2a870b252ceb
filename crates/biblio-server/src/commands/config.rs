//! Config command handlers

use std::path::PathBuf;

use anyhow::Result;

use biblio_core::Config;

use crate::output::{Output, OutputFormat};

/// Show the effective configuration
pub fn show(config: &Config, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Quiet => {
            println!("{}", config.database_path().display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!("  bind_addr:           {}", config.bind_addr);
            println!("  loan_period_days:    {}", config.loan_period_days);
            println!("  token_ttl_hours:     {}", config.token_ttl_hours);
            println!("  sweep_interval_secs: {}", config.sweep_interval_secs);
            println!();
            println!("Config file: {}", effective_path.display());
            println!("Database:    {}", config.database_path().display());
        }
    }

    Ok(())
}
