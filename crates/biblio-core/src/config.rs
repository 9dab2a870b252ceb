//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/biblio/config.toml)
//! 3. Environment variables (BIBLIO_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "BIBLIO";

/// Longest accepted loan period (about a century)
pub const MAX_LOAN_PERIOD_DAYS: u32 = 36_500;

/// Longest accepted token lifetime (about a century)
pub const MAX_TOKEN_TTL_HOURS: u32 = 876_000;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP API listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Days between a loan being issued and falling due
    #[serde(default = "default_loan_period_days")]
    pub loan_period_days: u32,

    /// Lifetime of a login token
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u32,

    /// Seconds between background overdue sweeps (0 disables the sweep)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind_addr: default_bind_addr(),
            loan_period_days: default_loan_period_days(),
            token_ttl_hours: default_token_ttl_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (BIBLIO_DATA_DIR, BIBLIO_BIND_ADDR, ...)
    /// 2. Config file (~/.config/biblio/config.toml or BIBLIO_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject durations too long to add to a timestamp
    pub fn validate(&self) -> Result<()> {
        if self.loan_period_days > MAX_LOAN_PERIOD_DAYS {
            bail!(
                "loan_period_days must be at most {}, got {}",
                MAX_LOAN_PERIOD_DAYS,
                self.loan_period_days
            );
        }
        if self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            bail!(
                "token_ttl_hours must be at most {}, got {}",
                MAX_TOKEN_TTL_HOURS,
                self.token_ttl_hours
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable numeric values are ignored and the previous value kept.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_BIND_ADDR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.bind_addr = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOAN_PERIOD_DAYS", ENV_PREFIX)) {
            if let Ok(days) = val.parse() {
                self.loan_period_days = days;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_TOKEN_TTL_HOURS", ENV_PREFIX)) {
            if let Ok(hours) = val.parse() {
                self.token_ttl_hours = hours;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SWEEP_INTERVAL_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.sweep_interval_secs = secs;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with BIBLIO_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("biblio")
            .join("config.toml")
    }

    /// Get the path to the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("biblio.db")
    }

    pub fn loan_period(&self) -> Duration {
        Duration::days(i64::from(self.loan_period_days))
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.token_ttl_hours))
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("biblio")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_loan_period_days() -> u32 {
    14
}

fn default_token_ttl_hours() -> u32 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "BIBLIO_DATA_DIR",
        "BIBLIO_BIND_ADDR",
        "BIBLIO_LOAN_PERIOD_DAYS",
        "BIBLIO_TOKEN_TTL_HOURS",
        "BIBLIO_SWEEP_INTERVAL_SECS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.loan_period_days, 14);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.data_dir.ends_with("biblio"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();
        assert!(config.database_path().ends_with("biblio.db"));
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.loan_period(), Duration::days(14));
        assert_eq!(config.token_ttl(), Duration::hours(24));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("BIBLIO_DATA_DIR", "/tmp/biblio-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/biblio-test"));
    }

    #[test]
    fn test_env_override_loan_period() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("BIBLIO_LOAN_PERIOD_DAYS", "7");
        config.apply_env_overrides();
        assert_eq!(config.loan_period_days, 7);

        // Garbage keeps the previous value
        env::set_var("BIBLIO_LOAN_PERIOD_DAYS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.loan_period_days, 7);
    }

    #[test]
    fn test_env_override_bind_addr() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("BIBLIO_BIND_ADDR", "0.0.0.0:9000");
        config.apply_env_overrides();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");

        env::set_var("BIBLIO_BIND_ADDR", "");
        config.apply_env_overrides();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/biblio"),
            bind_addr: "0.0.0.0:80".to_string(),
            loan_period_days: 21,
            token_ttl_hours: 8,
            sweep_interval_secs: 0,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("loan_period_days"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.loan_period_days, 21);
        assert_eq!(parsed.sweep_interval_secs, 0);
    }

    #[test]
    fn test_load_from_str_fills_defaults() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(r#"data_dir = "/custom/data""#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.loan_period_days, 14);
        assert_eq!(config.token_ttl_hours, 24);
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        let _guard = EnvGuard::new(ENV_VARS);

        assert!(Config::load_from_str("loan_period_days = 36500").is_ok());
        assert!(Config::load_from_str("loan_period_days = 100000").is_err());
        assert!(Config::load_from_str("token_ttl_hours = 4000000000").is_err());

        env::set_var("BIBLIO_LOAN_PERIOD_DAYS", "200000000");
        assert!(Config::load_from_str("").is_err());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp = tempfile::TempDir::new().unwrap();
        env::set_var("BIBLIO_DATA_DIR", temp.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();

        assert_eq!(config.loan_period_days, 14);
        assert!(config.data_dir.exists());
    }
}
