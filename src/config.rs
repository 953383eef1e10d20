// ⚙️ Configuration - environment variables with defaults

use crate::rates::LocationRateTable;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "HOME_PRICE_DB";
pub const RATES_PATH_VAR: &str = "HOME_PRICE_RATES";
pub const ADDR_VAR: &str = "HOME_PRICE_ADDR";

pub const DEFAULT_DB_PATH: &str = "home_price.db";

/// The browser client talks to port 5000
pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

/// Server `tracing` filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "home_price_estimator=info,tower_http=info";

/// The CLI already reports fallbacks on stdout
pub const CLI_LOG_FILTER: &str = "home_price_estimator=error";

/// Anything on stderr would draw over the terminal form
pub const TUI_LOG_FILTER: &str = "off";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,

    /// Rate table file (`.json` / `.csv`); built-in Bangalore table when `None`
    pub rates_path: Option<PathBuf>,

    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(DB_PATH_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let rates_path = lookup(RATES_PATH_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let addr_str = lookup(ADDR_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_str
            .parse()
            .with_context(|| format!("Invalid {}: {}", ADDR_VAR, addr_str))?;

        Ok(Config {
            db_path: PathBuf::from(db_path),
            rates_path,
            addr,
        })
    }

    pub fn load_rate_table(&self) -> Result<LocationRateTable> {
        match &self.rates_path {
            Some(path) => {
                let table = LocationRateTable::from_path(path)?;
                tracing::info!(path = ?path, locations = table.len(), "rate table loaded");
                Ok(table)
            }
            None => Ok(LocationRateTable::bangalore()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            rates_path: None,
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

/// Install the global `tracing` subscriber (`RUST_LOG` overrides `default_filter`)
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // a second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
