use anyhow::{Context, Result};
use std::str::FromStr;

/// Runtime settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub pool_size: u32,
    pub max_write_retries: u32,
    /// Seconds between overdue sweeps; 0 turns the sweep off
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "revisions.db".into()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:5000".into()),
            pool_size: parse_or(&lookup, "DB_POOL_SIZE", 8)?,
            max_write_retries: parse_or(&lookup, "MAX_WRITE_RETRIES", 5)?,
            sweep_interval_secs: parse_or(&lookup, "SWEEP_INTERVAL_SECS", 0)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}
