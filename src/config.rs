use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    MySql,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StorageBackend::MySql),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown STORAGE_BACKEND `{other}` (expected mysql or memory)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub storage: StorageBackend,
    /// Required when `storage` is MySQL.
    pub database_url: Option<String>,
    pub run_migrations: bool,

    pub api_prefix: String,
    pub rate_api_per_min: u32,

    pub log_dir: String,
}

impl Config {
    /// Reads configuration from the environment; call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = lookup("STORAGE_BACKEND")
            .as_deref()
            .unwrap_or("mysql")
            .parse::<StorageBackend>()?;

        let database_url = lookup("DATABASE_URL");
        if storage == StorageBackend::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set for the mysql storage backend");
        }

        Ok(Self {
            server_addr: lookup("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            storage,
            database_url,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_api_per_min: parse_or(&lookup, "RATE_API_PER_MIN", 1000)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}
