//! Runtime configuration, read from the environment.
//!
//! The export path, API base URL, and API token are required; everything
//! else has a default. Missing or empty required variables fail fast with
//! the offending variable named; the pipeline never proceeds on empty
//! defaults.

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const ENV_EXPORT_FILE: &str = "PATH_ECODMS_EXPORT_FILE";
pub const ENV_API_URL: &str = "PAPERLESS_API_URL";
pub const ENV_API_TOKEN: &str = "PAPERLESS_API_TOKEN";
pub const ENV_LEDGER_PATH: &str = "PAPERLESS_MIGRATION_LEDGER";
pub const ENV_POLL_INTERVAL: &str = "ECODMS_POLL_INTERVAL_SECS";
pub const ENV_POLL_MAX_ATTEMPTS: &str = "ECODMS_POLL_MAX_ATTEMPTS";

const DEFAULT_LEDGER_PATH: &str = "migration-ledger.json";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 360;

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the EcoDMS XML export file.
    pub export_file: PathBuf,
    /// Destination API base URL, without a trailing slash.
    pub api_url: String,
    /// Destination API token.
    pub api_token: String,
    /// Path of the idempotency-ledger file.
    pub ledger_path: PathBuf,
    /// Seconds between consumption-task polls.
    pub poll_interval_secs: u64,
    /// Polls per task before giving up.
    pub poll_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let export_file = PathBuf::from(required(ENV_EXPORT_FILE)?);
        let api_url = required(ENV_API_URL)?.trim_end_matches('/').to_string();
        let api_token = required(ENV_API_TOKEN)?;

        let ledger_path = optional(ENV_LEDGER_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH));
        let poll_interval_secs = parse_or(ENV_POLL_INTERVAL, DEFAULT_POLL_INTERVAL_SECS)?;
        let poll_max_attempts = parse_or(ENV_POLL_MAX_ATTEMPTS, DEFAULT_POLL_MAX_ATTEMPTS)?;
        if poll_max_attempts == 0 {
            bail!("{} must be > 0", ENV_POLL_MAX_ATTEMPTS);
        }

        Ok(Config {
            export_file,
            api_url,
            api_token,
            ledger_path,
            poll_interval_secs,
            poll_max_attempts,
        })
    }
}

fn required(name: &str) -> Result<String> {
    match optional(name) {
        Some(value) => Ok(value),
        None => bail!("{} must be set (and non-empty)", name),
    }
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        None => Ok(default),
        Some(value) => match value.parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => bail!("{} is not a valid number: {}", name, e),
        },
    }
}
