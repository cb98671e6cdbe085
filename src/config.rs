// src/config.rs

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

const DEFAULT_EXPORT_BASE: &str = "https://docs.google.com/spreadsheets/d";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub sheet_id: Option<String>,
    pub sheet_export_base: String,
    pub cache_ttl_days: u32,
    pub warmup_timeout: Duration,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: try_load("PORT", 3000),
            sheet_id: var("SHEET_ID"),
            sheet_export_base: var("SHEET_EXPORT_BASE")
                .unwrap_or_else(|| DEFAULT_EXPORT_BASE.to_string()),
            cache_ttl_days: try_load("CACHE_TTL_DAYS", 30),
            warmup_timeout: Duration::from_secs(try_load("WARMUP_TIMEOUT_SECS", 8)),
            fetch_timeout: Duration::from_secs(try_load("FETCH_TIMEOUT_SECS", 30)),
        }
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.cache_ttl_days))
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}
