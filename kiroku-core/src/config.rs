use log::LevelFilter;
use std::env;

use crate::errors::{KirokuError, Result};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings read from the process environment.
///
/// | Env Var                  | Default |
/// |--------------------------|---------|
/// | `DATABASE_URL`           | required |
/// | `KIROKU_LOG_LEVEL`       | `info`  |
/// | `KIROKU_MAX_CONNECTIONS` | `5`     |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub log_level: LevelFilter,
    pub max_connections: u32,
}

impl Config {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            log_level: LevelFilter::Info,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            KirokuError::Config("DATABASE_URL must be specified or present in the environment".into())
        })?;

        let log_level = match env::var("KIROKU_LOG_LEVEL") {
            Ok(raw) => parse_level(&raw)
                .ok_or_else(|| KirokuError::Config(format!("unknown log level: {raw}")))?,
            Err(_) => LevelFilter::Info,
        };

        let max_connections = match env::var("KIROKU_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| {
                KirokuError::Config(format!("KIROKU_MAX_CONNECTIONS must be a number: {e}"))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            log_level,
            max_connections: max_connections.max(1),
        })
    }
}

pub fn parse_level(level: &str) -> Option<LevelFilter> {
    let lvl = match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    };
    Some(lvl)
}
