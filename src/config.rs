use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read from the environment (and `.env` via dotenvy).
///
/// | Env Var                  | Default             |
/// |--------------------------|---------------------|
/// | `DATABASE_URL`           | `sqlite://tasks.db` |
/// | `HOST`                   | `127.0.0.1`         |
/// | `PORT`                   | `3000`              |
/// | `ROLLOVER_INTERVAL_SECS` | `60`                |
/// | `DB_MAX_CONNECTIONS`     | `5`                 |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub rollover_interval_secs: u64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://tasks.db".to_string());
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_var(&lookup, "PORT", 3000)?;
        let rollover_interval_secs = parse_var(&lookup, "ROLLOVER_INTERVAL_SECS", 60)?;
        let db_max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS", 5)?;

        if rollover_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "ROLLOVER_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host,
            port,
            rollover_interval_secs,
            db_max_connections,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
