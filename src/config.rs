use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// SQLite URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
}

impl Config {
    /// Reads `.env` and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let shutdown_grace = match lookup("SHUTDOWN_GRACE_SECS") {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "SHUTDOWN_GRACE_SECS",
                value: value.clone(),
            })?,
            None => DEFAULT_SHUTDOWN_GRACE_SECS,
        };

        Ok(Self {
            bind_addr,
            database_url,
            shutdown_grace: Duration::from_secs(shutdown_grace),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("DATABASE_URL", "sqlite://urls.db"),
            ("SHUTDOWN_GRACE_SECS", "12"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://urls.db"));
        assert_eq!(config.shutdown_grace, Duration::from_secs(12));
    }

    #[test]
    fn blank_database_url_means_memory() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SHUTDOWN_GRACE_SECS", "soon")])).is_err());
    }
}
