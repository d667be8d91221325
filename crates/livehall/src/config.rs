//! Server configuration loaded from the environment.

use std::env;

use tracing::{info, warn};

/// Environment variable holding the listen address.
pub const BIND_ENV: &str = "LIVEHALL_BIND";
/// Environment variable holding the PostgreSQL connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable capping the database pool size.
pub const DB_MAX_CONNECTIONS_ENV: &str = "LIVEHALL_DB_MAX_CONNECTIONS";

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Runtime settings of a LiveHall server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// When set, rooms and users are stored in PostgreSQL instead of memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup(BIND_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.bind_addr);

        let database_url = lookup(DATABASE_URL_ENV).filter(|value| !value.trim().is_empty());

        let db_max_connections = match lookup(DB_MAX_CONNECTIONS_ENV) {
            None => defaults.db_max_connections,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(
                        value = %raw,
                        default = defaults.db_max_connections,
                        "invalid {DB_MAX_CONNECTIONS_ENV}; using default"
                    );
                    defaults.db_max_connections
                }
            },
        };

        let config = Self {
            bind_addr,
            database_url,
            db_max_connections,
        };
        info!(
            bind = %config.bind_addr,
            backend = config.backend_name(),
            db_max_connections = config.db_max_connections,
            "server configuration loaded"
        );
        config
    }

    /// `"postgres"` when a database URL is configured, `"memory"` otherwise.
    pub fn backend_name(&self) -> &'static str {
        if self.database_url.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_empty_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.backend_name(), "memory");
    }

    #[test]
    fn test_from_lookup_reads_all_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            (BIND_ENV, "127.0.0.1:9000"),
            (DATABASE_URL_ENV, "postgres://localhost/livehall"),
            (DB_MAX_CONNECTIONS_ENV, "12"),
        ]));

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/livehall"));
        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.backend_name(), "postgres");
    }

    #[test]
    fn test_from_lookup_invalid_pool_size_falls_back() {
        for raw in ["zero", "0", "-3", ""] {
            let config = ServerConfig::from_lookup(lookup(&[(DB_MAX_CONNECTIONS_ENV, raw)]));
            assert_eq!(config.db_max_connections, 5, "value {raw:?}");
        }
    }

    #[test]
    fn test_from_lookup_blank_database_url_means_memory() {
        let config = ServerConfig::from_lookup(lookup(&[(DATABASE_URL_ENV, "  ")]));

        assert_eq!(config.database_url, None);
    }
}
