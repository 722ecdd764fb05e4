//! Process configuration, read from environment variables.
//!
//! | Variable                | Default   | Meaning                              |
//! |-------------------------|-----------|--------------------------------------|
//! | `HOST`                  | `0.0.0.0` | interface to bind                    |
//! | `PORT`                  | `3000`    | port to bind                         |
//! | `ROOMCODE_POOL_SIZE`    | `10000`   | number of codes (`1..=10000`)        |
//! | `ROOMCODE_RECLAIM_SECS` | `10`      | seconds before unconfirmed codes return |
//! | `ROOMCODE_STATIC_DIR`   | unset     | directory served for unmatched paths |

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use roomcode_alloc::AllocatorConfig;

/// Errors from reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but can't be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub pool_size: u16,
    pub reclaim_after: Duration,
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let alloc = AllocatorConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            pool_size: alloc.pool_size,
            reclaim_after: alloc.reclaim_after,
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Loads configuration from a map (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = vars.get("HOST").cloned().unwrap_or(defaults.host);
        let port = parse_var(vars, "PORT")?.unwrap_or(defaults.port);
        let pool_size = parse_var(vars, "ROOMCODE_POOL_SIZE")?.unwrap_or(defaults.pool_size);
        let reclaim_after = parse_var::<u64>(vars, "ROOMCODE_RECLAIM_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.reclaim_after);
        let static_dir = vars
            .get("ROOMCODE_STATIC_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if pool_size == 0 || pool_size > roomcode_protocol::Code::UNIVERSE {
            return Err(ConfigError::Invalid {
                var: "ROOMCODE_POOL_SIZE",
                value: pool_size.to_string(),
                reason: format!("must be between 1 and {}", roomcode_protocol::Code::UNIVERSE),
            });
        }

        Ok(Self {
            host,
            port,
            pool_size,
            reclaim_after,
            static_dir,
        })
    }

    /// `host:port`, ready for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The allocator settings carried by this config.
    pub fn allocator_config(&self) -> AllocatorConfig {
        AllocatorConfig {
            pool_size: self.pool_size,
            reclaim_after: self.reclaim_after,
        }
    }
}

/// Parses an optional variable. Unset and empty both mean "use default".
fn parse_var<T>(vars: &HashMap<String, String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(var).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars_empty_uses_defaults() {
        let config = ServerConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.pool_size, 10_000);
        assert_eq!(config.reclaim_after, Duration::from_secs(10));
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn test_from_vars_reads_all_variables() {
        let config = ServerConfig::from_vars(&vars(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("ROOMCODE_POOL_SIZE", "5"),
            ("ROOMCODE_RECLAIM_SECS", "30"),
            ("ROOMCODE_STATIC_DIR", "./static"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.reclaim_after, Duration::from_secs(30));
        assert_eq!(config.static_dir, Some(PathBuf::from("./static")));

        let alloc = config.allocator_config();
        assert_eq!(alloc.pool_size, 5);
        assert_eq!(alloc.reclaim_after, Duration::from_secs(30));
    }

    #[test]
    fn test_from_vars_empty_port_uses_default() {
        let config = ServerConfig::from_vars(&vars(&[("PORT", "")])).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_from_vars_rejects_non_numeric_port() {
        let result = ServerConfig::from_vars(&vars(&[("PORT", "http")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
    }

    #[test]
    fn test_from_vars_rejects_zero_pool() {
        let result = ServerConfig::from_vars(&vars(&[("ROOMCODE_POOL_SIZE", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { var: "ROOMCODE_POOL_SIZE", .. })
        ));
    }

    #[test]
    fn test_from_vars_rejects_pool_beyond_universe() {
        let result = ServerConfig::from_vars(&vars(&[("ROOMCODE_POOL_SIZE", "10001")]));
        assert!(result.is_err());
    }
}
