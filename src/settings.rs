//! Process settings from the environment (optionally seeded from `.env` by the binary).

use crate::error::ConfigError;
use crate::store::StoreTechnology;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Label reported when a store's driver name does not identify its technology.
    pub default_technology: StoreTechnology,
    pub pool: PoolSettings,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            catalog_path: PathBuf::from("sample/catalog.json"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            default_technology: StoreTechnology::PostgreSql,
            pool: PoolSettings::default(),
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Settings {
    /// Read settings from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, so callers can supply something other than the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Settings::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Ok(Settings {
            catalog_path: get("CATALOG_PATH").map(PathBuf::from).unwrap_or(d.catalog_path),
            bind_addr: parse_var(&get, "BIND_ADDR")?.unwrap_or(d.bind_addr),
            default_technology: match get("DEFAULT_STORE_TECHNOLOGY") {
                Some(v) => v.parse()?,
                None => d.default_technology,
            },
            pool: PoolSettings {
                max_connections: parse_var(&get, "STORE_MAX_CONNECTIONS")?.unwrap_or(d.pool.max_connections),
                acquire_timeout: parse_var::<u64>(&get, "STORE_ACQUIRE_TIMEOUT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(d.pool.acquire_timeout),
            },
            body_limit_bytes: parse_var(&get, "REQUEST_BODY_LIMIT_BYTES")?.unwrap_or(d.body_limit_bytes),
        })
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidSetting {
                name,
                message: format!("'{}': {}", raw, e),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = from(&[]).unwrap();
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.pool.max_connections, 5);
        assert_eq!(s.default_technology, StoreTechnology::PostgreSql);
        assert_eq!(s.body_limit_bytes, 2_097_152);
    }

    #[test]
    fn overrides_are_parsed() {
        let s = from(&[
            ("BIND_ADDR", "127.0.0.1:8081"),
            ("STORE_MAX_CONNECTIONS", "12"),
            ("STORE_ACQUIRE_TIMEOUT_SECS", "3"),
            ("DEFAULT_STORE_TECHNOLOGY", "sqlite"),
        ])
        .unwrap();
        assert_eq!(s.bind_addr.port(), 8081);
        assert_eq!(s.pool.max_connections, 12);
        assert_eq!(s.pool.acquire_timeout, Duration::from_secs(3));
        assert_eq!(s.default_technology, StoreTechnology::Sqlite);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        match from(&[("STORE_MAX_CONNECTIONS", "many")]) {
            Err(ConfigError::InvalidSetting { name, .. }) => assert_eq!(name, "STORE_MAX_CONNECTIONS"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
