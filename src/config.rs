use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, with the same defaults as `from_env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let server_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let ttl_minutes = positive_or(&lookup, "JWT_TTL_MINUTES", 20)?;
        let ttl_secs = ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Invalid {
                key: "JWT_TTL_MINUTES",
                value: ttl_minutes.to_string(),
            })?;
        let timeout_secs = positive_or(&lookup, "STORE_TIMEOUT_SECS", 10)?;

        Ok(Self {
            database_url,
            server_port,
            server_host,
            jwt_secret,
            jwt_ttl: Duration::from_secs(ttl_secs),
            store_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn positive_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt_ttl, Duration::from_secs(20 * 60));
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert_eq!(config.server_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("JWT_TTL_MINUTES", "5"),
            ("STORE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.jwt_ttl, Duration::from_secs(300));
        assert_eq!(config.store_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_missing_required() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "secret")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn test_config_invalid_values() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "SERVER_PORT",
                value: "eighty".into()
            }
        );

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("JWT_TTL_MINUTES", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JWT_TTL_MINUTES", .. }));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://test"),
            ("JWT_SECRET", "secret"),
            ("JWT_TTL_MINUTES", "18446744073709551615"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "JWT_TTL_MINUTES",
                value: "18446744073709551615".into()
            }
        );
    }
}
