use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: Option<i64>,
    pub upload_dir: PathBuf,
    pub public_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let port = parse_or(&lookup, "PORT", 4000u16)?;
        let token_ttl_hours = match lookup("JWT_EXPIRATION_HOURS") {
            Some(value) => Some(value.parse::<i64>().map_err(|_| ConfigError::Invalid {
                key: "JWT_EXPIRATION_HOURS",
                value,
            })?),
            None => None,
        };

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: required("DATABASE_URL")?,
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "e-commerce".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_hours,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./upload/images")),
            public_url: lookup("PUBLIC_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database_name, "e-commerce");
        assert_eq!(config.upload_dir, PathBuf::from("./upload/images"));
        assert_eq!(config.public_url, "http://localhost:4000");
        assert_eq!(config.token_ttl_hours, None);
    }

    #[test]
    fn requires_secret_and_database() {
        assert_eq!(
            config_from(&[("JWT_SECRET", "secret")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        assert_eq!(
            config_from(&[("DATABASE_URL", "mongodb://localhost")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = config_from(&[
            ("DATABASE_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn trims_public_url() {
        let config = config_from(&[
            ("DATABASE_URL", "mongodb://localhost"),
            ("JWT_SECRET", "secret"),
            ("PUBLIC_URL", "https://shop.example.com/"),
            ("JWT_EXPIRATION_HOURS", "12"),
        ])
        .unwrap();
        assert_eq!(config.public_url, "https://shop.example.com");
        assert_eq!(config.token_ttl_hours, Some(12));
    }
}
