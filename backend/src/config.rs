//! Runtime settings, read from the process environment.
//!
//! `main` loads an optional `.env` file first, so every variable below can
//! also live there. Only `JWT_SECRET` is mandatory.

use crate::services::lockers::allocator::GridLayout;
use crate::services::lockers::receipt::ReceiptPolicy;
use log::info;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub layout: GridLayout,
    pub receipts: ReceiptPolicy,
    pub static_dir: Option<PathBuf>,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup };

        let jwt_secret = source
            .raw("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let rows: u32 = source.parse("LOCKER_ROWS", 4)?;
        let columns: u32 = source.parse("LOCKER_COLUMNS", 6)?;
        let layout = GridLayout::new(rows, columns).ok_or(ConfigError::Invalid {
            key: "LOCKER_ROWS",
            reason: format!("a {}x{} grid is empty or too large", rows, columns),
        })?;

        let quality: u8 = source.parse("RECEIPT_QUALITY", 50)?;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Invalid {
                key: "RECEIPT_QUALITY",
                reason: format!("{} is outside 1..=100", quality),
            });
        }
        let max_dimension: u32 = source.parse("RECEIPT_MAX_DIMENSION", 800)?;
        if max_dimension == 0 {
            return Err(ConfigError::Invalid {
                key: "RECEIPT_MAX_DIMENSION",
                reason: "must be positive".to_string(),
            });
        }
        let receipts = ReceiptPolicy {
            max_dimension,
            quality,
            max_bytes: source.parse("RECEIPT_MAX_BYTES", 5 * 1024 * 1024)?,
        };

        let admin = match (source.raw("ADMIN_USER"), source.raw("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => {
                let email = source
                    .raw("ADMIN_EMAIL")
                    .unwrap_or_else(|| format!("{}@localhost", username));
                Some(AdminSeed {
                    username,
                    password,
                    email,
                })
            }
            _ => None,
        };

        Ok(Config {
            host: source.raw("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: source.parse("SERVER_PORT", 3000)?,
            database_path: source
                .raw("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("casilleros.sqlite")),
            jwt_secret,
            jwt_ttl: Duration::from_secs(source.parse("JWT_TTL_SECS", 3 * 60 * 60)?),
            layout,
            receipts,
            static_dir: source.raw("STATIC_DIR").map(PathBuf::from),
            admin,
        })
    }
}

struct Source<F> {
    lookup: F,
}

impl<F> Source<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => {
                info!("{key} not set, using default: {default}");
                Ok(default)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let config = load(&[("JWT_SECRET", "s3cret")]).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_ttl, Duration::from_secs(10_800));
        assert_eq!(config.layout.capacity(), 24);
        assert_eq!(config.receipts.max_dimension, 800);
        assert_eq!(config.receipts.quality, 50);
        assert!(config.admin.is_none());
        assert!(config.static_dir.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = load(&[("JWT_SECRET", "x"), ("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_PORT", .. }));

        let err = load(&[("JWT_SECRET", "x"), ("LOCKER_COLUMNS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = load(&[
            ("JWT_SECRET", "x"),
            ("LOCKER_ROWS", "4294967295"),
            ("LOCKER_COLUMNS", "2"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOCKER_ROWS", .. }));

        let err = load(&[("JWT_SECRET", "x"), ("RECEIPT_QUALITY", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "RECEIPT_QUALITY", .. }));
    }

    #[test]
    fn admin_seed_needs_user_and_password() {
        let config = load(&[("JWT_SECRET", "x"), ("ADMIN_USER", "admin")]).unwrap();
        assert!(config.admin.is_none());

        let config = load(&[
            ("JWT_SECRET", "x"),
            ("ADMIN_USER", "admin"),
            ("ADMIN_PASSWORD", "Admin123!"),
        ])
        .unwrap();
        let seed = config.admin.unwrap();
        assert_eq!(seed.username, "admin");
        assert_eq!(seed.email, "admin@localhost");
    }
}
