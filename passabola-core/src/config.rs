use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::ConfigError;

/// Seven days, the lifetime of an access token unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 7;

/// Storage and process settings shared by the gateway and the CLI.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub seed_dir: Option<PathBuf>,
    pub http_bind: String,
}

impl CoreConfig {
    /// Loads configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = read("PASSABOLA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("database"));
        let log_file = read("PASSABOLA_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs.txt"));
        let seed_dir = read("PASSABOLA_SEED_DIR").map(PathBuf::from);
        let http_bind = read("PASSABOLA_BIND").unwrap_or_else(|| "0.0.0.0:8000".to_string());

        Ok(Self {
            data_dir,
            log_file,
            seed_dir,
            http_bind,
        })
    }
}

/// Token signing settings. The secret has no built-in fallback.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: chrono::Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("PASSABOLA_JWT_SECRET")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("PASSABOLA_JWT_SECRET".to_string()))?;

        let ttl_minutes = parse_value::<i64>(
            "PASSABOLA_TOKEN_TTL_MINUTES",
            lookup("PASSABOLA_TOKEN_TTL_MINUTES"),
            DEFAULT_TOKEN_TTL_MINUTES,
        )?;
        if ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "PASSABOLA_TOKEN_TTL_MINUTES",
                message: "precisa ser positivo".into(),
            });
        }

        Ok(Self {
            jwt_secret,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
        })
    }
}

/// Parses an optional raw value, falling back to `default` when absent or blank.
pub fn parse_value<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.trim().is_empty() => {
            T::from_str(value.trim()).map_err(|err| ConfigError::InvalidValue {
                key,
                message: err.to_string(),
            })
        }
        _ => Ok(default),
    }
}
