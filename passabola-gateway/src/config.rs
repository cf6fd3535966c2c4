use std::env;

use passabola_core::config::{parse_value, AuthConfig, CoreConfig};
use passabola_core::errors::ConfigError;

/// Configuração do gateway carregada a partir das variáveis de ambiente.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub core: CoreConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            core: CoreConfig::from_lookup(&lookup)?,
            auth: AuthConfig::from_lookup(&lookup)?,
            security: SecurityConfig::from_lookup(&lookup)?,
        })
    }

    pub fn bind_address(&self) -> &str {
        &self.core.http_bind
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub cors_allowed_origins: Vec<String>,
    pub cors_allow_credentials: bool,
    /// Path prefixes, matched on whole segments, that skip the bearer check.
    /// `/auth/me` always requires a token.
    pub public_paths: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: vec!["*".to_string()],
            cors_allow_credentials: false,
            public_paths: Vec::new(),
        }
    }
}

impl SecurityConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cors_allowed_origins = lookup("PASSABOLA_ALLOWED_ORIGINS")
            .map(|value| split_list(&value))
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        let cors_allow_credentials = parse_value::<u64>(
            "PASSABOLA_ALLOW_CREDENTIALS",
            lookup("PASSABOLA_ALLOW_CREDENTIALS"),
            0,
        )? != 0;

        let public_paths = lookup("PASSABOLA_PUBLIC_PATHS")
            .map(|value| split_list(&value))
            .unwrap_or_default();

        Ok(Self {
            cors_allowed_origins,
            cors_allow_credentials,
            public_paths,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
