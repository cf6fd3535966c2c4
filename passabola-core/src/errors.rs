use std::io;

use thiserror::Error;

/// Result type used across the Passa a Bola core crate.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Canonical error representation surfaced by the services.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Erro de validação: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registro não encontrado: {0}")]
    NotFound(String),

    #[error("Erro de I/O: {0}")]
    Io(#[from] io::Error),

    #[error("Erro de autenticação: {0}")]
    Auth(#[from] AuthError),

    #[error("Erro interno: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Short machine-readable code for the error class.
    pub fn code(&self) -> &'static str {
        match self {
            PlatformError::Validation(ValidationError::DuplicateEmail(_)) => "duplicate_email",
            PlatformError::Validation(ValidationError::InvalidRole(_)) => "invalid_role",
            PlatformError::Validation(_) => "validation_error",
            PlatformError::NotFound(_) => "not_found",
            PlatformError::Io(_) => "io_error",
            PlatformError::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            PlatformError::Auth(_) => "auth_error",
            PlatformError::Internal(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::Internal(err.to_string())
    }
}

/// Input rejected by a service before anything is persisted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email já cadastrado. Faça login ou use outro email.")]
    DuplicateEmail(String),

    #[error("Role inválido: {0}. Valores aceitos: jogadora_amadora, jogadora_profissional, olheiro, torcedor")]
    InvalidRole(String),

    #[error("campo {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Email ou senha incorretos")]
    InvalidCredentials,

    #[error("token inválido: {0}")]
    InvalidToken(String),

    #[error("falha ao gerar hash de senha: {0}")]
    Hashing(String),

    #[error("falha ao assinar token: {0}")]
    Signing(String),
}

/// Failure reported by a collection backend. Never leaves the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("falha de I/O na coleção {collection}: {source}")]
    Io {
        collection: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON inválido na coleção {collection}: {message}")]
    Parse { collection: String, message: String },

    #[error("escrita recusada na coleção {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn io(collection: &str, source: io::Error) -> Self {
        StoreError::Io {
            collection: collection.to_string(),
            source,
        }
    }

    pub fn parse(collection: &str, message: impl Into<String>) -> Self {
        StoreError::Parse {
            collection: collection.to_string(),
            message: message.into(),
        }
    }
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Variável de ambiente obrigatória ausente: {0}")]
    MissingEnvVar(String),

    #[error("Valor inválido para {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
