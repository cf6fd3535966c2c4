//! Registration and login over the `users` collection.

use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::{hash_password, verify_password, Role, TokenClaims, TokenService};
use crate::errors::{AuthError, PlatformError, Result, ValidationError};
use crate::store::{collections, CollectionStore, Record};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub nome: String,
    pub email: String,
    pub role: String,
    pub senha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub role: String,
    pub nome: String,
}

#[derive(Clone)]
pub struct UserService {
    store: CollectionStore,
    tokens: TokenService,
}

impl UserService {
    pub fn new(store: CollectionStore, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates an account. The e-mail must not be taken yet.
    pub fn register(&self, request: NewUser) -> Result<RegisteredUser> {
        let audit = self.store.audit();
        if let Err(err) = validate_new_user(&request) {
            audit.log(format!("✗ ERRO de validação no registro: {err}"));
            return Err(err.into());
        }

        let users = self.store.load(collections::USERS);
        if users.iter().any(|user| field_str(user, "email") == Some(request.email.as_str())) {
            audit.log(format!(
                "✗ Tentativa de registro com email duplicado: {}",
                request.email
            ));
            return Err(ValidationError::DuplicateEmail(request.email).into());
        }

        let role: Role = request.role.parse().map_err(|raw| {
            audit.log(format!("✗ Tentativa de registro com role inválido: {raw}"));
            ValidationError::InvalidRole(raw)
        })?;

        let hashed = hash_password(&request.senha).map_err(|err| {
            audit.log(format!("✗ ERRO inesperado no registro: {err}"));
            PlatformError::Internal(err.to_string())
        })?;

        let mut record = Record::new();
        record.insert("nome".into(), Value::String(request.nome));
        record.insert("email".into(), Value::String(request.email.clone()));
        record.insert("hashed_password".into(), Value::String(hashed));
        record.insert("role".into(), Value::String(role.as_str().into()));
        record.insert(
            "data_criacao".into(),
            Value::String(Local::now().naive_local().to_string()),
        );

        if !self.store.insert(collections::USERS, &mut record) {
            audit.log(format!(
                "✗ ERRO inesperado no registro: falha ao salvar {}",
                request.email
            ));
            return Err(PlatformError::Internal(
                "Erro interno ao registrar usuário".into(),
            ));
        }

        info!(email = %request.email, %role, "usuário registrado");
        audit.log(format!(
            "✓ Novo usuário registrado: {} ({role})",
            request.email
        ));
        Ok(RegisteredUser {
            email: request.email,
            role,
        })
    }

    /// Checks credentials and issues an access token.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginSession> {
        let audit = self.store.audit();
        let users = self.store.load(collections::USERS);
        let Some(user) = users
            .iter()
            .find(|user| field_str(user, "email") == Some(email))
        else {
            audit.log(format!(
                "✗ Tentativa de login com email não cadastrado: {email}"
            ));
            return Err(AuthError::InvalidCredentials.into());
        };

        let hash = field_str(user, "hashed_password").unwrap_or_default();
        if !verify_password(password, hash) {
            audit.log(format!("✗ Tentativa de login com senha incorreta: {email}"));
            return Err(AuthError::InvalidCredentials.into());
        }

        let role = field_str(user, "role").unwrap_or_default().to_string();
        let nome = field_str(user, "nome").unwrap_or_default().to_string();
        let token = self
            .tokens
            .issue(&TokenClaims::new(email, role.clone()))
            .map_err(|err| {
                audit.log(format!("✗ ERRO inesperado no login: {err}"));
                PlatformError::Internal(err.to_string())
            })?;

        info!(%email, "login bem-sucedido");
        audit.log(format!("✓ Login bem-sucedido: {email}"));
        Ok(LoginSession { token, role, nome })
    }
}

fn field_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static e-mail pattern compiles")
    })
}

fn validate_new_user(request: &NewUser) -> std::result::Result<(), ValidationError> {
    let name_len = request.nome.chars().count();
    if !(3..=100).contains(&name_len) {
        return Err(ValidationError::field(
            "nome",
            "precisa ter entre 3 e 100 caracteres",
        ));
    }
    if !email_pattern().is_match(&request.email) {
        return Err(ValidationError::field("email", "email inválido"));
    }
    if request.senha.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::field(
            "senha",
            format!("precisa ter no mínimo {MIN_PASSWORD_LEN} caracteres"),
        ));
    }
    Ok(())
}
