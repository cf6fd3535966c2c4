//! Password hashing and access tokens.
//!
//! Passwords are hashed with Argon2 (random salt, PHC string output).
//! Tokens are HS256 JWTs carrying the user's e-mail (`sub`), role and an
//! absolute expiry. There is no session store and no revocation: a token is
//! valid until `exp`, and only the signature and clock decide that.

use std::fmt;
use std::str::FromStr;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::errors::AuthError;

/// Account type chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "jogadora_amadora")]
    AmateurPlayer,
    #[serde(rename = "jogadora_profissional")]
    ProfessionalPlayer,
    #[serde(rename = "olheiro")]
    Scout,
    #[serde(rename = "torcedor")]
    Fan,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::AmateurPlayer,
        Role::ProfessionalPlayer,
        Role::Scout,
        Role::Fan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AmateurPlayer => "jogadora_amadora",
            Role::ProfessionalPlayer => "jogadora_profissional",
            Role::Scout => "olheiro",
            Role::Fan => "torcedor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| value.to_string())
    }
}

/// Hashes a password with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hashing(err.to_string()))
}

/// Checks a password against a stored hash. Malformed hashes never match.
pub fn verify_password(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

/// Identity asserted by a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: String,
    pub role: String,
}

impl TokenClaims {
    pub fn new(subject: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            role: role.into(),
        }
    }
}

/// Claims after validation, including the timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedToken {
    pub subject: String,
    pub role: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl ValidatedToken {
    pub fn claims(&self) -> TokenClaims {
        TokenClaims::new(self.subject.clone(), self.role.clone())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    role: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates signed, expiring tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = decode_secret(&config.jwt_secret);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&secret),
            decoding_key: DecodingKey::from_secret(&secret),
            validation,
            ttl: config.token_ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs `claims`, expiring one ttl from now.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        self.issue_at(claims, Utc::now())
    }

    /// Signs `claims` as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        claims: &TokenClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let payload = JwtClaims {
            sub: claims.subject.clone(),
            role: claims.role.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))
    }

    /// Verifies signature and expiry. Every failure is `InvalidToken`.
    pub fn validate(&self, token: &str) -> Result<ValidatedToken, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;

        // jsonwebtoken accepts exp == now; expiry is exclusive here
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken("ExpiredSignature".into()));
        }

        Ok(ValidatedToken {
            subject: data.claims.sub,
            role: data.claims.role,
            issued_at: data.claims.iat,
            expires_at: data.claims.exp,
        })
    }
}

/// Secrets may be given base64-encoded; anything else is used as raw bytes.
fn decode_secret(secret: &str) -> Vec<u8> {
    if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(secret) {
        if !decoded.is_empty() {
            return decoded;
        }
    }

    secret.as_bytes().to_vec()
}
