use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{self, header, HeaderMap, HeaderValue, Method, Request};
use axum::middleware::Next;
use axum::response::Response;
use passabola_core::auth::ValidatedToken;
use passabola_core::TokenService;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::config::SecurityConfig;
use crate::error::AppError;

/// Identidade autenticada extraída do token bearer.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub email: String,
    pub role: String,
    pub expires_at: i64,
}

impl From<ValidatedToken> for AuthContext {
    fn from(token: ValidatedToken) -> Self {
        Self {
            email: token.subject,
            role: token.role,
            expires_at: token.expires_at,
        }
    }
}

#[derive(Clone)]
pub struct SecurityState {
    config: SecurityConfig,
    tokens: TokenService,
}

impl SecurityState {
    pub fn new(config: SecurityConfig, tokens: TokenService) -> Self {
        Self { config, tokens }
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let wildcard = self
            .config
            .cors_allowed_origins
            .iter()
            .any(|origin| origin == "*");

        let origins: Vec<_> = self
            .config
            .cors_allowed_origins
            .iter()
            .filter(|origin| origin.as_str() != "*")
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(%origin, ?err, "origem inválida configurada para CORS");
                    None
                }
            })
            .collect();

        let methods = vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ];

        let headers = vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
        ];

        let layer = CorsLayer::new()
            .allow_methods(AllowMethods::list(methods))
            .allow_headers(AllowHeaders::list(headers));

        if wildcard || origins.is_empty() {
            // credentials cannot be combined with a wildcard origin
            if self.config.cors_allow_credentials {
                warn!("CORS com origem '*' ignora allow_credentials");
            }
            layer.allow_origin(AllowOrigin::any())
        } else {
            layer
                .allow_origin(AllowOrigin::list(origins))
                .allow_credentials(self.config.cors_allow_credentials)
        }
    }

    /// Reads are public; writes under `/api/` and `/auth/me` need a token.
    pub fn is_public_path(&self, method: &Method, path: &str) -> bool {
        if *method == Method::OPTIONS {
            return true;
        }

        if path == "/auth/me" {
            return false;
        }

        if self
            .config
            .public_paths
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            return true;
        }

        let is_read = *method == Method::GET || *method == Method::HEAD;
        !(path.starts_with("/api/") && !is_read)
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthContext, AppError> {
        self.tokens
            .validate(token)
            .map(AuthContext::from)
            .map_err(|err| AppError::unauthorized(err.to_string()))
    }
}

pub async fn enforce_auth(
    State(state): State<Arc<SecurityState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    if state.is_public_path(&method, &path) {
        return Ok(next.run(request).await);
    }

    let token = extract_bearer(request.headers()).ok_or_else(|| {
        warn!(%path, "requisição sem cabeçalho Authorization");
        AppError::unauthorized("Não autenticado")
    })?;

    let context = state.validate_token(&token).map_err(|err| {
        warn!(%path, reason = %err, "token rejeitado");
        AppError::unauthorized("Token inválido ou expirado")
    })?;

    debug!(email = %context.email, %path, "requisição autenticada");
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

/// Prefix match on whole path segments: `/api/events` covers `/api/events/3`
/// but not `/api/eventsX`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use passabola_core::config::AuthConfig;

    use super::*;

    fn state(public_paths: Vec<String>) -> SecurityState {
        SecurityState::new(
            SecurityConfig {
                public_paths,
                ..SecurityConfig::default()
            },
            TokenService::new(&AuthConfig::new("segredo")),
        )
    }

    #[test]
    fn reads_are_public_and_writes_are_not() {
        let state = state(Vec::new());
        assert!(state.is_public_path(&Method::GET, "/api/players/"));
        assert!(state.is_public_path(&Method::GET, "/api/events/3"));
        assert!(state.is_public_path(&Method::POST, "/auth/login"));
        assert!(state.is_public_path(&Method::POST, "/auth/register"));
        assert!(state.is_public_path(&Method::OPTIONS, "/api/players/1"));
        assert!(!state.is_public_path(&Method::POST, "/api/players/"));
        assert!(!state.is_public_path(&Method::PUT, "/api/events/1"));
        assert!(!state.is_public_path(&Method::DELETE, "/api/events/1"));
        assert!(!state.is_public_path(&Method::GET, "/auth/me"));
    }

    #[test]
    fn configured_prefixes_open_writes() {
        let state = state(vec!["/api/events".into()]);
        assert!(state.is_public_path(&Method::POST, "/api/events"));
        assert!(state.is_public_path(&Method::POST, "/api/events/"));
        assert!(state.is_public_path(&Method::DELETE, "/api/events/3"));
        assert!(!state.is_public_path(&Method::POST, "/api/players/"));
    }

    #[test]
    fn prefixes_match_whole_segments() {
        let state = state(vec!["/api/events/".into()]);
        assert!(!state.is_public_path(&Method::POST, "/api/eventsX"));
        assert!(!state.is_public_path(&Method::POST, "/api/events-old/1"));
        assert!(state.is_public_path(&Method::PUT, "/api/events/1"));
    }

    #[test]
    fn token_consumer_is_never_public() {
        let state = state(vec!["/auth".into(), "/".into()]);
        assert!(!state.is_public_path(&Method::GET, "/auth/me"));
        assert!(state.is_public_path(&Method::POST, "/auth/register"));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc.def "));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));
    }
}
