use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use passabola_core::users::NewUser;
use passabola_core::UserService;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::blocking::run_blocking;
use crate::error::AppError;
use crate::extract::{ApiForm, ApiJson};
use crate::security::AuthContext;

pub fn router(users: UserService) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .with_state(users)
}

/// OAuth2 password form: the e-mail travels as `username`.
#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[instrument(skip_all, fields(email = %request.email))]
async fn register(
    State(users): State<UserService>,
    ApiJson(request): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let registered = run_blocking(move || users.register(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "mensagem": "Usuário registrado com sucesso!",
            "email": registered.email,
            "role": registered.role,
        })),
    ))
}

#[instrument(skip_all, fields(email = %form.username))]
async fn login(
    State(users): State<UserService>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<Value>, AppError> {
    let session = run_blocking(move || users.login(&form.username, &form.password)).await?;
    Ok(Json(json!({
        "access_token": session.token,
        "token_type": "bearer",
        "role": session.role,
        "nome": session.nome,
    })))
}

async fn me(Extension(auth): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "email": auth.email,
        "role": auth.role,
        "expires_at": auth.expires_at,
    }))
}
