use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    mensagem: &'static str,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

async fn root() -> Json<Value> {
    Json(json!({
        "mensagem": "Bem-vindo à API Passa a Bola! ⚽",
        "versao": env!("CARGO_PKG_VERSION"),
        "status": "online",
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        mensagem: "API funcionando corretamente",
    })
}
