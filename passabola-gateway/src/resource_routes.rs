use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use passabola_core::{Record, ResourceKind, ResourceService};
use serde_json::{json, Value};
use tracing::instrument;

use crate::blocking::run_blocking;
use crate::error::AppError;
use crate::extract::ApiJson;

/// Mounts list/create at `base` (with and without trailing slash) and
/// get/update/delete at `base/:id`.
pub fn router(service: ResourceService, base: &str) -> Router {
    Router::new()
        .route(base, get(list).post(create))
        .route(&format!("{base}/"), get(list).post(create))
        .route(
            &format!("{base}/:id"),
            get(fetch).put(update).delete(remove),
        )
        .with_state(service)
}

#[derive(Clone, Copy)]
enum Action {
    Created,
    Updated,
    Deleted,
}

fn confirmation(kind: ResourceKind, action: Action) -> &'static str {
    match (kind, action) {
        (ResourceKind::Players, Action::Created) => "Jogadora criada com sucesso",
        (ResourceKind::Players, Action::Updated) => "Jogadora atualizada com sucesso",
        (ResourceKind::Players, Action::Deleted) => "Jogadora deletada com sucesso",
        (ResourceKind::Events, Action::Created) => "Evento criado com sucesso",
        (ResourceKind::Events, Action::Updated) => "Evento atualizado com sucesso",
        (ResourceKind::Events, Action::Deleted) => "Evento deletado com sucesso",
    }
}

async fn list(State(service): State<ResourceService>) -> Result<Json<Vec<Record>>, AppError> {
    let records = run_blocking(move || Ok(service.list())).await?;
    Ok(Json(records))
}

#[instrument(skip_all, fields(collection = service.kind().collection(), %id))]
async fn fetch(
    State(service): State<ResourceService>,
    Path(id): Path<String>,
) -> Result<Json<Record>, AppError> {
    let record = run_blocking(move || service.get(&id)).await?;
    Ok(Json(record))
}

#[instrument(skip_all, fields(collection = service.kind().collection()))]
async fn create(
    State(service): State<ResourceService>,
    ApiJson(fields): ApiJson<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let kind = service.kind();
    let record = run_blocking(move || service.create(fields)).await?;
    let id = record.get("id").cloned().unwrap_or(Value::Null);

    let mut body = serde_json::Map::new();
    body.insert("mensagem".into(), Value::from(confirmation(kind, Action::Created)));
    body.insert("id".into(), id);
    body.insert(kind.singular().into(), Value::Object(record));
    Ok((StatusCode::CREATED, Json(Value::Object(body))))
}

#[instrument(skip_all, fields(collection = service.kind().collection(), %id))]
async fn update(
    State(service): State<ResourceService>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<Record>,
) -> Result<Json<Value>, AppError> {
    let kind = service.kind();
    let target = id.clone();
    run_blocking(move || service.update(&target, &patch)).await?;
    Ok(Json(json!({
        "mensagem": confirmation(kind, Action::Updated),
        "id": id,
    })))
}

#[instrument(skip_all, fields(collection = service.kind().collection(), %id))]
async fn remove(
    State(service): State<ResourceService>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let kind = service.kind();
    let target = id.clone();
    run_blocking(move || service.delete(&target)).await?;
    Ok(Json(json!({
        "mensagem": confirmation(kind, Action::Deleted),
        "id": id,
    })))
}
