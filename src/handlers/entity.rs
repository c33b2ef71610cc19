//! Entity CRUD handlers: list, read, create, update, delete. The entity comes from the first
//! path segment and is resolved against the endpoint table.

use crate::error::AppError;
use crate::response::Page;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Unwrap a JSON body, reporting malformed input as a validation failure.
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v)
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// Integer query parameter; absent or malformed values are ignored.
fn int_param(params: &HashMap<String, String>, name: &str) -> Option<i64> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .and_then(|(_, v)| v.trim().parse().ok())
}

pub async fn list(
    State(state): State<AppState>,
    Path(entity_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page>, AppError> {
    let ep = state.endpoints.resolve(&entity_name)?;
    let page = int_param(&params, "page");
    let page_size = int_param(&params, "pageSize");
    let result = CrudService::list(ep.store.as_ref(), &ep.entity, page, page_size).await?;
    Ok(Json(result))
}

pub async fn read(
    State(state): State<AppState>,
    Path((entity_name, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let ep = state.endpoints.resolve(&entity_name)?;
    Ok(Json(CrudService::read(ep.store.as_ref(), &ep.entity, &id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(entity_name): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let ep = state.endpoints.resolve(&entity_name)?;
    let body = json_body(body)?;
    Ok(Json(CrudService::create(ep.store.as_ref(), &ep.entity, body).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path((entity_name, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let ep = state.endpoints.resolve(&entity_name)?;
    let body = json_body(body)?;
    Ok(Json(CrudService::update(ep.store.as_ref(), &ep.entity, &id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((entity_name, id)): Path<(String, String)>,
) -> Result<axum::http::StatusCode, AppError> {
    let ep = state.endpoints.resolve(&entity_name)?;
    CrudService::delete(ep.store.as_ref(), &ep.entity, &id).await?;
    Ok(axum::http::StatusCode::OK)
}
