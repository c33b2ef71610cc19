//! Ad hoc SQL execution handler.

use crate::error::AppError;
use crate::handlers::entity::json_body;
use crate::response::SqlExecutionResult;
use crate::service::SqlGateway;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlRequest {
    #[serde(default)]
    pub sql: String,
    #[serde(default, alias = "dbContextName")]
    pub store_id: Option<String>,
}

/// POST /api/sql/execute
pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SqlExecutionResult>, AppError> {
    let req: SqlRequest = serde_json::from_value(json_body(body)?)
        .map_err(|e| AppError::Validation(format!("invalid request: {}", e)))?;
    let result = SqlGateway::execute(&state.stores, &req.sql, req.store_id.as_deref()).await?;
    Ok(Json(result))
}
