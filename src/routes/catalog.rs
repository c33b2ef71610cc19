//! Catalog-wide routes: metadata, diagram, ad hoc SQL.

use crate::handlers::catalog::{diagram, entities, entity_metadata, entity_metadata_plain, metadata};
use crate::handlers::sql::execute;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/metadata", get(metadata))
        .route("/api/metadata/:entity", get(entity_metadata))
        .route("/api/entities", get(entities))
        .route("/api/entities/:entity/metadata", get(entity_metadata_plain))
        .route("/api/diagram", get(diagram))
        .route("/api/sql/execute", post(execute))
        .with_state(state)
}
