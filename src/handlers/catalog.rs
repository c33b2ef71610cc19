//! Catalog-wide handlers: entity metadata and the relationship diagram.

use crate::catalog::EntityDescriptor;
use crate::error::AppError;
use crate::service::{DiagramService, EntityMetadata, MetadataService, TableGraphNode};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /api/metadata: every entity, with the store technology label.
pub async fn metadata(State(state): State<AppState>) -> Json<Vec<EntityMetadata>> {
    Json(MetadataService::describe_all(
        state.catalog.entities(),
        Some((state.stores.as_ref(), state.default_technology)),
    ))
}

/// GET /api/entities: every entity, without the technology label.
pub async fn entities(State(state): State<AppState>) -> Json<Vec<EntityMetadata>> {
    Json(MetadataService::describe_all(state.catalog.entities(), None))
}

fn find_entity<'a>(state: &'a AppState, entity_name: &str) -> Result<&'a EntityDescriptor, AppError> {
    state
        .catalog
        .get(entity_name)
        .ok_or_else(|| AppError::NotFound(format!("entity '{}'", entity_name)))
}

/// GET /api/metadata/:entity: one entity, with the store technology label.
pub async fn entity_metadata(
    State(state): State<AppState>,
    Path(entity_name): Path<String>,
) -> Result<Json<EntityMetadata>, AppError> {
    let entity = find_entity(&state, &entity_name)?;
    let db = MetadataService::database_type(entity, &state.stores, state.default_technology);
    Ok(Json(MetadataService::describe(entity, Some(db))))
}

/// GET /api/entities/:entity/metadata: one entity, without the technology label.
pub async fn entity_metadata_plain(
    State(state): State<AppState>,
    Path(entity_name): Path<String>,
) -> Result<Json<EntityMetadata>, AppError> {
    let entity = find_entity(&state, &entity_name)?;
    Ok(Json(MetadataService::describe(entity, None)))
}

pub async fn diagram(State(state): State<AppState>) -> Json<Vec<TableGraphNode>> {
    Json(DiagramService::extract(&state.catalog, &state.stores).await)
}
