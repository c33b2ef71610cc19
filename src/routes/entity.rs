//! Entity CRUD routes. The entity name is a path parameter; handlers resolve it case-insensitively
//! against the endpoint table, so unknown entities answer 404.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:entity/api", get(list).post(create))
        .route("/:entity/api/:id", get(read).put(update).delete(delete_handler))
        .with_state(state)
}
