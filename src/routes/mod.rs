//! Router assembly.

mod catalog;
mod common;
mod entity;

pub use catalog::catalog_routes;
pub use common::common_routes;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Every route the gateway serves, with request tracing and a body size limit.
pub fn gateway_routes(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(catalog_routes(state.clone()))
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
}
