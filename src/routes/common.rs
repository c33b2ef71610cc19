//! Common routes: health, readiness, version.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    stores: BTreeMap<String, &'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Ping every registered store; degraded when any of them fails.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let mut stores = BTreeMap::new();
    let mut degraded = false;
    for (id, store) in state.stores.iter() {
        let status = match store.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(store_id = %id, error = %e, "store not ready");
                degraded = true;
                "unavailable"
            }
        };
        stores.insert(id.to_string(), status);
    }
    if degraded {
        (StatusCode::SERVICE_UNAVAILABLE, Json(ReadyBody { status: "degraded", stores }))
    } else {
        (StatusCode::OK, Json(ReadyBody { status: "ok", stores }))
    }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /health, /ready, /version, /info.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(version))
        .with_state(state)
}
