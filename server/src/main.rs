//! Entity gateway server: reads settings and the catalog file, registers a PostgreSQL store per
//! declaration and serves the gateway routes.
//!
//! Run from repo root: `cargo run -p entity-gateway-server`

use entity_gateway::{build_catalog, connect_stores, gateway_routes, load_catalog_file, AppState, Settings};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("entity_gateway=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let file = load_catalog_file(&settings.catalog_path).await?;
    let catalog = build_catalog(&file.stores)?;
    let stores = connect_stores(&file.stores, &settings.pool)?;
    let state = AppState::new(catalog, stores, settings.default_technology);

    let app = gateway_routes(state, settings.body_limit_bytes);
    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("entity gateway listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
