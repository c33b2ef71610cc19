//! Entity gateway: schema-driven CRUD REST API, metadata catalog, relationship diagram and ad hoc
//! SQL execution over registered stores.

pub mod case;
pub mod catalog;
pub mod coerce;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use catalog::{build_catalog, load_catalog_file, Catalog, CatalogFile, CollectionDecl, PropertyDecl, StoreDecl};
pub use error::{AppError, ConfigError, StoreError};
pub use routes::{catalog_routes, common_routes, entity_routes, gateway_routes};
pub use settings::{PoolSettings, Settings};
pub use state::AppState;
pub use store::{connect_stores, EntityStore, MemoryStore, PgStore, StoreHandle, StoreRegistry, StoreTechnology};
