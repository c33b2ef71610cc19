//! Shared application state for all routes. Immutable after startup.

use crate::catalog::Catalog;
use crate::dispatch::EndpointTable;
use crate::store::{StoreRegistry, StoreTechnology};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub stores: Arc<StoreRegistry>,
    pub endpoints: Arc<EndpointTable>,
    /// Reported when a store's driver does not identify its technology.
    pub default_technology: StoreTechnology,
}

impl AppState {
    pub fn new(catalog: Catalog, stores: StoreRegistry, default_technology: StoreTechnology) -> Self {
        let endpoints = EndpointTable::build(&catalog, &stores);
        AppState {
            catalog: Arc::new(catalog),
            stores: Arc::new(stores),
            endpoints: Arc::new(endpoints),
            default_technology,
        }
    }
}
