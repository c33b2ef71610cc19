//! Endpoint table: one entry per servable entity, pairing its descriptor with its store.
//! Built once at startup; request handlers only read it.

use crate::catalog::{Catalog, EntityDescriptor};
use crate::error::AppError;
use crate::store::{StoreHandle, StoreRegistry};
use std::collections::HashMap;

pub struct EntityEndpoint {
    pub entity: EntityDescriptor,
    pub store: StoreHandle,
}

#[derive(Default)]
pub struct EndpointTable {
    entries: Vec<EntityEndpoint>,
    by_name: HashMap<String, usize>,
}

impl EndpointTable {
    /// Materialize endpoints for every catalog entity whose store is registered. Entities of
    /// unregistered stores are skipped and answer 404.
    pub fn build(catalog: &Catalog, stores: &StoreRegistry) -> Self {
        let mut table = EndpointTable::default();
        for entity in catalog.entities() {
            let Some(store) = stores.get(&entity.store_id) else {
                tracing::warn!(entity = %entity.name, store_id = %entity.store_id, "store not registered, entity not served");
                continue;
            };
            table.by_name.insert(entity.name.to_lowercase(), table.entries.len());
            table.entries.push(EntityEndpoint {
                entity: entity.clone(),
                store: store.clone(),
            });
        }
        tracing::info!(endpoints = table.entries.len(), "endpoint table built");
        table
    }

    /// Case-insensitive lookup by entity name.
    pub fn get(&self, name: &str) -> Option<&EntityEndpoint> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|&i| self.entries.get(i))
    }

    pub fn resolve(&self, name: &str) -> Result<&EntityEndpoint, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::NotFound(format!("entity '{}'", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityEndpoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
