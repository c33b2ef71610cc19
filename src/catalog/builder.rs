//! Build the immutable catalog from store declarations: key discovery and descriptor derivation.

use crate::case::to_camel_case;
use crate::catalog::descriptor::{
    declared_collection, declared_nullable, EntityDescriptor, InputKind, KeyType, PropertyDescriptor, ScalarType,
};
use crate::catalog::types::{CollectionDecl, PropertyDecl, StoreDecl};
use crate::error::ConfigError;
use std::collections::{HashMap, HashSet};

/// All entity descriptors across all stores, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entities: Vec<EntityDescriptor>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn entities(&self) -> &[EntityDescriptor] {
        &self.entities
    }

    /// Case-insensitive lookup by entity name.
    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|&i| self.entities.get(i))
    }

    /// Entities of one store (store id compared case-insensitively).
    pub fn for_store<'a>(&'a self, store_id: &'a str) -> impl Iterator<Item = &'a EntityDescriptor> + 'a {
        self.entities.iter().filter(move |e| e.store_id.eq_ignore_ascii_case(store_id))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Pick the key property index: `Id` or `<Entity>Id`, else the explicitly marked key, else the
/// first declared property. Returns None only when there are no properties.
pub fn discover_key(entity_name: &str, properties: &[PropertyDecl]) -> Option<usize> {
    let entity_id = format!("{}Id", entity_name);
    properties
        .iter()
        .position(|p| p.name == "Id" || p.name == entity_id)
        .or_else(|| properties.iter().position(|p| p.key))
        .or(if properties.is_empty() { None } else { Some(0) })
}

fn describe_property(decl: &PropertyDecl, is_key: bool) -> PropertyDescriptor {
    let scalar = ScalarType::from_declared(&decl.type_);
    let is_navigation = decl.navigation || declared_collection(&decl.type_);
    PropertyDescriptor {
        name: decl.name.clone(),
        declared_type: decl.type_.clone(),
        scalar,
        column: decl.column.clone().unwrap_or_else(|| decl.name.clone()),
        nullable: decl.nullable.unwrap_or_else(|| declared_nullable(&decl.type_)),
        is_key,
        is_navigation: is_navigation && !is_key,
        input_kind: InputKind::infer(scalar),
        json_name: to_camel_case(&decl.name),
    }
}

fn describe_collection(store_id: &str, collection: &CollectionDecl) -> Result<EntityDescriptor, ConfigError> {
    let key_index = discover_key(&collection.entity, &collection.properties).ok_or_else(|| ConfigError::NoProperties {
        store_id: store_id.to_string(),
        collection: collection.name.clone(),
    })?;
    let properties: Vec<PropertyDescriptor> = collection
        .properties
        .iter()
        .enumerate()
        .map(|(i, p)| describe_property(p, i == key_index))
        .collect();
    let key = &properties[key_index];
    Ok(EntityDescriptor {
        name: collection.entity.clone(),
        store_id: store_id.to_string(),
        collection_name: collection.name.clone(),
        table_name: collection.table.clone().unwrap_or_else(|| collection.name.clone()),
        key_property: key.name.clone(),
        key_type: KeyType::from(key.scalar),
        properties,
    })
}

/// Derive the catalog. Pure: no I/O. A store with zero collections contributes nothing.
pub fn build_catalog(stores: &[StoreDecl]) -> Result<Catalog, ConfigError> {
    let mut catalog = Catalog::default();
    let mut store_ids = HashSet::new();
    for store in stores {
        if !store_ids.insert(store.id.to_lowercase()) {
            return Err(ConfigError::DuplicateStore(store.id.clone()));
        }
        for collection in &store.collections {
            let entity = describe_collection(&store.id, collection)?;
            let lookup = entity.name.to_lowercase();
            if catalog.by_name.contains_key(&lookup) {
                return Err(ConfigError::DuplicateEntity(entity.name));
            }
            catalog.by_name.insert(lookup, catalog.entities.len());
            catalog.entities.push(entity);
        }
    }
    tracing::info!(entities = catalog.len(), stores = stores.len(), "catalog built");
    Ok(catalog)
}
