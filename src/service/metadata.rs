//! Entity metadata: catalog descriptors rendered for clients, with generated endpoint URIs and
//! the store technology label.

use crate::catalog::{EntityDescriptor, InputKind, KeyType, PropertyDescriptor};
use crate::store::{StoreRegistry, StoreTechnology};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub name: String,
    pub collection_name: String,
    pub store_id: String,
    pub table_name: String,
    pub key_property: String,
    pub key_type: KeyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_type: Option<String>,
    pub properties: Vec<PropertyMetadata>,
    pub api_endpoints: Vec<ApiEndpoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub input_type: InputKind,
    pub is_key: bool,
    pub is_nullable: bool,
    pub is_navigation: bool,
    pub json_name: String,
}

#[derive(Debug, Serialize)]
pub struct ApiEndpoint {
    pub method: &'static str,
    pub path: String,
    pub description: String,
}

pub struct MetadataService;

fn describe_property(p: &PropertyDescriptor) -> PropertyMetadata {
    PropertyMetadata {
        name: p.name.clone(),
        type_: p.declared_type.clone(),
        input_type: p.input_kind,
        is_key: p.is_key,
        is_nullable: p.nullable,
        is_navigation: p.is_navigation,
        json_name: p.json_name.clone(),
    }
}

/// The five CRUD endpoints served for an entity.
pub fn api_endpoints(entity: &EntityDescriptor) -> Vec<ApiEndpoint> {
    let base = format!("/{}/api", entity.name);
    let item = format!("{}/{{id}}", base);
    let n = &entity.name;
    vec![
        ApiEndpoint { method: "GET", path: base.clone(), description: format!("Get all {}", n) },
        ApiEndpoint { method: "GET", path: item.clone(), description: format!("Get {} by id", n) },
        ApiEndpoint { method: "POST", path: base, description: format!("Create {}", n) },
        ApiEndpoint { method: "PUT", path: item.clone(), description: format!("Update {}", n) },
        ApiEndpoint { method: "DELETE", path: item, description: format!("Delete {}", n) },
    ]
}

impl MetadataService {
    /// Technology label for an entity's store; the default when the store is not registered or
    /// its driver is not recognized.
    pub fn database_type(entity: &EntityDescriptor, stores: &StoreRegistry, default: StoreTechnology) -> StoreTechnology {
        stores
            .get(&entity.store_id)
            .map(|s| StoreTechnology::detect_or(s.driver_name(), default))
            .unwrap_or(default)
    }

    pub fn describe(entity: &EntityDescriptor, database_type: Option<StoreTechnology>) -> EntityMetadata {
        EntityMetadata {
            name: entity.name.clone(),
            collection_name: entity.collection_name.clone(),
            store_id: entity.store_id.clone(),
            table_name: entity.table_name.clone(),
            key_property: entity.key_property.clone(),
            key_type: entity.key_type,
            database_type: database_type.map(|t| t.label().to_string()),
            properties: entity.properties.iter().map(describe_property).collect(),
            api_endpoints: api_endpoints(entity),
        }
    }

    /// Metadata for every entity. `technology` carries the registry and fallback label when the
    /// store technology should be reported.
    pub fn describe_all<'a>(
        entities: impl IntoIterator<Item = &'a EntityDescriptor>,
        technology: Option<(&StoreRegistry, StoreTechnology)>,
    ) -> Vec<EntityMetadata> {
        entities
            .into_iter()
            .map(|e| {
                let db = technology.map(|(stores, default)| Self::database_type(e, stores, default));
                Self::describe(e, db)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_catalog, CollectionDecl, PropertyDecl, StoreDecl};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn catalog() -> crate::catalog::Catalog {
        build_catalog(&[StoreDecl::new("main").collection(
            CollectionDecl::new("Products", "Product")
                .table("products")
                .property(PropertyDecl::new("Id", "int"))
                .property(PropertyDecl::new("SKU", "string"))
                .property(PropertyDecl::new("ReleasedOn", "DateTime?"))
                .property(PropertyDecl::new("Reviews", "ICollection<Review>")),
        )])
        .unwrap()
    }

    #[test]
    fn metadata_shape() {
        let c = catalog();
        let m = serde_json::to_value(MetadataService::describe(&c.entities()[0], None)).unwrap();
        assert_eq!(m["name"], "Product");
        assert_eq!(m["collectionName"], "Products");
        assert_eq!(m["tableName"], "products");
        assert_eq!(m["keyProperty"], "Id");
        assert_eq!(m["keyType"], "Int32");
        assert!(m.get("databaseType").is_none());
        assert_eq!(
            m["properties"][2],
            json!({"name": "ReleasedOn", "type": "DateTime?", "inputType": "datetime-local",
                   "isKey": false, "isNullable": true, "isNavigation": false, "jsonName": "releasedOn"})
        );
        assert_eq!(m["properties"][1]["jsonName"], "sku");
        assert_eq!(m["properties"][3]["isNavigation"], true);
        assert_eq!(m["apiEndpoints"][3], json!({"method": "PUT", "path": "/Product/api/{id}", "description": "Update Product"}));
    }

    #[test]
    fn database_type_falls_back_to_default() {
        let c = catalog();
        let stores = StoreRegistry::new().with("main", Arc::new(MemoryStore::new())).unwrap();
        let all = MetadataService::describe_all(c.entities(), Some((&stores, StoreTechnology::MySql)));
        assert_eq!(all[0].database_type.as_deref(), Some("MySQL"));
        let none = MetadataService::describe_all(c.entities(), None);
        assert!(none[0].database_type.is_none());
    }
}
