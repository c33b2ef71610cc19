//! Relationship graph: tables, columns and foreign-key edges for every cataloged entity,
//! from each store's live model, or from the catalog alone when no store yields anything.

use crate::catalog::{Catalog, EntityDescriptor};
use crate::store::{LiveTable, StoreRegistry};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableGraphNode {
    pub name: String,
    pub collection_name: String,
    pub table_name: String,
    pub store_id: String,
    pub columns: Vec<GraphColumn>,
    pub relations: Vec<RelationEdge>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub nullable: bool,
    pub is_key: bool,
    pub is_foreign_key: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEdge {
    pub from_table: String,
    pub to_table: String,
    pub from_column: String,
    pub to_column: String,
    pub kind: RelationKind,
}

pub struct DiagramService;

fn live_node(entity: &EntityDescriptor, store_id: &str, table: &LiveTable) -> TableGraphNode {
    let columns = table
        .columns
        .iter()
        .map(|c| GraphColumn {
            name: c.name.clone(),
            type_: c.data_type.clone(),
            nullable: c.nullable,
            is_key: c.is_key,
            is_foreign_key: table.is_foreign_key(&c.name),
        })
        .collect();
    let relations = table
        .foreign_keys
        .iter()
        .map(|fk| RelationEdge {
            from_table: table.name.clone(),
            to_table: fk.referenced_table.clone(),
            from_column: fk.columns.join(","),
            to_column: fk.referenced_columns.join(","),
            kind: if fk.required { RelationKind::OneToOne } else { RelationKind::OneToMany },
        })
        .collect();
    TableGraphNode {
        name: entity.name.clone(),
        collection_name: entity.collection_name.clone(),
        table_name: table.name.clone(),
        store_id: store_id.to_string(),
        columns,
        relations,
    }
}

fn catalog_node(entity: &EntityDescriptor) -> TableGraphNode {
    TableGraphNode {
        name: entity.name.clone(),
        collection_name: entity.collection_name.clone(),
        table_name: entity.table_name.clone(),
        store_id: entity.store_id.clone(),
        columns: entity
            .stored_properties()
            .map(|p| GraphColumn {
                name: p.column.clone(),
                type_: p.scalar.label().to_string(),
                nullable: p.nullable,
                is_key: p.is_key,
                is_foreign_key: false,
            })
            .collect(),
        relations: Vec::new(),
    }
}

impl DiagramService {
    /// Walk stores in registration order. A store whose model cannot be read is logged and
    /// skipped; the catalog-only graph is used only when no store produced a node.
    pub async fn extract(catalog: &Catalog, stores: &StoreRegistry) -> Vec<TableGraphNode> {
        let mut nodes = Vec::new();
        for (store_id, store) in stores.iter() {
            let model = match store.live_model().await {
                Ok(Some(model)) => model,
                Ok(None) => {
                    tracing::debug!(store_id = %store_id, "store has no live model");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(store_id = %store_id, error = %e, "live model unavailable, skipping store");
                    continue;
                }
            };
            for entity in catalog.for_store(store_id) {
                match model.table(&entity.table_name) {
                    Some(table) => nodes.push(live_node(entity, store_id, table)),
                    None => tracing::debug!(entity = %entity.name, table = %entity.table_name, "table not in live model"),
                }
            }
        }
        if nodes.is_empty() {
            tracing::info!("no live model produced nodes, using catalog");
            nodes = catalog.entities().iter().map(catalog_node).collect();
        }
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_catalog, CollectionDecl, PropertyDecl, StoreDecl};
    use crate::store::{LiveColumn, LiveForeignKey, LiveModel, MemoryStore};
    use std::sync::Arc;

    fn catalog() -> Catalog {
        build_catalog(&[StoreDecl::new("main")
            .collection(
                CollectionDecl::new("Orders", "Order")
                    .table("orders")
                    .property(PropertyDecl::new("Id", "int"))
                    .property(PropertyDecl::new("CustomerId", "int")),
            )
            .collection(CollectionDecl::new("Customers", "Customer").table("customers").property(PropertyDecl::new("Id", "int")))])
        .unwrap()
    }

    fn model() -> LiveModel {
        LiveModel {
            tables: vec![
                LiveTable::new("orders")
                    .column(LiveColumn::new("id", "integer", false, true))
                    .column(LiveColumn::new("customer_id", "integer", false, false))
                    .foreign_key(LiveForeignKey {
                        columns: vec!["customer_id".into()],
                        referenced_table: "customers".into(),
                        referenced_columns: vec!["id".into()],
                        required: true,
                    }),
                LiveTable::new("CUSTOMERS").column(LiveColumn::new("id", "integer", false, true)),
            ],
        }
    }

    #[tokio::test]
    async fn live_model_drives_nodes_and_edges() {
        let stores = StoreRegistry::new()
            .with("main", Arc::new(MemoryStore::new().with_live_model(model())))
            .unwrap();
        let nodes = DiagramService::extract(&catalog(), &stores).await;
        assert_eq!(nodes.len(), 2);
        let orders = &nodes[0];
        assert_eq!(orders.relations.len(), 1);
        assert_eq!(orders.relations[0].kind, RelationKind::OneToOne);
        assert!(orders.columns[1].is_foreign_key);
        assert_eq!(nodes[1].table_name, "CUSTOMERS");
        assert_eq!(nodes[1].collection_name, "Customers");
    }

    #[tokio::test]
    async fn falls_back_to_catalog_when_nothing_live() {
        let stores = StoreRegistry::new()
            .with("main", Arc::new(MemoryStore::new().unreachable()))
            .unwrap();
        let nodes = DiagramService::extract(&catalog(), &stores).await;
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.relations.is_empty()));
        assert_eq!(nodes[0].columns[0].type_, "Int32");
        assert_eq!(nodes[0].collection_name, "Orders");
    }
}
