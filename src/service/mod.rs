//! Transport-free services: entity CRUD, metadata, relationship graph, SQL gateway.

mod crud;
mod diagram;
mod gateway;
mod metadata;
pub use crud::{page_window, CrudService};
pub use diagram::{DiagramService, GraphColumn, RelationEdge, RelationKind, TableGraphNode};
pub use gateway::{classify, SqlGateway, StatementKind};
pub use metadata::{api_endpoints, ApiEndpoint, EntityMetadata, MetadataService, PropertyMetadata};
