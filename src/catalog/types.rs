//! Raw catalog declarations: what the host registers per store, before key discovery.
//! Deserializable from the schema file (snake_case keys) or built in code with the builder methods.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    /// Declared type, e.g. `int32`, `decimal?`, `System.DateTime`, `ICollection<OrderItem>`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Explicit key marker. Only consulted when no `Id` / `<Entity>Id` property exists.
    #[serde(default)]
    pub key: bool,
    /// Column name in the backing table. Defaults to the property name.
    #[serde(default)]
    pub column: Option<String>,
    /// Overrides nullability inferred from a trailing `?` on the declared type.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Relationship accessor with no column of its own.
    #[serde(default)]
    pub navigation: bool,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, type_: impl Into<String>) -> Self {
        PropertyDecl {
            name: name.into(),
            type_: type_.into(),
            ..Default::default()
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn navigation(mut self) -> Self {
        self.navigation = true;
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionDecl {
    /// Collection (set) name, e.g. `Products`. Also the default table name.
    pub name: String,
    /// Entity type name, e.g. `Product`. Used for routes and key discovery.
    pub entity: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
}

impl CollectionDecl {
    pub fn new(name: impl Into<String>, entity: impl Into<String>) -> Self {
        CollectionDecl {
            name: name.into(),
            entity: entity.into(),
            table: None,
            properties: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreDecl {
    pub id: String,
    /// Connection string. Takes precedence over `database_url_env`.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Name of the environment variable holding the connection string.
    #[serde(default)]
    pub database_url_env: Option<String>,
    /// PostgreSQL schema holding the store's tables.
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub collections: Vec<CollectionDecl>,
}

fn default_schema() -> String {
    "public".into()
}

impl StoreDecl {
    pub fn new(id: impl Into<String>) -> Self {
        StoreDecl {
            id: id.into(),
            database_url: None,
            database_url_env: None,
            schema: default_schema(),
            collections: Vec::new(),
        }
    }

    pub fn collection(mut self, collection: CollectionDecl) -> Self {
        self.collections.push(collection);
        self
    }

    /// Connection string for this store: inline value, else the named env var.
    pub fn resolve_database_url(&self) -> Option<String> {
        if let Some(url) = self.database_url.as_ref().filter(|s| !s.is_empty()) {
            return Some(url.clone());
        }
        self.database_url_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|s| !s.is_empty())
    }
}

/// Top-level shape of the schema file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub stores: Vec<StoreDecl>,
}
