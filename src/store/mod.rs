//! Store abstraction: the per-store persistence seam, the ordered store registry, and the
//! live-model shapes used by relationship extraction.

pub mod memory;
pub mod postgres;

use crate::catalog::EntityDescriptor;
use crate::coerce::{KeyValue, Record};
use crate::error::{AppError, ConfigError, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use memory::MemoryStore;
pub use postgres::{connect_stores, PgStore};

/// Rows returned by an ad hoc read statement. Columns are known even when there are no rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabularResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Introspected schema of a store.
#[derive(Clone, Debug, Default)]
pub struct LiveModel {
    pub tables: Vec<LiveTable>,
}

impl LiveModel {
    /// Table lookup by name, case-insensitive.
    pub fn table(&self, name: &str) -> Option<&LiveTable> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Clone, Debug, Default)]
pub struct LiveTable {
    pub name: String,
    pub columns: Vec<LiveColumn>,
    pub foreign_keys: Vec<LiveForeignKey>,
}

impl LiveTable {
    pub fn new(name: impl Into<String>) -> Self {
        LiveTable {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(mut self, column: LiveColumn) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: LiveForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// True when the column takes part in any foreign key of this table.
    pub fn is_foreign_key(&self, column: &str) -> bool {
        self.foreign_keys
            .iter()
            .any(|fk| fk.columns.iter().any(|c| c.eq_ignore_ascii_case(column)))
    }
}

#[derive(Clone, Debug)]
pub struct LiveColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub is_key: bool,
}

impl LiveColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool, is_key: bool) -> Self {
        LiveColumn {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            is_key,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LiveForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// All referencing columns are NOT NULL.
    pub required: bool,
}

/// One persistence backend. Implementations own their connection handling; every call is
/// independent and scoped to one request.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Driver identifier used for technology detection (e.g. "sqlx-postgres").
    fn driver_name(&self) -> &str;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn count(&self, entity: &EntityDescriptor) -> Result<i64, StoreError>;

    /// Rows ordered by key; `window` is (offset, limit).
    async fn list(&self, entity: &EntityDescriptor, window: Option<(i64, i64)>) -> Result<Vec<Record>, StoreError>;

    async fn find(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<Option<Record>, StoreError>;

    /// Persist a new record and return it as stored, including a store-assigned key.
    async fn insert(&self, entity: &EntityDescriptor, record: Record) -> Result<Record, StoreError>;

    /// Replace every field of the record with `key`. None when no such record exists.
    async fn replace(&self, entity: &EntityDescriptor, key: &KeyValue, record: Record) -> Result<Option<Record>, StoreError>;

    /// Remove the record with `key`. False when no such record exists.
    async fn remove(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<bool, StoreError>;

    /// Introspected schema. Ok(None) when the store has no introspectable model.
    async fn live_model(&self) -> Result<Option<LiveModel>, StoreError>;

    /// Run a read statement and materialize every row.
    async fn query(&self, sql: &str) -> Result<TabularResult, AppError>;

    /// Run a write statement and report affected rows.
    async fn execute(&self, sql: &str) -> Result<u64, AppError>;
}

pub type StoreHandle = Arc<dyn EntityStore>;

/// Stores in registration order. "First available" means first registered.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    stores: Vec<(String, StoreHandle)>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store. Ids are unique case-insensitively.
    pub fn register(&mut self, id: impl Into<String>, store: StoreHandle) -> Result<(), ConfigError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(ConfigError::DuplicateStore(id));
        }
        tracing::info!(store_id = %id, driver = store.driver_name(), "store registered");
        self.stores.push((id, store));
        Ok(())
    }

    pub fn with(mut self, id: impl Into<String>, store: StoreHandle) -> Result<Self, ConfigError> {
        self.register(id, store)?;
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&StoreHandle> {
        self.stores
            .iter()
            .find(|(sid, _)| sid.eq_ignore_ascii_case(id))
            .map(|(_, s)| s)
    }

    pub fn first(&self) -> Option<(&str, &StoreHandle)> {
        self.stores.first().map(|(id, s)| (id.as_str(), s))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoreHandle)> {
        self.stores.iter().map(|(id, s)| (id.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Store for an explicit id (case-insensitive); an unknown or absent id falls back to the
    /// first registered store.
    pub fn resolve(&self, id: Option<&str>) -> Result<(&str, &StoreHandle), AppError> {
        if let Some(wanted) = id.map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((sid, s)) = self.stores.iter().find(|(sid, _)| sid.eq_ignore_ascii_case(wanted)) {
                return Ok((sid.as_str(), s));
            }
            tracing::warn!(store_id = %wanted, "unknown store id, using first registered store");
        }
        self.first().ok_or(AppError::NoStoreAvailable)
    }
}

/// Store technology label. Advisory; derived from the driver name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreTechnology {
    PostgreSql,
    SqlServer,
    MySql,
    Sqlite,
    Oracle,
}

impl StoreTechnology {
    /// Case-insensitive substring match on a driver or provider name.
    pub fn detect(driver: &str) -> Option<Self> {
        let d = driver.to_ascii_lowercase();
        if d.contains("postgres") || d.contains("npgsql") {
            Some(StoreTechnology::PostgreSql)
        } else if d.contains("sqlserver") || d.contains("mssql") || d.contains("sql server") {
            Some(StoreTechnology::SqlServer)
        } else if d.contains("mysql") || d.contains("mariadb") {
            Some(StoreTechnology::MySql)
        } else if d.contains("sqlite") {
            Some(StoreTechnology::Sqlite)
        } else if d.contains("oracle") {
            Some(StoreTechnology::Oracle)
        } else {
            None
        }
    }

    pub fn detect_or(driver: &str, default: StoreTechnology) -> Self {
        Self::detect(driver).unwrap_or(default)
    }

    pub fn label(self) -> &'static str {
        match self {
            StoreTechnology::PostgreSql => "PostgreSQL",
            StoreTechnology::SqlServer => "SQL Server",
            StoreTechnology::MySql => "MySQL",
            StoreTechnology::Sqlite => "SQLite",
            StoreTechnology::Oracle => "Oracle",
        }
    }
}

impl fmt::Display for StoreTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StoreTechnology {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::detect(&compact).ok_or_else(|| ConfigError::InvalidSetting {
            name: "DEFAULT_STORE_TECHNOLOGY",
            message: format!("unknown store technology '{}'", s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technology_detection_is_substring_and_case_insensitive() {
        assert_eq!(StoreTechnology::detect("sqlx-postgres"), Some(StoreTechnology::PostgreSql));
        assert_eq!(StoreTechnology::detect("Microsoft.Data.SqlClient (SqlServer)"), Some(StoreTechnology::SqlServer));
        assert_eq!(StoreTechnology::detect("MYSQL"), Some(StoreTechnology::MySql));
        assert_eq!(StoreTechnology::detect("memory"), None);
        assert_eq!(
            StoreTechnology::detect_or("memory", StoreTechnology::Sqlite),
            StoreTechnology::Sqlite
        );
        assert_eq!("SQL Server".parse::<StoreTechnology>().unwrap(), StoreTechnology::SqlServer);
        assert!("db2".parse::<StoreTechnology>().is_err());
    }

    #[test]
    fn registry_resolves_case_insensitively_then_first() {
        let reg = StoreRegistry::new()
            .with("Main", Arc::new(MemoryStore::new()))
            .unwrap()
            .with("archive", Arc::new(MemoryStore::new()))
            .unwrap();
        assert_eq!(reg.resolve(Some("ARCHIVE")).unwrap().0, "archive");
        assert_eq!(reg.resolve(Some("missing")).unwrap().0, "Main");
        assert_eq!(reg.resolve(None).unwrap().0, "Main");
        assert!(matches!(
            reg.clone().with("main", Arc::new(MemoryStore::new())),
            Err(ConfigError::DuplicateStore(_))
        ));
        assert!(matches!(StoreRegistry::new().resolve(None), Err(AppError::NoStoreAvailable)));
    }
}
