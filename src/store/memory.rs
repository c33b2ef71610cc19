//! In-process store. Records live in ordered maps keyed by entity key, so listing is key-ordered.

use crate::catalog::{EntityDescriptor, KeyType};
use crate::coerce::{FieldValue, KeyValue, Record};
use crate::error::{AppError, StoreError};
use crate::store::{EntityStore, LiveModel, TabularResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, BTreeMap<KeyValue, Record>>>,
    live_model: Option<LiveModel>,
    unreachable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report this model from `live_model`.
    pub fn with_live_model(mut self, model: LiveModel) -> Self {
        self.live_model = Some(model);
        self
    }

    /// Fail every call with `StoreError::Unavailable`.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unreachable {
            return Err(StoreError::Unavailable("memory store marked unreachable".into()));
        }
        Ok(())
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory store lock poisoned".into())
    }

    fn next_key(entity: &EntityDescriptor, rows: &BTreeMap<KeyValue, Record>) -> Result<KeyValue, StoreError> {
        match entity.key_type {
            KeyType::Int16 | KeyType::Int32 | KeyType::Int64 => {
                let max = rows
                    .keys()
                    .filter_map(|k| match k {
                        KeyValue::Int(n) => Some(*n),
                        _ => None,
                    })
                    .max()
                    .unwrap_or(0);
                Ok(KeyValue::Int(max + 1))
            }
            KeyType::Guid => Ok(KeyValue::Uuid(uuid::Uuid::new_v4())),
            KeyType::Other => Err(StoreError::Rejected(format!(
                "{} requires an explicit '{}'",
                entity.name, entity.key_property
            ))),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn driver_name(&self) -> &str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn count(&self, entity: &EntityDescriptor) -> Result<i64, StoreError> {
        self.check()?;
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.get(&entity.name).map_or(0, |rows| rows.len() as i64))
    }

    async fn list(&self, entity: &EntityDescriptor, window: Option<(i64, i64)>) -> Result<Vec<Record>, StoreError> {
        self.check()?;
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        let Some(rows) = tables.get(&entity.name) else { return Ok(Vec::new()) };
        let (skip, take) = match window {
            Some((offset, limit)) => (offset.max(0) as usize, limit.max(0) as usize),
            None => (0, usize::MAX),
        };
        Ok(rows.values().skip(skip).take(take).cloned().collect())
    }

    async fn find(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<Option<Record>, StoreError> {
        self.check()?;
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.get(&entity.name).and_then(|rows| rows.get(key)).cloned())
    }

    async fn insert(&self, entity: &EntityDescriptor, mut record: Record) -> Result<Record, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let rows = tables.entry(entity.name.clone()).or_default();
        let key = match record.get(&entity.key_property).and_then(KeyValue::from_field) {
            Some(k) => k,
            None => Self::next_key(entity, rows)?,
        };
        if rows.contains_key(&key) {
            return Err(StoreError::Rejected(format!("{} with key {} already exists", entity.name, key)));
        }
        record.insert(entity.key_property.clone(), key.to_field());
        rows.insert(key, record.clone());
        Ok(record)
    }

    async fn replace(&self, entity: &EntityDescriptor, key: &KeyValue, mut record: Record) -> Result<Option<Record>, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let Some(slot) = tables.get_mut(&entity.name).and_then(|rows| rows.get_mut(key)) else {
            return Ok(None);
        };
        record.insert(entity.key_property.clone(), key.to_field());
        for prop in entity.stored_properties() {
            record.entry(prop.name.clone()).or_insert(FieldValue::Null);
        }
        *slot = record.clone();
        Ok(Some(record))
    }

    async fn remove(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<bool, StoreError> {
        self.check()?;
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        Ok(tables
            .get_mut(&entity.name)
            .map_or(false, |rows| rows.remove(key).is_some()))
    }

    async fn live_model(&self) -> Result<Option<LiveModel>, StoreError> {
        self.check()?;
        Ok(self.live_model.clone())
    }

    async fn query(&self, _sql: &str) -> Result<TabularResult, AppError> {
        Err(StoreError::Rejected("raw sql is not supported by the in-memory store".into()).into())
    }

    async fn execute(&self, _sql: &str) -> Result<u64, AppError> {
        Err(StoreError::Rejected("raw sql is not supported by the in-memory store".into()).into())
    }
}
