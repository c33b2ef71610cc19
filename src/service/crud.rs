//! Generic CRUD over one entity and its store: key parsing, body coercion, paging.

use crate::catalog::EntityDescriptor;
use crate::coerce::{coerce_body, parse_key, render_record, BodyMode, KeyValue};
use crate::error::AppError;
use crate::response::Page;
use crate::store::EntityStore;
use serde_json::Value;

pub struct CrudService;

/// Offset and limit for a page request; None unless both values are positive.
pub fn page_window(page: Option<i64>, page_size: Option<i64>) -> Option<(i64, i64)> {
    match (page, page_size) {
        (Some(p), Some(s)) if p > 0 && s > 0 => Some(((p - 1).saturating_mul(s), s)),
        _ => None,
    }
}

fn not_found(entity: &EntityDescriptor, key: &KeyValue) -> AppError {
    AppError::NotFound(format!("{} with {} = {}", entity.name, entity.key_property, key))
}

impl CrudService {
    /// List in key order. The window applies only when both page and page size are positive;
    /// `page` defaults to 1 and `page_size` to the total count.
    pub async fn list(
        store: &dyn EntityStore,
        entity: &EntityDescriptor,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> Result<Page, AppError> {
        let total_count = store.count(entity).await?;
        let window = page_window(page, page_size);
        let records = store.list(entity, window).await?;
        tracing::debug!(entity = %entity.name, total_count, window = ?window, returned = records.len(), "list");
        Ok(Page {
            data: records.iter().map(|r| render_record(entity, r)).collect(),
            total_count,
            page: page.unwrap_or(1),
            page_size: page_size.unwrap_or(total_count),
        })
    }

    pub async fn read(store: &dyn EntityStore, entity: &EntityDescriptor, raw_id: &str) -> Result<Value, AppError> {
        let key = parse_key(entity.key_type, raw_id)?;
        let record = store
            .find(entity, &key)
            .await?
            .ok_or_else(|| not_found(entity, &key))?;
        Ok(render_record(entity, &record))
    }

    /// Coerce and persist a new record; the response carries the store-assigned key.
    pub async fn create(store: &dyn EntityStore, entity: &EntityDescriptor, body: Value) -> Result<Value, AppError> {
        let record = coerce_body(entity, body, &BodyMode::Create)?;
        let stored = store.insert(entity, record).await?;
        tracing::info!(entity = %entity.name, "created");
        Ok(render_record(entity, &stored))
    }

    /// Full replacement of an existing record. The path key wins over any key in the body.
    pub async fn update(
        store: &dyn EntityStore,
        entity: &EntityDescriptor,
        raw_id: &str,
        body: Value,
    ) -> Result<Value, AppError> {
        let key = parse_key(entity.key_type, raw_id)?;
        if store.find(entity, &key).await?.is_none() {
            return Err(not_found(entity, &key));
        }
        let record = coerce_body(entity, body, &BodyMode::Replace(key.clone()))?;
        let stored = store
            .replace(entity, &key, record)
            .await?
            .ok_or_else(|| not_found(entity, &key))?;
        tracing::info!(entity = %entity.name, key = %key, "updated");
        Ok(render_record(entity, &stored))
    }

    pub async fn delete(store: &dyn EntityStore, entity: &EntityDescriptor, raw_id: &str) -> Result<(), AppError> {
        let key = parse_key(entity.key_type, raw_id)?;
        if store.find(entity, &key).await?.is_none() || !store.remove(entity, &key).await? {
            return Err(not_found(entity, &key));
        }
        tracing::info!(entity = %entity.name, key = %key, "deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_catalog, CollectionDecl, PropertyDecl, StoreDecl};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn product() -> EntityDescriptor {
        let store = StoreDecl::new("shop").collection(
            CollectionDecl::new("Products", "Product")
                .property(PropertyDecl::new("Id", "int"))
                .property(PropertyDecl::new("Name", "string"))
                .property(PropertyDecl::new("Price", "decimal")),
        );
        build_catalog(&[store]).unwrap().entities()[0].clone()
    }

    #[test]
    fn window_requires_both_positive() {
        assert_eq!(page_window(Some(3), Some(10)), Some((20, 10)));
        assert_eq!(page_window(Some(1), None), None);
        assert_eq!(page_window(Some(0), Some(10)), None);
        assert_eq!(page_window(Some(2), Some(-1)), None);
        assert_eq!(page_window(Some(i64::MAX), Some(i64::MAX)), Some((i64::MAX, i64::MAX)));
    }

    #[tokio::test]
    async fn page_length_matches_window() {
        let store = MemoryStore::new();
        let e = product();
        for i in 0..7 {
            CrudService::create(&store, &e, json!({"name": format!("p{}", i), "price": i}))
                .await
                .unwrap();
        }
        for (page, size) in [(1i64, 3i64), (3, 3), (4, 3), (2, 10)] {
            let p = CrudService::list(&store, &e, Some(page), Some(size)).await.unwrap();
            let expected = size.min((7 - (page - 1) * size).max(0));
            assert_eq!(p.data.len() as i64, expected, "page {} size {}", page, size);
            assert_eq!(p.total_count, 7);
        }
        let all = CrudService::list(&store, &e, None, None).await.unwrap();
        assert_eq!((all.page, all.page_size, all.data.len()), (1, 7, 7));
    }

    #[tokio::test]
    async fn update_replaces_and_keeps_path_key() {
        let store = MemoryStore::new();
        let e = product();
        CrudService::create(&store, &e, json!({"name": "lamp", "price": "5.50"})).await.unwrap();
        let updated = CrudService::update(&store, &e, "1", json!({"id": 9, "name": "desk"})).await.unwrap();
        assert_eq!(updated, json!({"id": 1, "name": "desk", "price": 0}));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found_and_bad_ids_are_invalid() {
        let store = MemoryStore::new();
        let e = product();
        assert!(matches!(CrudService::delete(&store, &e, "42").await, Err(AppError::NotFound(_))));
        assert!(matches!(CrudService::read(&store, &e, "42").await, Err(AppError::NotFound(_))));
        assert!(matches!(
            CrudService::update(&store, &e, "42", json!({})).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(CrudService::read(&store, &e, "abc").await, Err(AppError::InvalidKeyFormat(_))));
    }
}
