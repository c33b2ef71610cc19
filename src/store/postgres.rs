//! PostgreSQL store over a sqlx pool: generated CRUD, information_schema / pg_catalog
//! introspection, and raw statement execution.

use crate::catalog::{EntityDescriptor, StoreDecl};
use crate::coerce::{KeyValue, Record};
use crate::error::{AppError, ConfigError, StoreError};
use crate::settings::PoolSettings;
use crate::sql::{self, cell_to_value, decode_property, pg_cast, ColumnType, ColumnTypes, PgBindValue, QueryBuf};
use crate::store::{EntityStore, LiveColumn, LiveForeignKey, LiveModel, LiveTable, StoreRegistry, TabularResult};
use async_trait::async_trait;
use serde_json::json;
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgDatabaseError, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Statement};
use std::sync::Arc;

pub struct PgStore {
    id: String,
    pool: PgPool,
    schema: String,
}

const COLUMNS_SQL: &str = r#"
SELECT c.table_name::text, c.column_name::text, c.data_type::text,
       (c.is_nullable = 'YES') AS nullable,
       EXISTS (
           SELECT 1
           FROM information_schema.table_constraints tc
           JOIN information_schema.key_column_usage k
             ON k.constraint_schema = tc.constraint_schema
            AND k.constraint_name = tc.constraint_name
            AND k.table_name = tc.table_name
           WHERE tc.constraint_type = 'PRIMARY KEY'
             AND tc.table_schema = c.table_schema
             AND tc.table_name = c.table_name
             AND k.column_name = c.column_name
       ) AS is_key
FROM information_schema.columns c
WHERE c.table_schema = $1
ORDER BY c.table_name, c.ordinal_position
"#;

const COLUMN_TYPES_SQL: &str = r#"
SELECT column_name::text, udt_schema::text, udt_name::text
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
"#;

const FOREIGN_KEYS_SQL: &str = r#"
SELECT src.relname::text AS table_name,
       dst.relname::text AS referenced_table,
       array_agg(sa.attname::text ORDER BY k.ord) AS columns,
       array_agg(da.attname::text ORDER BY k.ord) AS referenced_columns,
       bool_and(sa.attnotnull) AS required
FROM pg_constraint con
JOIN pg_class src ON src.oid = con.conrelid
JOIN pg_namespace ns ON ns.oid = src.relnamespace
JOIN pg_class dst ON dst.oid = con.confrelid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_att, dst_att, ord)
JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_att
JOIN pg_attribute da ON da.attrelid = con.confrelid AND da.attnum = k.dst_att
WHERE con.contype = 'f' AND ns.nspname = $1
GROUP BY src.relname, con.conname, dst.relname
ORDER BY src.relname, con.conname
"#;

impl PgStore {
    pub fn new(id: impl Into<String>, pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            id: id.into(),
            pool,
            schema: schema.into(),
        }
    }

    /// Build a lazily connecting pool for a declared store. Nothing is dialed until first use.
    pub fn connect_lazy(decl: &StoreDecl, pool: &PoolSettings) -> Result<Self, StoreError> {
        let url = decl.resolve_database_url().ok_or_else(|| {
            StoreError::Unavailable(format!("store '{}' has no resolvable database url", decl.id))
        })?;
        let pg = PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .acquire_timeout(pool.acquire_timeout)
            .connect_lazy(&url)?;
        Ok(Self::new(decl.id.clone(), pg, decl.schema.clone()))
    }

    fn bind_all<'q>(q: &'q QueryBuf) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue(p.clone()));
        }
        query
    }

    /// Live column types of the entity's table. Only read when some stored property has no fixed
    /// PostgreSQL mapping; every other entity binds without it.
    async fn column_types(&self, entity: &EntityDescriptor) -> Result<ColumnTypes, StoreError> {
        if entity.stored_properties().all(|p| pg_cast(p.scalar).is_some()) {
            return Ok(ColumnTypes::default());
        }
        tracing::debug!(sql = %COLUMN_TYPES_SQL, table = %entity.table_name, "introspect column types");
        let rows: Vec<(String, String, String)> = sqlx::query_as(COLUMN_TYPES_SQL)
            .bind(&self.schema)
            .bind(&entity.table_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(column, schema, name)| (column, ColumnType::new(schema, name)))
            .collect())
    }

    async fn fetch_optional(&self, entity: &EntityDescriptor, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        let row = Self::bind_all(q).fetch_optional(&self.pool).await.map_err(rejecting)?;
        Ok(row.map(|r| row_to_record(entity, &r)))
    }
}

/// Register a lazily connecting PostgreSQL store for every declaration. A store whose database
/// url cannot be resolved is logged and left out; its entities then answer 404.
pub fn connect_stores(decls: &[StoreDecl], pool: &PoolSettings) -> Result<StoreRegistry, ConfigError> {
    let mut registry = StoreRegistry::new();
    for decl in decls {
        match PgStore::connect_lazy(decl, pool) {
            Ok(store) => registry.register(decl.id.clone(), Arc::new(store))?,
            Err(e) => tracing::warn!(store_id = %decl.id, error = %e, "store skipped"),
        }
    }
    Ok(registry)
}

fn row_to_record(entity: &EntityDescriptor, row: &PgRow) -> Record {
    entity
        .stored_properties()
        .enumerate()
        .map(|(idx, prop)| (prop.name.clone(), decode_property(row, idx, prop)))
        .collect()
}

/// Constraint violations are the caller's fault; everything else stays a database error.
fn rejecting(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if matches!(
            db.kind(),
            ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation
        ) {
            return StoreError::Rejected(db.message().to_string());
        }
    }
    StoreError::Db(e)
}

/// Raw statement failures carry the driver's diagnostics back to the caller.
fn execution_error(e: sqlx::Error) -> AppError {
    let details = match &e {
        sqlx::Error::Database(db) => {
            let pg = db.try_downcast_ref::<PgDatabaseError>();
            Some(json!({
                "sqlState": db.code().map(|c| c.to_string()),
                "constraint": db.constraint(),
                "table": db.table(),
                "detail": pg.and_then(|p| p.detail()),
                "hint": pg.and_then(|p| p.hint()),
                "position": pg.and_then(|p| match p.position() {
                    Some(sqlx::postgres::PgErrorPosition::Original(n)) => Some(n),
                    _ => None,
                }),
            }))
        }
        _ => None,
    };
    let message = match &e {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    };
    AppError::Execution { message, details }
}

#[async_trait]
impl EntityStore for PgStore {
    fn driver_name(&self) -> &str {
        "sqlx-postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn count(&self, entity: &EntityDescriptor) -> Result<i64, StoreError> {
        let q = sql::count(entity, &self.schema);
        tracing::debug!(sql = %q.sql, "query");
        let n: i64 = sqlx::query_scalar(&q.sql).fetch_one(&self.pool).await?;
        Ok(n)
    }

    async fn list(&self, entity: &EntityDescriptor, window: Option<(i64, i64)>) -> Result<Vec<Record>, StoreError> {
        let q = sql::select_list(entity, &self.schema, window);
        let rows = Self::bind_all(&q).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(|r| row_to_record(entity, r)).collect())
    }

    async fn find(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<Option<Record>, StoreError> {
        let types = self.column_types(entity).await?;
        self.fetch_optional(entity, &sql::select_by_key(entity, &self.schema, &types, key)).await
    }

    async fn insert(&self, entity: &EntityDescriptor, record: Record) -> Result<Record, StoreError> {
        let types = self.column_types(entity).await?;
        let q = sql::insert(entity, &self.schema, &types, &record);
        self.fetch_optional(entity, &q)
            .await?
            .ok_or(StoreError::Db(sqlx::Error::RowNotFound))
    }

    async fn replace(&self, entity: &EntityDescriptor, key: &KeyValue, record: Record) -> Result<Option<Record>, StoreError> {
        let types = self.column_types(entity).await?;
        self.fetch_optional(entity, &sql::update(entity, &self.schema, &types, key, &record)).await
    }

    async fn remove(&self, entity: &EntityDescriptor, key: &KeyValue) -> Result<bool, StoreError> {
        let types = self.column_types(entity).await?;
        let q = sql::delete(entity, &self.schema, &types, key);
        let row = Self::bind_all(&q).fetch_optional(&self.pool).await.map_err(rejecting)?;
        Ok(row.is_some())
    }

    async fn live_model(&self) -> Result<Option<LiveModel>, StoreError> {
        tracing::debug!(sql = %COLUMNS_SQL, schema = %self.schema, "introspect columns");
        let columns: Vec<(String, String, String, bool, bool)> = sqlx::query_as(COLUMNS_SQL)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(sql = %FOREIGN_KEYS_SQL, schema = %self.schema, "introspect foreign keys");
        let fks: Vec<(String, String, Vec<String>, Vec<String>, bool)> = sqlx::query_as(FOREIGN_KEYS_SQL)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await?;

        let mut model = LiveModel::default();
        for (table, column, data_type, nullable, is_key) in columns {
            if model.tables.last().map_or(true, |t| t.name != table) {
                model.tables.push(LiveTable::new(table));
            }
            if let Some(t) = model.tables.last_mut() {
                t.columns.push(LiveColumn::new(column, data_type, nullable, is_key));
            }
        }
        for (table, referenced_table, columns, referenced_columns, required) in fks {
            if let Some(t) = model.tables.iter_mut().find(|t| t.name == table) {
                t.foreign_keys.push(LiveForeignKey {
                    columns,
                    referenced_table,
                    referenced_columns,
                    required,
                });
            }
        }
        Ok(Some(model))
    }

    async fn query(&self, sql: &str) -> Result<TabularResult, AppError> {
        tracing::debug!(sql = %sql, store = %self.id, "raw query");
        // The pooled connection returns to the pool when `conn` drops, on every path.
        let mut conn = self.pool.acquire().await.map_err(execution_error)?;
        let stmt = (&mut *conn).prepare(sql).await.map_err(execution_error)?;
        let columns = stmt.columns().iter().map(|c| c.name().to_string()).collect::<Vec<_>>();
        let rows = stmt.query().fetch_all(&mut *conn).await.map_err(execution_error)?;
        let rows = rows
            .iter()
            .map(|row| (0..columns.len()).map(|i| cell_to_value(row, i)).collect())
            .collect();
        Ok(TabularResult { columns, rows })
    }

    async fn execute(&self, sql: &str) -> Result<u64, AppError> {
        tracing::debug!(sql = %sql, store = %self.id, "raw execute");
        let result = sqlx::raw_sql(sql).execute(&self.pool).await.map_err(execution_error)?;
        Ok(result.rows_affected())
    }
}
