//! Builds parameterized COUNT, SELECT, INSERT, UPDATE, DELETE from an entity descriptor.
//! Identifiers come from the catalog only; values are always parameters.

use crate::catalog::{EntityDescriptor, PropertyDescriptor};
use crate::coerce::{FieldValue, KeyValue, Record};
use crate::sql::params::{pg_cast, value_for_column};
use std::collections::HashMap;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

/// Live type of a column: `udt_schema` and `udt_name` from information_schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnType {
    pub schema: String,
    pub name: String,
}

impl ColumnType {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnType {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn is_json(&self) -> bool {
        self.name.eq_ignore_ascii_case("json") || self.name.eq_ignore_ascii_case("jsonb")
    }

    /// Schema-qualified, quoted type name for a `::` cast.
    pub fn cast(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.name))
    }
}

/// Live column types of one table by column name. Only consulted for properties whose declared
/// type has no fixed PostgreSQL mapping.
#[derive(Clone, Debug, Default)]
pub struct ColumnTypes(HashMap<String, ColumnType>);

impl ColumnTypes {
    pub fn insert(&mut self, column: impl Into<String>, ty: ColumnType) {
        self.0.insert(column.into(), ty);
    }

    pub fn get(&self, column: &str) -> Option<&ColumnType> {
        self.0.get(column)
    }
}

impl FromIterator<(String, ColumnType)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (String, ColumnType)>>(iter: I) -> Self {
        ColumnTypes(iter.into_iter().collect())
    }
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its placeholder, cast to the property's column type. Without
    /// a fixed mapping the live column type decides both the cast and the bound shape.
    fn push_param(&mut self, prop: &PropertyDescriptor, v: FieldValue, types: &ColumnTypes) -> String {
        let n = self.params.len() + 1;
        if let Some(t) = pg_cast(prop.scalar) {
            self.params.push(v);
            return format!("${}::{}", n, t);
        }
        let live = types.get(&prop.column);
        self.params.push(value_for_column(v, live));
        match live {
            Some(ty) => format!("${}::{}", n, ty.cast()),
            None => format!("${}", n),
        }
    }
}

/// SELECT list: stored properties' columns in declaration order. Decoding relies on this order.
pub fn select_column_list(entity: &EntityDescriptor) -> String {
    entity
        .stored_properties()
        .map(|p| quoted(&p.column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn key_predicate(q: &mut QueryBuf, entity: &EntityDescriptor, types: &ColumnTypes, key: &KeyValue) -> String {
    let pk = entity.key();
    let ph = q.push_param(pk, key.to_field(), types);
    format!("{} = {}", quoted(&pk.column), ph)
}

/// SELECT COUNT(*) over the whole table.
pub fn count(entity: &EntityDescriptor, schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT COUNT(*) FROM {}",
        qualified_table(schema, &entity.table_name)
    );
    q
}

/// SELECT all rows ORDER BY key, with an optional (offset, limit) window.
pub fn select_list(entity: &EntityDescriptor, schema: &str, window: Option<(i64, i64)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let order_clause = format!(" ORDER BY {}", quoted(&entity.key().column));
    let window_clause = window
        .map(|(offset, limit)| format!(" LIMIT {} OFFSET {}", limit, offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        select_column_list(entity),
        table,
        order_clause,
        window_clause
    );
    q
}

/// SELECT by primary key.
pub fn select_by_key(entity: &EntityDescriptor, schema: &str, types: &ColumnTypes, key: &KeyValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let predicate = key_predicate(&mut q, entity, types, key);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {}",
        select_column_list(entity),
        table,
        predicate
    );
    q
}

/// INSERT every stored property present in the record. An omitted key column is left to the
/// column default. Returns the persisted row.
pub fn insert(entity: &EntityDescriptor, schema: &str, types: &ColumnTypes, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for prop in entity.stored_properties() {
        let Some(val) = record.get(&prop.name) else { continue };
        cols.push(quoted(&prop.column));
        placeholders.push(q.push_param(prop, val.clone(), types));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by key: SET every non-key stored property (full replacement, absent values become NULL).
/// Falls back to a plain SELECT when the entity has no non-key columns.
pub fn update(entity: &EntityDescriptor, schema: &str, types: &ColumnTypes, key: &KeyValue, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let mut sets = Vec::new();
    for prop in entity.stored_properties().filter(|p| !p.is_key) {
        let val = record.get(&prop.name).cloned().unwrap_or(FieldValue::Null);
        let ph = q.push_param(prop, val, types);
        sets.push(format!("{} = {}", quoted(&prop.column), ph));
    }
    if sets.is_empty() {
        return select_by_key(entity, schema, types, key);
    }
    let predicate = key_predicate(&mut q, entity, types, key);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        table,
        sets.join(", "),
        predicate,
        select_column_list(entity)
    );
    q
}

/// DELETE by key, returning the key column so the caller can tell whether a row went away.
pub fn delete(entity: &EntityDescriptor, schema: &str, types: &ColumnTypes, key: &KeyValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, &entity.table_name);
    let predicate = key_predicate(&mut q, entity, types, key);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        table,
        predicate,
        quoted(&entity.key().column)
    );
    q
}
