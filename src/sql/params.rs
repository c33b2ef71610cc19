//! Binding typed field values to PostgreSQL parameters, and decoding row cells back.

use crate::catalog::{PropertyDescriptor, ScalarType};
use crate::coerce::FieldValue;
use crate::sql::builder::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgRow, PgTypeInfo, Postgres};
use sqlx::{Database, Row, Type};

/// A field value bound as a query parameter. The wire type follows the value; placeholders in
/// generated SQL carry a cast to the column's type.
#[derive(Clone, Debug)]
pub struct PgBindValue(pub FieldValue);

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match &self.0 {
            FieldValue::Null => <Option<String> as Encode<Postgres>>::encode_by_ref(&None, buf),
            FieldValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            FieldValue::Int(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            FieldValue::Float(f) => <f64 as Encode<Postgres>>::encode_by_ref(f, buf),
            FieldValue::Decimal(d) => <Decimal as Encode<Postgres>>::encode_by_ref(d, buf),
            FieldValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            FieldValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
            FieldValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf),
            FieldValue::Time(t) => <NaiveTime as Encode<Postgres>>::encode_by_ref(t, buf),
            FieldValue::DateTime(dt) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(dt, buf),
            FieldValue::LocalDateTime(dt) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(dt, buf),
            FieldValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match &self.0 {
            FieldValue::Null | FieldValue::Text(_) => return None,
            FieldValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            FieldValue::Int(_) => <i64 as Type<Postgres>>::type_info(),
            FieldValue::Float(_) => <f64 as Type<Postgres>>::type_info(),
            FieldValue::Decimal(_) => <Decimal as Type<Postgres>>::type_info(),
            FieldValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            FieldValue::Date(_) => <NaiveDate as Type<Postgres>>::type_info(),
            FieldValue::Time(_) => <NaiveTime as Type<Postgres>>::type_info(),
            FieldValue::DateTime(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
            FieldValue::LocalDateTime(_) => <NaiveDateTime as Type<Postgres>>::type_info(),
            FieldValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// Cast applied to a placeholder bound for a property of this scalar type.
pub fn pg_cast(scalar: ScalarType) -> Option<&'static str> {
    Some(match scalar {
        ScalarType::Int16 => "int2",
        ScalarType::Int32 => "int4",
        ScalarType::Int64 => "int8",
        ScalarType::Float => "float4",
        ScalarType::Double => "float8",
        ScalarType::Decimal => "numeric",
        ScalarType::Bool => "bool",
        ScalarType::String => "text",
        ScalarType::Guid => "uuid",
        ScalarType::Date => "date",
        ScalarType::Time => "time",
        ScalarType::DateTime | ScalarType::DateTimeOffset => "timestamptz",
        ScalarType::Other => return None,
    })
}

/// Shape a value of a property with no fixed mapping for its live column. JSON stays JSON for
/// json/jsonb columns; anything else travels as text and the placeholder cast converts it.
pub fn value_for_column(v: FieldValue, column: Option<&ColumnType>) -> FieldValue {
    if column.is_some_and(ColumnType::is_json) {
        return v;
    }
    match v {
        FieldValue::Json(Value::Null) => FieldValue::Null,
        FieldValue::Json(Value::String(s)) => FieldValue::Text(s),
        FieldValue::Json(other) => FieldValue::Text(other.to_string()),
        other => other,
    }
}

/// Decode the cell at `idx` as the property's declared type, widening where the column is
/// narrower or wider than declared. Falls back to the untyped decoding.
pub fn decode_property(row: &PgRow, idx: usize, prop: &PropertyDescriptor) -> FieldValue {
    let typed = match prop.scalar {
        ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64 => decode_integer(row, idx),
        ScalarType::Float | ScalarType::Double => decode_float(row, idx),
        ScalarType::Decimal => row
            .try_get::<Option<Decimal>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Decimal)),
        ScalarType::Bool => row
            .try_get::<Option<bool>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Bool)),
        ScalarType::String => row
            .try_get::<Option<String>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Text)),
        ScalarType::Guid => row
            .try_get::<Option<uuid::Uuid>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Uuid)),
        ScalarType::Date => row
            .try_get::<Option<NaiveDate>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Date)),
        ScalarType::Time => row
            .try_get::<Option<NaiveTime>, _>(idx)
            .ok()
            .map(|v| v.map_or(FieldValue::Null, FieldValue::Time)),
        ScalarType::DateTime | ScalarType::DateTimeOffset => decode_timestamp(row, idx),
        ScalarType::Other => None,
    };
    typed.unwrap_or_else(|| match cell_to_value(row, idx) {
        Value::Null => FieldValue::Null,
        v => FieldValue::Json(v),
    })
}

fn decode_integer(row: &PgRow, idx: usize) -> Option<FieldValue> {
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, |n| FieldValue::Int(n.into())));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, |n| FieldValue::Int(n.into())));
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, FieldValue::Int));
    }
    None
}

fn decode_float(row: &PgRow, idx: usize) -> Option<FieldValue> {
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, |f| FieldValue::Float(f.into())));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, FieldValue::Float));
    }
    None
}

fn decode_timestamp(row: &PgRow, idx: usize) -> Option<FieldValue> {
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, FieldValue::DateTime));
    }
    // timestamp without time zone is stored UTC wall-clock.
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return Some(v.map_or(FieldValue::Null, |dt| FieldValue::DateTime(dt.and_utc())));
    }
    None
}

/// Untyped cell decoding for ad hoc result sets: tries the common PostgreSQL types in turn and
/// renders anything else as `<typename>`.
pub fn cell_to_value(row: &PgRow, idx: usize) -> Value {
    use sqlx::{Column, TypeInfo};
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map_or(Value::Null, |n| Value::Number(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map_or(Value::Null, |n| Value::Number(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map_or(Value::Null, |n| Value::Number(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map_or(Value::Null, |f| FieldValue::Float(f.into()).to_json());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map_or(Value::Null, |f| FieldValue::Float(f).to_json());
    }
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
        return v.map_or(Value::Null, |d| FieldValue::Decimal(d).to_json());
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = row.try_get::<Option<uuid::Uuid>, _>(idx) {
        return v.map_or(Value::Null, |u| Value::String(u.to_string()));
    }
    if let Some(v) = decode_timestamp(row, idx) {
        return v.to_json();
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map_or(Value::Null, |d| FieldValue::Date(d).to_json());
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v.map_or(Value::Null, |t| FieldValue::Time(t).to_json());
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.map_or(Value::Null, Value::String);
    }
    if let Ok(v) = row.try_get::<Option<Value>, _>(idx) {
        return v.unwrap_or(Value::Null);
    }
    let type_name = row.columns().get(idx).map(|c| c.type_info().name()).unwrap_or("unknown");
    Value::String(format!("<{}>", type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casts_follow_declared_scalar() {
        assert_eq!(pg_cast(ScalarType::Int32), Some("int4"));
        assert_eq!(pg_cast(ScalarType::Decimal), Some("numeric"));
        assert_eq!(pg_cast(ScalarType::DateTime), Some("timestamptz"));
        assert_eq!(pg_cast(ScalarType::Other), None);
    }

    #[test]
    fn unmapped_values_follow_live_column() {
        let jsonb = ColumnType::new("pg_catalog", "jsonb");
        let text = ColumnType::new("pg_catalog", "text");
        let open = FieldValue::Json(Value::String("Open".into()));
        assert_eq!(value_for_column(open.clone(), Some(&jsonb)), open);
        assert_eq!(value_for_column(open.clone(), Some(&text)), FieldValue::Text("Open".into()));
        assert_eq!(value_for_column(open, None), FieldValue::Text("Open".into()));
        assert_eq!(
            value_for_column(FieldValue::Json(serde_json::json!([1, 2])), Some(&text)),
            FieldValue::Text("[1,2]".into())
        );
        assert_eq!(value_for_column(FieldValue::Null, Some(&jsonb)), FieldValue::Null);
    }

    #[test]
    fn wire_type_follows_value() {
        assert!(PgBindValue(FieldValue::Null).produces().is_none());
        let int = PgBindValue(FieldValue::Int(3)).produces().unwrap();
        assert_eq!(sqlx::TypeInfo::name(&int), "INT8");
        let uuid = PgBindValue(FieldValue::Uuid(uuid::Uuid::nil())).produces().unwrap();
        assert_eq!(sqlx::TypeInfo::name(&uuid), "UUID");
    }
}
