//! Typed field values and their JSON rendering.

use crate::catalog::EntityDescriptor;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A property value after coercion from JSON (or decoding from a store row).
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Uuid(uuid::Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Instant with a known zone, held as UTC.
    DateTime(DateTime<Utc>),
    /// Wall-clock time with no zone designator. Normalized to UTC before persistence.
    LocalDateTime(NaiveDateTime),
    Json(Value),
}

/// One entity row keyed by property name.
pub type Record = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::Number((*n).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Decimal(d) => d
                .to_string()
                .parse::<serde_json::Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(d.to_string())),
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Uuid(u) => Value::String(u.to_string()),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
            FieldValue::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            FieldValue::LocalDateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            FieldValue::Json(v) => v.clone(),
        }
    }
}

/// Render a record as a JSON object with camelCase keys, in property declaration order.
/// Navigation properties are not rendered.
pub fn render_record(entity: &EntityDescriptor, record: &Record) -> Value {
    let mut map = Map::new();
    for prop in entity.stored_properties() {
        let value = record.get(&prop.name).map(FieldValue::to_json).unwrap_or(Value::Null);
        map.insert(prop.json_name.clone(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn renders_scalars() {
        assert_eq!(FieldValue::Decimal(Decimal::from_str("19.99").unwrap()).to_json(), serde_json::json!(19.99));
        assert_eq!(FieldValue::Int(7).to_json(), serde_json::json!(7));
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(FieldValue::DateTime(dt).to_json(), serde_json::json!("2024-03-01T09:30:00Z"));
        let t = NaiveTime::from_hms_opt(8, 15, 0).unwrap();
        assert_eq!(FieldValue::Time(t).to_json(), serde_json::json!("08:15:00"));
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), Value::Null);
    }
}
