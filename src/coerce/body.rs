//! Tolerant JSON ingestion: request bodies into typed records, driven by property descriptors.
//!
//! Numeric fields accept native numbers or numeric strings (blank means zero), since form
//! payloads serialize numbers as strings.

use crate::case::match_key;
use crate::catalog::{EntityDescriptor, KeyType, PropertyDescriptor, ScalarType};
use crate::coerce::datetime::{parse_date, parse_datetime, parse_time};
use crate::coerce::{normalize_datetimes, FieldValue, KeyValue, Record};
use crate::error::AppError;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;

/// What the body is for: a new row (key may be store-assigned) or a full replacement of `key`.
#[derive(Clone, Debug)]
pub enum BodyMode {
    Create,
    Replace(KeyValue),
}

fn invalid(prop: &PropertyDescriptor, what: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("property '{}': {}", prop.json_name, what))
}

/// Numeric text of a JSON value: native numbers as-is, strings trimmed, blank strings as "0".
fn numeric_text(prop: &PropertyDescriptor, value: &Value) -> Result<String, AppError> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) if s.trim().is_empty() => Ok("0".into()),
        Value::String(s) => Ok(s.trim().to_string()),
        other => Err(invalid(prop, format!("expected a number, got {}", json_kind(other)))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_integer(prop: &PropertyDescriptor, value: &Value) -> Result<FieldValue, AppError> {
    let text = numeric_text(prop, value)?;
    let n: i64 = text
        .parse()
        .map_err(|_| invalid(prop, format!("'{}' is not an integer", text)))?;
    let in_range = match prop.scalar {
        ScalarType::Int16 => i16::try_from(n).is_ok(),
        ScalarType::Int32 => i32::try_from(n).is_ok(),
        _ => true,
    };
    if !in_range {
        return Err(invalid(prop, format!("{} is out of range for {}", n, prop.scalar.label())));
    }
    Ok(FieldValue::Int(n))
}

fn coerce_float(prop: &PropertyDescriptor, value: &Value) -> Result<FieldValue, AppError> {
    let text = numeric_text(prop, value)?;
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(FieldValue::Float(f)),
        _ => Err(invalid(prop, format!("'{}' is not a number", text))),
    }
}

fn coerce_decimal(prop: &PropertyDescriptor, value: &Value) -> Result<FieldValue, AppError> {
    let text = numeric_text(prop, value)?;
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(FieldValue::Decimal)
        .map_err(|_| invalid(prop, format!("'{}' is not a decimal", text)))
}

fn expect_str<'v>(prop: &PropertyDescriptor, value: &'v Value) -> Result<&'v str, AppError> {
    value
        .as_str()
        .ok_or_else(|| invalid(prop, format!("expected a string, got {}", json_kind(value))))
}

/// Coerce one non-null JSON value to the property's scalar type.
pub fn coerce_field(prop: &PropertyDescriptor, value: &Value) -> Result<FieldValue, AppError> {
    if value.is_null() {
        return coerce_null(prop);
    }
    // Blank strings in nullable non-text fields come from cleared form inputs.
    if prop.nullable && prop.scalar != ScalarType::String && value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return Ok(FieldValue::Null);
    }
    match prop.scalar {
        ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64 => coerce_integer(prop, value),
        ScalarType::Float | ScalarType::Double => coerce_float(prop, value),
        ScalarType::Decimal => coerce_decimal(prop, value),
        ScalarType::Bool => match value {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(FieldValue::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(FieldValue::Bool(false)),
            other => Err(invalid(prop, format!("expected a boolean, got {}", json_kind(other)))),
        },
        ScalarType::String => Ok(FieldValue::Text(expect_str(prop, value)?.to_string())),
        ScalarType::Guid => {
            let s = expect_str(prop, value)?;
            uuid::Uuid::parse_str(s.trim())
                .map(FieldValue::Uuid)
                .map_err(|_| invalid(prop, format!("'{}' is not a valid guid", s)))
        }
        ScalarType::Date => {
            let s = expect_str(prop, value)?;
            parse_date(s)
                .map(FieldValue::Date)
                .ok_or_else(|| invalid(prop, format!("'{}' is not a valid date", s)))
        }
        ScalarType::Time => {
            let s = expect_str(prop, value)?;
            parse_time(s)
                .map(FieldValue::Time)
                .ok_or_else(|| invalid(prop, format!("'{}' is not a valid time", s)))
        }
        ScalarType::DateTime | ScalarType::DateTimeOffset => {
            let s = expect_str(prop, value)?;
            parse_datetime(s).ok_or_else(|| invalid(prop, format!("'{}' is not a valid date-time", s)))
        }
        ScalarType::Other => Ok(FieldValue::Json(value.clone())),
    }
}

/// Explicit null: allowed for nullable properties and reference-like types; value types refuse it.
fn coerce_null(prop: &PropertyDescriptor) -> Result<FieldValue, AppError> {
    if prop.nullable || matches!(prop.scalar, ScalarType::String | ScalarType::Other) {
        Ok(FieldValue::Null)
    } else {
        Err(invalid(prop, "must not be null"))
    }
}

/// Value for a property the body does not mention: null when nullable, else the type's zero value.
pub fn default_for(prop: &PropertyDescriptor) -> FieldValue {
    if prop.nullable {
        return FieldValue::Null;
    }
    match prop.scalar {
        ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64 => FieldValue::Int(0),
        ScalarType::Float | ScalarType::Double => FieldValue::Float(0.0),
        ScalarType::Decimal => FieldValue::Decimal(Decimal::ZERO),
        ScalarType::Bool => FieldValue::Bool(false),
        ScalarType::String => FieldValue::Text(String::new()),
        _ => FieldValue::Null,
    }
}

/// Unset keys on create: null, blank, a zero integer or the nil guid.
fn key_is_unset(prop: &PropertyDescriptor, value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) if s.trim().is_empty() => true,
        Value::String(s) if prop.scalar == ScalarType::Guid => {
            uuid::Uuid::parse_str(s.trim()).is_ok_and(|u| u.is_nil())
        }
        Value::String(s) if prop.scalar.is_integer() => s.trim() == "0",
        Value::Number(n) if prop.scalar.is_integer() => n.as_i64() == Some(0),
        _ => false,
    }
}

/// Key for a create whose body leaves it unset. Guid keys are generated here; integer and other
/// keys are left to the store.
fn assigned_key(entity: &EntityDescriptor) -> Option<FieldValue> {
    (entity.key_type == KeyType::Guid).then(|| FieldValue::Uuid(uuid::Uuid::new_v4()))
}

/// Coerce a request body into a full record for `entity`, then normalize zone-less timestamps.
/// Keys are matched case-insensitively; unknown keys are ignored; navigation properties are skipped.
pub fn coerce_body(entity: &EntityDescriptor, body: Value, mode: &BodyMode) -> Result<Record, AppError> {
    let obj: Map<String, Value> = match body {
        Value::Object(m) => m,
        other => {
            return Err(AppError::Validation(format!(
                "body must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };
    let by_key: HashMap<String, &Value> = obj.iter().map(|(k, v)| (match_key(k), v)).collect();

    let mut record = Record::new();
    for prop in entity.stored_properties() {
        let incoming = by_key.get(&match_key(&prop.name)).copied();
        if prop.is_key {
            match mode {
                BodyMode::Replace(key) => {
                    record.insert(prop.name.clone(), key.to_field());
                }
                BodyMode::Create => {
                    let value = match incoming {
                        Some(v) if !key_is_unset(prop, v) => Some(coerce_field(prop, v)?),
                        _ => assigned_key(entity),
                    };
                    if let Some(value) = value {
                        record.insert(prop.name.clone(), value);
                    }
                }
            }
            continue;
        }
        let value = match incoming {
            Some(v) => coerce_field(prop, v)?,
            None => default_for(prop),
        };
        record.insert(prop.name.clone(), value);
    }
    normalize_datetimes(&mut record);
    Ok(record)
}
