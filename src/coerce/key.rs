//! Key coercion: transport-level id strings into the entity's declared key type.

use crate::catalog::KeyType;
use crate::coerce::FieldValue;
use crate::error::AppError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Int(i64),
    Uuid(uuid::Uuid),
    Text(String),
}

impl KeyValue {
    pub fn to_field(&self) -> FieldValue {
        match self {
            KeyValue::Int(n) => FieldValue::Int(*n),
            KeyValue::Uuid(u) => FieldValue::Uuid(*u),
            KeyValue::Text(s) => FieldValue::Text(s.clone()),
        }
    }

    /// Key of a stored record. None for null or non-key-shaped values.
    pub fn from_field(value: &FieldValue) -> Option<KeyValue> {
        match value {
            FieldValue::Int(n) => Some(KeyValue::Int(*n)),
            FieldValue::Uuid(u) => Some(KeyValue::Uuid(*u)),
            FieldValue::Text(s) => Some(KeyValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(n) => write!(f, "{}", n),
            KeyValue::Uuid(u) => write!(f, "{}", u),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Parse an id path segment. Integer keys are range-checked; surrounding whitespace is ignored
/// for integer and Guid keys.
pub fn parse_key(key_type: KeyType, raw: &str) -> Result<KeyValue, AppError> {
    let invalid = || AppError::InvalidKeyFormat(raw.to_string());
    Ok(match key_type {
        KeyType::Int16 => KeyValue::Int(raw.trim().parse::<i16>().map_err(|_| invalid())? as i64),
        KeyType::Int32 => KeyValue::Int(raw.trim().parse::<i32>().map_err(|_| invalid())? as i64),
        KeyType::Int64 => KeyValue::Int(raw.trim().parse::<i64>().map_err(|_| invalid())?),
        KeyType::Guid => KeyValue::Uuid(uuid::Uuid::parse_str(raw.trim()).map_err(|_| invalid())?),
        KeyType::Other => KeyValue::Text(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_keys_parse() {
        assert_eq!(parse_key(KeyType::Int32, "42").unwrap(), KeyValue::Int(42));
        assert_eq!(parse_key(KeyType::Int32, "-7").unwrap(), KeyValue::Int(-7));
        assert_eq!(parse_key(KeyType::Int64, "9000000000").unwrap(), KeyValue::Int(9_000_000_000));
        let u = uuid::Uuid::new_v4();
        assert_eq!(parse_key(KeyType::Guid, &u.to_string()).unwrap(), KeyValue::Uuid(u));
        assert_eq!(parse_key(KeyType::Other, "ABC-1").unwrap(), KeyValue::Text("ABC-1".into()));
    }

    #[test]
    fn malformed_keys_are_invalid_format() {
        for (kt, raw) in [
            (KeyType::Int32, "abc"),
            (KeyType::Int32, "1.5"),
            (KeyType::Int32, "9000000000"),
            (KeyType::Int16, "40000"),
            (KeyType::Int16, "-32769"),
            (KeyType::Int64, ""),
            (KeyType::Guid, "not-a-guid"),
            (KeyType::Guid, "1234"),
        ] {
            assert!(
                matches!(parse_key(kt, raw), Err(AppError::InvalidKeyFormat(_))),
                "{:?} {:?}",
                kt,
                raw
            );
        }
    }

    #[test]
    fn parsing_is_idempotent() {
        let samples = [
            (KeyType::Int32, " 17 "),
            (KeyType::Int64, "-9000000000"),
            (KeyType::Guid, "{67E55044-10B1-426F-9247-BB680E5FE0C8}"),
            (KeyType::Other, "sku-001"),
        ];
        for (kt, raw) in samples {
            let once = parse_key(kt, raw).unwrap();
            let twice = parse_key(kt, &once.to_string()).unwrap();
            assert_eq!(once, twice);
        }
    }
}
