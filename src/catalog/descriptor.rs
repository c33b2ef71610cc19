//! Resolved catalog model: descriptors derived from declarations, immutable after build.

use serde::Serialize;

/// Scalar type a declared property type normalizes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScalarType {
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    Bool,
    String,
    Guid,
    Date,
    DateTime,
    DateTimeOffset,
    Time,
    Other,
}

impl ScalarType {
    /// Normalize a declared type name. Accepts short aliases (`int`, `uuid`), CLR-style names
    /// (`System.Int32`, `global::System.Guid`) and a trailing `?`.
    pub fn from_declared(declared: &str) -> Self {
        let base = strip_nullable(declared.trim());
        let base = ["Option<", "Nullable<"]
            .iter()
            .find_map(|w| base.strip_prefix(w).and_then(|rest| rest.strip_suffix('>')))
            .unwrap_or(base)
            .trim();
        let base = base.rsplit(['.', ':']).next().unwrap_or(base);
        match base.to_ascii_lowercase().as_str() {
            "byte" | "sbyte" | "u8" | "i8" | "short" | "int16" | "i16" | "smallint" | "int2" => ScalarType::Int16,
            "int" | "int32" | "i32" | "integer" | "int4" | "serial" => ScalarType::Int32,
            "long" | "int64" | "i64" | "bigint" | "int8" | "bigserial" => ScalarType::Int64,
            "float" | "single" | "f32" | "real" | "float4" => ScalarType::Float,
            "double" | "f64" | "float8" => ScalarType::Double,
            "decimal" | "numeric" | "money" => ScalarType::Decimal,
            "bool" | "boolean" => ScalarType::Bool,
            "string" | "str" | "text" | "varchar" | "char" => ScalarType::String,
            "guid" | "uuid" => ScalarType::Guid,
            "date" | "dateonly" | "naivedate" => ScalarType::Date,
            "datetime" | "timestamp" | "naivedatetime" => ScalarType::DateTime,
            "datetimeoffset" | "timestamptz" => ScalarType::DateTimeOffset,
            "time" | "timeonly" | "naivetime" => ScalarType::Time,
            _ => ScalarType::Other,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(self, ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64)
    }

    pub fn label(self) -> &'static str {
        match self {
            ScalarType::Int16 => "Int16",
            ScalarType::Int32 => "Int32",
            ScalarType::Int64 => "Int64",
            ScalarType::Float => "Single",
            ScalarType::Double => "Double",
            ScalarType::Decimal => "Decimal",
            ScalarType::Bool => "Boolean",
            ScalarType::String => "String",
            ScalarType::Guid => "Guid",
            ScalarType::Date => "DateOnly",
            ScalarType::DateTime => "DateTime",
            ScalarType::DateTimeOffset => "DateTimeOffset",
            ScalarType::Time => "TimeOnly",
            ScalarType::Other => "Object",
        }
    }
}

fn strip_nullable(s: &str) -> &str {
    s.strip_suffix('?').unwrap_or(s)
}

/// True when the declared type is nullable by notation (`int?`, `Option<i32>`).
pub fn declared_nullable(declared: &str) -> bool {
    let t = declared.trim();
    t.ends_with('?') || t.starts_with("Option<") || t.starts_with("Nullable<")
}

/// True for generic collection types (`ICollection<OrderItem>`, `List<T>`, `Vec<T>`), which are
/// relationship accessors rather than columns. `Option<T>` is not a collection.
pub fn declared_collection(declared: &str) -> bool {
    let t = declared.trim();
    t.contains('<') && !t.starts_with("Option<") && !t.starts_with("Nullable<")
}

/// Key type, which decides how a transport-level id string is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum KeyType {
    Int16,
    Int32,
    Int64,
    Guid,
    Other,
}

impl From<ScalarType> for KeyType {
    fn from(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Int16 => KeyType::Int16,
            ScalarType::Int32 => KeyType::Int32,
            ScalarType::Int64 => KeyType::Int64,
            ScalarType::Guid => KeyType::Guid,
            _ => KeyType::Other,
        }
    }
}

/// Form input kind a client should render for a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InputKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "checkbox")]
    Checkbox,
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "datetime-local")]
    DateTime,
    #[serde(rename = "time")]
    Time,
}

impl InputKind {
    pub fn infer(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Date => InputKind::Date,
            ScalarType::DateTime | ScalarType::DateTimeOffset => InputKind::DateTime,
            ScalarType::Time => InputKind::Time,
            ScalarType::Bool => InputKind::Checkbox,
            ScalarType::Int16
            | ScalarType::Int32
            | ScalarType::Int64
            | ScalarType::Float
            | ScalarType::Double
            | ScalarType::Decimal => InputKind::Number,
            ScalarType::String | ScalarType::Guid | ScalarType::Other => InputKind::Text,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declared_type: String,
    pub scalar: ScalarType,
    pub column: String,
    pub nullable: bool,
    pub is_key: bool,
    pub is_navigation: bool,
    pub input_kind: InputKind,
    /// Wire name (lower camel case).
    pub json_name: String,
}

impl PropertyDescriptor {
    /// Participates in persistence (has a column).
    pub fn is_stored(&self) -> bool {
        !self.is_navigation
    }
}

#[derive(Clone, Debug)]
pub struct EntityDescriptor {
    pub name: String,
    pub store_id: String,
    pub collection_name: String,
    pub table_name: String,
    pub key_property: String,
    pub key_type: KeyType,
    pub properties: Vec<PropertyDescriptor>,
}

impl EntityDescriptor {
    pub fn key(&self) -> &PropertyDescriptor {
        // Catalog build guarantees exactly one key property.
        self.properties
            .iter()
            .find(|p| p.is_key)
            .unwrap_or(&self.properties[0])
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Properties backed by a column, in declaration order.
    pub fn stored_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_stored())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_types_normalize() {
        assert_eq!(ScalarType::from_declared("int"), ScalarType::Int32);
        assert_eq!(ScalarType::from_declared("System.Int64"), ScalarType::Int64);
        assert_eq!(ScalarType::from_declared("global::System.Guid"), ScalarType::Guid);
        assert_eq!(ScalarType::from_declared("decimal?"), ScalarType::Decimal);
        assert_eq!(ScalarType::from_declared("DateTimeOffset"), ScalarType::DateTimeOffset);
        assert_eq!(ScalarType::from_declared("Option<i32>"), ScalarType::Int32);
        assert_eq!(ScalarType::from_declared("Customer"), ScalarType::Other);
    }

    #[test]
    fn input_kinds_follow_scalar() {
        let kind = |t: &str| InputKind::infer(ScalarType::from_declared(t));
        assert_eq!(kind("DateOnly"), InputKind::Date);
        assert_eq!(kind("DateTime"), InputKind::DateTime);
        assert_eq!(kind("TimeOnly"), InputKind::Time);
        assert_eq!(kind("bool"), InputKind::Checkbox);
        assert_eq!(kind("long"), InputKind::Number);
        assert_eq!(kind("double"), InputKind::Number);
        assert_eq!(kind("decimal"), InputKind::Number);
        assert_eq!(kind("string"), InputKind::Text);
        assert_eq!(kind("Guid"), InputKind::Text);
        assert_eq!(kind("Whatever"), InputKind::Text);
    }

    #[test]
    fn input_kind_wire_names() {
        assert_eq!(serde_json::to_value(InputKind::DateTime).unwrap(), "datetime-local");
        assert_eq!(serde_json::to_value(InputKind::Checkbox).unwrap(), "checkbox");
    }

    #[test]
    fn key_types_from_scalars() {
        assert_eq!(KeyType::from(ScalarType::Int16), KeyType::Int16);
        assert_eq!(KeyType::from(ScalarType::Int64), KeyType::Int64);
        assert_eq!(KeyType::from(ScalarType::Guid), KeyType::Guid);
        assert_eq!(KeyType::from(ScalarType::String), KeyType::Other);
    }

    #[test]
    fn nullability_and_collections() {
        assert!(declared_nullable("int?"));
        assert!(declared_nullable("Option<String>"));
        assert!(!declared_nullable("string"));
        assert!(declared_collection("ICollection<OrderItem>"));
        assert!(!declared_collection("Option<i32>"));
    }
}
