//! Type coercion: key strings, tolerant JSON bodies, date/time normalization.

pub mod body;
pub mod datetime;
pub mod key;
pub mod value;

pub use body::{coerce_body, coerce_field, default_for, BodyMode};
pub use datetime::normalize_datetimes;
pub use key::{parse_key, KeyValue};
pub use value::{render_record, FieldValue, Record};
