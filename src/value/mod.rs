//! Literal values exchanged between conditions, entities and executors.
//!
//! [`Value`] is the single currency of the crate: comparison literals, bound statement
//! parameters and decoded row cells all use it. [`ValueType`] maps Rust field types onto
//! it (see [`types`]).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub mod types;

pub use types::ValueType;

/// A literal value comparable by the underlying store.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Decimal(Decimal),
    Json(serde_json::Value),
}

/// Payload-less tag of a non-null [`Value`] variant.
///
/// Recorded in entity descriptors so the resolver can tell boolean fields apart and
/// check that a write accessor accepts the field's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    SmallInt,
    Int,
    BigInt,
    Double,
    String,
    Bytes,
    Uuid,
    Timestamp,
    TimestampTz,
    Decimal,
    Json,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::SmallInt => "smallint",
            ValueKind::Int => "int",
            ValueKind::BigInt => "bigint",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Uuid => "uuid",
            ValueKind::Timestamp => "timestamp",
            ValueKind::TimestampTz => "timestamptz",
            ValueKind::Decimal => "decimal",
            ValueKind::Json => "json",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Kind of this value, `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::SmallInt(_) => ValueKind::SmallInt,
            Value::Int(_) => ValueKind::Int,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::TimestampTz(_) => ValueKind::TimestampTz,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Json(_) => ValueKind::Json,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.kind().map_or("null", ValueKind::name)
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// SQL-style comparison.
    ///
    /// Integers and doubles compare numerically across variants, integers compare with
    /// decimals, everything else only within its own variant. Returns `None` when either
    /// side is null or the variants are incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_i64(), other.as_i64()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Double(a), b) => b.as_i64().and_then(|b| a.partial_cmp(&(b as f64))),
            (a, Value::Double(b)) => a.as_i64().and_then(|a| (a as f64).partial_cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), b) => b.as_i64().map(|b| a.cmp(&Decimal::from(b))),
            (a, Value::Decimal(b)) => a.as_i64().map(|a| Decimal::from(a).cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::TimestampTz(a), Value::TimestampTz(b)) => Some(a.cmp(b)),
            (Value::Json(a), Value::Json(b)) => Some(a.to_string().cmp(&b.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::SmallInt(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::BigInt(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "'{v}'"),
            Value::Timestamp(v) => write!(f, "'{v}'"),
            Value::TimestampTz(v) => write!(f, "'{}'", v.to_rfc3339()),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "'{v}'"),
        }
    }
}

/// Error converting a [`Value`] into a Rust field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// Null encountered where the field is not optional
    NullValue,
    /// The value variant doesn't match the expected type
    TypeMismatch {
        expected: String,
        actual: String,
    },
    /// Conversion failed (overflow, invalid format)
    ConversionError(String),
}

impl ValueError {
    pub(crate) fn mismatch(expected: ValueKind, actual: &Value) -> Self {
        ValueError::TypeMismatch {
            expected: expected.name().to_string(),
            actual: actual.type_name().to_string(),
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueError::NullValue => write!(f, "Value is null"),
            ValueError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {expected}, got {actual}")
            }
            ValueError::ConversionError(msg) => write!(f, "Conversion error: {msg}"),
        }
    }
}

impl std::error::Error for ValueError {}

macro_rules! impl_from_for_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    ValueType::into_value(v)
                }
            }

            impl From<Option<$ty>> for Value {
                fn from(v: Option<$ty>) -> Self {
                    ValueType::into_value(v)
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    Vec<u8>,
    Uuid,
    NaiveDateTime,
    DateTime<Utc>,
    Decimal,
    serde_json::Value,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}
