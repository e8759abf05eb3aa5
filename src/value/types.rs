//! `ValueType` trait for type-safe value conversions
//!
//! Maps Rust field types to their [`Value`] variant and back. Entity descriptors use
//! [`ValueType::KIND`] to record each field's kind, and generated accessors use
//! [`ValueType::into_value`] / [`ValueType::try_from_value`] to move data between rows
//! and struct fields.
//!
//! Implemented for:
//!
//! - Integer types: `i16`, `i32`, `i64`, and `u8`, `u16`, `u32` (stored widened)
//! - Floating point: `f32`, `f64`
//! - Boolean: `bool`
//! - String: `String`
//! - Binary: `Vec<u8>`
//! - `uuid::Uuid`, `chrono::NaiveDateTime`, `chrono::DateTime<Utc>`,
//!   `rust_decimal::Decimal`, `serde_json::Value`
//! - `Option<T>` for all of the above

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{Value, ValueError, ValueKind};

/// Trait for mapping Rust types to their corresponding [`Value`] variant.
///
/// ```rust
/// use tablefacade::{Value, ValueKind, ValueType};
///
/// assert_eq!(ValueType::into_value(42i32), Value::Int(42));
/// assert_eq!(<Option<bool> as ValueType>::KIND, ValueKind::Bool);
/// assert_eq!(<i64 as ValueType>::try_from_value(Value::Int(7)), Ok(7));
/// ```
pub trait ValueType: Sized {
    /// Kind recorded for fields of this type
    const KIND: ValueKind;

    /// `true` when `Value::Null` is a valid value of this type
    const NULLABLE: bool = false;

    fn into_value(self) -> Value;

    /// Convert a `Value` into this type.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NullValue` for null on a non-optional type,
    /// `ValueError::TypeMismatch` for an incompatible variant and
    /// `ValueError::ConversionError` when a numeric value is out of range.
    fn try_from_value(value: Value) -> Result<Self, ValueError>;
}

fn null_or_mismatch(expected: ValueKind, value: &Value) -> ValueError {
    if value.is_null() {
        ValueError::NullValue
    } else {
        ValueError::mismatch(expected, value)
    }
}

fn narrow<S, D>(value: S, target: &str) -> Result<D, ValueError>
where
    S: Copy + std::fmt::Display,
    D: TryFrom<S>,
{
    D::try_from(value)
        .map_err(|_| ValueError::ConversionError(format!("{value} does not fit in {target}")))
}

impl ValueType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            // MySQL TINYINT(1) columns come back as integers
            Value::SmallInt(v) => Ok(v != 0),
            Value::Int(v) => Ok(v != 0),
            Value::BigInt(v) => Ok(v != 0),
            other => Err(null_or_mismatch(Self::KIND, &other)),
        }
    }
}

// Signed integers accept any integer variant that fits.
macro_rules! impl_signed {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl ValueType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn try_from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::SmallInt(v) => narrow(v, stringify!($ty)),
                    Value::Int(v) => narrow(v, stringify!($ty)),
                    Value::BigInt(v) => narrow(v, stringify!($ty)),
                    other => Err(null_or_mismatch(Self::KIND, &other)),
                }
            }
        }
    };
}

impl_signed!(i16, SmallInt, SmallInt);
impl_signed!(i32, Int, Int);
impl_signed!(i64, BigInt, BigInt);

// Unsigned integers are stored in the next wider signed column type.
macro_rules! impl_unsigned {
    ($ty:ty, $wide:ty, $kind:ident) => {
        impl ValueType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(<$wide>::from(self))
            }

            fn try_from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::SmallInt(v) => narrow(v, stringify!($ty)),
                    Value::Int(v) => narrow(v, stringify!($ty)),
                    Value::BigInt(v) => narrow(v, stringify!($ty)),
                    other => Err(null_or_mismatch(Self::KIND, &other)),
                }
            }
        }
    };
}

impl_unsigned!(u8, i16, SmallInt);
impl_unsigned!(u16, i32, Int);
impl_unsigned!(u32, i64, BigInt);

impl ValueType for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Double(v) => Ok(v),
            Value::SmallInt(v) => Ok(f64::from(v)),
            Value::Int(v) => Ok(f64::from(v)),
            other => Err(null_or_mismatch(Self::KIND, &other)),
        }
    }
}

impl ValueType for f32 {
    const KIND: ValueKind = ValueKind::Double;

    fn into_value(self) -> Value {
        Value::Double(f64::from(self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        f64::try_from_value(value).map(|v| v as f32)
    }
}

macro_rules! impl_exact {
    ($ty:ty, $kind:ident) => {
        impl ValueType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(self)
            }

            fn try_from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::$kind(v) => Ok(v),
                    other => Err(null_or_mismatch(Self::KIND, &other)),
                }
            }
        }
    };
}

impl_exact!(String, String);
impl_exact!(Vec<u8>, Bytes);
impl_exact!(NaiveDateTime, Timestamp);
impl_exact!(DateTime<Utc>, TimestampTz);
impl_exact!(serde_json::Value, Json);

impl ValueType for Uuid {
    const KIND: ValueKind = ValueKind::Uuid;

    fn into_value(self) -> Value {
        Value::Uuid(self)
    }

    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Uuid(v) => Ok(v),
            // Stores without a native uuid type hand back text
            Value::String(s) => Uuid::parse_str(&s)
                .map_err(|e| ValueError::ConversionError(format!("invalid uuid '{s}': {e}"))),
            other => Err(null_or_mismatch(Self::KIND, &other)),
        }
    }
}

impl ValueType for Decimal {
    const KIND: ValueKind = ValueKind::Decimal;

    fn into_value(self) -> Value {
        Value::Decimal(self)
    }

    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::SmallInt(v) => Ok(Decimal::from(v)),
            Value::Int(v) => Ok(Decimal::from(v)),
            Value::BigInt(v) => Ok(Decimal::from(v)),
            other => Err(null_or_mismatch(Self::KIND, &other)),
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, ValueType::into_value)
    }

    fn try_from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from_value(other).map(Some),
        }
    }
}
