use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between a primitive Rust type and its native [`Value`].
///
/// This is the terminal layer of type mapping: [`TypeMapper::of`](crate::TypeMapper::of) builds a
/// registry mapper for any `AsValue` type, chained and derived mappers eventually land on one of
/// these conversions.
///
/// # Error semantics
/// - Numeric widening is accepted on decode (an `i64` can be read from `Value::Int16`), narrowing is
///   range checked and the error names both the offending value and the target type.
/// - NULL values are rejected here: nullability is handled by the mapper, not by the primitive.
///
/// # Examples
/// ```rust
/// use quarry_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert!(matches!(v, Value::Int32(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL of this type, used as the database type descriptor.
    fn as_empty_value() -> Value;
    /// Convert into the owned native representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a native value back into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl From<&'static str> for Value {
    fn from(value: &'static str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {value:?} to {}",
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value_integer {
    ($source:ty, $destination:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let wide: i128 = match value {
                    $destination(Some(v)) => return Ok(v),
                    Value::Int8(Some(v)) => v as _,
                    Value::Int16(Some(v)) => v as _,
                    Value::Int32(Some(v)) => v as _,
                    Value::Int64(Some(v)) => v as _,
                    Value::UInt8(Some(v)) => v as _,
                    Value::UInt16(Some(v)) => v as _,
                    Value::UInt32(Some(v)) => v as _,
                    Value::UInt64(Some(v)) => v as _,
                    Value::Decimal(Some(v)) => {
                        let error = Error::msg(format!(
                            "Value {v}: Decimal does not fit into {}",
                            any::type_name::<Self>()
                        ));
                        if !v.is_integer() {
                            return Err(error.context("The value is not a integer"));
                        }
                        v.to_i128().ok_or(error)?
                    }
                    _ => return Err(conversion_error::<Self>(&value)),
                };
                <$source>::try_from(wide).map_err(|_| {
                    Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>(),
                    ))
                })
            }
        }
    };
}
impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    _ => Err(conversion_error::<Self>(&value)),
                }
            }
        }
    };
}
impl_as_value!(
    bool,
    Value::Boolean,
    Value::Int8(Some(v)) => Ok(v != 0),
    Value::Int16(Some(v)) => Ok(v != 0),
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::Int64(Some(v)) => Ok(v != 0),
    Value::UInt8(Some(v)) => Ok(v != 0),
    Value::UInt16(Some(v)) => Ok(v != 0),
    Value::UInt32(Some(v)) => Ok(v != 0),
    Value::UInt64(Some(v)) => Ok(v != 0),
);
impl_as_value!(
    f32,
    Value::Float32,
    Value::Float64(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v)) => Ok(v.try_into()?),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Float32(Some(v)) => Ok(v as _),
    Value::Int32(Some(v)) => Ok(v as _),
    Value::Decimal(Some(v)) => Ok(v.try_into()?),
);
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int64(Some(v)) => Ok(v.into()),
    Value::Int32(Some(v)) => Ok(v.into()),
    Value::Float64(Some(v)) => Ok(v.try_into()?),
);
impl_as_value!(String, Value::Varchar);
impl_as_value!(
    Vec<u8>,
    Value::Blob,
    Value::Varchar(Some(v)) => Ok(v.into_bytes()),
);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(
    PrimitiveDateTime,
    Value::Timestamp,
    Value::TimestampWithTimezone(Some(v)) => {
        let v = v.to_utc();
        Ok(PrimitiveDateTime::new(v.date(), v.time()))
    },
);
impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    Value::Timestamp(Some(v)) => Ok(v.assume_utc()),
);
impl_as_value!(
    Uuid,
    Value::Uuid,
    Value::Varchar(Some(v)) => Ok(Uuid::parse_str(&v)?),
);
