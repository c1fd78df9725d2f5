//! Typed column reads.
//!
//! A read goes through four checks in order: the column must exist, an enum
//! target must receive one of its defined members, NULL is only accepted by
//! targets that can represent absence (`Option<T>`, raw [`RowValues`]), and
//! finally the raw value is converted to the target type.
//!
//! ```rust
//! use sql_query_manager::prelude::*;
//! use sql_query_manager::helpers::create_test_row;
//!
//! let row = create_test_row(
//!     vec!["id".into(), "count".into()],
//!     vec![RowValues::Int(7), RowValues::Null],
//! );
//! let id: i32 = row.read("id")?;
//! let count: Option<i64> = row.read("count")?;
//! assert_eq!((id, count), (7, None));
//! assert!(matches!(
//!     row.read::<i64>("count"),
//!     Err(FieldReadError::NullValueType { .. })
//! ));
//! # Ok::<(), FieldReadError>(())
//! ```

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::FieldReadError;
use crate::results::DbRow;
use crate::types::RowValues;

/// Conversion from a raw column value into a Rust type.
///
/// Implementations for non-nullable types must reject [`RowValues::Null`]
/// with [`FieldReadError::NullValueType`]; wrap the type in `Option` to
/// accept NULL.
pub trait FromField: Sized {
    /// Convert `raw`, read from column `field`.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldReadError`] describing why `raw` is not a `Self`.
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError>;
}

/// An enumeration whose members are stored by discriminant (or by name).
///
/// Usually implemented through [`field_enum!`](crate::field_enum).
pub trait FieldEnum: Sized {
    const ENUM_NAME: &'static str;

    fn from_discriminant(value: i64) -> Option<Self>;

    fn from_name(name: &str) -> Option<Self>;
}

/// Read column `field` of `row` as `T`.
///
/// # Errors
///
/// [`FieldReadError::Read`] if the column does not exist, otherwise whatever
/// `T::from_field` reports.
pub fn read_field<T: FromField>(row: &DbRow, field: &str) -> Result<T, FieldReadError> {
    let raw = row.get(field).ok_or_else(|| FieldReadError::Read {
        field: field.to_string(),
        reason: "column not found in row".to_string(),
    })?;
    T::from_field(field, raw)
}

/// Resolve a raw value against the members of `E`.
///
/// # Errors
///
/// [`FieldReadError::NullValueType`] for NULL, [`FieldReadError::EnumNotDefined`]
/// for any value that is not a member.
pub fn read_enum<E: FieldEnum>(field: &str, raw: &RowValues) -> Result<E, FieldReadError> {
    let member = match raw {
        RowValues::Null => return Err(null_value(field, E::ENUM_NAME)),
        RowValues::Int(value) => E::from_discriminant(*value),
        RowValues::Text(name) => E::from_name(name.trim()),
        _ => None,
    };
    member.ok_or_else(|| FieldReadError::EnumNotDefined {
        field: field.to_string(),
        enum_name: E::ENUM_NAME,
        value: raw.to_string(),
    })
}

pub(crate) fn null_value(field: &str, to: &'static str) -> FieldReadError {
    FieldReadError::NullValueType {
        field: field.to_string(),
        to,
    }
}

pub(crate) fn cast_failure(field: &str, raw: &RowValues, to: &'static str) -> FieldReadError {
    FieldReadError::Cast {
        field: field.to_string(),
        from: raw.type_name(),
        to,
    }
}

/// Shared shape of the scalar impls: NULL is rejected, `convert` decides the rest.
fn convert_non_null<T>(
    field: &str,
    raw: &RowValues,
    to: &'static str,
    convert: impl FnOnce(&RowValues) -> Option<T>,
) -> Result<T, FieldReadError> {
    if raw.is_null() {
        return Err(null_value(field, to));
    }
    convert(raw).ok_or_else(|| cast_failure(field, raw, to))
}

macro_rules! narrow_int_from_field {
    ($($ty:ty),+) => {
        $(
            impl FromField for $ty {
                fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
                    convert_non_null(field, raw, stringify!($ty), |v| {
                        v.as_int().and_then(|i| <$ty>::try_from(i).ok())
                    })
                }
            }
        )+
    };
}

narrow_int_from_field!(i32, i16, u8);

impl FromField for i64 {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "i64", RowValues::as_int)
    }
}

impl FromField for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "f64", |v| match v {
            RowValues::Float(f) => Some(*f),
            RowValues::Int(i) => Some(*i as f64),
            _ => None,
        })
    }
}

impl FromField for f32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "f32", |v| match v {
            RowValues::Float(f) => Some(*f as f32),
            RowValues::Int(i) => Some(*i as f32),
            _ => None,
        })
    }
}

impl FromField for bool {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "bool", RowValues::as_bool)
    }
}

impl FromField for String {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "String", |v| v.as_text().map(str::to_string))
    }
}

impl FromField for Vec<u8> {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "Vec<u8>", |v| v.as_blob().map(<[u8]>::to_vec))
    }
}

impl FromField for NaiveDateTime {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "NaiveDateTime", RowValues::as_timestamp)
    }
}

impl FromField for JsonValue {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        convert_non_null(field, raw, "serde_json::Value", |v| match v {
            RowValues::JSON(json) => Some(json.clone()),
            RowValues::Text(text) => serde_json::from_str(text).ok(),
            _ => None,
        })
    }
}

/// The raw value, NULL included.
impl FromField for RowValues {
    fn from_field(_field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        Ok(raw.clone())
    }
}

impl<T: FromField> FromField for Option<T> {
    fn from_field(field: &str, raw: &RowValues) -> Result<Self, FieldReadError> {
        match raw {
            RowValues::Null => Ok(None),
            other => T::from_field(field, other).map(Some),
        }
    }
}

/// Declare an enum that can be read from a column holding its discriminant
/// or its variant name.
///
/// ```rust
/// use sql_query_manager::field_enum;
/// use sql_query_manager::prelude::*;
/// use sql_query_manager::helpers::create_test_row;
///
/// field_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum OrderStatus {
///         Open = 1,
///         Shipped = 2,
///     }
/// }
///
/// let row = create_test_row(vec!["status".into()], vec![RowValues::Int(2)]);
/// assert_eq!(row.read::<OrderStatus>("status"), Ok(OrderStatus::Shipped));
/// ```
#[macro_export]
macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $crate::field::FieldEnum for $name {
            const ENUM_NAME: &'static str = stringify!($name);

            fn from_discriminant(value: i64) -> ::std::option::Option<Self> {
                $(
                    if value == ($value) as i64 {
                        return ::std::option::Option::Some($name::$variant);
                    }
                )+
                ::std::option::Option::None
            }

            fn from_name(name: &str) -> ::std::option::Option<Self> {
                match name {
                    $( stringify!($variant) => ::std::option::Option::Some($name::$variant), )+
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::field::FromField for $name {
            fn from_field(
                field: &str,
                raw: &$crate::types::RowValues,
            ) -> ::std::result::Result<Self, $crate::error::FieldReadError> {
                $crate::field::read_enum(field, raw)
            }
        }
    };
}
