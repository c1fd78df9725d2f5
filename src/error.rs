use thiserror::Error;

/// Failure to turn a single column of a row into the requested Rust type.
///
/// Every variant carries the column name so callers mapping wide rows can
/// tell which field was at fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldReadError {
    /// The raw value could not be read at all (unknown column and the like).
    #[error("Failed to read [{field}]: {reason}")]
    Read { field: String, reason: String },

    /// The raw value is present but has the wrong shape for the target type.
    #[error("Failed to cast [{field}]: {from} could not be converted to {to}")]
    Cast {
        field: String,
        from: &'static str,
        to: &'static str,
    },

    /// The raw value is NULL and the target type cannot represent absence.
    #[error("Null value in field [{field}] could not be converted to value type {to}")]
    NullValueType { field: String, to: &'static str },

    /// The raw value does not name any member of the target enumeration.
    #[error("Failed to read [{field}], [{value}] is not defined in enumeration {enum_name}")]
    EnumNotDefined {
        field: String,
        enum_name: &'static str,
        value: String,
    },
}

impl FieldReadError {
    /// Name of the column the failed read targeted.
    #[must_use]
    pub fn field_name(&self) -> &str {
        match self {
            FieldReadError::Read { field, .. }
            | FieldReadError::Cast { field, .. }
            | FieldReadError::NullValueType { field, .. }
            | FieldReadError::EnumNotDefined { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum QueryManagerError {
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error(transparent)]
    FieldRead(#[from] FieldReadError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other error: {0}")]
    Other(String),
}
