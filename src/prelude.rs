//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::blocking::BlockingQueryManager;
pub use crate::driver::{Connection, Connector};
pub use crate::error::{FieldReadError, QueryManagerError};
pub use crate::executor::QueryManager;
pub use crate::field::{FieldEnum, FromField};
pub use crate::options::{EffectiveOptions, QueryOptions};
pub use crate::params::Parameter;
pub use crate::results::{DbRow, ResultSet};
pub use crate::types::{CommandType, RowValues};

#[cfg(feature = "mssql")]
pub use crate::mssql::{MssqlConnection, MssqlConnector};
