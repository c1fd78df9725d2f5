//! Thin query helpers for SQL Server.
//!
//! A [`QueryManager`] resolves per-call [`QueryOptions`] against configured
//! defaults, opens one connection per call through a [`Connector`], runs a
//! single command and maps the rows with a caller supplied closure. Column
//! reads go through [`FromField`], which reports failures as
//! [`FieldReadError`] naming the offending column.
//!
//! ```rust,no_run
//! use sql_query_manager::prelude::*;
//!
//! # async fn run() -> Result<(), QueryManagerError> {
//! let manager = QueryManager::with_defaults(
//!     MssqlConnector::new(),
//!     &QueryOptions::new("Server=tcp:localhost,1433;Database=app;User Id=sa;Password=pw"),
//! )?;
//!
//! let names: Vec<String> = manager
//!     .select_to_objects(
//!         "select name from users where active = @active",
//!         |row| row.read("name"),
//!         &QueryOptions::default().with_command_type(CommandType::Text),
//!         &[Parameter::new("active", true)],
//!     )
//!     .await?;
//! # let _ = names;
//! # Ok(())
//! # }
//! ```

pub mod blocking;
pub mod command;
pub mod driver;
pub mod error;
pub mod executor;
pub mod field;
pub mod helpers;
#[cfg(feature = "mssql")]
pub mod mssql;
pub mod options;
pub mod params;
pub mod prelude;
pub mod results;
pub mod types;

pub use blocking::BlockingQueryManager;
pub use command::Command;
pub use driver::{Connection, Connector, DriverFuture};
pub use error::{FieldReadError, QueryManagerError};
pub use executor::{QueryManager, SCALAR_FIELD};
pub use field::{FieldEnum, FromField, read_enum, read_field};
pub use options::{DEFAULT_COMMAND_TIMEOUT, DefaultOptions, EffectiveOptions, QueryOptions};
pub use params::{BoundParameter, Parameter};
pub use results::{DbRow, ResultSet};
pub use types::{CommandType, RowValues};
