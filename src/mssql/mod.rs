// SQL Server driver on top of tiberius.
//
// - config: connection string parsing and the `Connector` implementation
// - client: TCP connect, login and redirect handling
// - command: T-SQL rendering of commands and named parameters
// - params: binding `RowValues` as tiberius parameters
// - query: decoding result streams into `ResultSet`
// - executor: the `Connection` implementation

pub mod client;
mod command;
pub mod config;
pub mod executor;
pub mod params;
pub mod query;
mod scanner;

pub use client::create_mssql_client;
pub use command::{render_command, rewrite_named_parameters};
pub use config::{MssqlClient, MssqlConnector};
pub use executor::MssqlConnection;
pub use params::bind_command;
pub use query::build_result_set;
