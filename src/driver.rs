//! The seam between the query manager and a database driver.
//!
//! A [`Connector`] opens one [`Connection`] per call; the manager runs a
//! single command on it and closes it again. Pooling, if any, lives behind
//! the connector.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::command::Command;
use crate::error::QueryManagerError;
use crate::options::EffectiveOptions;
use crate::results::{DbRow, ResultSet};
use crate::types::RowValues;

/// Future returned by the [`Connection`] methods.
pub type DriverFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, QueryManagerError>> + Send + 'a>>;

#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: Connection + 'static;

    /// Open a connection for `options.connection_string()`.
    async fn open(&self, options: &EffectiveOptions) -> Result<Self::Connection, QueryManagerError>;
}

#[async_trait]
pub trait Connection: Send + Sized {
    /// Run `command` and collect every row of its first result set.
    async fn query(&mut self, command: &Command) -> Result<ResultSet, QueryManagerError>;

    /// Run `command` and read no further than its first row.
    async fn query_first(&mut self, command: &Command) -> Result<Option<DbRow>, QueryManagerError>;

    /// First column of the first row, `None` when there is no row.
    async fn scalar(&mut self, command: &Command) -> Result<Option<RowValues>, QueryManagerError> {
        let row = self.query_first(command).await?;
        Ok(row.and_then(|row| row.into_values().into_iter().next()))
    }

    /// Run `command` for its effect; returns the number of affected rows.
    async fn execute(&mut self, command: &Command) -> Result<u64, QueryManagerError>;

    async fn close(self) -> Result<(), QueryManagerError> {
        Ok(())
    }
}
