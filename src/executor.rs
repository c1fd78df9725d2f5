use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::command::Command;
use crate::driver::{Connection, Connector, DriverFuture};
use crate::error::{FieldReadError, QueryManagerError};
use crate::field::FromField;
use crate::options::{DefaultOptions, EffectiveOptions, QueryOptions};
use crate::params::Parameter;
use crate::results::DbRow;
use crate::types::RowValues;

/// Field name reported when a scalar result cannot be cast.
pub const SCALAR_FIELD: &str = "scalar";

/// Runs commands through a [`Connector`], one connection per call.
///
/// Every operation takes per-call [`QueryOptions`]; fields left unset there
/// come from the defaults configured on this manager (see
/// [`QueryManager::configure`]). Pass `&QueryOptions::default()` to use the
/// defaults as they are.
#[derive(Debug)]
pub struct QueryManager<C> {
    connector: C,
    defaults: DefaultOptions,
}

impl<C: Connector> QueryManager<C> {
    /// A manager without defaults; each call must then carry a connection string.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            defaults: DefaultOptions::new(),
        }
    }

    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if `defaults` has no usable
    /// connection string.
    pub fn with_defaults(connector: C, defaults: &QueryOptions) -> Result<Self, QueryManagerError> {
        let manager = Self::new(connector);
        manager.configure(defaults)?;
        Ok(manager)
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    #[must_use]
    pub fn defaults(&self) -> &DefaultOptions {
        &self.defaults
    }

    /// Replace the defaults.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` for a missing or blank
    /// connection string; the previous defaults stay in effect.
    pub fn configure(&self, options: &QueryOptions) -> Result<(), QueryManagerError> {
        self.defaults.configure(options)
    }

    /// Replace the defaults with a bare connection string.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` for a blank connection string.
    pub fn configure_connection_string(
        &self,
        connection_string: &str,
    ) -> Result<(), QueryManagerError> {
        self.defaults.configure_connection_string(connection_string)
    }

    /// Effective options a call with `options` would run with.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if no connection string resolves.
    pub fn resolve_options(
        &self,
        options: &QueryOptions,
    ) -> Result<EffectiveOptions, QueryManagerError> {
        self.defaults.resolve(options)
    }

    /// Run `query` and map every row of its first result set with `row_map`.
    ///
    /// Returns an empty `Vec` when no rows come back. The first mapping error
    /// stops the iteration and is returned.
    ///
    /// # Errors
    ///
    /// Configuration, connection and execution errors from the driver, or the
    /// first `FieldReadError` returned by `row_map`.
    pub async fn select_to_objects<T, F>(
        &self,
        query: &str,
        mut row_map: F,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Vec<T>, QueryManagerError>
    where
        F: FnMut(&DbRow) -> Result<T, FieldReadError>,
    {
        let result_set = self
            .execute_command(query, options, params, |conn, cmd| conn.query(cmd))
            .await?;
        trace!(rows = result_set.len(), "mapping result set");

        let mut mapped = Vec::with_capacity(result_set.len());
        for row in result_set.rows() {
            mapped.push(row_map(row)?);
        }
        Ok(mapped)
    }

    /// Run `query` and map its first row with `row_map`; `None` when there is
    /// no row. Later rows are never read.
    ///
    /// # Errors
    ///
    /// As for [`QueryManager::select_to_objects`].
    pub async fn select_to_object<T, F>(
        &self,
        query: &str,
        row_map: F,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Option<T>, QueryManagerError>
    where
        F: FnOnce(&DbRow) -> Result<T, FieldReadError>,
    {
        let row = self
            .execute_command(query, options, params, |conn, cmd| conn.query_first(cmd))
            .await?;
        match row {
            Some(row) => Ok(Some(row_map(&row)?)),
            None => Ok(None),
        }
    }

    /// Run `query` and cast the first column of its first row to `T`.
    ///
    /// NULL or no row at all yields `T::default()`.
    ///
    /// # Errors
    ///
    /// Driver errors, or a `FieldReadError` for [`SCALAR_FIELD`] if the value
    /// cannot be cast to `T`.
    pub async fn select_value_scalar<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<T, QueryManagerError>
    where
        T: FromField + Default,
    {
        match self.scalar(query, options, params).await? {
            None | Some(RowValues::Null) => Ok(T::default()),
            Some(value) => Ok(T::from_field(SCALAR_FIELD, &value)?),
        }
    }

    /// Run `query` and cast the first column of its first row to `T`.
    ///
    /// NULL, no row, or a value that does not cast all yield `None`.
    ///
    /// # Errors
    ///
    /// Configuration, connection and execution errors only.
    pub async fn select_reference_scalar<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Option<T>, QueryManagerError>
    where
        T: FromField,
    {
        let value = self.scalar(query, options, params).await?;
        Ok(value.and_then(|v| Option::<T>::from_field(SCALAR_FIELD, &v).ok().flatten()))
    }

    /// Run `query` for its effect, ignoring any rows; returns the number of
    /// rows affected.
    ///
    /// # Errors
    ///
    /// Configuration, connection and execution errors.
    pub async fn execute_non_query(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<u64, QueryManagerError> {
        self.execute_command(query, options, params, |conn, cmd| conn.execute(cmd))
            .await
    }

    async fn scalar(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Option<RowValues>, QueryManagerError> {
        self.execute_command(query, options, params, |conn, cmd| conn.scalar(cmd))
            .await
    }

    /// Resolve options, open a connection, run `action` under the command
    /// timeout, and close the connection whatever the outcome.
    async fn execute_command<R, A>(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
        action: A,
    ) -> Result<R, QueryManagerError>
    where
        A: for<'c> FnOnce(&'c mut C::Connection, &'c Command) -> DriverFuture<'c, R>,
    {
        let effective = self.resolve_options(options)?;
        let command = Command::new(query, &effective, params)?;

        debug!(
            command_type = ?command.command_type(),
            timeout = ?command.timeout(),
            params = command.parameters().len(),
            query = command.text(),
            "executing command"
        );

        let mut connection = self.connector.open(&effective).await?;
        let outcome = with_timeout(command.timeout(), action(&mut connection, &command)).await;
        let closed = connection.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(error = %close_err, "failed to close connection after command error");
                Err(err)
            }
        }
    }
}

/// A zero timeout waits indefinitely.
async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, QueryManagerError>>,
) -> Result<T, QueryManagerError> {
    if timeout.is_zero() {
        return fut.await;
    }
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(QueryManagerError::ExecutionError(format!(
            "command timed out after {timeout:?}"
        ))),
    }
}
