//! Synchronous wrapper around [`QueryManager`].
//!
//! Each call blocks the calling thread on a private current-thread runtime
//! until the driver is done. Do not use it from inside an async runtime;
//! `block_on` panics there. Use [`QueryManager`] directly instead.

use tokio::runtime::{Builder, Runtime};

use crate::driver::Connector;
use crate::error::{FieldReadError, QueryManagerError};
use crate::executor::QueryManager;
use crate::field::FromField;
use crate::options::{EffectiveOptions, QueryOptions};
use crate::params::Parameter;
use crate::results::DbRow;

#[derive(Debug)]
pub struct BlockingQueryManager<C> {
    inner: QueryManager<C>,
    runtime: Runtime,
}

impl<C: Connector> BlockingQueryManager<C> {
    /// # Errors
    ///
    /// Returns `QueryManagerError::Other` if the runtime cannot be started.
    pub fn new(connector: C) -> Result<Self, QueryManagerError> {
        Self::from_async(QueryManager::new(connector))
    }

    /// Wrap an existing manager, keeping its defaults.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::Other` if the runtime cannot be started.
    pub fn from_async(inner: QueryManager<C>) -> Result<Self, QueryManagerError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| QueryManagerError::Other(format!("failed to start runtime: {e}")))?;
        Ok(Self { inner, runtime })
    }

    #[must_use]
    pub fn as_async(&self) -> &QueryManager<C> {
        &self.inner
    }

    /// # Errors
    ///
    /// See [`QueryManager::configure`].
    pub fn configure(&self, options: &QueryOptions) -> Result<(), QueryManagerError> {
        self.inner.configure(options)
    }

    /// # Errors
    ///
    /// See [`QueryManager::configure_connection_string`].
    pub fn configure_connection_string(
        &self,
        connection_string: &str,
    ) -> Result<(), QueryManagerError> {
        self.inner.configure_connection_string(connection_string)
    }

    /// # Errors
    ///
    /// See [`QueryManager::resolve_options`].
    pub fn resolve_options(
        &self,
        options: &QueryOptions,
    ) -> Result<EffectiveOptions, QueryManagerError> {
        self.inner.resolve_options(options)
    }

    /// # Errors
    ///
    /// See [`QueryManager::select_to_objects`].
    pub fn select_to_objects<T, F>(
        &self,
        query: &str,
        row_map: F,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Vec<T>, QueryManagerError>
    where
        F: FnMut(&DbRow) -> Result<T, FieldReadError>,
    {
        self.runtime
            .block_on(self.inner.select_to_objects(query, row_map, options, params))
    }

    /// # Errors
    ///
    /// See [`QueryManager::select_to_object`].
    pub fn select_to_object<T, F>(
        &self,
        query: &str,
        row_map: F,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Option<T>, QueryManagerError>
    where
        F: FnOnce(&DbRow) -> Result<T, FieldReadError>,
    {
        self.runtime
            .block_on(self.inner.select_to_object(query, row_map, options, params))
    }

    /// # Errors
    ///
    /// See [`QueryManager::select_value_scalar`].
    pub fn select_value_scalar<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<T, QueryManagerError>
    where
        T: FromField + Default,
    {
        self.runtime
            .block_on(self.inner.select_value_scalar(query, options, params))
    }

    /// # Errors
    ///
    /// See [`QueryManager::select_reference_scalar`].
    pub fn select_reference_scalar<T>(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<Option<T>, QueryManagerError>
    where
        T: FromField,
    {
        self.runtime
            .block_on(self.inner.select_reference_scalar(query, options, params))
    }

    /// # Errors
    ///
    /// See [`QueryManager::execute_non_query`].
    pub fn execute_non_query(
        &self,
        query: &str,
        options: &QueryOptions,
        params: &[Parameter],
    ) -> Result<u64, QueryManagerError> {
        self.runtime
            .block_on(self.inner.execute_non_query(query, options, params))
    }
}
