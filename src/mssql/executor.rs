use async_trait::async_trait;
use tracing::trace;

use super::config::MssqlClient;
use super::params::bind_command;
use super::query::{build_result_set, first_row, first_value};
use crate::command::Command;
use crate::driver::Connection;
use crate::error::QueryManagerError;
use crate::results::{DbRow, ResultSet};
use crate::types::RowValues;

/// One logged-in SQL Server session.
pub struct MssqlConnection {
    client: MssqlClient,
}

impl MssqlConnection {
    #[must_use]
    pub fn new(client: MssqlClient) -> Self {
        Self { client }
    }

    /// The underlying tiberius client, for work outside the query manager.
    pub fn client_mut(&mut self) -> &mut MssqlClient {
        &mut self.client
    }
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection").finish_non_exhaustive()
    }
}

fn execution_error(e: tiberius::error::Error) -> QueryManagerError {
    QueryManagerError::ExecutionError(format!("SQL Server execution error: {e}"))
}

#[async_trait]
impl Connection for MssqlConnection {
    async fn query(&mut self, command: &Command) -> Result<ResultSet, QueryManagerError> {
        let stream = bind_command(command)
            .query(&mut self.client)
            .await
            .map_err(execution_error)?;
        let result_set = build_result_set(stream).await?;
        trace!(rows = result_set.len(), "read result set");
        Ok(result_set)
    }

    async fn query_first(&mut self, command: &Command) -> Result<Option<DbRow>, QueryManagerError> {
        let stream = bind_command(command)
            .query(&mut self.client)
            .await
            .map_err(execution_error)?;
        first_row(stream).await
    }

    async fn scalar(&mut self, command: &Command) -> Result<Option<RowValues>, QueryManagerError> {
        let stream = bind_command(command)
            .query(&mut self.client)
            .await
            .map_err(execution_error)?;
        first_value(stream).await
    }

    async fn execute(&mut self, command: &Command) -> Result<u64, QueryManagerError> {
        let result = bind_command(command)
            .execute(&mut self.client)
            .await
            .map_err(execution_error)?;
        Ok(result.rows_affected().iter().sum())
    }

    async fn close(self) -> Result<(), QueryManagerError> {
        self.client.close().await.map_err(|e| {
            QueryManagerError::ConnectionError(format!("Failed to close SQL Server connection: {e}"))
        })
    }
}
