use async_trait::async_trait;
use tiberius::Config;
use tokio::net::TcpStream;
use tokio_util::compat::Compat;
use tracing::debug;

use super::client::create_mssql_client;
use super::executor::MssqlConnection;
use crate::driver::Connector;
use crate::error::QueryManagerError;
use crate::options::EffectiveOptions;

/// Type alias for SQL Server client
pub type MssqlClient = tiberius::Client<Compat<TcpStream>>;

/// Opens SQL Server connections from ADO.NET style connection strings.
///
/// ```
/// use sql_query_manager::mssql::MssqlConnector;
///
/// let connector = MssqlConnector::new()
///     .with_trust_cert(true)
///     .with_application_name("reports");
/// let config = connector
///     .build_config("Server=tcp:db.local,1433;Database=app;User Id=sa;Password=pw")
///     .unwrap();
/// assert_eq!(config.get_addr(), "db.local:1433");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MssqlConnector {
    trust_cert: bool,
    application_name: Option<String>,
}

impl MssqlConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the server certificate without validation, whatever the
    /// connection string says.
    #[must_use]
    pub fn with_trust_cert(mut self, trust_cert: bool) -> Self {
        self.trust_cert = trust_cert;
        self
    }

    #[must_use]
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Parse `connection_string` and apply the connector's overrides.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if the string cannot be parsed.
    pub fn build_config(&self, connection_string: &str) -> Result<Config, QueryManagerError> {
        let mut config = Config::from_ado_string(connection_string).map_err(|e| {
            QueryManagerError::ConfigError(format!("Invalid SQL Server connection string: {e}"))
        })?;
        if self.trust_cert {
            config.trust_cert();
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        Ok(config)
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    type Connection = MssqlConnection;

    async fn open(&self, options: &EffectiveOptions) -> Result<MssqlConnection, QueryManagerError> {
        let config = self.build_config(options.connection_string())?;
        debug!(addr = %config.get_addr(), "opening SQL Server connection");
        let client = create_mssql_client(config).await?;
        Ok(MssqlConnection::new(client))
    }
}
