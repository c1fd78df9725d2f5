use tiberius::{Client, Config, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing::debug;

use super::config::MssqlClient;
use crate::error::QueryManagerError;

/// Connect and log in to the server `config` points at.
///
/// Named instances are resolved through the SQL Browser service. A routing
/// response (Azure SQL gateways, availability group listeners) is followed
/// once.
///
/// # Errors
/// Returns `QueryManagerError::ConnectionError` if the TCP connection or login fails.
pub async fn create_mssql_client(config: Config) -> Result<MssqlClient, QueryManagerError> {
    let tcp = TcpStream::connect_named(&config)
        .await
        .map_err(|e| QueryManagerError::ConnectionError(format!("TCP connection error: {e}")))?;
    tcp.set_nodelay(true)
        .map_err(|e| QueryManagerError::ConnectionError(format!("TCP connection error: {e}")))?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        Err(tiberius::error::Error::Routing { host, port }) => {
            debug!(%host, port, "server redirected connection");
            let mut config = config;
            config.host(&host);
            config.port(port);

            let tcp = TcpStream::connect(config.get_addr()).await.map_err(|e| {
                QueryManagerError::ConnectionError(format!("TCP connection error: {e}"))
            })?;
            tcp.set_nodelay(true).map_err(|e| {
                QueryManagerError::ConnectionError(format!("TCP connection error: {e}"))
            })?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(login_error)
        }
        Err(e) => Err(login_error(e)),
    }
}

fn login_error(e: tiberius::error::Error) -> QueryManagerError {
    QueryManagerError::ConnectionError(format!("SQL Server connection error: {e}"))
}
