use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QueryManagerError;
use crate::types::CommandType;

/// Timeout used when neither the call nor the configured defaults set one.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-call options. Every unset field falls back to the configured
/// defaults, then to [`CommandType::StoredProcedure`] and
/// [`DEFAULT_COMMAND_TIMEOUT`].
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use sql_query_manager::prelude::*;
///
/// let options = QueryOptions::default()
///     .with_command_type(CommandType::Text)
///     .with_command_timeout(Duration::from_secs(5));
/// let effective = options.resolve(None);
/// // no connection string anywhere
/// assert!(matches!(effective, Err(QueryManagerError::ConfigError(_))));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub connection_string: Option<String>,
    pub command_type: Option<CommandType>,
    #[serde(rename = "command_timeout_secs", with = "timeout_secs")]
    pub command_timeout: Option<Duration>,
}

impl QueryOptions {
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self::default().with_connection_string(connection_string)
    }

    #[must_use]
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    #[must_use]
    pub fn with_command_type(mut self, command_type: CommandType) -> Self {
        self.command_type = Some(command_type);
        self
    }

    #[must_use]
    pub fn with_command_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = Some(command_timeout);
        self
    }

    /// Parse options from a JSON document such as
    /// `{"connection_string": "...", "command_type": "text", "command_timeout_secs": 10}`.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if the document is malformed or
    /// the timeout is negative.
    pub fn from_json(json: &str) -> Result<Self, QueryManagerError> {
        serde_json::from_str(json)
            .map_err(|e| QueryManagerError::ConfigError(format!("invalid query options: {e}")))
    }

    /// Layer these options over `defaults`.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if no usable connection string
    /// results.
    pub fn resolve(
        &self,
        defaults: Option<&EffectiveOptions>,
    ) -> Result<EffectiveOptions, QueryManagerError> {
        let connection_string = match (&self.connection_string, defaults) {
            (Some(own), _) => own.clone(),
            (None, Some(defaults)) => defaults.connection_string.clone(),
            (None, None) => {
                return Err(QueryManagerError::ConfigError(
                    "no connection string was given and no default has been configured"
                        .to_string(),
                ));
            }
        };
        let command_type = self
            .command_type
            .or(defaults.map(EffectiveOptions::command_type))
            .unwrap_or_default();
        let command_timeout = self
            .command_timeout
            .or(defaults.map(EffectiveOptions::command_timeout))
            .unwrap_or(DEFAULT_COMMAND_TIMEOUT);

        EffectiveOptions::new(connection_string, command_type, command_timeout)
    }
}

/// Fully resolved, validated options for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    connection_string: String,
    command_type: CommandType,
    command_timeout: Duration,
}

impl EffectiveOptions {
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if `connection_string` is blank.
    pub fn new(
        connection_string: String,
        command_type: CommandType,
        command_timeout: Duration,
    ) -> Result<Self, QueryManagerError> {
        if connection_string.trim().is_empty() {
            return Err(QueryManagerError::ConfigError(
                "connection string cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            connection_string,
            command_type,
            command_timeout,
        })
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    #[must_use]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Zero means no timeout.
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }
}

impl TryFrom<QueryOptions> for EffectiveOptions {
    type Error = QueryManagerError;

    fn try_from(options: QueryOptions) -> Result<Self, Self::Error> {
        options.resolve(None)
    }
}

/// Holder for the defaults a [`QueryManager`](crate::QueryManager) falls back
/// to. Reads and writes share one lock.
#[derive(Debug, Default)]
pub struct DefaultOptions {
    current: Mutex<Option<EffectiveOptions>>,
}

impl DefaultOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<EffectiveOptions>> {
        match self.current.lock() {
            Ok(guard) => guard,
            // A panic while holding the lock cannot leave a half-written value.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the defaults. Unset fields take the built-in fallbacks, not
    /// the previous defaults.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if the connection string is
    /// missing or blank; the previous defaults stay in effect.
    pub fn configure(&self, options: &QueryOptions) -> Result<(), QueryManagerError> {
        let resolved = options.resolve(None)?;
        *self.lock() = Some(resolved);
        Ok(())
    }

    /// Replace the defaults with `connection_string` and the built-in
    /// command type and timeout.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ConfigError` if the connection string is blank.
    pub fn configure_connection_string(
        &self,
        connection_string: &str,
    ) -> Result<(), QueryManagerError> {
        self.configure(&QueryOptions::new(connection_string))
    }

    #[must_use]
    pub fn current(&self) -> Option<EffectiveOptions> {
        self.lock().clone()
    }

    /// Resolve per-call `options` against the current defaults.
    ///
    /// # Errors
    ///
    /// See [`QueryOptions::resolve`].
    pub fn resolve(&self, options: &QueryOptions) -> Result<EffectiveOptions, QueryManagerError> {
        let guard = self.lock();
        options.resolve(guard.as_ref())
    }
}

mod timeout_secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(timeout) => s.serialize_some(&timeout.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(d)? {
            None => Ok(None),
            Some(secs) => Duration::try_from_secs_f64(secs).map(Some).map_err(|_| {
                D::Error::custom(format!(
                    "command timeout must be a non-negative number of seconds, got {secs}"
                ))
            }),
        }
    }
}
