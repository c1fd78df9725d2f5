use std::time::Duration;

use crate::error::QueryManagerError;
use crate::options::EffectiveOptions;
use crate::params::{BoundParameter, Parameter};
use crate::types::{CommandType, RowValues};

/// A fully configured command, ready for a driver to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    text: String,
    command_type: CommandType,
    timeout: Duration,
    parameters: Vec<BoundParameter>,
}

impl Command {
    /// Build a command from caller input; NULL is substituted for parameters
    /// without a value.
    ///
    /// # Errors
    ///
    /// Returns `QueryManagerError::ParameterError` for an empty query text, a
    /// parameter without a name, or two parameters with the same name.
    pub fn new(
        text: &str,
        options: &EffectiveOptions,
        params: &[Parameter],
    ) -> Result<Self, QueryManagerError> {
        if text.trim().is_empty() {
            return Err(QueryManagerError::ParameterError(
                "query text cannot be empty".to_string(),
            ));
        }

        let mut parameters: Vec<BoundParameter> = Vec::with_capacity(params.len());
        for param in params {
            let bound = BoundParameter::from(param);
            if bound.name.is_empty() {
                return Err(QueryManagerError::ParameterError(format!(
                    "parameter name cannot be empty (given {:?})",
                    param.name()
                )));
            }
            if !is_parameter_name(&bound.name) {
                return Err(QueryManagerError::ParameterError(format!(
                    "parameter name {:?} is not a valid identifier",
                    param.name()
                )));
            }
            if parameters
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&bound.name))
            {
                return Err(QueryManagerError::ParameterError(format!(
                    "parameter @{} is given more than once",
                    bound.name
                )));
            }
            parameters.push(bound);
        }

        Ok(Self {
            text: text.to_string(),
            command_type: options.command_type(),
            timeout: options.command_timeout(),
            parameters,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }

    /// Value bound to `name` (with or without `@`), matched ignoring case.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&RowValues> {
        let name = name.trim_start_matches('@');
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| &p.value)
    }
}

/// T-SQL identifier bytes after the first: letters, digits, `_ # $ @`.
/// Non-ASCII bytes are taken whole so slicing stays on char boundaries.
pub(crate) fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'#' | b'$' | b'@') || b >= 0x80
}

/// A bare parameter name must be a single identifier; it ends up in SQL text.
fn is_parameter_name(name: &str) -> bool {
    match name.as_bytes() {
        [] => false,
        [first, ..] if first.is_ascii_digit() || *first == b'$' => false,
        bytes => bytes.iter().all(|b| is_identifier_byte(*b)),
    }
}
