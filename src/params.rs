use crate::types::RowValues;

/// A named query parameter supplied by the caller.
///
/// The name may be written with or without the leading `@`. A parameter can
/// carry no value at all ([`Parameter::null`]); it is bound as NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: Option<RowValues>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<RowValues>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A parameter with no value.
    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without the leading `@`.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        self.name.trim().trim_start_matches('@')
    }

    #[must_use]
    pub fn value(&self) -> Option<&RowValues> {
        self.value.as_ref()
    }
}

/// A parameter as handed to the driver: bare name, never-absent value.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub value: RowValues,
}

impl From<&Parameter> for BoundParameter {
    fn from(param: &Parameter) -> Self {
        BoundParameter {
            name: param.bare_name().to_string(),
            value: param.value.clone().unwrap_or(RowValues::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_binds_as_null() {
        let bound = BoundParameter::from(&Parameter::null("@note"));
        assert_eq!(bound.name, "note");
        assert_eq!(bound.value, RowValues::Null);
    }

    #[test]
    fn at_sign_is_optional() {
        assert_eq!(Parameter::new("@id", 1).bare_name(), "id");
        assert_eq!(Parameter::new("id", 1).bare_name(), "id");
    }
}
