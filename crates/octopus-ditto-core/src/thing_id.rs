//! Thing identifiers of the form `namespace:name`.

use std::fmt;
use std::str::FromStr;

/// Identifier of a thing.
///
/// The string form is `namespace + ":" + name`. Devices use exactly this
/// string as their device id, so the format must not change. The namespace
/// may be empty (the default namespace); the name may not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThingId {
    namespace: String,
    name: String,
}

impl ThingId {
    /// Create a thing id from its parts.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The name part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

impl FromStr for ThingId {
    type Err = ThingIdError;

    /// Split on the first `:`; the name may itself contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, name)) if !name.is_empty() => Ok(Self::new(namespace, name)),
            _ => Err(ThingIdError::Invalid(s.to_string())),
        }
    }
}

/// Errors for thing id parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThingIdError {
    /// Missing `:` separator or an empty name
    #[error("invalid thing id '{0}': expected 'namespace:name'")]
    Invalid(String),
}
