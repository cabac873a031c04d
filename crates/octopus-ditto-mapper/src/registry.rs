//! Explicit alias → mapper registration.

use crate::mapper::MessageMapper;
use crate::octopus::OctopusProtobufMapper;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of mappers, looked up by alias.
#[derive(Default, Clone)]
pub struct MapperRegistry {
    mappers: BTreeMap<&'static str, Arc<dyn MessageMapper>>,
}

impl MapperRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in mapper.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.mappers.insert(
            OctopusProtobufMapper.alias(),
            Arc::new(OctopusProtobufMapper::new()),
        );
        registry
    }

    /// Register a mapper under its alias.
    ///
    /// # Errors
    ///
    /// Returns error if a mapper with the same alias is already registered.
    pub fn register(&mut self, mapper: Arc<dyn MessageMapper>) -> Result<(), RegistryError> {
        let alias = mapper.alias();
        if self.mappers.contains_key(alias) {
            return Err(RegistryError::DuplicateAlias(alias.to_string()));
        }
        tracing::debug!(alias, "Registered message mapper");
        self.mappers.insert(alias, mapper);
        Ok(())
    }

    /// Look up a mapper by alias.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<Arc<dyn MessageMapper>> {
        self.mappers.get(alias).cloned()
    }

    /// Look up a mapper by alias, failing if it is unknown.
    ///
    /// # Errors
    ///
    /// Returns error if no mapper is registered under `alias`.
    pub fn require(&self, alias: &str) -> Result<Arc<dyn MessageMapper>, RegistryError> {
        self.get(alias)
            .ok_or_else(|| RegistryError::UnknownAlias(alias.to_string()))
    }

    /// Registered aliases in order.
    pub fn aliases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.mappers.keys().copied()
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("aliases", &self.mappers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Errors for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Alias already taken
    #[error("mapper alias already registered: {0}")]
    DuplicateAlias(String),
    /// No mapper with that alias
    #[error("unknown mapper alias: {0}")]
    UnknownAlias(String),
}
