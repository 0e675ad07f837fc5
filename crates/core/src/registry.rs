//! The set of dialects used for extraction.

use crate::dialect::Dialect;
use crate::error::ConfigError;

/// Ordered, validated collection of dialects keyed by item root.
///
/// Built-in dialects come first in the order Atom, RSS, RDF. Custom dialects
/// whose item root matches an existing entry are merged into it in place;
/// any other custom dialect is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    dialects: Vec<Dialect>,
}

impl Registry {
    /// Registry holding only the built-in dialects
    pub fn builtin() -> Self {
        Self { dialects: Dialect::builtin() }
    }

    /// Build a registry from the built-ins plus `custom`, in the given order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use syndicate_core::{Dialect, Registry};
    ///
    /// let custom = Dialect::new("Custom", "custom/item").field("title", "string(title)");
    /// let registry = Registry::build([custom]).unwrap();
    ///
    /// assert_eq!(registry.item_roots(), vec!["feed/entry", "rss/channel/item", "rdf:RDF/item", "custom/item"]);
    /// ```
    pub fn build(custom: impl IntoIterator<Item = Dialect>) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin();
        for dialect in custom {
            registry.register(dialect);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Merge or append a dialect without validating.
    fn register(&mut self, dialect: Dialect) {
        match self.dialects.iter_mut().find(|existing| existing.key() == dialect.key()) {
            Some(existing) => {
                tracing::debug!("Merging dialect override into {}", existing.name);
                *existing = existing.merge(&dialect);
            }
            None => {
                tracing::debug!("Registering dialect {} for {}", dialect.name, dialect.key());
                self.dialects.push(dialect);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for dialect in &self.dialects {
            dialect.validate()?;
        }
        Ok(())
    }

    /// Dialect registered for an item root
    pub fn get(&self, item_root: &str) -> Option<&Dialect> {
        let key = item_root.trim().trim_start_matches('/');
        self.dialects.iter().find(|dialect| dialect.key() == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dialect> {
        self.dialects.iter()
    }

    pub fn len(&self) -> usize {
        self.dialects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialects.is_empty()
    }

    /// Item roots in registry order
    pub fn item_roots(&self) -> Vec<&str> {
        self.dialects.iter().map(Dialect::key).collect()
    }
}

/// Build a registry from the built-in dialects plus caller dialects
pub fn build_registry(custom: impl IntoIterator<Item = Dialect>) -> Result<Registry, ConfigError> {
    Registry::build(custom)
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Dialect;
    type IntoIter = std::slice::Iter<'a, Dialect>;

    fn into_iter(self) -> Self::IntoIter {
        self.dialects.iter()
    }
}
