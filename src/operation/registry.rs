// src/operation/registry.rs

//! Shared operations looked up by id or alias.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{info, warn};

use crate::operation::{Operation, Parameters};

/// Identifier handed out by [`Registry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryId(u64);

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RegistryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RegistryId)
    }
}

struct Entry<T: ?Sized> {
    alias: Option<String>,
    item: Arc<T>,
}

/// Items stored under a generated id and an optional alias.
///
/// An alias points at one id at a time; registering it again rebinds it to
/// the newer entry, which stays reachable by id.
pub struct Registry<T: ?Sized> {
    entries: HashMap<RegistryId, Entry<T>>,
    aliases: HashMap<String, RegistryId>,
    next_id: u64,
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            aliases: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aliases: Vec<&str> = self.aliases.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        f.debug_struct("Registry")
            .field("len", &self.entries.len())
            .field("aliases", &aliases)
            .finish()
    }
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, item: Arc<T>, alias: Option<&str>) -> RegistryId {
        let id = RegistryId(self.next_id);
        self.next_id += 1;

        let alias = alias.map(str::to_string);
        if let Some(name) = &alias {
            if let Some(previous) = self.aliases.insert(name.clone(), id) {
                warn!(alias = %name, %previous, %id, "alias rebound to a new entry");
                if let Some(entry) = self.entries.get_mut(&previous) {
                    entry.alias = None;
                }
            }
            info!(%id, alias = %name, "registered entry");
        } else {
            info!(%id, "registered entry");
        }

        self.entries.insert(id, Entry { alias, item });
        id
    }

    pub fn get(&self, id: RegistryId) -> Option<Arc<T>> {
        self.entries.get(&id).map(|e| Arc::clone(&e.item))
    }

    pub fn get_by_alias(&self, alias: &str) -> Option<Arc<T>> {
        self.aliases.get(alias).and_then(|id| self.get(*id))
    }

    /// Look `key` up as an alias first, then as a printed [`RegistryId`].
    pub fn resolve(&self, key: &str) -> Option<Arc<T>> {
        self.get_by_alias(key)
            .or_else(|| key.parse().ok().and_then(|id| self.get(id)))
    }

    pub fn alias_of(&self, id: RegistryId) -> Option<&str> {
        self.entries.get(&id).and_then(|e| e.alias.as_deref())
    }

    pub fn remove(&mut self, id: RegistryId) -> Option<Arc<T>> {
        let entry = self.entries.remove(&id)?;
        if let Some(alias) = &entry.alias {
            self.aliases.remove(alias);
        }
        Some(entry.item)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.aliases.clear();
        info!("registry cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Operations that take and return loosely typed data.
pub type DynOperation = dyn Operation<Input = Parameters, Output = toml::Value>;

pub type OperationRegistry = Registry<DynOperation>;

impl Registry<DynOperation> {
    /// Register `operation` under its own name.
    pub fn register_operation<O>(&mut self, operation: O) -> RegistryId
    where
        O: Operation<Input = Parameters, Output = toml::Value>,
    {
        let name = operation.name().to_string();
        self.register(Arc::new(operation), Some(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FoundationError;
    use crate::operation::{OperationExt, ParameterizedOperation};

    #[test]
    fn lookup_by_id_alias_and_printed_id() {
        let mut reg: Registry<str> = Registry::new();
        let a = reg.register(Arc::from("alpha"), Some("first"));
        let b = reg.register(Arc::from("beta"), None);

        assert_eq!(reg.get(a).as_deref(), Some("alpha"));
        assert_eq!(reg.get_by_alias("first").as_deref(), Some("alpha"));
        assert_eq!(reg.resolve(&b.to_string()).as_deref(), Some("beta"));
        assert_eq!(reg.resolve("nobody"), None);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn rebinding_an_alias_keeps_the_old_entry_by_id() {
        let mut reg: Registry<str> = Registry::new();
        let old = reg.register(Arc::from("v1"), Some("cfg"));
        let new = reg.register(Arc::from("v2"), Some("cfg"));

        assert_eq!(reg.get_by_alias("cfg").as_deref(), Some("v2"));
        assert_eq!(reg.get(old).as_deref(), Some("v1"));
        assert_eq!(reg.alias_of(old), None);
        assert_eq!(reg.alias_of(new), Some("cfg"));

        // Removing the stale entry must not unbind the alias.
        reg.remove(old);
        assert_eq!(reg.get_by_alias("cfg").as_deref(), Some("v2"));
    }

    #[test]
    fn remove_and_clear_drop_aliases() {
        let mut reg: Registry<str> = Registry::new();
        let id = reg.register(Arc::from("x"), Some("x"));
        assert!(reg.remove(id).is_some());
        assert!(reg.get_by_alias("x").is_none());

        reg.register(Arc::from("y"), Some("y"));
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.resolve("y").is_none());
    }

    #[test]
    fn operations_are_registered_under_their_name() {
        let mut reg = OperationRegistry::new();
        reg.register_operation(
            ParameterizedOperation::new("double", Parameters::new())
                .with_handler(|_, input| Ok(toml::Value::Integer(input.get_integer("n").unwrap_or(0) * 2))),
        );
        reg.register_operation(ParameterizedOperation::new("pending", Parameters::new()));

        let double = reg.resolve("double").unwrap();
        assert_eq!(
            double.call(Parameters::new().with("n", 21)).unwrap(),
            toml::Value::Integer(42)
        );

        let pending = reg.resolve("pending").unwrap();
        assert!(matches!(
            pending.call(Parameters::new()),
            Err(FoundationError::NotImplemented(_))
        ));
    }
}
