use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::registry::Registry;
use crate::error::CoreError;

/// Holds one [`Registry`] per binding name.
///
/// Safe to share between threads; registration replaces any registry
/// already held under the same name.
#[derive(Debug, Default)]
pub struct Manager {
    registries: RwLock<HashMap<String, Arc<Registry>>>,
}

impl Manager {
    pub fn new() -> Manager {
        Manager::default()
    }

    /// A manager preloaded with the WIT registry.
    pub fn with_defaults() -> Manager {
        let manager = Manager::new();
        manager.register(crate::wit_defaults::default_wit_registry());
        manager
    }

    pub fn register(&self, registry: Registry) {
        let name = registry.binding_name().to_string();
        debug!(binding = %name, "registering type registry");
        self.registries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(registry));
    }

    pub fn get(&self, binding: &str) -> Option<Arc<Registry>> {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(binding)
            .cloned()
    }

    pub fn try_get(&self, binding: &str) -> Result<Arc<Registry>, CoreError> {
        self.get(binding)
            .ok_or_else(|| CoreError::UnknownBinding(binding.to_string()))
    }

    /// Like [`Manager::get`], for bindings known to be registered.
    ///
    /// # Panics
    ///
    /// Panics if no registry is held under `binding`.
    pub fn must_get(&self, binding: &str) -> Arc<Registry> {
        match self.get(binding) {
            Some(registry) => registry,
            None => panic!("no type registry registered for binding {binding:?}"),
        }
    }

    pub fn has(&self, binding: &str) -> bool {
        self.registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(binding)
    }

    /// Registered binding names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::typemap::{Builder, MappingOptions};

    fn registry(binding: &str, target: &str) -> Registry {
        Builder::new(binding)
            .add_primitive("u32", target, MappingOptions::default())
            .build()
    }

    #[test]
    fn registers_and_replaces() {
        let manager = Manager::new();
        assert!(!manager.has("wit"));
        manager.register(registry("wit", "Int"));
        manager.register(registry("wit", "Int64"));
        let wit = manager.must_get("wit");
        assert_eq!(
            wit.lookup("u32").map(|m| m.morphir_type.to_string()),
            Some("Int64".to_string())
        );
        assert_eq!(manager.names(), ["wit"]);
    }

    #[test]
    fn names_are_sorted() {
        let manager = Manager::new();
        manager.register(registry("zeta", "Int"));
        manager.register(registry("alpha", "Int"));
        assert_eq!(manager.names(), ["alpha", "zeta"]);
    }

    #[test]
    fn unknown_binding_is_an_error() {
        let manager = Manager::new();
        assert!(manager.get("proto").is_none());
        assert!(matches!(
            manager.try_get("proto"),
            Err(CoreError::UnknownBinding(name)) if name == "proto"
        ));
    }

    #[test]
    #[should_panic(expected = "no type registry")]
    fn must_get_panics_when_missing() {
        Manager::new().must_get("proto");
    }

    #[test]
    fn defaults_include_wit() {
        let manager = Manager::with_defaults();
        assert!(manager.has(crate::wit_defaults::BINDING_NAME));
    }

    #[test]
    fn concurrent_access() {
        let manager = Arc::new(Manager::with_defaults());
        let handles: Vec<_> = (0..8)
            .map(|index| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    let name = format!("binding-{index}");
                    manager.register(registry(&name, "Int"));
                    assert!(manager.has(&name));
                    assert!(manager.get("wit").is_some());
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }
        assert_eq!(manager.names().len(), 9);
    }
}
