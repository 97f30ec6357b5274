use std::collections::HashMap;

use super::types::{ContainerMapping, MorphirTypeRef, TypeMapping};

/// Read-only bidirectional lookup table for one binding.
///
/// Built once by [`super::Builder`]; reverse maps only contain entries
/// that were bidirectional after priority resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    pub(super) binding: String,
    pub(super) primitives: HashMap<String, TypeMapping>,
    pub(super) primitives_reverse: HashMap<String, TypeMapping>,
    pub(super) containers: HashMap<String, ContainerMapping>,
    pub(super) containers_reverse: HashMap<String, ContainerMapping>,
}

impl Registry {
    pub fn binding_name(&self) -> &str {
        &self.binding
    }

    pub fn lookup(&self, external_type: &str) -> Option<&TypeMapping> {
        self.primitives.get(external_type)
    }

    pub fn lookup_reverse(&self, morphir_type: &MorphirTypeRef) -> Option<&TypeMapping> {
        self.primitives_reverse.get(&morphir_type.to_string())
    }

    pub fn lookup_container(&self, external_pattern: &str) -> Option<&ContainerMapping> {
        self.containers.get(external_pattern)
    }

    pub fn lookup_container_reverse(&self, morphir_pattern: &str) -> Option<&ContainerMapping> {
        self.containers_reverse.get(morphir_pattern)
    }

    /// All primitive mappings, ordered by external type.
    pub fn all_primitives(&self) -> Vec<&TypeMapping> {
        let mut all: Vec<_> = self.primitives.values().collect();
        all.sort_by(|a, b| a.external_type.cmp(&b.external_type));
        all
    }

    /// All container mappings, ordered by external pattern.
    pub fn all_containers(&self) -> Vec<&ContainerMapping> {
        let mut all: Vec<_> = self.containers.values().collect();
        all.sort_by(|a, b| a.external_pattern.cmp(&b.external_pattern));
        all
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}
