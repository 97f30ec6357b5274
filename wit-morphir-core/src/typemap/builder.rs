use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use super::config::TypeMappingConfig;
use super::registry::Registry;
use super::types::{Arity, ContainerMapping, Direction, MorphirTypeRef, TypeMapping};

/// Supplies a binding's built-in mappings.
pub trait DefaultsProvider {
    fn default_primitives(&self) -> Vec<TypeMapping>;
    fn default_containers(&self) -> Vec<ContainerMapping>;
}

/// Per-mapping settings for [`Builder::add_primitive`].
///
/// The default is bidirectional with priority 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOptions {
    pub priority: i32,
    pub one_way: Option<Direction>,
    pub metadata: BTreeMap<String, String>,
}

impl MappingOptions {
    pub fn with_priority(mut self, priority: i32) -> MappingOptions {
        self.priority = priority;
        self
    }

    pub fn one_way(mut self, direction: Direction) -> MappingOptions {
        self.one_way = Some(direction);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> MappingOptions {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Per-mapping settings for [`Builder::add_container`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    pub priority: i32,
    pub one_way: Option<Direction>,
}

impl ContainerOptions {
    pub fn with_priority(mut self, priority: i32) -> ContainerOptions {
        self.priority = priority;
        self
    }

    pub fn one_way(mut self, direction: Direction) -> ContainerOptions {
        self.one_way = Some(direction);
        self
    }
}

/// Collects mappings from three sources and resolves them into a
/// [`Registry`].
///
/// Sources are concatenated as explicit, then defaults, then config;
/// the winner per key is decided by priority alone (ascending stable
/// sort, then overwrite), so equal priorities keep that order and the
/// later source wins.
#[derive(Debug, Clone)]
pub struct Builder {
    binding: String,
    explicit: Vec<TypeMapping>,
    explicit_containers: Vec<ContainerMapping>,
    defaults: Vec<TypeMapping>,
    default_containers: Vec<ContainerMapping>,
    configured: Vec<TypeMapping>,
    configured_containers: Vec<ContainerMapping>,
}

impl Builder {
    pub fn new(binding: impl Into<String>) -> Builder {
        Builder {
            binding: binding.into(),
            explicit: Vec::new(),
            explicit_containers: Vec::new(),
            defaults: Vec::new(),
            default_containers: Vec::new(),
            configured: Vec::new(),
            configured_containers: Vec::new(),
        }
    }

    /// Add a primitive mapping. An unparsable `morphir` reference is
    /// skipped with a warning.
    pub fn add_primitive(mut self, external: &str, morphir: &str, options: MappingOptions) -> Builder {
        if let Some(mapping) = primitive_mapping(external, morphir, options) {
            self.explicit.push(mapping);
        }
        self
    }

    pub fn add_container(
        mut self,
        external_pattern: &str,
        morphir_pattern: &str,
        arity: Arity,
        options: ContainerOptions,
    ) -> Builder {
        self.explicit_containers.push(container_mapping(
            external_pattern,
            morphir_pattern,
            arity,
            options,
        ));
        self
    }

    pub fn with_defaults(mut self, provider: &dyn DefaultsProvider) -> Builder {
        self.defaults = provider.default_primitives();
        self.default_containers = provider.default_containers();
        self
    }

    pub fn with_config(mut self, config: &TypeMappingConfig) -> Builder {
        self.configured = config
            .primitives
            .iter()
            .filter_map(|entry| {
                let mut options = MappingOptions::default().with_priority(entry.priority);
                if !entry.bidirectional {
                    options = options.one_way(Direction::ToMorphir);
                }
                primitive_mapping(&entry.external, &entry.morphir, options)
            })
            .collect();
        self.configured_containers = config
            .containers
            .iter()
            .map(|entry| {
                let mut options = ContainerOptions::default().with_priority(entry.priority);
                if !entry.bidirectional {
                    options = options.one_way(Direction::ToMorphir);
                }
                container_mapping(
                    &entry.external_pattern,
                    &entry.morphir_pattern,
                    Arity::from_count(entry.type_params),
                    options,
                )
            })
            .collect();
        self
    }

    pub fn build(self) -> Registry {
        let mut all: Vec<TypeMapping> = self
            .explicit
            .into_iter()
            .chain(self.defaults)
            .chain(self.configured)
            .collect();
        all.sort_by_key(|m| m.priority);

        let mut primitives = HashMap::new();
        for mapping in all {
            primitives.insert(mapping.external_type.clone(), mapping);
        }
        let primitives_reverse = reverse_index(
            primitives.values().filter(|m| m.bidirectional),
            |m| (m.priority, m.external_type.clone()),
            |m| m.morphir_type.to_string(),
        );

        let mut all_containers: Vec<ContainerMapping> = self
            .explicit_containers
            .into_iter()
            .chain(self.default_containers)
            .chain(self.configured_containers)
            .collect();
        all_containers.sort_by_key(|c| c.priority);

        let mut containers = HashMap::new();
        for container in all_containers {
            containers.insert(container.external_pattern.clone(), container);
        }
        let containers_reverse = reverse_index(
            containers.values().filter(|c| c.bidirectional),
            |c| (c.priority, c.external_pattern.clone()),
            |c| c.morphir_pattern.clone(),
        );

        debug!(
            binding = %self.binding,
            primitives = primitives.len(),
            containers = containers.len(),
            "built type registry"
        );

        Registry {
            binding: self.binding,
            primitives,
            primitives_reverse,
            containers,
            containers_reverse,
        }
    }
}

/// When several forward winners share an IR type the highest priority
/// owns the reverse entry, ties going to the greatest external name.
fn reverse_index<'a, T, I, O, K>(entries: I, order: O, key: K) -> HashMap<String, T>
where
    T: Clone + 'a,
    I: Iterator<Item = &'a T>,
    O: Fn(&T) -> (i32, String),
    K: Fn(&T) -> String,
{
    let mut sorted: Vec<&T> = entries.collect();
    sorted.sort_by_key(|entry| order(*entry));
    sorted
        .into_iter()
        .map(|entry| (key(entry), entry.clone()))
        .collect()
}

fn primitive_mapping(external: &str, morphir: &str, options: MappingOptions) -> Option<TypeMapping> {
    let morphir_type = match MorphirTypeRef::parse(morphir) {
        Ok(morphir_type) => morphir_type,
        Err(err) => {
            warn!(external, morphir, error = %err, "skipping type mapping");
            return None;
        }
    };
    Some(TypeMapping {
        external_type: external.to_string(),
        morphir_type,
        bidirectional: options.one_way.is_none(),
        direction: options.one_way.unwrap_or(Direction::ToMorphir),
        priority: options.priority,
        metadata: options.metadata,
    })
}

fn container_mapping(
    external_pattern: &str,
    morphir_pattern: &str,
    arity: Arity,
    options: ContainerOptions,
) -> ContainerMapping {
    ContainerMapping {
        external_pattern: external_pattern.to_string(),
        morphir_pattern: morphir_pattern.to_string(),
        arity,
        bidirectional: options.one_way.is_none(),
        direction: options.one_way.unwrap_or(Direction::ToMorphir),
        priority: options.priority,
    }
}
