//! Type mappings between an external type system and the Morphir IR.
//!
//! A [`Builder`] merges explicit mappings, a binding's defaults and user
//! config into an immutable [`Registry`]; a [`Manager`] holds registries
//! by binding name.

mod builder;
mod config;
mod manager;
mod registry;
mod types;

pub use builder::{Builder, ContainerOptions, DefaultsProvider, MappingOptions};
pub use config::{ContainerOverride, PrimitiveOverride, TypeMappingConfig};
pub use manager::Manager;
pub use registry::Registry;
pub use types::{Arity, ContainerMapping, Direction, MorphirTypeRef, TypeId, TypeMapping};
