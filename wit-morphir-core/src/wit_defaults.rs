//! Built-in WIT ↔ IR mappings.
//!
//! Every WIT integer maps to `Int` and both floats to `Float`, so only one
//! spelling per IR kind can be bidirectional: `u32` and `f64`. The rest map
//! one way and are reported as lossy by `make`.

use crate::typemap::{
    Arity, Builder, ContainerMapping, DefaultsProvider, Direction, MorphirTypeRef, Registry,
    TypeMapping, TypeMappingConfig,
};

pub const BINDING_NAME: &str = "wit";

// (external, IR kind, bidirectional)
const PRIMITIVES: &[(&str, &str, bool)] = &[
    ("bool", "Bool", true),
    ("u32", "Int", true),
    ("f64", "Float", true),
    ("string", "String", true),
    ("char", "Char", true),
    ("u8", "Int", false),
    ("u16", "Int", false),
    ("u64", "Int", false),
    ("s8", "Int", false),
    ("s16", "Int", false),
    ("s32", "Int", false),
    ("s64", "Int", false),
    ("f32", "Float", false),
];

// (external, IR pattern, type params; `None` is variadic)
const CONTAINERS: &[(&str, &str, Option<usize>)] = &[
    ("list", "Morphir.SDK:List:List", Some(1)),
    ("option", "Morphir.SDK:Maybe:Maybe", Some(1)),
    ("result", "Morphir.SDK:Result:Result", Some(2)),
    ("tuple", "tuple", None),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct WitDefaults;

impl DefaultsProvider for WitDefaults {
    fn default_primitives(&self) -> Vec<TypeMapping> {
        PRIMITIVES
            .iter()
            .map(|&(external, kind, bidirectional)| TypeMapping {
                external_type: external.to_string(),
                morphir_type: MorphirTypeRef::primitive(kind),
                bidirectional,
                direction: Direction::ToMorphir,
                priority: 0,
                metadata: Default::default(),
            })
            .collect()
    }

    fn default_containers(&self) -> Vec<ContainerMapping> {
        CONTAINERS
            .iter()
            .map(|&(external, pattern, params)| ContainerMapping {
                external_pattern: external.to_string(),
                morphir_pattern: pattern.to_string(),
                arity: params.map_or(Arity::Variadic, Arity::Fixed),
                bidirectional: true,
                direction: Direction::ToMorphir,
                priority: 0,
            })
            .collect()
    }
}

/// The WIT registry, optionally with user overrides applied.
pub fn new_wit_registry(config: Option<&TypeMappingConfig>) -> Registry {
    let builder = Builder::new(BINDING_NAME).with_defaults(&WitDefaults);
    match config {
        Some(config) => builder.with_config(config).build(),
        None => builder.build(),
    }
}

pub fn default_wit_registry() -> Registry {
    new_wit_registry(None)
}
