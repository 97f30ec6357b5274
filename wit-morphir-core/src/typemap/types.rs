use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ir::FQName;

/// External type identifier; the format depends on the binding
/// (for WIT it is the primitive spelling, e.g. `u32`).
pub type TypeId = String;

/// Primary direction of a one-way mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToMorphir,
    FromMorphir,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToMorphir => f.write_str("to_morphir"),
            Direction::FromMorphir => f.write_str("from_morphir"),
        }
    }
}

/// IR side of a mapping: a primitive kind such as `Int`, or a
/// fully-qualified `Package:Module:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MorphirTypeRef {
    Primitive(String),
    FqName(FQName),
}

impl MorphirTypeRef {
    pub fn primitive(kind: impl Into<String>) -> MorphirTypeRef {
        MorphirTypeRef::Primitive(kind.into())
    }

    pub fn parse(text: &str) -> Result<MorphirTypeRef, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::InvalidTypeRef(
                "type reference cannot be empty".to_string(),
            ));
        }
        if text.contains(':') {
            return FQName::parse(text).map(MorphirTypeRef::FqName);
        }
        Ok(MorphirTypeRef::Primitive(text.to_string()))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, MorphirTypeRef::Primitive(_))
    }

    pub fn is_fq_name(&self) -> bool {
        matches!(self, MorphirTypeRef::FqName(_))
    }

    pub fn primitive_kind(&self) -> Option<&str> {
        match self {
            MorphirTypeRef::Primitive(kind) => Some(kind),
            MorphirTypeRef::FqName(_) => None,
        }
    }
}

impl fmt::Display for MorphirTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphirTypeRef::Primitive(kind) => f.write_str(kind),
            MorphirTypeRef::FqName(name) => write!(f, "{name}"),
        }
    }
}

/// How one external type maps to and from the IR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    pub external_type: TypeId,
    pub morphir_type: MorphirTypeRef,
    pub bidirectional: bool,
    /// Only meaningful when `bidirectional` is false.
    pub direction: Direction,
    /// Higher wins when several mappings share an external type.
    pub priority: i32,
    pub metadata: BTreeMap<String, String>,
}

/// Number of type parameters a container takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    /// Negative counts mean variadic.
    pub fn from_count(count: i32) -> Arity {
        usize::try_from(count).map_or(Arity::Variadic, Arity::Fixed)
    }
}

/// Mapping for a parameterized type such as `list<T>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMapping {
    pub external_pattern: String,
    pub morphir_pattern: String,
    pub arity: Arity,
    pub bidirectional: bool,
    pub direction: Direction,
    pub priority: i32,
}

impl ContainerMapping {
    pub fn is_variadic(&self) -> bool {
        self.arity == Arity::Variadic
    }
}
