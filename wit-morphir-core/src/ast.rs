//! WIT domain model.
//!
//! The tree is plain owned data: once built by the parser or a converter
//! it is only read. A [`Type::Named`] refers to a [`TypeDef`] by name and
//! is resolved by lookup, never by pointer.

use std::fmt;

use semver::Version;

use crate::names::{Documentation, Identifier, Namespace, PackageName};

/// A WIT package: the root of a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Package {
    /// Present whenever the source had a `package` declaration.
    pub namespace: Option<Namespace>,
    /// Last `/`-separated segment of the declared package path.
    pub name: Option<PackageName>,
    /// Segments between the namespace and the name in `ns:a/b/name`.
    pub nested_path: Vec<PackageName>,
    pub version: Option<Version>,
    pub interfaces: Vec<Interface>,
    pub worlds: Vec<World>,
    pub uses: Vec<Use>,
    pub docs: Documentation,
}

impl Package {
    pub fn new(namespace: Namespace, name: PackageName) -> Package {
        Package {
            namespace: Some(namespace),
            name: Some(name),
            ..Package::default()
        }
    }

    pub fn find_interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: Identifier,
    pub types: Vec<TypeDef>,
    pub functions: Vec<Function>,
    pub uses: Vec<Use>,
    pub docs: Documentation,
}

impl Interface {
    pub fn new(name: Identifier) -> Interface {
        Interface {
            name,
            types: Vec::new(),
            functions: Vec::new(),
            uses: Vec::new(),
            docs: Documentation::default(),
        }
    }

    pub fn find_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name.as_str() == name)
    }

    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name.as_str() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: Identifier,
    pub kind: TypeDefKind,
    pub docs: Documentation,
}

impl TypeDef {
    pub fn new(name: Identifier, kind: TypeDefKind) -> TypeDef {
        TypeDef {
            name,
            kind,
            docs: Documentation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    Record { fields: Vec<Field> },
    Variant { cases: Vec<VariantCase> },
    Enum { cases: Vec<Identifier> },
    Flags { flags: Vec<Identifier> },
    Resource {
        constructor: Option<Constructor>,
        methods: Vec<ResourceMethod>,
    },
    Alias { target: Type },
}

impl TypeDefKind {
    /// WIT keyword introducing this kind of definition.
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeDefKind::Record { .. } => "record",
            TypeDefKind::Variant { .. } => "variant",
            TypeDefKind::Enum { .. } => "enum",
            TypeDefKind::Flags { .. } => "flags",
            TypeDefKind::Resource { .. } => "resource",
            TypeDefKind::Alias { .. } => "type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Identifier,
    pub ty: Type,
    pub docs: Documentation,
}

impl Field {
    pub fn new(name: Identifier, ty: Type) -> Field {
        Field {
            name,
            ty,
            docs: Documentation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCase {
    pub name: Identifier,
    pub payload: Option<Type>,
    pub docs: Documentation,
}

impl VariantCase {
    pub fn new(name: Identifier, payload: Option<Type>) -> VariantCase {
        VariantCase {
            name,
            payload,
            docs: Documentation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    pub params: Vec<Param>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMethod {
    pub name: Identifier,
    pub function: Function,
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: Identifier,
    pub params: Vec<Param>,
    /// Empty for no return value; more than one is conceptually a tuple.
    pub results: Vec<Type>,
    pub is_async: bool,
    pub docs: Documentation,
}

impl Function {
    pub fn new(name: Identifier) -> Function {
        Function {
            name,
            params: Vec::new(),
            results: Vec::new(),
            is_async: false,
            docs: Documentation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Identifier,
    pub ty: Type,
}

impl Param {
    pub fn new(name: Identifier, ty: Type) -> Param {
        Param { name, ty }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F32,
    F64,
    Bool,
    Char,
    String,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 13] = [
        PrimitiveKind::U8,
        PrimitiveKind::U16,
        PrimitiveKind::U32,
        PrimitiveKind::U64,
        PrimitiveKind::S8,
        PrimitiveKind::S16,
        PrimitiveKind::S32,
        PrimitiveKind::S64,
        PrimitiveKind::F32,
        PrimitiveKind::F64,
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::String,
    ];

    /// The WIT spelling, which is also the external type ID in the registry.
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::S8 => "s8",
            PrimitiveKind::S16 => "s16",
            PrimitiveKind::S32 => "s32",
            PrimitiveKind::S64 => "s64",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::String => "string",
        }
    }

    pub fn from_wit(name: &str) -> Option<PrimitiveKind> {
        PrimitiveKind::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            PrimitiveKind::U8
                | PrimitiveKind::U16
                | PrimitiveKind::U32
                | PrimitiveKind::U64
                | PrimitiveKind::S8
                | PrimitiveKind::S16
                | PrimitiveKind::S32
                | PrimitiveKind::S64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimitiveKind::F32 | PrimitiveKind::F64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A WIT type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Primitive(PrimitiveKind),
    /// Reference to a type definition by name.
    Named(Identifier),
    List(Box<Type>),
    Option(Box<Type>),
    /// `result`, `result<T>`, `result<_, E>` or `result<T, E>`.
    Result {
        ok: Option<Box<Type>>,
        err: Option<Box<Type>>,
    },
    Tuple(Vec<Type>),
    /// `own<R>` or `borrow<R>`.
    Handle { resource: Identifier, borrow: bool },
    Future(Option<Box<Type>>),
    Stream(Option<Box<Type>>),
}

impl Type {
    pub fn named(name: Identifier) -> Type {
        Type::Named(name)
    }

    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn option(inner: Type) -> Type {
        Type::Option(Box::new(inner))
    }

    pub fn result(ok: Option<Type>, err: Option<Type>) -> Type {
        Type::Result {
            ok: ok.map(Box::new),
            err: err.map(Box::new),
        }
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Type> {
        match self {
            Type::Primitive(_) | Type::Named(_) | Type::Handle { .. } => Vec::new(),
            Type::List(inner) | Type::Option(inner) => vec![inner.as_ref()],
            Type::Result { ok, err } => ok.iter().chain(err.iter()).map(|t| t.as_ref()).collect(),
            Type::Tuple(elements) => elements.iter().collect(),
            Type::Future(inner) | Type::Stream(inner) => inner.iter().map(|t| t.as_ref()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    pub name: Identifier,
    pub imports: Vec<WorldItem>,
    pub exports: Vec<WorldItem>,
    pub uses: Vec<Use>,
    pub docs: Documentation,
}

impl World {
    pub fn new(name: Identifier) -> World {
        World {
            name,
            imports: Vec::new(),
            exports: Vec::new(),
            uses: Vec::new(),
            docs: Documentation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldItem {
    Interface {
        name: Identifier,
        interface: InterfaceRef,
    },
    Function(Function),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceRef {
    /// `import name: interface { ... }`
    Inline(Interface),
    /// `import name;` or `import ns:pkg/name@1.0.0;`
    External(UsePath),
}

/// `use path.{a, b as c};` or, at package level, `use path as name;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Use {
    pub path: UsePath,
    pub items: Vec<UseItem>,
    pub alias: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsePath {
    Local(Identifier),
    External {
        namespace: Namespace,
        package: PackageName,
        interface: Identifier,
        version: Option<Version>,
    },
}

impl UsePath {
    /// The interface this path points at.
    pub fn interface_name(&self) -> &Identifier {
        match self {
            UsePath::Local(name) => name,
            UsePath::External { interface, .. } => interface,
        }
    }
}

impl fmt::Display for UsePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsePath::Local(name) => write!(f, "{name}"),
            UsePath::External {
                namespace,
                package,
                interface,
                version,
            } => {
                write!(f, "{namespace}:{package}/{interface}")?;
                if let Some(version) = version {
                    write!(f, "@{version}")?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseItem {
    pub name: Identifier,
    pub alias: Option<Identifier>,
}
