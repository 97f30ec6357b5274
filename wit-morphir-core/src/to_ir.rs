//! WIT → IR conversion (`make`).
//!
//! Lossy mappings are reported as diagnostics next to a best-effort
//! module. In strict mode a flags, resource or handle fallback turns into
//! an error and the enclosing type or value definition is dropped.

use tracing::{debug, trace};

use crate::ast::{
    Function, Interface, InterfaceRef, Package, PrimitiveKind, Type, TypeDef, TypeDefKind,
    World, WorldItem,
};
use crate::compiler::MakeOptions;
use crate::diagnostic::{Diagnostic, DiagnosticCode, STEP_MAKE};
use crate::ir::{
    self, AccessControlled, ConstructorArg, Documented, FQName, ModuleDefinition, ModuleType,
    ModuleValue, Name, RecordField, TypeConstructor, TypeDefinition, ValueDefinition, ValueInput,
};
use crate::names::Documentation;
use crate::typemap::{MorphirTypeRef, Registry};
use crate::wit_defaults::default_wit_registry;

/// Convert with the default WIT registry.
pub fn convert_to_ir(package: &Package, options: &MakeOptions) -> (ModuleDefinition, Vec<Diagnostic>) {
    convert_to_ir_with(package, options, &default_wit_registry())
}

pub fn convert_to_ir_with(
    package: &Package,
    options: &MakeOptions,
    registry: &Registry,
) -> (ModuleDefinition, Vec<Diagnostic>) {
    let mut converter = ToIr {
        registry,
        options,
        diagnostics: Vec::new(),
        drop_current: false,
    };
    let module = converter.package(package);
    debug!(
        types = module.types.len(),
        values = module.values.len(),
        diagnostics = converter.diagnostics.len(),
        "converted package to IR"
    );
    (module, converter.diagnostics)
}

struct ToIr<'a> {
    registry: &'a Registry,
    options: &'a MakeOptions,
    diagnostics: Vec<Diagnostic>,
    /// Set when a strict-mode error means the definition being converted
    /// must not reach the module.
    drop_current: bool,
}

impl ToIr<'_> {
    fn package(&mut self, package: &Package) -> ModuleDefinition {
        let mut module = ModuleDefinition {
            types: Vec::new(),
            values: Vec::new(),
            doc: non_empty_doc(&package.docs),
        };
        for interface in &package.interfaces {
            self.interface(interface, &mut module);
        }
        for world in &package.worlds {
            self.world(world, &mut module);
        }
        module
    }

    fn interface(&mut self, interface: &Interface, module: &mut ModuleDefinition) {
        trace!(interface = %interface.name, "converting interface");
        module
            .types
            .extend(interface.types.iter().filter_map(|def| self.type_def(def)));
        module
            .values
            .extend(interface.functions.iter().filter_map(|func| self.function(func)));
    }

    fn world(&mut self, world: &World, module: &mut ModuleDefinition) {
        trace!(world = %world.name, "converting world");
        for item in world.imports.iter().chain(&world.exports) {
            match item {
                WorldItem::Interface {
                    interface: InterfaceRef::Inline(interface),
                    ..
                } => self.interface(interface, module),
                WorldItem::Interface {
                    interface: InterfaceRef::External(path),
                    ..
                } => self.diagnostics.push(Diagnostic::info(
                    DiagnosticCode::ExternalRef,
                    format!("external interface reference: {path}"),
                    STEP_MAKE,
                )),
                WorldItem::Function(func) => {
                    if let Some(value) = self.function(func) {
                        module.values.push(value);
                    }
                }
            }
        }
    }

    fn type_def(&mut self, def: &TypeDef) -> Option<ModuleType> {
        self.drop_current = false;
        let strict = self.options.strict_mode;
        let definition = match &def.kind {
            TypeDefKind::Record { fields } => TypeDefinition::TypeAlias {
                params: Vec::new(),
                expr: ir::Type::Record {
                    fields: fields
                        .iter()
                        .map(|field| RecordField {
                            name: Name::from_str(field.name.unescaped()),
                            tpe: self.ty(&field.ty),
                        })
                        .collect(),
                },
            },
            TypeDefKind::Variant { cases } => custom_type(
                cases
                    .iter()
                    .map(|case| TypeConstructor {
                        name: Name::from_str(case.name.unescaped()),
                        args: case
                            .payload
                            .iter()
                            .map(|payload| ConstructorArg {
                                name: Name::from_str("value"),
                                tpe: self.ty(payload),
                            })
                            .collect(),
                    })
                    .collect(),
            ),
            TypeDefKind::Enum { cases } => custom_type(
                cases
                    .iter()
                    .map(|case| TypeConstructor {
                        name: Name::from_str(case.unescaped()),
                        args: Vec::new(),
                    })
                    .collect(),
            ),
            TypeDefKind::Flags { .. } => {
                self.diagnostics
                    .push(Diagnostic::flags_unsupported(def.name.as_str(), STEP_MAKE, strict));
                if strict {
                    return None;
                }
                // bitmask
                alias(basics("Int"))
            }
            TypeDefKind::Resource { .. } => {
                self.diagnostics
                    .push(Diagnostic::resource_unsupported(def.name.as_str(), STEP_MAKE, strict));
                if strict {
                    return None;
                }
                // opaque handle
                alias(basics("Int"))
            }
            TypeDefKind::Alias { target } => alias(self.ty(target)),
        };

        if self.drop_current {
            trace!(name = %def.name, "dropping type definition");
            return None;
        }
        Some(ModuleType {
            name: Name::from_str(def.name.unescaped()),
            definition: AccessControlled::public(Documented::new(def.docs.to_string(), definition)),
        })
    }

    fn function(&mut self, func: &Function) -> Option<ModuleValue> {
        self.drop_current = false;
        let output = match func.results.as_slice() {
            [] => ir::Type::Unit,
            [single] => self.ty(single),
            many => ir::Type::Tuple {
                elements: many.iter().map(|ty| self.ty(ty)).collect(),
            },
        };
        let inputs = func
            .params
            .iter()
            .map(|param| ValueInput {
                name: Name::from_str(param.name.unescaped()),
                tpe: self.ty(&param.ty),
            })
            .collect();

        if self.drop_current {
            trace!(name = %func.name, "dropping value definition");
            return None;
        }
        Some(ModuleValue {
            name: Name::from_str(func.name.unescaped()),
            definition: AccessControlled::public(Documented::new(
                func.docs.to_string(),
                ValueDefinition { inputs, output },
            )),
        })
    }

    fn ty(&mut self, ty: &Type) -> ir::Type {
        match ty {
            Type::Primitive(kind) => self.primitive(*kind),
            Type::Named(name) => ir::Type::variable(Name::from_str(name.unescaped())),
            Type::List(element) => {
                let element = self.ty(element);
                ir::Type::reference(self.container("list", "List"), vec![element])
            }
            Type::Option(inner) => {
                let inner = self.ty(inner);
                ir::Type::reference(self.container("option", "Maybe"), vec![inner])
            }
            Type::Result { ok, err } => {
                let ok = self.optional(ok.as_deref());
                let err = self.optional(err.as_deref());
                // error first: `Result e a`
                ir::Type::reference(self.container("result", "Result"), vec![err, ok])
            }
            Type::Tuple(elements) => ir::Type::Tuple {
                elements: elements.iter().map(|element| self.ty(element)).collect(),
            },
            Type::Handle { resource, .. } => {
                let strict = self.options.strict_mode;
                self.diagnostics.push(Diagnostic::resource_unsupported(
                    resource.as_str(),
                    STEP_MAKE,
                    strict,
                ));
                self.drop_current |= strict;
                basics("Int")
            }
            Type::Future(inner) => {
                self.diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::ConversionError,
                    "future type not supported, using inner type",
                    STEP_MAKE,
                ));
                self.optional(inner.as_deref())
            }
            Type::Stream(element) => {
                self.diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::ConversionError,
                    "stream type not supported, using List of element type",
                    STEP_MAKE,
                ));
                let element = self.optional(element.as_deref());
                ir::Type::reference(self.container("list", "List"), vec![element])
            }
        }
    }

    fn optional(&mut self, ty: Option<&Type>) -> ir::Type {
        match ty {
            Some(ty) => self.ty(ty),
            None => ir::Type::Unit,
        }
    }

    fn primitive(&mut self, kind: PrimitiveKind) -> ir::Type {
        let Some(mapping) = self.registry.lookup(kind.as_str()) else {
            self.diagnostics
                .push(Diagnostic::unknown_type(kind.as_str(), STEP_MAKE));
            return ir::Type::Unit;
        };
        if kind.is_integer() {
            self.diagnostics
                .push(Diagnostic::int_precision_lost(kind.as_str(), STEP_MAKE));
        } else if kind == PrimitiveKind::F32 {
            self.diagnostics
                .push(Diagnostic::float_precision_lost(kind.as_str(), STEP_MAKE));
        }
        match &mapping.morphir_type {
            MorphirTypeRef::Primitive(name) => basics(name),
            MorphirTypeRef::FqName(name) => ir::Type::reference(name.clone(), Vec::new()),
        }
    }

    /// The registry's IR name for a WIT container, falling back to the
    /// SDK module of the same purpose.
    fn container(&self, pattern: &str, sdk_module: &str) -> FQName {
        self.registry
            .lookup_container(pattern)
            .and_then(|mapping| FQName::parse(&mapping.morphir_pattern).ok())
            .unwrap_or_else(|| FQName::sdk(sdk_module, sdk_module))
    }
}

fn basics(name: &str) -> ir::Type {
    ir::Type::reference(FQName::sdk("Basics", name), Vec::new())
}

fn alias(expr: ir::Type) -> TypeDefinition {
    TypeDefinition::TypeAlias {
        params: Vec::new(),
        expr,
    }
}

fn custom_type(constructors: Vec<TypeConstructor>) -> TypeDefinition {
    TypeDefinition::CustomType {
        params: Vec::new(),
        constructors: AccessControlled::public(constructors),
    }
}

fn non_empty_doc(docs: &Documentation) -> Option<String> {
    (!docs.is_empty()).then(|| docs.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticsExt, Severity};
    use crate::parser::parse;

    fn make(source: &str, strict: bool) -> (ModuleDefinition, Vec<Diagnostic>) {
        let package = parse(source).expect("parse");
        let options = MakeOptions {
            strict_mode: strict,
            ..MakeOptions::default()
        };
        convert_to_ir(&package, &options)
    }

    fn alias_expr(module: &ModuleDefinition, index: usize) -> &ir::Type {
        match &module.types[index].definition.value.value {
            TypeDefinition::TypeAlias { expr, .. } => expr,
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn record_becomes_alias_to_record() {
        let (module, diagnostics) = make(
            "package a:b; interface i { record point { x: f64, y-pos: f32 } }",
            false,
        );
        let ir::Type::Record { fields } = alias_expr(&module, 0) else {
            panic!("expected record");
        };
        assert_eq!(fields[1].name.to_camel_case(), "yPos");
        assert_eq!(fields[0].tpe, basics("Float"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::FloatPrecisionLost);
    }

    #[test]
    fn every_integer_warns() {
        let (_, diagnostics) = make(
            "package a:b; interface i { f: func(a: u8, b: u32, c: s64) -> bool; }",
            false,
        );
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics
            .iter()
            .all(|d| d.code == DiagnosticCode::IntPrecisionLost && d.severity == Severity::Warn));
    }

    #[test]
    fn result_params_are_error_first() {
        let (module, _) = make(
            "package a:b; interface i { type r = result<string, bool>; type e = result<_, char>; }",
            false,
        );
        assert_eq!(
            alias_expr(&module, 0),
            &ir::Type::reference(FQName::sdk("Result", "Result"), vec![basics("Bool"), basics("String")])
        );
        assert_eq!(
            alias_expr(&module, 1),
            &ir::Type::reference(FQName::sdk("Result", "Result"), vec![basics("Char"), ir::Type::Unit])
        );
    }

    #[test]
    fn variants_and_enums_become_custom_types() {
        let (module, diagnostics) = make(
            "package a:b; interface i { variant shape { none, circle(f64), } enum color { red, green, } }",
            false,
        );
        assert!(diagnostics.is_empty());
        let TypeDefinition::CustomType { constructors, .. } = &module.types[0].definition.value.value
        else {
            panic!("expected custom type");
        };
        assert!(constructors.value[0].args.is_empty());
        assert_eq!(constructors.value[1].args[0].name, Name::from_str("value"));
        let TypeDefinition::CustomType { constructors, .. } = &module.types[1].definition.value.value
        else {
            panic!("expected custom type");
        };
        assert_eq!(constructors.value.len(), 2);
    }

    #[test]
    fn flags_fall_back_or_drop() {
        let source = "package a:b; interface i { flags perms { read, write, } }";
        let (module, diagnostics) = make(source, false);
        assert_eq!(module.types.len(), 1);
        assert_eq!(alias_expr(&module, 0), &basics("Int"));
        assert!(diagnostics.has_warnings());

        let (module, diagnostics) = make(source, true);
        assert!(module.types.is_empty());
        assert!(diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::FlagsUnsupported && d.severity == Severity::Error));
    }

    #[test]
    fn strict_handles_drop_the_function() {
        let source = "package a:b; interface i { resource file; open: func() -> own<file>; close: func(); }";
        let (module, _) = make(source, false);
        assert_eq!(module.values.len(), 2);
        let (module, diagnostics) = make(source, true);
        assert!(module.types.is_empty());
        assert_eq!(module.values.len(), 1);
        assert_eq!(diagnostics.filter_by_severity(Severity::Error).len(), 2);
    }

    #[test]
    fn function_results_map_to_unit_single_or_tuple() {
        let (module, _) = make(
            "package a:b; interface i { a: func(); b: func() -> string; }",
            false,
        );
        assert_eq!(module.values[0].definition.value.value.output, ir::Type::Unit);
        assert_eq!(module.values[1].definition.value.value.output, basics("String"));
    }

    #[test]
    fn future_and_stream_unwrap_with_warnings() {
        let (module, diagnostics) = make(
            "package a:b; interface i { type f = future<string>; type g = future; type s = stream; }",
            false,
        );
        assert_eq!(alias_expr(&module, 0), &basics("String"));
        assert_eq!(alias_expr(&module, 1), &ir::Type::Unit);
        assert_eq!(
            alias_expr(&module, 2),
            &ir::Type::reference(FQName::sdk("List", "List"), vec![ir::Type::Unit])
        );
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn worlds_contribute_inline_items() {
        let (module, diagnostics) = make(
            "package a:b; world w { import host: interface { log: func(msg: string); } export run: func(); import wasi:io/streams; }",
            false,
        );
        assert_eq!(module.values.len(), 2);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::ExternalRef && d.severity == Severity::Info));
    }

    #[test]
    fn docs_are_carried_over() {
        let (module, _) = make(
            "/// pkg\npackage a:b;\ninterface i {\n    /// A point.\n    record p { x: string }\n}",
            false,
        );
        assert_eq!(module.doc.as_deref(), Some("pkg"));
        assert_eq!(module.types[0].definition.value.doc, "A point.");
    }

    #[test]
    fn fq_primitive_mappings_become_references() {
        let config = crate::typemap::TypeMappingConfig::from_json(
            r#"{"primitives": [{"external": "s64", "morphir": "Morphir.SDK:Int:Int64", "priority": 1}]}"#,
        )
        .expect("config");
        let registry = crate::wit_defaults::new_wit_registry(Some(&config));
        let package = parse("package a:b; interface i { type t = s64; }").expect("parse");
        let (module, _) = convert_to_ir_with(&package, &MakeOptions::default(), &registry);
        assert_eq!(
            alias_expr(&module, 0),
            &ir::Type::reference(FQName::parse("Morphir.SDK:Int:Int64").expect("fq"), Vec::new())
        );
    }
}
