//! IR → WIT conversion (`gen`).
//!
//! Everything lands in one synthetic `generated:module` package with a
//! single interface named `generated`. IR names are turned into
//! kebab-case identifiers; names that still fail validation are reported
//! and skipped.

use tracing::{debug, trace};

use crate::ast::{
    Field, Function, Interface, Package, Param, PrimitiveKind, Type, TypeDef, TypeDefKind,
    VariantCase,
};
use crate::compiler::GenOptions;
use crate::diagnostic::{Diagnostic, DiagnosticCode, STEP_GEN};
use crate::ir::{self, FQName, ModuleDefinition, ModuleType, ModuleValue, Name, TypeDefinition};
use crate::names::{Documentation, Identifier, Namespace, PackageName};
use crate::typemap::{MorphirTypeRef, Registry};
use crate::wit_defaults::default_wit_registry;

pub const GENERATED_NAMESPACE: &str = "generated";
pub const GENERATED_PACKAGE: &str = "module";
pub const GENERATED_INTERFACE: &str = "generated";

/// Convert with the default WIT registry.
pub fn convert_from_ir(module: &ModuleDefinition, options: &GenOptions) -> (Package, Vec<Diagnostic>) {
    convert_from_ir_with(module, options, &default_wit_registry())
}

pub fn convert_from_ir_with(
    module: &ModuleDefinition,
    _options: &GenOptions,
    registry: &Registry,
) -> (Package, Vec<Diagnostic>) {
    // Formatting options only matter to the emitter.
    let mut converter = FromIr {
        registry,
        diagnostics: Vec::new(),
    };

    let mut interface = Interface::new(Identifier::must(GENERATED_INTERFACE));
    interface.types = module
        .types
        .iter()
        .filter_map(|def| converter.type_def(def))
        .collect();
    interface.functions = module
        .values
        .iter()
        .filter_map(|value| converter.function(value))
        .collect();
    debug!(
        types = interface.types.len(),
        functions = interface.functions.len(),
        diagnostics = converter.diagnostics.len(),
        "converted IR to WIT"
    );

    let mut package = Package::new(
        Namespace::must(GENERATED_NAMESPACE),
        PackageName::must(GENERATED_PACKAGE),
    );
    package.interfaces.push(interface);
    if let Some(doc) = &module.doc {
        package.docs = Documentation::new(doc);
    }
    (package, converter.diagnostics)
}

struct FromIr<'a> {
    registry: &'a Registry,
    diagnostics: Vec<Diagnostic>,
}

impl FromIr<'_> {
    fn type_def(&mut self, def: &ModuleType) -> Option<TypeDef> {
        let documented = &def.definition.value;
        let kind = match &documented.value {
            TypeDefinition::TypeAlias {
                expr: ir::Type::Record { fields },
                ..
            } => TypeDefKind::Record {
                fields: fields
                    .iter()
                    .filter_map(|field| {
                        let name = self.identifier(&field.name, "field name")?;
                        Some(Field::new(name, self.required(&field.tpe)))
                    })
                    .collect(),
            },
            TypeDefinition::TypeAlias { expr, .. } => TypeDefKind::Alias {
                target: self.required(expr),
            },
            TypeDefinition::CustomType { constructors, .. } => {
                let constructors = &constructors.value;
                if constructors.iter().all(|ctor| ctor.args.is_empty()) {
                    TypeDefKind::Enum {
                        cases: constructors
                            .iter()
                            .filter_map(|ctor| self.identifier(&ctor.name, "enum case name"))
                            .collect(),
                    }
                } else {
                    TypeDefKind::Variant {
                        cases: constructors
                            .iter()
                            .filter_map(|ctor| {
                                let name = self.identifier(&ctor.name, "variant case name")?;
                                // WIT cases carry at most one payload.
                                let payload = ctor.args.first().map(|arg| self.required(&arg.tpe));
                                Some(VariantCase::new(name, payload))
                            })
                            .collect(),
                    }
                }
            }
        };

        let name = self.identifier(&def.name, "identifier")?;
        trace!(name = %name, kind = kind.keyword(), "generated type definition");
        let mut type_def = TypeDef::new(name, kind);
        type_def.docs = Documentation::new(&documented.doc);
        Some(type_def)
    }

    fn function(&mut self, value: &ModuleValue) -> Option<Function> {
        let documented = &value.definition.value;
        let definition = &documented.value;

        let params = definition
            .inputs
            .iter()
            .filter_map(|input| {
                let name = self.identifier(&input.name, "parameter name")?;
                Some(Param::new(name, self.required(&input.tpe)))
            })
            .collect();
        let results = match &definition.output {
            ir::Type::Unit => Vec::new(),
            ir::Type::Tuple { elements } => elements.iter().map(|ty| self.required(ty)).collect(),
            output => self.ty(output).into_iter().collect(),
        };

        let name = self.identifier(&value.name, "function name")?;
        let mut func = Function::new(name);
        func.params = params;
        func.results = results;
        func.docs = Documentation::new(&documented.doc);
        Some(func)
    }

    /// `None` for IR types with no WIT spelling (unit, inline records).
    fn ty(&mut self, ty: &ir::Type) -> Option<Type> {
        match ty {
            ir::Type::Reference { name, params } => self.reference(name, params),
            ir::Type::Variable { name } => self.identifier(name, "type name").map(Type::Named),
            ir::Type::Record { .. } => {
                self.diagnostics.push(Diagnostic::warn(
                    DiagnosticCode::ConversionError,
                    "inline record converted to named type",
                    STEP_GEN,
                ));
                None
            }
            ir::Type::Tuple { elements } => Some(Type::Tuple(
                elements.iter().map(|element| self.required(element)).collect(),
            )),
            ir::Type::Unit => None,
        }
    }

    /// For positions that need a type; unit becomes the empty tuple.
    fn required(&mut self, ty: &ir::Type) -> Type {
        self.ty(ty).unwrap_or_else(|| Type::Tuple(Vec::new()))
    }

    fn reference(&mut self, name: &FQName, params: &[ir::Type]) -> Option<Type> {
        if let Some(mapping) = self.registry.lookup_reverse(&MorphirTypeRef::FqName(name.clone())) {
            return PrimitiveKind::from_wit(&mapping.external_type).map(Type::Primitive);
        }
        if let Some(pattern) = self.container_pattern(name) {
            if let Some(ty) = self.container(&pattern, params) {
                return Some(ty);
            }
        }
        if name.is_sdk() {
            return self.sdk(name, params);
        }

        let local = name.local_name.to_title_case();
        if let Some(mapping) = self.registry.lookup_reverse(&MorphirTypeRef::primitive(&local)) {
            return PrimitiveKind::from_wit(&mapping.external_type).map(Type::Primitive);
        }
        self.identifier(&name.local_name, "type name").map(Type::Named)
    }

    /// External pattern of a bidirectional container mapped to `name`.
    fn container_pattern(&self, name: &FQName) -> Option<String> {
        self.registry
            .all_containers()
            .into_iter()
            .filter(|mapping| mapping.bidirectional)
            .find(|mapping| FQName::parse(&mapping.morphir_pattern).is_ok_and(|fq| &fq == name))
            .map(|mapping| mapping.external_pattern.clone())
    }

    fn container(&mut self, pattern: &str, params: &[ir::Type]) -> Option<Type> {
        match (pattern, params) {
            ("list", [element, ..]) => Some(Type::list(self.required(element))),
            ("option", [inner, ..]) => Some(Type::option(self.required(inner))),
            // error first: `Result e a`
            ("result", [err, ok, ..]) => {
                let err = self.ty(err);
                let ok = self.ty(ok);
                Some(Type::result(ok, err))
            }
            _ => None,
        }
    }

    fn sdk(&mut self, name: &FQName, params: &[ir::Type]) -> Option<Type> {
        let module = name.module_name();
        let local = name.local_name.to_title_case();
        if module == "Basics" {
            return self.basics(&local);
        }
        let pattern = match module.as_str() {
            "List" if local == "List" => Some("list"),
            "Maybe" if local == "Maybe" => Some("option"),
            "Result" if local == "Result" => Some("result"),
            _ => None,
        };
        if let Some(ty) = pattern.and_then(|pattern| self.container(pattern, params)) {
            return Some(ty);
        }

        self.diagnostics.push(Diagnostic::warn(
            DiagnosticCode::ConversionError,
            format!("unknown SDK type: {module}.{local}"),
            STEP_GEN,
        ));
        self.identifier(&name.local_name, "type name").map(Type::Named)
    }

    fn basics(&mut self, local: &str) -> Option<Type> {
        if let Some(mapping) = self.registry.lookup_reverse(&MorphirTypeRef::primitive(local)) {
            if let Some(kind) = PrimitiveKind::from_wit(&mapping.external_type) {
                return Some(Type::Primitive(kind));
            }
        }
        let kind = match local {
            "Bool" => PrimitiveKind::Bool,
            "Int" => {
                self.diagnostics.push(Diagnostic::info(
                    DiagnosticCode::IntPrecisionLost,
                    "Int converted to s32 (size unknown)",
                    STEP_GEN,
                ));
                PrimitiveKind::S32
            }
            "Float" => PrimitiveKind::F64,
            "String" => PrimitiveKind::String,
            "Char" => PrimitiveKind::Char,
            _ => {
                self.diagnostics
                    .push(Diagnostic::unknown_type(&format!("Basics.{local}"), STEP_GEN));
                return None;
            }
        };
        Some(Type::Primitive(kind))
    }

    fn identifier(&mut self, name: &Name, what: &str) -> Option<Identifier> {
        let kebab = name.to_kebab_case();
        match Identifier::new(kebab) {
            Ok(ident) => Some(ident),
            Err(_) => {
                self.diagnostics.push(Diagnostic::conversion_error(
                    &format!("invalid {what}: {}", name.to_camel_case()),
                    STEP_GEN,
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticsExt, Severity};
    use crate::ir::{
        AccessControlled, ConstructorArg, Documented, RecordField, TypeConstructor, ValueDefinition,
        ValueInput,
    };
    use crate::typemap::{Builder, MappingOptions};
    use crate::wit_defaults::WitDefaults;

    fn basics(name: &str) -> ir::Type {
        ir::Type::reference(FQName::sdk("Basics", name), Vec::new())
    }

    fn alias(name: &str, expr: ir::Type) -> ModuleType {
        ModuleType {
            name: Name::from_str(name),
            definition: AccessControlled::public(Documented::new(
                "",
                TypeDefinition::TypeAlias {
                    params: Vec::new(),
                    expr,
                },
            )),
        }
    }

    fn value(name: &str, inputs: Vec<(&str, ir::Type)>, output: ir::Type) -> ModuleValue {
        ModuleValue {
            name: Name::from_str(name),
            definition: AccessControlled::public(Documented::new(
                "",
                ValueDefinition {
                    inputs: inputs
                        .into_iter()
                        .map(|(name, tpe)| ValueInput {
                            name: Name::from_str(name),
                            tpe,
                        })
                        .collect(),
                    output,
                },
            )),
        }
    }

    fn generate(module: &ModuleDefinition) -> (Package, Vec<Diagnostic>) {
        convert_from_ir(module, &GenOptions::default())
    }

    fn alias_target(package: &Package, index: usize) -> &Type {
        match &package.interfaces[0].types[index].kind {
            TypeDefKind::Alias { target } => target,
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn wraps_everything_in_generated_interface() {
        let (package, diagnostics) = generate(&ModuleDefinition::default());
        assert!(diagnostics.is_empty());
        assert_eq!(package.namespace.as_ref().map(|n| n.as_str()), Some("generated"));
        assert_eq!(package.name.as_ref().map(|n| n.as_str()), Some("module"));
        assert_eq!(package.interfaces.len(), 1);
        assert_eq!(package.interfaces[0].name.as_str(), "generated");
    }

    #[test]
    fn record_alias_becomes_record() {
        let module = ModuleDefinition {
            types: vec![alias(
                "DateTime",
                ir::Type::Record {
                    fields: vec![RecordField {
                        name: Name::from_str("nanoSeconds"),
                        tpe: basics("Int"),
                    }],
                },
            )],
            ..ModuleDefinition::default()
        };
        let (package, _) = generate(&module);
        let def = &package.interfaces[0].types[0];
        assert_eq!(def.name.as_str(), "date-time");
        let TypeDefKind::Record { fields } = &def.kind else {
            panic!("expected record");
        };
        assert_eq!(fields[0].name.as_str(), "nano-seconds");
        // `u32` is the bidirectional spelling of Int.
        assert_eq!(fields[0].ty, Type::Primitive(PrimitiveKind::U32));
    }

    #[test]
    fn int_without_reverse_entry_defaults_to_s32() {
        let registry = Builder::new("wit")
            .add_primitive("bool", "Bool", MappingOptions::default())
            .build();
        let module = ModuleDefinition {
            types: vec![alias("count", basics("Int"))],
            ..ModuleDefinition::default()
        };
        let (package, diagnostics) = convert_from_ir_with(&module, &GenOptions::default(), &registry);
        assert_eq!(alias_target(&package, 0), &Type::Primitive(PrimitiveKind::S32));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Info);
        assert_eq!(diagnostics[0].code, DiagnosticCode::IntPrecisionLost);
    }

    #[test]
    fn result_params_are_reversed() {
        let module = ModuleDefinition {
            types: vec![alias(
                "outcome",
                ir::Type::reference(
                    FQName::sdk("Result", "Result"),
                    vec![basics("String"), ir::Type::Unit],
                ),
            )],
            ..ModuleDefinition::default()
        };
        let (package, _) = generate(&module);
        assert_eq!(
            alias_target(&package, 0),
            &Type::result(None, Some(Type::Primitive(PrimitiveKind::String)))
        );
    }

    #[test]
    fn custom_types_become_enums_or_variants() {
        let constructors = |with_arg: bool| {
            TypeDefinition::CustomType {
                params: Vec::new(),
                constructors: AccessControlled::public(vec![
                    TypeConstructor {
                        name: Name::from_str("none"),
                        args: Vec::new(),
                    },
                    TypeConstructor {
                        name: Name::from_str("someValue"),
                        args: if with_arg {
                            vec![ConstructorArg {
                                name: Name::from_str("value"),
                                tpe: basics("Float"),
                            }]
                        } else {
                            Vec::new()
                        },
                    },
                ]),
            }
        };
        let module = ModuleDefinition {
            types: [("plain", false), ("tagged", true)]
                .into_iter()
                .map(|(name, with_arg)| ModuleType {
                    name: Name::from_str(name),
                    definition: AccessControlled::public(Documented::new("", constructors(with_arg))),
                })
                .collect(),
            ..ModuleDefinition::default()
        };
        let (package, _) = generate(&module);
        let types = &package.interfaces[0].types;
        assert!(matches!(&types[0].kind, TypeDefKind::Enum { cases } if cases[1].as_str() == "some-value"));
        let TypeDefKind::Variant { cases } = &types[1].kind else {
            panic!("expected variant");
        };
        assert_eq!(cases[1].payload, Some(Type::Primitive(PrimitiveKind::F64)));
    }

    #[test]
    fn tuple_output_becomes_multiple_results() {
        let module = ModuleDefinition {
            values: vec![
                value("noop", Vec::new(), ir::Type::Unit),
                value(
                    "pair",
                    vec![("inputValue", ir::Type::variable(Name::from_str("point")))],
                    ir::Type::Tuple {
                        elements: vec![basics("Bool"), basics("Char")],
                    },
                ),
            ],
            ..ModuleDefinition::default()
        };
        let (package, _) = generate(&module);
        let functions = &package.interfaces[0].functions;
        assert!(functions[0].results.is_empty());
        assert_eq!(functions[1].results.len(), 2);
        assert_eq!(functions[1].params[0].name.as_str(), "input-value");
        assert_eq!(
            functions[1].params[0].ty,
            Type::named(Identifier::must("point"))
        );
    }

    #[test]
    fn unknown_references_fall_back_to_named_types() {
        let module = ModuleDefinition {
            types: vec![
                alias("a", ir::Type::reference(FQName::sdk("Dict", "Dict"), Vec::new())),
                alias(
                    "b",
                    ir::Type::reference(FQName::parse("My.Pkg:Geo:LatLng").expect("fq"), Vec::new()),
                ),
            ],
            ..ModuleDefinition::default()
        };
        let (package, diagnostics) = generate(&module);
        assert_eq!(alias_target(&package, 0), &Type::named(Identifier::must("dict")));
        assert_eq!(alias_target(&package, 1), &Type::named(Identifier::must("lat-lng")));
        assert!(diagnostics.has_warnings());
        assert!(diagnostics[0].message.contains("unknown SDK type: Dict.Dict"));
    }

    #[test]
    fn invalid_names_are_skipped_with_errors() {
        let module = ModuleDefinition {
            types: vec![alias("123", basics("Bool")), alias("ok", basics("Bool"))],
            ..ModuleDefinition::default()
        };
        let (package, diagnostics) = generate(&module);
        assert_eq!(package.interfaces[0].types.len(), 1);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics[0].code, DiagnosticCode::ConversionError);
    }

    #[test]
    fn inline_records_and_units_have_no_spelling() {
        let module = ModuleDefinition {
            types: vec![alias(
                "wrapped",
                ir::Type::reference(
                    FQName::sdk("List", "List"),
                    vec![ir::Type::Record { fields: Vec::new() }],
                ),
            )],
            ..ModuleDefinition::default()
        };
        let (package, diagnostics) = generate(&module);
        assert_eq!(alias_target(&package, 0), &Type::list(Type::Tuple(Vec::new())));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn fq_reverse_mappings_win() {
        let config = crate::typemap::TypeMappingConfig::from_json(
            r#"{"primitives": [{"external": "s64", "morphir": "Morphir.SDK:Int:Int64", "priority": 1}]}"#,
        )
        .expect("config");
        let registry = Builder::new("wit")
            .with_defaults(&WitDefaults)
            .with_config(&config)
            .build();
        let module = ModuleDefinition {
            types: vec![alias(
                "big",
                ir::Type::reference(FQName::parse("Morphir.SDK:Int:Int64").expect("fq"), Vec::new()),
            )],
            ..ModuleDefinition::default()
        };
        let (package, diagnostics) = convert_from_ir_with(&module, &GenOptions::default(), &registry);
        assert!(diagnostics.is_empty());
        assert_eq!(alias_target(&package, 0), &Type::Primitive(PrimitiveKind::S64));
    }
}
