//! WIT source text from a [`Package`].
//!
//! Output follows AST order exactly and is accepted by [`crate::parser`].
//! Reserved words used as names are written `%`-escaped.

use crate::ast::{
    Function, Interface, InterfaceRef, Package, Param, Type, TypeDef, TypeDefKind, Use, UsePath,
    World, WorldItem,
};
use crate::compiler::FormatOptions;
use crate::lexer::TokenKind;
use crate::names::{Documentation, Identifier};

pub fn emit(package: &Package) -> String {
    emit_with(package, &FormatOptions::default())
}

pub fn emit_with(package: &Package, options: &FormatOptions) -> String {
    let mut emitter = Emitter {
        out: String::new(),
        options,
        depth: 0,
    };
    emitter.package(package);
    emitter.out
}

/// Render a type expression in WIT syntax.
pub fn type_to_string(ty: &Type) -> String {
    match ty {
        Type::Primitive(kind) => kind.as_str().to_string(),
        Type::Named(name) => escaped(name),
        Type::List(element) => format!("list<{}>", type_to_string(element)),
        Type::Option(inner) => format!("option<{}>", type_to_string(inner)),
        Type::Result { ok, err } => match (ok, err) {
            (None, None) => "result".to_string(),
            (Some(ok), None) => format!("result<{}>", type_to_string(ok)),
            (None, Some(err)) => format!("result<_, {}>", type_to_string(err)),
            (Some(ok), Some(err)) => {
                format!("result<{}, {}>", type_to_string(ok), type_to_string(err))
            }
        },
        Type::Tuple(elements) => format!("tuple<{}>", type_list(elements)),
        Type::Handle { resource, borrow } => {
            let keyword = if *borrow { "borrow" } else { "own" };
            format!("{keyword}<{}>", escaped(resource))
        }
        Type::Future(inner) => parameterized("future", inner.as_deref()),
        Type::Stream(element) => parameterized("stream", element.as_deref()),
    }
}

fn parameterized(keyword: &str, param: Option<&Type>) -> String {
    match param {
        Some(param) => format!("{keyword}<{}>", type_to_string(param)),
        None => keyword.to_string(),
    }
}

fn type_list(types: &[Type]) -> String {
    types.iter().map(type_to_string).collect::<Vec<_>>().join(", ")
}

fn escaped(name: &Identifier) -> String {
    if !name.is_escaped() && TokenKind::from_word(name.as_str()) != TokenKind::Ident {
        format!("%{name}")
    } else {
        name.to_string()
    }
}

struct Emitter<'a> {
    out: String,
    options: &'a FormatOptions,
    depth: usize,
}

impl Emitter<'_> {
    fn package(&mut self, package: &Package) {
        if let (Some(namespace), Some(name)) = (&package.namespace, &package.name) {
            self.docs(&package.docs);
            let mut header = format!("package {namespace}:");
            for segment in &package.nested_path {
                header.push_str(segment.as_str());
                header.push('/');
            }
            header.push_str(name.as_str());
            if let Some(version) = &package.version {
                header.push_str(&format!("@{version}"));
            }
            header.push(';');
            self.line(&header);
        }
        for use_stmt in &package.uses {
            self.use_stmt(use_stmt);
        }

        for interface in &package.interfaces {
            self.blank();
            self.docs(&interface.docs);
            self.line(&format!("interface {} {{", escaped(&interface.name)));
            self.interface_body(interface);
            self.line("}");
        }
        for world in &package.worlds {
            self.blank();
            self.world(world);
        }
    }

    fn interface_body(&mut self, interface: &Interface) {
        self.indented(|e| {
            for use_stmt in &interface.uses {
                e.use_stmt(use_stmt);
            }
            for def in &interface.types {
                e.type_def(def);
            }
            for func in &interface.functions {
                e.docs(&func.docs);
                e.line(&format!("{};", signature(&escaped(&func.name), func)));
            }
        });
    }

    fn type_def(&mut self, def: &TypeDef) {
        self.docs(&def.docs);
        let name = escaped(&def.name);
        match &def.kind {
            TypeDefKind::Record { fields } => {
                self.line(&format!("record {name} {{"));
                self.indented(|e| {
                    for field in fields {
                        e.docs(&field.docs);
                        e.line(&format!("{}: {},", escaped(&field.name), type_to_string(&field.ty)));
                    }
                });
                self.line("}");
            }
            TypeDefKind::Variant { cases } => {
                self.line(&format!("variant {name} {{"));
                self.indented(|e| {
                    for case in cases {
                        e.docs(&case.docs);
                        match &case.payload {
                            Some(payload) => e.line(&format!(
                                "{}({}),",
                                escaped(&case.name),
                                type_to_string(payload)
                            )),
                            None => e.line(&format!("{},", escaped(&case.name))),
                        }
                    }
                });
                self.line("}");
            }
            TypeDefKind::Enum { cases } => self.name_list("enum", &name, cases),
            TypeDefKind::Flags { flags } => self.name_list("flags", &name, flags),
            TypeDefKind::Resource {
                constructor,
                methods,
            } => {
                if constructor.is_none() && methods.is_empty() {
                    self.line(&format!("resource {name};"));
                    return;
                }
                self.line(&format!("resource {name} {{"));
                self.indented(|e| {
                    if let Some(constructor) = constructor {
                        e.line(&format!("constructor({});", params(&constructor.params)));
                    }
                    for method in methods {
                        e.docs(&method.function.docs);
                        let prefix = if method.is_static {
                            format!("{}: static", escaped(&method.name))
                        } else {
                            format!("{}:", escaped(&method.name))
                        };
                        e.line(&format!("{prefix} {};", func_type(&method.function)));
                    }
                });
                self.line("}");
            }
            TypeDefKind::Alias { target } => {
                self.line(&format!("type {name} = {};", type_to_string(target)));
            }
        }
    }

    fn name_list(&mut self, keyword: &str, name: &str, entries: &[Identifier]) {
        self.line(&format!("{keyword} {name} {{"));
        self.indented(|e| {
            for entry in entries {
                e.line(&format!("{},", escaped(entry)));
            }
        });
        self.line("}");
    }

    fn world(&mut self, world: &World) {
        self.docs(&world.docs);
        self.line(&format!("world {} {{", escaped(&world.name)));
        self.indented(|e| {
            for use_stmt in &world.uses {
                e.use_stmt(use_stmt);
            }
            for item in &world.imports {
                e.world_item("import", item);
            }
            for item in &world.exports {
                e.world_item("export", item);
            }
        });
        self.line("}");
    }

    fn world_item(&mut self, direction: &str, item: &WorldItem) {
        match item {
            WorldItem::Interface {
                interface: InterfaceRef::External(path),
                ..
            } => self.line(&format!("{direction} {};", use_path(path))),
            WorldItem::Interface {
                name,
                interface: InterfaceRef::Inline(interface),
            } => {
                self.docs(&interface.docs);
                self.line(&format!("{direction} {}: interface {{", escaped(name)));
                self.interface_body(interface);
                self.line("}");
            }
            WorldItem::Function(func) => {
                self.docs(&func.docs);
                self.line(&format!("{direction} {};", signature(&escaped(&func.name), func)));
            }
        }
    }

    fn use_stmt(&mut self, use_stmt: &Use) {
        let mut text = format!("use {}", use_path(&use_stmt.path));
        if !use_stmt.items.is_empty() {
            let items: Vec<String> = use_stmt
                .items
                .iter()
                .map(|item| match &item.alias {
                    Some(alias) => format!("{} as {}", escaped(&item.name), escaped(alias)),
                    None => escaped(&item.name),
                })
                .collect();
            text.push_str(&format!(".{{{}}}", items.join(", ")));
        } else if let Some(alias) = &use_stmt.alias {
            text.push_str(&format!(" as {}", escaped(alias)));
        }
        text.push(';');
        self.line(&text);
    }

    fn docs(&mut self, docs: &Documentation) {
        if !self.options.include_comments {
            return;
        }
        for line in docs.lines() {
            if line.is_empty() {
                self.line("///");
            } else {
                self.line(&format!("/// {line}"));
            }
        }
    }

    fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    fn line(&mut self, text: &str) {
        let width = self.depth * self.options.indent_size;
        self.out.extend(std::iter::repeat_n(' ', width));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
    }
}

fn use_path(path: &UsePath) -> String {
    match path {
        UsePath::Local(name) => escaped(name),
        UsePath::External { .. } => path.to_string(),
    }
}

fn params(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| format!("{}: {}", escaped(&param.name), type_to_string(&param.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `[async] func(params) [-> T]`; several results are written as a tuple.
fn func_type(func: &Function) -> String {
    let mut text = String::new();
    if func.is_async {
        text.push_str("async ");
    }
    text.push_str(&format!("func({})", params(&func.params)));
    match func.results.as_slice() {
        [] => {}
        [single] => text.push_str(&format!(" -> {}", type_to_string(single))),
        many => text.push_str(&format!(" -> tuple<{}>", type_list(many))),
    }
    text
}

fn signature(name: &str, func: &Function) -> String {
    format!("{name}: {}", func_type(func))
}
