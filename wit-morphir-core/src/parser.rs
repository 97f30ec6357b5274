//! Recursive-descent parser for WIT.
//!
//! The parser keeps two tokens of lookahead (`current` and `peek`) and
//! fails the whole parse on the first structural mismatch. Every error
//! carries the line:column of the offending token.

use std::mem;

use tracing::debug;

use crate::ast::{
    Constructor, Field, Function, Interface, InterfaceRef, Package, Param, PrimitiveKind,
    ResourceMethod, Type, TypeDef, TypeDefKind, Use, UseItem, UsePath, VariantCase, World,
    WorldItem,
};
use crate::error::CoreError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::names::{self, Documentation, Identifier, Namespace, PackageName};

/// Parse a complete WIT document.
pub fn parse(source: &str) -> Result<Package, CoreError> {
    Parser::new(source).parse()
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    peek: Token,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Parser<'src> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            current,
            peek,
        }
    }

    pub fn parse(mut self) -> Result<Package, CoreError> {
        let mut package = Package::default();

        if self.check(TokenKind::Package) {
            package.docs = self.take_docs();
            self.parse_package_decl(&mut package)?;
        }

        loop {
            match self.current.kind {
                TokenKind::Interface => {
                    let interface = self.parse_interface()?;
                    debug!(name = %interface.name, types = interface.types.len(), functions = interface.functions.len(), "parsed interface");
                    package.interfaces.push(interface);
                }
                TokenKind::World => {
                    let world = self.parse_world()?;
                    debug!(name = %world.name, imports = world.imports.len(), exports = world.exports.len(), "parsed world");
                    package.worlds.push(world);
                }
                TokenKind::Use => {
                    let use_stmt = self.parse_use()?;
                    package.uses.push(use_stmt);
                }
                TokenKind::Eof => break,
                _ => return Err(self.unexpected("interface, world, or use")),
            }
        }

        Ok(package)
    }

    // -----------------------------------------------------------------
    // Package header
    // -----------------------------------------------------------------

    /// `package ns:name(/name)*(@semver)?;`
    fn parse_package_decl(&mut self, package: &mut Package) -> Result<(), CoreError> {
        self.expect(TokenKind::Package)?;

        let namespace = self.parse_word("package namespace", Namespace::new)?;
        self.expect(TokenKind::Colon)?;

        let mut segments = vec![self.parse_word("package name", PackageName::new)?];
        while self.check(TokenKind::Slash) {
            self.advance();
            segments.push(self.parse_word("package name", PackageName::new)?);
        }

        if self.check(TokenKind::At) {
            self.advance();
            package.version = Some(self.parse_version()?);
        }
        self.expect(TokenKind::Semicolon)?;

        package.namespace = Some(namespace);
        package.name = segments.pop();
        package.nested_path = segments;
        Ok(())
    }

    /// 1-3 dot-separated segments, each an integer or an identifier.
    fn parse_version(&mut self) -> Result<semver::Version, CoreError> {
        let start = self.current.start;
        let mut segments = Vec::new();
        loop {
            if !matches!(self.current.kind, TokenKind::Integer | TokenKind::Ident) {
                return Err(self.unexpected("version number"));
            }
            segments.push(self.advance().value);
            let continues = self.check(TokenKind::Dot)
                && matches!(self.peek.kind, TokenKind::Integer | TokenKind::Ident);
            if !continues || segments.len() == 3 {
                break;
            }
            self.advance();
        }
        names::parse_version(&segments).map_err(|err| {
            CoreError::parse(
                start,
                format!("invalid version {:?}: {err}", segments.join(".")),
            )
        })
    }

    // -----------------------------------------------------------------
    // Interfaces
    // -----------------------------------------------------------------

    fn parse_interface(&mut self) -> Result<Interface, CoreError> {
        let docs = self.take_docs();
        self.expect(TokenKind::Interface)?;
        let name = self.parse_name("interface name", false)?;
        let mut interface = Interface::new(name);
        interface.docs = docs;
        self.parse_interface_body(&mut interface)?;
        Ok(interface)
    }

    fn parse_interface_body(&mut self, interface: &mut Interface) -> Result<(), CoreError> {
        self.expect(TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) {
            self.parse_interface_item(interface)?;
        }
        self.expect(TokenKind::RBrace)?;
        Ok(())
    }

    fn parse_interface_item(&mut self, interface: &mut Interface) -> Result<(), CoreError> {
        let docs = self.take_docs();
        let kind = match self.current.kind {
            TokenKind::Type => Some(self.parse_type_alias()?),
            TokenKind::Record => Some(self.parse_record()?),
            TokenKind::Variant => Some(self.parse_variant()?),
            TokenKind::Enum => Some(self.parse_enum()?),
            TokenKind::Flags => Some(self.parse_flags()?),
            TokenKind::Resource => Some(self.parse_resource()?),
            TokenKind::Use => {
                let use_stmt = self.parse_use()?;
                interface.uses.push(use_stmt);
                None
            }
            TokenKind::Ident | TokenKind::Percent => {
                let mut function = self.parse_function()?;
                function.docs = docs;
                interface.functions.push(function);
                return Ok(());
            }
            _ => return Err(self.unexpected("type, record, variant, enum, flags, resource, use, or function")),
        };

        if let Some((name, kind)) = kind {
            interface.types.push(TypeDef { name, kind, docs });
        }
        Ok(())
    }

    /// `type name = T;`
    fn parse_type_alias(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Type)?;
        let name = self.parse_name("type name", false)?;
        self.expect(TokenKind::Equal)?;
        let target = self.parse_type()?;
        self.expect(TokenKind::Semicolon)?;
        Ok((name, TypeDefKind::Alias { target }))
    }

    /// `record name { field: T, ... }`
    fn parse_record(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Record)?;
        let name = self.parse_name("record name", false)?;
        let fields = self.parse_braced_list(|p| {
            let docs = p.take_docs();
            let name = p.parse_name("field name", true)?;
            p.expect(TokenKind::Colon)?;
            let ty = p.parse_type()?;
            Ok(Field { name, ty, docs })
        })?;
        Ok((name, TypeDefKind::Record { fields }))
    }

    /// `variant name { case, case(T), ... }`
    fn parse_variant(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Variant)?;
        let name = self.parse_name("variant name", true)?;
        let cases = self.parse_braced_list(|p| {
            let docs = p.take_docs();
            let name = p.parse_name("variant case name", true)?;
            let payload = if p.check(TokenKind::LParen) {
                p.advance();
                let ty = p.parse_type()?;
                p.expect(TokenKind::RParen)?;
                Some(ty)
            } else {
                None
            };
            Ok(VariantCase {
                name,
                payload,
                docs,
            })
        })?;
        Ok((name, TypeDefKind::Variant { cases }))
    }

    /// `enum name { case, ... }`
    fn parse_enum(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Enum)?;
        let name = self.parse_name("enum name", false)?;
        let cases = self.parse_braced_list(|p| p.parse_name("enum case", false))?;
        Ok((name, TypeDefKind::Enum { cases }))
    }

    /// `flags name { flag, ... }`
    fn parse_flags(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Flags)?;
        let name = self.parse_name("flags name", false)?;
        let flags = self.parse_braced_list(|p| p.parse_name("flag name", false))?;
        Ok((name, TypeDefKind::Flags { flags }))
    }

    /// `resource name;` or `resource name { constructor(...); method: [static] func...; }`
    fn parse_resource(&mut self) -> Result<(Identifier, TypeDefKind), CoreError> {
        self.expect(TokenKind::Resource)?;
        let name = self.parse_name("resource name", false)?;
        let mut constructor = None;
        let mut methods = Vec::new();

        if self.check(TokenKind::Semicolon) {
            self.advance();
            return Ok((
                name,
                TypeDefKind::Resource {
                    constructor,
                    methods,
                },
            ));
        }

        self.expect(TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Constructor) {
                let position = self.current.start;
                self.advance();
                let params = self.parse_param_list()?;
                self.expect(TokenKind::Semicolon)?;
                if constructor.is_some() {
                    return Err(CoreError::parse(
                        position,
                        format!("resource {name} declares more than one constructor"),
                    ));
                }
                constructor = Some(Constructor { params });
                continue;
            }

            let docs = self.take_docs();
            let method_name = self.parse_name("method name", true)?;
            self.expect(TokenKind::Colon)?;
            let is_static = if self.check(TokenKind::Static) {
                self.advance();
                true
            } else {
                false
            };
            let mut function = self.parse_func_type(method_name.clone())?;
            function.docs = docs;
            self.expect(TokenKind::Semicolon)?;
            methods.push(ResourceMethod {
                name: method_name,
                function,
                is_static,
            });
        }
        self.expect(TokenKind::RBrace)?;

        Ok((
            name,
            TypeDefKind::Resource {
                constructor,
                methods,
            },
        ))
    }

    // -----------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------

    /// `name: [async] func(params) [-> T];`
    fn parse_function(&mut self) -> Result<Function, CoreError> {
        let name = self.parse_name("function name", false)?;
        self.expect(TokenKind::Colon)?;
        let function = self.parse_func_type(name)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(function)
    }

    fn parse_func_type(&mut self, name: Identifier) -> Result<Function, CoreError> {
        let mut function = Function::new(name);
        if self.check(TokenKind::Async) {
            self.advance();
            function.is_async = true;
        }
        self.expect(TokenKind::Func)?;
        function.params = self.parse_param_list()?;
        if self.check(TokenKind::Arrow) {
            self.advance();
            function.results.push(self.parse_type()?);
        }
        Ok(function)
    }

    /// `(name: T, ...)`, trailing comma allowed.
    fn parse_param_list(&mut self) -> Result<Vec<Param>, CoreError> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) {
            let name = self.parse_name("parameter name", false)?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param { name, ty });
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    // -----------------------------------------------------------------
    // Worlds
    // -----------------------------------------------------------------

    fn parse_world(&mut self) -> Result<World, CoreError> {
        let docs = self.take_docs();
        self.expect(TokenKind::World)?;
        let name = self.parse_name("world name", false)?;
        let mut world = World::new(name);
        world.docs = docs;

        self.expect(TokenKind::LBrace)?;
        while !self.check(TokenKind::RBrace) {
            match self.current.kind {
                TokenKind::Import => {
                    let item = self.parse_world_item()?;
                    world.imports.push(item);
                }
                TokenKind::Export => {
                    let item = self.parse_world_item()?;
                    world.exports.push(item);
                }
                TokenKind::Use => {
                    let use_stmt = self.parse_use()?;
                    world.uses.push(use_stmt);
                }
                TokenKind::Include => {
                    // include resolution needs other packages
                    self.skip_past(TokenKind::Semicolon)?;
                }
                _ => return Err(self.unexpected("import, export, use, or include")),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(world)
    }

    /// After `import`/`export`:
    ///   `name;`
    ///   `name: interface { ... }`
    ///   `name: [async] func(...) [-> T];`
    ///   `ns:pkg/iface[@version];`
    fn parse_world_item(&mut self) -> Result<WorldItem, CoreError> {
        let docs = self.take_docs();
        self.advance();

        let name_start = self.current.start;
        let name = self.parse_name("import or export name", false)?;

        if self.check(TokenKind::Semicolon) {
            self.advance();
            return Ok(WorldItem::Interface {
                name: name.clone(),
                interface: InterfaceRef::External(UsePath::Local(name)),
            });
        }

        self.expect(TokenKind::Colon)?;
        match self.current.kind {
            TokenKind::Interface => {
                self.advance();
                let mut interface = Interface::new(name.clone());
                interface.docs = docs;
                self.parse_interface_body(&mut interface)?;
                Ok(WorldItem::Interface {
                    name,
                    interface: InterfaceRef::Inline(interface),
                })
            }
            TokenKind::Func | TokenKind::Async => {
                let mut function = self.parse_func_type(name)?;
                function.docs = docs;
                self.expect(TokenKind::Semicolon)?;
                Ok(WorldItem::Function(function))
            }
            _ => {
                let namespace = Namespace::new(name.as_str())
                    .map_err(|err| self.name_error(name_start, "package namespace", err))?;
                let path = self.parse_external_path(namespace)?;
                self.expect(TokenKind::Semicolon)?;
                Ok(WorldItem::Interface {
                    name: path.interface_name().clone(),
                    interface: InterfaceRef::External(path),
                })
            }
        }
    }

    // -----------------------------------------------------------------
    // Use statements
    // -----------------------------------------------------------------

    /// `use path.{a, b as c};` or `use path as name;`
    fn parse_use(&mut self) -> Result<Use, CoreError> {
        self.expect(TokenKind::Use)?;
        let path = self.parse_use_path()?;
        let mut use_stmt = Use {
            path,
            items: Vec::new(),
            alias: None,
        };

        if self.check(TokenKind::Dot) {
            self.advance();
            use_stmt.items = self.parse_braced_list(|p| {
                let name = p.parse_name("imported name", false)?;
                let alias = if p.check(TokenKind::As) {
                    p.advance();
                    Some(p.parse_name("alias", false)?)
                } else {
                    None
                };
                Ok(UseItem { name, alias })
            })?;
        } else if self.check(TokenKind::As) {
            self.advance();
            use_stmt.alias = Some(self.parse_name("alias", false)?);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(use_stmt)
    }

    fn parse_use_path(&mut self) -> Result<UsePath, CoreError> {
        if self.peek.kind == TokenKind::Colon {
            let namespace = self.parse_word("package namespace", Namespace::new)?;
            self.expect(TokenKind::Colon)?;
            return self.parse_external_path(namespace);
        }
        Ok(UsePath::Local(self.parse_name("interface name", false)?))
    }

    /// The remainder of `ns:pkg/iface[@version]` after `ns:`.
    fn parse_external_path(&mut self, namespace: Namespace) -> Result<UsePath, CoreError> {
        let package = self.parse_word("package name", PackageName::new)?;
        self.expect(TokenKind::Slash)?;
        let interface = self.parse_name("interface name", false)?;
        let version = if self.check(TokenKind::At) {
            self.advance();
            Some(self.parse_version()?)
        } else {
            None
        };
        Ok(UsePath::External {
            namespace,
            package,
            interface,
            version,
        })
    }

    // -----------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------

    pub fn parse_type(&mut self) -> Result<Type, CoreError> {
        if let Some(kind) = primitive_kind(self.current.kind) {
            self.advance();
            return Ok(Type::Primitive(kind));
        }

        match self.current.kind {
            TokenKind::List => {
                self.advance();
                Ok(Type::list(self.parse_angle_single()?))
            }
            TokenKind::Option => {
                self.advance();
                Ok(Type::option(self.parse_angle_single()?))
            }
            TokenKind::Result => {
                self.advance();
                self.parse_result_params()
            }
            TokenKind::Tuple => {
                self.advance();
                self.expect(TokenKind::LAngle)?;
                // `tuple<>` is the unit placeholder written by `gen`.
                let mut elements = Vec::new();
                while !self.check(TokenKind::RAngle) {
                    elements.push(self.parse_type()?);
                    if self.check(TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(TokenKind::RAngle)?;
                Ok(Type::Tuple(elements))
            }
            TokenKind::Future => {
                self.advance();
                Ok(Type::Future(self.parse_optional_angle()?.map(Box::new)))
            }
            TokenKind::Stream => {
                self.advance();
                Ok(Type::Stream(self.parse_optional_angle()?.map(Box::new)))
            }
            TokenKind::Own | TokenKind::Borrow => {
                let borrow = self.advance().kind == TokenKind::Borrow;
                self.expect(TokenKind::LAngle)?;
                let resource = self.parse_name("resource name", false)?;
                self.expect(TokenKind::RAngle)?;
                Ok(Type::Handle { resource, borrow })
            }
            TokenKind::Ident | TokenKind::Percent => {
                Ok(Type::Named(self.parse_name("type name", false)?))
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// `result`, `result<T>`, `result<_, E>`, `result<T, E>`
    fn parse_result_params(&mut self) -> Result<Type, CoreError> {
        if !self.check(TokenKind::LAngle) {
            return Ok(Type::result(None, None));
        }
        self.advance();

        if self.check(TokenKind::Underscore) {
            self.advance();
            self.expect(TokenKind::Comma)?;
            let err = self.parse_type()?;
            self.expect(TokenKind::RAngle)?;
            return Ok(Type::result(None, Some(err)));
        }

        let ok = self.parse_type()?;
        let err = if self.check(TokenKind::Comma) {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };
        self.expect(TokenKind::RAngle)?;
        Ok(Type::result(Some(ok), err))
    }

    fn parse_angle_single(&mut self) -> Result<Type, CoreError> {
        self.expect(TokenKind::LAngle)?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::RAngle)?;
        Ok(ty)
    }

    fn parse_optional_angle(&mut self) -> Result<Option<Type>, CoreError> {
        if self.check(TokenKind::LAngle) {
            self.parse_angle_single().map(Some)
        } else {
            Ok(None)
        }
    }

    // -----------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------

    /// `{ item, item, ... }`: commas separate items, a trailing one is allowed.
    fn parse_braced_list<T, F>(&mut self, mut item: F) -> Result<Vec<T>, CoreError>
    where
        F: FnMut(&mut Self) -> Result<T, CoreError>,
    {
        self.expect(TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(TokenKind::RBrace) {
            items.push(item(self)?);
            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(items)
    }

    /// An identifier, optionally `%`-escaped. With `allow_keywords`,
    /// reserved words are accepted unescaped as well.
    fn parse_name(&mut self, what: &str, allow_keywords: bool) -> Result<Identifier, CoreError> {
        let escaped = self.check(TokenKind::Percent);
        if escaped {
            self.advance();
        }

        let accepted = self.current.kind == TokenKind::Ident
            || ((escaped || allow_keywords) && self.current.kind.is_word());
        if !accepted {
            return Err(self.unexpected(what));
        }

        let start = self.current.start;
        let text = if escaped {
            format!("%{}", self.current.value)
        } else {
            self.current.value.clone()
        };
        let ident = Identifier::new(text).map_err(|err| self.name_error(start, what, err))?;
        self.advance();
        Ok(ident)
    }

    /// A bare word validated by `make` (namespaces and package names).
    fn parse_word<T>(
        &mut self,
        what: &str,
        make: impl FnOnce(String) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if !self.current.kind.is_word() {
            return Err(self.unexpected(what));
        }
        let start = self.current.start;
        let value = make(self.current.value.clone()).map_err(|err| self.name_error(start, what, err))?;
        self.advance();
        Ok(value)
    }

    fn name_error(&self, position: crate::span::Position, what: &str, err: CoreError) -> CoreError {
        let message = match err {
            CoreError::InvalidIdentifier { value, reason, .. } => {
                format!("invalid {what} {value:?}: {reason}")
            }
            other => format!("invalid {what}: {other}"),
        };
        CoreError::parse(position, message)
    }

    fn take_docs(&mut self) -> Documentation {
        Documentation::from_lines(mem::take(&mut self.current.docs))
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peek = mem::replace(&mut self.peek, next);
        mem::replace(&mut self.current, peek)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CoreError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn skip_past(&mut self, kind: TokenKind) -> Result<(), CoreError> {
        while !self.check(kind) {
            if matches!(self.current.kind, TokenKind::Eof | TokenKind::Error) {
                return Err(self.unexpected(&kind.to_string()));
            }
            self.advance();
        }
        self.advance();
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> CoreError {
        let token = &self.current;
        if token.kind == TokenKind::Error {
            return CoreError::Lex {
                position: token.start,
                message: token.value.clone(),
            };
        }
        let got = match token.kind {
            TokenKind::Ident | TokenKind::Integer => format!("{} {:?}", token.kind, token.value),
            other => other.to_string(),
        };
        CoreError::parse(token.start, format!("expected {expected}, got {got}"))
    }
}

fn primitive_kind(kind: TokenKind) -> Option<PrimitiveKind> {
    let primitive = match kind {
        TokenKind::U8 => PrimitiveKind::U8,
        TokenKind::U16 => PrimitiveKind::U16,
        TokenKind::U32 => PrimitiveKind::U32,
        TokenKind::U64 => PrimitiveKind::U64,
        TokenKind::S8 => PrimitiveKind::S8,
        TokenKind::S16 => PrimitiveKind::S16,
        TokenKind::S32 => PrimitiveKind::S32,
        TokenKind::S64 => PrimitiveKind::S64,
        TokenKind::F32 => PrimitiveKind::F32,
        TokenKind::F64 => PrimitiveKind::F64,
        TokenKind::Bool => PrimitiveKind::Bool,
        TokenKind::Char => PrimitiveKind::Char,
        TokenKind::String => PrimitiveKind::String,
        _ => return None,
    };
    Some(primitive)
}
