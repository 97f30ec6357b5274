//! Semantic comparison of a source package with its WIT → IR → WIT image.
//!
//! Interfaces and their members are compared index by index. Primitive
//! types compare by class: every integer kind is interchangeable, as
//! are both float kinds, since `make` collapses them.

use crate::ast::{
    Field, Function, Interface, Package, Param, PrimitiveKind, Type, TypeDef, TypeDefKind,
    VariantCase, World,
};
use crate::names::Identifier;

pub fn validate_round_trip(source: &Package, generated: &Package) -> bool {
    all_pairs(&source.interfaces, &generated.interfaces, interfaces_equal)
        && all_pairs(&source.worlds, &generated.worlds, worlds_equal)
}

fn all_pairs<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
}

fn names_equal(a: &Identifier, b: &Identifier) -> bool {
    a.unescaped() == b.unescaped()
}

// Interface names are not compared: `gen` always writes `generated`.
fn interfaces_equal(a: &Interface, b: &Interface) -> bool {
    all_pairs(&a.types, &b.types, type_defs_equal)
        && all_pairs(&a.functions, &b.functions, functions_equal)
}

fn worlds_equal(a: &World, b: &World) -> bool {
    a.imports.len() == b.imports.len() && a.exports.len() == b.exports.len()
}

fn type_defs_equal(a: &TypeDef, b: &TypeDef) -> bool {
    names_equal(&a.name, &b.name) && kinds_equal(&a.kind, &b.kind)
}

fn kinds_equal(a: &TypeDefKind, b: &TypeDefKind) -> bool {
    match (a, b) {
        (TypeDefKind::Record { fields: a }, TypeDefKind::Record { fields: b }) => {
            all_pairs(a, b, fields_equal)
        }
        (TypeDefKind::Variant { cases: a }, TypeDefKind::Variant { cases: b }) => {
            all_pairs(a, b, cases_equal)
        }
        (TypeDefKind::Enum { cases: a }, TypeDefKind::Enum { cases: b })
        | (TypeDefKind::Flags { flags: a }, TypeDefKind::Flags { flags: b }) => {
            all_pairs(a, b, names_equal)
        }
        (
            TypeDefKind::Resource {
                constructor: ca,
                methods: ma,
            },
            TypeDefKind::Resource {
                constructor: cb,
                methods: mb,
            },
        ) => ma.len() == mb.len() && ca.is_some() == cb.is_some(),
        (TypeDefKind::Alias { target: a }, TypeDefKind::Alias { target: b }) => types_equal(a, b),
        _ => false,
    }
}

fn fields_equal(a: &Field, b: &Field) -> bool {
    names_equal(&a.name, &b.name) && types_equal(&a.ty, &b.ty)
}

fn cases_equal(a: &VariantCase, b: &VariantCase) -> bool {
    names_equal(&a.name, &b.name) && optional_types_equal(a.payload.as_ref(), b.payload.as_ref())
}

fn params_equal(a: &Param, b: &Param) -> bool {
    names_equal(&a.name, &b.name) && types_equal(&a.ty, &b.ty)
}

fn functions_equal(a: &Function, b: &Function) -> bool {
    names_equal(&a.name, &b.name)
        && all_pairs(&a.params, &b.params, params_equal)
        && all_pairs(&normalized_results(a), &normalized_results(b), types_equal)
}

/// Several results and a single tuple result are the same signature.
fn normalized_results(func: &Function) -> Vec<Type> {
    if func.results.len() > 1 {
        vec![Type::Tuple(func.results.clone())]
    } else {
        func.results.clone()
    }
}

fn optional_types_equal(a: Option<&Type>, b: Option<&Type>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => types_equal(a, b),
        _ => false,
    }
}

fn types_equal(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Primitive(a), Type::Primitive(b)) => primitives_equal(*a, *b),
        (Type::Named(a), Type::Named(b)) => names_equal(a, b),
        (Type::List(a), Type::List(b)) | (Type::Option(a), Type::Option(b)) => types_equal(a, b),
        (Type::Result { ok: oa, err: ea }, Type::Result { ok: ob, err: eb }) => {
            optional_types_equal(oa.as_deref(), ob.as_deref())
                && optional_types_equal(ea.as_deref(), eb.as_deref())
        }
        (Type::Tuple(a), Type::Tuple(b)) => all_pairs(a, b, types_equal),
        (
            Type::Handle {
                resource: ra,
                borrow: ba,
            },
            Type::Handle {
                resource: rb,
                borrow: bb,
            },
        ) => ba == bb && names_equal(ra, rb),
        // `make` unwraps these, so they never survive a round trip.
        _ => false,
    }
}

fn primitives_equal(a: PrimitiveKind, b: PrimitiveKind) -> bool {
    a == b || (a.is_integer() && b.is_integer()) || (a.is_float() && b.is_float())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn equal(a: &str, b: &str) -> bool {
        validate_round_trip(&parse(a).expect("source"), &parse(b).expect("generated"))
    }

    #[test]
    fn integer_kinds_are_one_class() {
        assert!(equal(
            "package a:b; interface i { record r { x: u8 } }",
            "package g:m; interface generated { record r { x: s64 } }",
        ));
        assert!(equal(
            "package a:b; interface i { type t = f32; }",
            "package g:m; interface generated { type t = f64; }",
        ));
    }

    #[test]
    fn other_primitives_must_match() {
        assert!(!equal(
            "package a:b; interface i { record r { x: bool } }",
            "package a:b; interface i { record r { x: string } }",
        ));
        assert!(!equal(
            "package a:b; interface i { type t = u32; }",
            "package a:b; interface i { type t = f64; }",
        ));
    }

    #[test]
    fn shapes_must_line_up() {
        assert!(!equal(
            "package a:b; interface i { record r { x: u8 } }",
            "package a:b; interface i { record r { x: u8, y: u8 } }",
        ));
        assert!(!equal(
            "package a:b; interface i {} interface j {}",
            "package a:b; interface i {}",
        ));
        assert!(!equal(
            "package a:b; interface i { record r { x: u8 } }",
            "package a:b; interface i { record s { x: u8 } }",
        ));
        assert!(!equal(
            "package a:b; interface i { type t = result<u8>; }",
            "package a:b; interface i { type t = result<_, u8>; }",
        ));
    }

    #[test]
    fn tuple_result_matches_multiple_results() {
        let mut source = parse("package a:b; interface i { f: func() -> tuple<u8, bool>; }")
            .expect("source");
        let generated = source.clone();
        let Type::Tuple(elements) = source.interfaces[0].functions[0].results.remove(0) else {
            panic!("expected tuple");
        };
        source.interfaces[0].functions[0].results = elements;
        assert!(validate_round_trip(&source, &generated));
    }

    #[test]
    fn escaped_names_match_plain_ones() {
        assert!(equal(
            "package a:b; interface i { record r { %type: u8 } }",
            "package a:b; interface i { record r { type: u8 } }",
        ));
    }

    #[test]
    fn futures_never_survive() {
        assert!(!equal(
            "package a:b; interface i { type t = future<u8>; }",
            "package a:b; interface i { type t = future<u8>; }",
        ));
    }

    #[test]
    fn worlds_compare_by_item_counts() {
        assert!(equal(
            "package a:b; world w { import x; export y; }",
            "package a:b; world v { import z; export q; }",
        ));
        assert!(!equal(
            "package a:b; world w { import x; }",
            "package a:b; world w { export x; }",
        ));
    }
}
