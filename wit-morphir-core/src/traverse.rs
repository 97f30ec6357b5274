//! Generic traversals over [`Type`] trees.

use crate::ast::Type;

/// Depth-first pre-order walk. Returning `false` from `visit` prunes the
/// children of the current node.
pub fn walk<'a, F>(ty: &'a Type, visit: &mut F)
where
    F: FnMut(&'a Type) -> bool,
{
    if !visit(ty) {
        return;
    }
    for child in ty.children() {
        walk(child, visit);
    }
}

/// Structure-preserving rewrite: `transform` runs on a node first, then
/// the children of its output are rewritten recursively.
///
/// `map_type(t, &mut |t| t)` returns a tree equal to `t`.
pub fn map_type<F>(ty: &Type, transform: &mut F) -> Type
where
    F: FnMut(Type) -> Type,
{
    match transform(ty.clone()) {
        Type::List(element) => Type::List(Box::new(map_type(&element, transform))),
        Type::Option(inner) => Type::Option(Box::new(map_type(&inner, transform))),
        Type::Result { ok, err } => Type::Result {
            ok: ok.map(|t| Box::new(map_type(&t, transform))),
            err: err.map(|t| Box::new(map_type(&t, transform))),
        },
        Type::Tuple(elements) => Type::Tuple(
            elements
                .iter()
                .map(|t| map_type(t, transform))
                .collect(),
        ),
        Type::Future(inner) => Type::Future(inner.map(|t| Box::new(map_type(&t, transform)))),
        Type::Stream(inner) => Type::Stream(inner.map(|t| Box::new(map_type(&t, transform)))),
        leaf @ (Type::Primitive(_) | Type::Named(_) | Type::Handle { .. }) => leaf,
    }
}

/// Pre-order left fold over every node of the tree.
pub fn fold_type<'a, A, F>(ty: &'a Type, init: A, combine: &mut F) -> A
where
    F: FnMut(A, &'a Type) -> A,
{
    let mut acc = combine(init, ty);
    for child in ty.children() {
        acc = fold_type(child, acc, combine);
    }
    acc
}

/// Every node matching `predicate`, in pre-order.
pub fn collect_types<'a, P>(ty: &'a Type, mut predicate: P) -> Vec<&'a Type>
where
    P: FnMut(&Type) -> bool,
{
    let mut found = Vec::new();
    walk(ty, &mut |node| {
        if predicate(node) {
            found.push(node);
        }
        true
    });
    found
}

/// Whether any node matches `predicate`. Stops descending once a match is found.
pub fn contains_type<P>(ty: &Type, mut predicate: P) -> bool
where
    P: FnMut(&Type) -> bool,
{
    let mut found = false;
    walk(ty, &mut |node| {
        if found {
            return false;
        }
        if predicate(node) {
            found = true;
            return false;
        }
        true
    });
    found
}

/// Maximum nesting depth. Leaves have depth 1; a container has depth one
/// more than its deepest child.
pub fn type_depth(ty: &Type) -> usize {
    let children = ty.children();
    let deepest = children
        .iter()
        .fold(0, |max, child| max.max(type_depth(child)));
    1 + deepest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PrimitiveKind;
    use crate::names::Identifier;

    fn prim(kind: PrimitiveKind) -> Type {
        Type::Primitive(kind)
    }

    fn sample() -> Type {
        Type::Tuple(vec![
            Type::list(prim(PrimitiveKind::U8)),
            Type::result(
                Some(Type::option(prim(PrimitiveKind::String))),
                Some(Type::named(Identifier::must("error-code"))),
            ),
        ])
    }

    #[test]
    fn walk_is_pre_order() {
        let ty = sample();
        let mut order = Vec::new();
        walk(&ty, &mut |node| {
            order.push(match node {
                Type::Tuple(_) => "tuple",
                Type::List(_) => "list",
                Type::Primitive(_) => "prim",
                Type::Result { .. } => "result",
                Type::Option(_) => "option",
                Type::Named(_) => "named",
                _ => "other",
            });
            true
        });
        assert_eq!(
            order,
            vec!["tuple", "list", "prim", "result", "option", "prim", "named"]
        );
    }

    #[test]
    fn walk_prunes_subtrees() {
        let ty = sample();
        let mut visited = 0;
        walk(&ty, &mut |node| {
            visited += 1;
            !matches!(node, Type::Result { .. })
        });
        assert_eq!(visited, 4);
    }

    #[test]
    fn map_identity_preserves_tree() {
        let ty = sample();
        assert_eq!(map_type(&ty, &mut |t| t), ty);
    }

    #[test]
    fn map_rewrites_every_matching_node() {
        let ty = sample();
        let widened = map_type(&ty, &mut |t| match t {
            Type::Primitive(PrimitiveKind::U8) => prim(PrimitiveKind::U64),
            other => other,
        });
        assert!(contains_type(&widened, |t| *t == prim(PrimitiveKind::U64)));
        assert!(!contains_type(&widened, |t| *t == prim(PrimitiveKind::U8)));
    }

    #[test]
    fn fold_counts_nodes() {
        let ty = sample();
        assert_eq!(fold_type(&ty, 0usize, &mut |n, _| n + 1), 7);
    }

    #[test]
    fn collects_primitives() {
        let ty = sample();
        let prims = collect_types(&ty, |t| matches!(t, Type::Primitive(_)));
        assert_eq!(prims.len(), 2);
    }

    #[test]
    fn depth_follows_deepest_branch() {
        assert_eq!(type_depth(&prim(PrimitiveKind::Bool)), 1);
        assert_eq!(type_depth(&Type::list(prim(PrimitiveKind::Bool))), 2);
        assert_eq!(type_depth(&sample()), 4);
        assert_eq!(type_depth(&Type::result(None, None)), 1);
    }
}
