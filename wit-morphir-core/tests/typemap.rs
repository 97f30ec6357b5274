use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use wit_morphir_core::error::CoreError;
use wit_morphir_core::ir::{self, FQName};
use wit_morphir_core::typemap::{
    Builder, Direction, Manager, MappingOptions, MorphirTypeRef, TypeMappingConfig,
};
use wit_morphir_core::wit_defaults::{BINDING_NAME, WitDefaults, new_wit_registry};
use wit_morphir_core::{MakeOptions, compiler};

#[test]
fn config_overrides_beat_defaults_on_priority() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("typemap.json");
    std::fs::write(
        &path,
        r#"{
            "primitives": [
                { "external": "u64", "morphir": "Morphir.SDK:Int:Int64", "priority": 10 }
            ],
            "containers": [
                { "external_pattern": "list", "morphir_pattern": "Morphir.SDK:Array:Array", "priority": 10 }
            ]
        }"#,
    )
    .expect("write config");
    let config = TypeMappingConfig::from_json(&std::fs::read_to_string(&path).expect("read"))
        .expect("valid config");
    let registry = new_wit_registry(Some(&config));

    let u64_mapping = registry.lookup("u64").expect("u64 mapped");
    assert_eq!(u64_mapping.morphir_type.to_string(), "Morphir.SDK:Int:int64");
    assert!(u64_mapping.bidirectional);
    assert_eq!(
        registry.lookup("list").map(|_| ()),
        None,
        "containers are looked up separately"
    );
    let list = registry.lookup_container("list").expect("list container");
    assert_eq!(list.morphir_pattern, "Morphir.SDK:Array:Array");

    let made = compiler::make_with(
        "package a:b; interface i { type big = u64; type many = list<bool>; }",
        &MakeOptions::default(),
        &registry,
    )
    .into_result()
    .expect("make succeeds");
    let references: Vec<_> = made
        .module
        .types
        .iter()
        .filter_map(|t| match &t.definition.value.value {
            ir::TypeDefinition::TypeAlias {
                expr: ir::Type::Reference { name, .. },
                ..
            } => Some(name.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        references,
        vec!["Morphir.SDK:Int:int64", "Morphir.SDK:Array:array"]
    );
}

#[test]
fn malformed_config_is_a_config_error() {
    let err = TypeMappingConfig::from_json(r#"{ "primitives": [ { "external": 3 } ] }"#)
        .expect_err("invalid config");
    assert!(matches!(err, CoreError::Config(_)));
}

#[test]
fn one_way_mappings_stay_out_of_the_reverse_map() {
    let registry = Builder::new("custom")
        .with_defaults(&WitDefaults)
        .add_primitive(
            "s8",
            "Byte",
            MappingOptions::default()
                .with_priority(5)
                .one_way(Direction::ToMorphir),
        )
        .build();
    assert_eq!(
        registry.lookup("s8").map(|m| m.morphir_type.to_string()),
        Some("Byte".to_string())
    );
    assert!(
        registry
            .lookup_reverse(&MorphirTypeRef::primitive("Byte"))
            .is_none()
    );
    assert_eq!(
        registry
            .lookup_reverse(&MorphirTypeRef::primitive("Int"))
            .map(|m| m.external_type.as_str()),
        Some("u32")
    );
}

#[test]
fn manager_is_safe_to_share_between_threads() {
    let manager = Arc::new(Manager::with_defaults());
    let handles: Vec<_> = (0..8)
        .map(|index| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let name = format!("binding-{index}");
                manager.register(Builder::new(name.clone()).with_defaults(&WitDefaults).build());
                let wit = manager.must_get(BINDING_NAME);
                assert!(wit.lookup("string").is_some());
                assert!(manager.has(&name));
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker finished");
    }
    let names = manager.names();
    assert_eq!(names.len(), 9);
    assert!(names.contains(&BINDING_NAME.to_string()));
    assert!(matches!(
        manager.try_get("missing"),
        Err(CoreError::UnknownBinding(_))
    ));
}

fn part() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,8}"
}

proptest! {
    #[test]
    fn fq_names_need_exactly_three_parts(parts in prop::collection::vec(part(), 0..6)) {
        let text = parts.join(":");
        let parsed = FQName::parse(&text);
        prop_assert_eq!(parsed.is_ok(), parts.len() == 3, "input {:?}", text);
    }

    #[test]
    fn type_refs_with_colons_are_fq_names(parts in prop::collection::vec(part(), 3..=3)) {
        let parsed = MorphirTypeRef::parse(&parts.join(":")).expect("three parts");
        prop_assert!(parsed.is_fq_name());
    }

    #[test]
    fn type_refs_without_colons_are_primitives(kind in part()) {
        let parsed = MorphirTypeRef::parse(&kind).expect("primitive");
        prop_assert_eq!(parsed.primitive_kind(), Some(kind.as_str()));
    }
}
