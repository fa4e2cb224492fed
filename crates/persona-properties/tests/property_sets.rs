//! Property set behaviour under concurrency and name derivation properties

use persona_core::{
    MethodSig, ResolverConfig, RoleCatalog, RoleDef, RoleName, UsageError, Value, ValueType,
};
use persona_properties::{
    decapitalize, property_name, ListView, PropertyResolver, PropertySet, Transient,
    Unmodifiable,
};
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_readers_never_see_partial_writes() {
    let set = Arc::new(Transient::with_values(ValueType::Integer, [0i64, 1, 2]));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let set = set.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let snapshot = set.get_all().unwrap();
                    // Writers always replace the whole set with a run of
                    // three consecutive integers
                    let first = *snapshot.first().unwrap();
                    assert_eq!(
                        snapshot.iter().copied().collect::<Vec<_>>(),
                        vec![first, first + 1, first + 2]
                    );
                }
            });
        }
        let writer = set.clone();
        scope.spawn(move || {
            for base in 0..200i64 {
                writer.set_all(vec![base, base + 1, base + 2]).unwrap();
            }
        });
    });
}

#[test]
fn test_snapshot_outlives_mutation() {
    let set = Transient::with_values(ValueType::Text, ["a".to_string()]);
    let before = set.get_all().unwrap();
    set.add("b".to_string()).unwrap();
    set.remove(&"a".to_string()).unwrap();

    assert_eq!(before.len(), 1);
    assert!(before.contains("a"));
    assert_eq!(set.get_all().unwrap().len(), 1);
    assert!(set.get_all().unwrap().contains("b"));
}

#[test]
fn test_list_view_over_read_only_set() {
    let backing: Arc<dyn PropertySet<Value>> = Arc::new(Transient::with_values(
        ValueType::Text,
        [Value::from("x"), Value::from("y")],
    ));
    let read_only: Arc<dyn PropertySet<Value>> = Arc::new(Unmodifiable::new(backing.clone()));
    let mut view = ListView::new(read_only).unwrap();

    assert_eq!(view.len(), 2);
    let err = view.remove(0).unwrap_err();
    assert!(matches!(
        err.as_usage(),
        Some(UsageError::Unsupported { .. })
    ));

    backing.add(Value::from("z")).unwrap();
    assert_eq!(view.len(), 2);
    assert_eq!(view.iter().unwrap().count(), 3);
}

#[test]
fn test_resolution_is_cached_per_role() {
    let catalog = RoleCatalog::new();
    catalog
        .register(
            RoleDef::new("Labelled")
                .method(MethodSig::getter("getLabel", ValueType::Text))
                .method(MethodSig::setter("setLabel", ValueType::Text)),
        )
        .unwrap();
    let resolver = PropertyResolver::new(Arc::new(catalog), ResolverConfig::default());

    let first = resolver.resolve(&RoleName::new("Labelled")).unwrap();
    let second = resolver.resolve(&RoleName::new("Labelled")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first[0].name, "label");
    assert_eq!(first[0].predicate.as_str(), "Labelled#label");
}

proptest! {
    #[test]
    fn prop_get_prefix_decapitalizes_stem(stem in "[A-Z][a-z][a-zA-Z]{0,8}") {
        let getter = MethodSig::getter(format!("get{stem}"), ValueType::Text);
        let name = property_name(&getter, true);
        prop_assert_eq!(name.to_uppercase(), stem.to_uppercase());
        prop_assert!(name.starts_with(|c: char| c.is_lowercase()));
    }

    #[test]
    fn prop_acronyms_are_kept(stem in "[A-Z]{2,6}[a-zA-Z]{0,4}") {
        prop_assert_eq!(decapitalize(&stem), stem);
    }

    #[test]
    fn prop_non_getters_keep_method_name(name in "[a-f][a-z]{0,8}") {
        // Names starting with a-f can never carry a get or is prefix
        let sig = MethodSig::getter(name.clone(), ValueType::Boolean);
        prop_assert_eq!(property_name(&sig, true), name);
    }
}
