//! Role catalog normalization properties

use persona_core::{ConfigurationError, MethodSig, RoleCatalog, RoleDef, RoleName, ValueType};
use proptest::prelude::*;

/// Diamond: `Thing` <- `Agent`, `Work` <- `Author` (extends both)
fn catalog() -> RoleCatalog {
    let catalog = RoleCatalog::new();
    catalog
        .register(RoleDef::new("Thing").method(MethodSig::getter("getLabel", ValueType::Text)))
        .unwrap();
    catalog
        .register(RoleDef::new("Agent").extends("Thing"))
        .unwrap();
    catalog.register(RoleDef::new("Work").extends("Thing")).unwrap();
    catalog
        .register(RoleDef::new("Author").extends("Agent").extends("Work"))
        .unwrap();
    catalog.register(RoleDef::new("Tag")).unwrap();
    catalog
}

const NAMES: [&str; 5] = ["Thing", "Agent", "Work", "Author", "Tag"];

#[test]
fn test_diamond_methods_are_listed_once() {
    let catalog = catalog();
    let methods = catalog.methods_of(&RoleName::new("Author")).unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].role, RoleName::new("Thing"));
}

#[test]
fn test_extending_unknown_role_is_rejected() {
    let catalog = catalog();
    let err = catalog
        .register(RoleDef::new("Orphan").extends("Missing"))
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnknownRole { .. }));
}

proptest! {
    #[test]
    fn prop_minimal_is_order_independent_and_idempotent(
        picked in prop::sample::subsequence(NAMES.to_vec(), 1..=5).prop_shuffle()
    ) {
        let catalog = catalog();
        let roles: Vec<RoleName> = picked.iter().map(|r| RoleName::new(r)).collect();
        let mut reversed = roles.clone();
        reversed.reverse();

        let minimal = catalog.minimal(&roles).unwrap();
        prop_assert_eq!(&minimal, &catalog.minimal(&reversed).unwrap());
        prop_assert_eq!(&minimal, &catalog.minimal(&minimal).unwrap());
        prop_assert_eq!(
            catalog.closure(&minimal).unwrap(),
            catalog.closure(&roles).unwrap()
        );
    }
}
