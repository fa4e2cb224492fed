//! Identifier types for roles, behaviours, predicates and entities
//!
//! Roles and behaviours are identified by stable names. Predicates are the
//! backing identifiers properties are stored under. Entity identifiers are
//! opaque handles: the engine only ever compares them for identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

macro_rules! name_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create from any string-like value
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(Arc::from(name.as_ref()))
            }

            /// Borrow the underlying string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(Arc::from(name))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

name_type!(
    /// Stable name of a role
    RoleName
);

name_type!(
    /// Stable name of a behaviour
    BehaviourName
);

name_type!(
    /// Backing identifier a property is stored under
    ///
    /// In a graph store this is the predicate IRI of the property edge.
    Predicate
);

name_type!(
    /// Opaque entity handle shared by every behaviour of one composite
    ///
    /// Typically the subject IRI of the entity in the graph store. The engine
    /// never interprets it beyond equality.
    EntityId
);

name_type!(
    /// External type fact, e.g. the recorded class IRI of an entity
    TypeFact
);

impl EntityId {
    /// Generate a fresh `urn:uuid:` identifier
    pub fn generate() -> Self {
        Self::from(format!("urn:uuid:{}", Uuid::new_v4()))
    }
}

impl Predicate {
    /// Predicate derived from a namespace and a local property name
    pub fn in_namespace(namespace: &str, local: &str) -> Self {
        Self::from(format!("{namespace}{local}"))
    }
}

/// Supplies entity handles for new composite instances
pub trait IdentityProvider: Send + Sync {
    /// Produce a handle for a new, anonymous entity
    fn next_handle(&self) -> EntityId;
}

/// Identity provider minting `urn:uuid:` handles
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdentityProvider;

impl IdentityProvider for UuidIdentityProvider {
    fn next_handle(&self) -> EntityId {
        EntityId::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_compare_by_content() {
        let a = RoleName::new("Person");
        let b = RoleName::from(String::from("Person"));
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Person");
        assert_eq!(a.to_string(), "Person");
    }

    #[test]
    fn test_generated_entity_ids_are_unique() {
        let provider = UuidIdentityProvider;
        let a = provider.next_handle();
        let b = provider.next_handle();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("urn:uuid:"));
    }

    #[test]
    fn test_predicate_namespace() {
        let p = Predicate::in_namespace("http://example.org/ns#", "name");
        assert_eq!(p.as_str(), "http://example.org/ns#name");
    }
}
