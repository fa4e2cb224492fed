//! Type references and the hierarchy seam used by property mapping
//!
//! The property mapper chain needs to walk behaviour superclasses and the
//! roles a type implements without knowing how behaviours or synthesized
//! composite types are stored. `TypeHierarchy` is that seam.

use crate::identifiers::{BehaviourName, RoleName};
use crate::role::RoleCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one synthesized composite type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeTypeId(pub u64);

impl fmt::Display for CompositeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "composite-{}", self.0)
    }
}

/// Any type the mapper chain can describe
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    /// A role
    Role(RoleName),
    /// A behaviour
    Behaviour(BehaviourName),
    /// A synthesized composite type
    Composite(CompositeTypeId),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role {role}"),
            Self::Behaviour(behaviour) => write!(f, "behaviour {behaviour}"),
            Self::Composite(id) => write!(f, "{id}"),
        }
    }
}

impl From<RoleName> for TypeRef {
    fn from(role: RoleName) -> Self {
        Self::Role(role)
    }
}

impl From<BehaviourName> for TypeRef {
    fn from(behaviour: BehaviourName) -> Self {
        Self::Behaviour(behaviour)
    }
}

impl From<CompositeTypeId> for TypeRef {
    fn from(id: CompositeTypeId) -> Self {
        Self::Composite(id)
    }
}

/// Structural queries over roles, behaviours and composite types
pub trait TypeHierarchy: Send + Sync {
    /// Parent type of a behaviour-style type, `None` at the root
    fn superclass(&self, ty: &TypeRef) -> Option<TypeRef>;

    /// Roles the type implements directly; for a role, the roles it extends
    fn interfaces(&self, ty: &TypeRef) -> Vec<RoleName>;
}

impl TypeHierarchy for RoleCatalog {
    fn superclass(&self, _ty: &TypeRef) -> Option<TypeRef> {
        None
    }

    fn interfaces(&self, ty: &TypeRef) -> Vec<RoleName> {
        match ty {
            TypeRef::Role(role) => self
                .get(role)
                .map(|def| def.extends.clone())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleDef;

    #[test]
    fn test_catalog_hierarchy_reports_parents() {
        let catalog = RoleCatalog::new();
        catalog.register(RoleDef::new("Base")).unwrap();
        catalog
            .register(RoleDef::new("Derived").extends("Base"))
            .unwrap();

        let derived = TypeRef::Role("Derived".into());
        assert_eq!(catalog.interfaces(&derived), vec![RoleName::new("Base")]);
        assert_eq!(catalog.superclass(&derived), None);
        assert!(catalog
            .interfaces(&TypeRef::Behaviour("Impl".into()))
            .is_empty());
    }
}
