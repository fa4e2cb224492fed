//! Type hierarchy over roles, registered behaviours and synthesized types

use crate::cache::TypeCache;
use crate::registry::BehaviourRegistry;
use persona_core::{RoleCatalog, RoleName, TypeHierarchy, TypeRef};
use std::sync::Arc;

/// Answers structural queries for the property mapper chain
///
/// Behaviours have their parent as superclass and their declared roles as
/// interfaces. Composite types implement the normalized roles of their key.
pub struct CompositionHierarchy {
    catalog: Arc<RoleCatalog>,
    behaviours: Arc<BehaviourRegistry>,
    types: Arc<dyn TypeCache>,
}

impl CompositionHierarchy {
    /// Hierarchy over the given registries
    pub fn new(
        catalog: Arc<RoleCatalog>,
        behaviours: Arc<BehaviourRegistry>,
        types: Arc<dyn TypeCache>,
    ) -> Self {
        Self {
            catalog,
            behaviours,
            types,
        }
    }
}

impl TypeHierarchy for CompositionHierarchy {
    fn superclass(&self, ty: &TypeRef) -> Option<TypeRef> {
        match ty {
            TypeRef::Behaviour(name) => self
                .behaviours
                .get(name)
                .and_then(|def| def.parent.clone())
                .map(TypeRef::Behaviour),
            TypeRef::Role(_) | TypeRef::Composite(_) => None,
        }
    }

    fn interfaces(&self, ty: &TypeRef) -> Vec<RoleName> {
        match ty {
            TypeRef::Role(_) => self.catalog.interfaces(ty),
            TypeRef::Behaviour(name) => self
                .behaviours
                .get(name)
                .map(|def| def.roles.clone())
                .unwrap_or_default(),
            TypeRef::Composite(id) => self
                .types
                .get_by_id(*id)
                .map(|ty| ty.key().roles().to_vec())
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for CompositionHierarchy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionHierarchy")
            .field("behaviours", &self.behaviours.len())
            .field("types", &self.types.len())
            .finish()
    }
}
