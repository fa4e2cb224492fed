//! Mapping from external type facts to roles
//!
//! The entity layer records type facts for its entities (class IRIs in a
//! graph store, say) and asks which roles those facts translate to.

use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use persona_core::{ConfigurationError, RoleCatalog, RoleName, TypeFact};
use std::sync::Arc;
use tracing::debug;

/// Registry of type fact to role mappings
pub struct RoleMapper {
    catalog: Arc<RoleCatalog>,
    by_fact: RwLock<IndexMap<TypeFact, IndexSet<RoleName>>>,
}

impl RoleMapper {
    /// Empty mapper over `catalog`
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self {
            catalog,
            by_fact: RwLock::new(IndexMap::new()),
        }
    }

    /// Entities carrying `fact` play `role`
    pub fn map(
        &self,
        fact: impl Into<TypeFact>,
        role: impl Into<RoleName>,
    ) -> Result<(), ConfigurationError> {
        let (fact, role) = (fact.into(), role.into());
        self.catalog.require(&role)?;
        debug!(%fact, %role, "Mapped type fact to role");
        self.by_fact.write().entry(fact).or_default().insert(role);
        Ok(())
    }

    /// Whether any role is mapped for `fact`
    pub fn is_mapped(&self, fact: &TypeFact) -> bool {
        self.by_fact.read().contains_key(fact)
    }

    /// Roles for a set of facts, deduplicated; unmapped facts contribute nothing
    pub fn roles_for(&self, facts: &[TypeFact]) -> Vec<RoleName> {
        let by_fact = self.by_fact.read();
        let roles: IndexSet<RoleName> = facts
            .iter()
            .filter_map(|fact| by_fact.get(fact))
            .flat_map(|roles| roles.iter().cloned())
            .collect();
        roles.into_iter().collect()
    }

    /// Facts mapped to `role` or to a role extending it
    pub fn types_for(&self, role: &RoleName) -> Vec<TypeFact> {
        self.by_fact
            .read()
            .iter()
            .filter(|(_, roles)| {
                roles
                    .iter()
                    .any(|mapped| self.catalog.is_assignable(mapped, role))
            })
            .map(|(fact, _)| fact.clone())
            .collect()
    }
}

impl std::fmt::Debug for RoleMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleMapper")
            .field(
                "facts",
                &format!("IndexMap with {} entries", self.by_fact.read().len()),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::RoleDef;

    fn mapper() -> RoleMapper {
        let catalog = RoleCatalog::new();
        catalog.register(RoleDef::new("Agent")).unwrap();
        catalog
            .register(RoleDef::new("Person").extends("Agent"))
            .unwrap();
        catalog.register(RoleDef::new("Document")).unwrap();
        RoleMapper::new(Arc::new(catalog))
    }

    #[test]
    fn test_roles_for_facts() {
        let mapper = mapper();
        mapper.map("foaf:Person", "Person").unwrap();
        mapper.map("foaf:Agent", "Agent").unwrap();
        mapper.map("schema:Person", "Person").unwrap();

        let facts = [
            TypeFact::new("foaf:Person"),
            TypeFact::new("schema:Person"),
            TypeFact::new("unmapped"),
        ];
        assert_eq!(mapper.roles_for(&facts), vec![RoleName::new("Person")]);
        assert!(!mapper.is_mapped(&TypeFact::new("unmapped")));
    }

    #[test]
    fn test_types_for_includes_subroles() {
        let mapper = mapper();
        mapper.map("foaf:Person", "Person").unwrap();
        mapper.map("foaf:Agent", "Agent").unwrap();
        mapper.map("foaf:Document", "Document").unwrap();

        let facts = mapper.types_for(&RoleName::new("Agent"));
        assert_eq!(
            facts,
            vec![TypeFact::new("foaf:Person"), TypeFact::new("foaf:Agent")]
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = mapper().map("x:Thing", "Thing").unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownRole { .. }));
    }
}
