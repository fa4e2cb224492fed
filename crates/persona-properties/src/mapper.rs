//! Property mapper chain
//!
//! Finds the descriptor set for a type, stopping at the first hit:
//!
//! 1. a mapper registered for the exact type
//! 2. a mapper registered for a behaviour superclass, walking to the root
//! 3. a mapper registered for an implemented role, breadth-first over all
//!    direct and transitive roles, visiting each role once
//! 4. the default mapper, covering every accessor pair of every role
//!
//! Registrations happen at configuration time; lookups run concurrently.

use crate::descriptor::PropertyDescriptor;
use crate::resolver::PropertyResolver;
use indexmap::IndexSet;
use parking_lot::RwLock;
use persona_core::{ConfigurationError, RoleName, TypeHierarchy, TypeRef};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Produces the descriptor set for a type
pub trait PropertyMapper: Send + Sync {
    /// Descriptors for `ty`, the type the mapper was found for
    fn properties(&self, ty: &TypeRef) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError>;
}

/// Mapper returning a fixed descriptor set
#[derive(Debug, Clone)]
pub struct FixedMapper {
    descriptors: Arc<[PropertyDescriptor]>,
}

impl FixedMapper {
    /// Mapper answering with exactly these descriptors
    pub fn new(descriptors: Vec<PropertyDescriptor>) -> Self {
        Self {
            descriptors: descriptors.into(),
        }
    }
}

impl PropertyMapper for FixedMapper {
    fn properties(&self, _ty: &TypeRef) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        Ok(self.descriptors.clone())
    }
}

/// Mapper resolving the descriptors of one role
pub struct RoleResolverMapper {
    role: RoleName,
    resolver: Arc<PropertyResolver>,
}

impl RoleResolverMapper {
    /// Mapper for `role` backed by `resolver`
    pub fn new(role: RoleName, resolver: Arc<PropertyResolver>) -> Self {
        Self { role, resolver }
    }
}

impl PropertyMapper for RoleResolverMapper {
    fn properties(&self, _ty: &TypeRef) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        self.resolver.resolve(&self.role)
    }
}

/// Fallback: every property of every role the type implements
pub struct DefaultMapper {
    resolver: Arc<PropertyResolver>,
    hierarchy: Arc<dyn TypeHierarchy>,
}

impl DefaultMapper {
    /// Default mapper over `hierarchy` using `resolver`
    pub fn new(resolver: Arc<PropertyResolver>, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        Self {
            resolver,
            hierarchy,
        }
    }
}

impl PropertyMapper for DefaultMapper {
    fn properties(&self, ty: &TypeRef) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        let mut roles: IndexSet<RoleName> = IndexSet::new();
        if let TypeRef::Role(role) = ty {
            roles.insert(role.clone());
        }
        roles.extend(implemented_roles(self.hierarchy.as_ref(), ty));
        Ok(self.resolver.resolve_all(roles.iter())?.into())
    }
}

/// Roles implemented by `ty` and its superclasses, then their ancestors,
/// breadth-first and without repeats
fn implemented_roles(hierarchy: &dyn TypeHierarchy, ty: &TypeRef) -> IndexSet<RoleName> {
    let mut queue: VecDeque<RoleName> = VecDeque::new();
    let mut current = Some(ty.clone());
    while let Some(next) = current {
        queue.extend(hierarchy.interfaces(&next));
        current = hierarchy.superclass(&next);
    }

    let mut seen = IndexSet::new();
    while let Some(role) = queue.pop_front() {
        if seen.insert(role.clone()) {
            queue.extend(hierarchy.interfaces(&TypeRef::Role(role)));
        }
    }
    seen
}

/// Which step of the chain produced a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapperSource {
    /// Mapper registered for the exact type
    Exact,
    /// Mapper registered for a behaviour superclass
    Superclass(TypeRef),
    /// Mapper registered for an implemented role
    Interface(RoleName),
    /// Default mapper
    Default,
}

/// Descriptors together with the chain step that produced them
#[derive(Debug, Clone)]
pub struct ResolvedProperties {
    /// Producing step
    pub source: MapperSource,
    /// Descriptors
    pub descriptors: Arc<[PropertyDescriptor]>,
}

/// Ordered mapper lookup with a default fallback
pub struct MapperChain {
    hierarchy: Arc<dyn TypeHierarchy>,
    mappers: RwLock<HashMap<TypeRef, Arc<dyn PropertyMapper>>>,
    default: Arc<dyn PropertyMapper>,
}

impl std::fmt::Debug for MapperChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperChain")
            .field(
                "mappers",
                &format!("HashMap with {} entries", self.mappers.read().len()),
            )
            .finish()
    }
}

impl MapperChain {
    /// Chain over `hierarchy` falling back to `default`
    pub fn new(hierarchy: Arc<dyn TypeHierarchy>, default: Arc<dyn PropertyMapper>) -> Self {
        Self {
            hierarchy,
            mappers: RwLock::new(HashMap::new()),
            default,
        }
    }

    /// Chain whose default mapper resolves every role with `resolver`
    pub fn with_default_resolver(
        hierarchy: Arc<dyn TypeHierarchy>,
        resolver: Arc<PropertyResolver>,
    ) -> Self {
        let default = Arc::new(DefaultMapper::new(resolver, hierarchy.clone()));
        Self::new(hierarchy, default)
    }

    /// Register a mapper for an exact type, replacing any previous one
    pub fn register(&self, ty: TypeRef, mapper: Arc<dyn PropertyMapper>) {
        tracing::debug!(%ty, "registered property mapper");
        self.mappers.write().insert(ty, mapper);
    }

    /// Whether a mapper is registered for exactly this type
    pub fn is_registered(&self, ty: &TypeRef) -> bool {
        self.mappers.read().contains_key(ty)
    }

    /// Descriptor set for a type
    pub fn properties_for(
        &self,
        ty: &TypeRef,
    ) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        Ok(self.resolve(ty)?.descriptors)
    }

    /// Descriptor set for a type and the chain step that produced it
    pub fn resolve(&self, ty: &TypeRef) -> Result<ResolvedProperties, ConfigurationError> {
        let (mapper, source, at) = self.lookup(ty);
        tracing::trace!(%ty, ?source, "property mapper lookup");
        Ok(ResolvedProperties {
            descriptors: mapper.properties(&at)?,
            source,
        })
    }

    fn lookup(&self, ty: &TypeRef) -> (Arc<dyn PropertyMapper>, MapperSource, TypeRef) {
        let mappers = self.mappers.read();

        if let Some(mapper) = mappers.get(ty) {
            return (mapper.clone(), MapperSource::Exact, ty.clone());
        }

        let mut ancestor = self.hierarchy.superclass(ty);
        while let Some(parent) = ancestor {
            if let Some(mapper) = mappers.get(&parent) {
                return (mapper.clone(), MapperSource::Superclass(parent.clone()), parent);
            }
            ancestor = self.hierarchy.superclass(&parent);
        }

        for role in implemented_roles(self.hierarchy.as_ref(), ty) {
            let at = TypeRef::Role(role.clone());
            if let Some(mapper) = mappers.get(&at) {
                return (mapper.clone(), MapperSource::Interface(role), at);
            }
        }

        (self.default.clone(), MapperSource::Default, ty.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Cardinality;
    use persona_core::{
        BehaviourName, MethodSig, ResolverConfig, RoleCatalog, RoleDef, ValueType,
    };
    use std::collections::BTreeSet;

    /// Roles from a catalog plus a hand-written behaviour hierarchy
    struct TestHierarchy {
        catalog: Arc<RoleCatalog>,
        behaviours: HashMap<BehaviourName, (Option<BehaviourName>, Vec<RoleName>)>,
    }

    impl TypeHierarchy for TestHierarchy {
        fn superclass(&self, ty: &TypeRef) -> Option<TypeRef> {
            match ty {
                TypeRef::Behaviour(b) => self
                    .behaviours
                    .get(b)
                    .and_then(|(parent, _)| parent.clone())
                    .map(TypeRef::Behaviour),
                _ => None,
            }
        }

        fn interfaces(&self, ty: &TypeRef) -> Vec<RoleName> {
            match ty {
                TypeRef::Behaviour(b) => self
                    .behaviours
                    .get(b)
                    .map(|(_, roles)| roles.clone())
                    .unwrap_or_default(),
                other => self.catalog.interfaces(other),
            }
        }
    }

    fn fixture() -> (MapperChain, Arc<PropertyResolver>) {
        let catalog = Arc::new(RoleCatalog::new());
        catalog
            .register(RoleDef::new("Thing").method(MethodSig::getter("getLabel", ValueType::Text)))
            .unwrap();
        catalog
            .register(
                RoleDef::new("Agent")
                    .extends("Thing")
                    .method(MethodSig::getter("getName", ValueType::Text)),
            )
            .unwrap();
        catalog
            .register(
                RoleDef::new("Person")
                    .extends("Agent")
                    .method(MethodSig::getter("getAge", ValueType::Integer)),
            )
            .unwrap();

        let mut behaviours = HashMap::new();
        behaviours.insert(
            BehaviourName::new("BaseSupport"),
            (None, vec![RoleName::new("Thing")]),
        );
        behaviours.insert(
            BehaviourName::new("PersonSupport"),
            (
                Some(BehaviourName::new("BaseSupport")),
                vec![RoleName::new("Person")],
            ),
        );

        let hierarchy: Arc<dyn TypeHierarchy> = Arc::new(TestHierarchy {
            catalog: catalog.clone(),
            behaviours,
        });
        let resolver = Arc::new(PropertyResolver::new(catalog, ResolverConfig::default()));
        (
            MapperChain::with_default_resolver(hierarchy, resolver.clone()),
            resolver,
        )
    }

    fn marker(name: &str) -> FixedMapper {
        FixedMapper::new(vec![PropertyDescriptor {
            name: name.to_string(),
            predicate: format!("urn:test:{name}").into(),
            declaring_role: "Marker".into(),
            getter: format!("get{name}"),
            setter: None,
            cardinality: Cardinality::Single,
            element_type: ValueType::Text,
            attributes: BTreeSet::new(),
        }])
    }

    #[test]
    fn test_default_mapper_covers_all_roles() {
        let (chain, _) = fixture();
        let resolved = chain.resolve(&TypeRef::Role("Person".into())).unwrap();
        assert_eq!(resolved.source, MapperSource::Default);
        let names: Vec<_> = resolved.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["age", "name", "label"]);
    }

    #[test]
    fn test_exact_mapper_wins() {
        let (chain, _) = fixture();
        let ty = TypeRef::Behaviour("PersonSupport".into());
        chain.register(ty.clone(), Arc::new(marker("exact")));
        chain.register(
            TypeRef::Behaviour("BaseSupport".into()),
            Arc::new(marker("super")),
        );
        let resolved = chain.resolve(&ty).unwrap();
        assert_eq!(resolved.source, MapperSource::Exact);
        assert_eq!(resolved.descriptors[0].name, "exact");
    }

    #[test]
    fn test_superclass_before_roles() {
        let (chain, _) = fixture();
        chain.register(
            TypeRef::Behaviour("BaseSupport".into()),
            Arc::new(marker("super")),
        );
        chain.register(TypeRef::Role("Agent".into()), Arc::new(marker("agent")));
        let resolved = chain
            .resolve(&TypeRef::Behaviour("PersonSupport".into()))
            .unwrap();
        assert_eq!(
            resolved.source,
            MapperSource::Superclass(TypeRef::Behaviour("BaseSupport".into()))
        );
    }

    #[test]
    fn test_single_role_mapper_beats_default() {
        let (chain, resolver) = fixture();
        chain.register(
            TypeRef::Role("Agent".into()),
            Arc::new(RoleResolverMapper::new("Agent".into(), resolver)),
        );
        let resolved = chain
            .resolve(&TypeRef::Behaviour("PersonSupport".into()))
            .unwrap();
        assert_eq!(resolved.source, MapperSource::Interface("Agent".into()));
        let names: Vec<_> = resolved.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["name", "label"]);
    }

    #[test]
    fn test_breadth_first_prefers_nearest_role() {
        let (chain, _) = fixture();
        chain.register(TypeRef::Role("Thing".into()), Arc::new(marker("thing")));
        chain.register(TypeRef::Role("Agent".into()), Arc::new(marker("agent")));
        let resolved = chain.resolve(&TypeRef::Role("Person".into())).unwrap();
        assert_eq!(resolved.source, MapperSource::Interface("Agent".into()));
        assert_eq!(resolved.descriptors[0].name, "agent");

        // The superclass contributes its roles at the same depth as the type's own
        let resolved = chain
            .resolve(&TypeRef::Behaviour("PersonSupport".into()))
            .unwrap();
        assert_eq!(resolved.descriptors[0].name, "thing");
    }
}
