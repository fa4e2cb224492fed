//! Role/behaviour composer
//!
//! The composer is the entry point of the entity layer. For a requested role
//! set it selects the best-matching behaviours, forms the composition key,
//! reuses or synthesizes the composite type for that key, and instantiates
//! it bound to an entity handle.
//!
//! Every configuration error (unknown role, unresolvable method, ambiguous
//! behaviours, cyclic ordering) is raised here, before any type is cached
//! or any composite is handed out.

use crate::behaviour::BehaviourDef;
use crate::cache::{TypeCache, UnboundedTypeCache};
use crate::composite::{Composite, PropertyBindings};
use crate::composite_type::{CompositeType, CompositionKey};
use crate::hierarchy::CompositionHierarchy;
use crate::pipeline::{ProcessorPipeline, SynthesisContext};
use crate::registry::BehaviourRegistry;
use crate::selection::Selection;
use crate::types::RoleMapper;
use persona_core::{
    CachePolicy, CompositeTypeId, ConfigurationError, EntityId, IdentityProvider, PersonaConfig,
    Result, RoleCatalog, RoleName, StorageMode, TypeFact, TypeRef, UuidIdentityProvider,
};
use persona_properties::{
    AccessorPairPredicate, CandidatePredicate, DurableFactory, MapperChain, PropertyDescriptor,
    PropertyResolver, PropertySetFactory, PropertyStore, TransientFactory,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, Span};

/// Builder for a `Composer`
pub struct ComposerBuilder {
    catalog: Arc<RoleCatalog>,
    config: PersonaConfig,
    behaviours: Option<Arc<BehaviourRegistry>>,
    pipeline: Option<ProcessorPipeline>,
    cache: Option<Arc<dyn TypeCache>>,
    factory: Option<Arc<dyn PropertySetFactory>>,
    store: Option<Arc<dyn PropertyStore>>,
    predicate: Option<Arc<dyn CandidatePredicate>>,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl ComposerBuilder {
    /// Use `config` instead of the defaults
    pub fn config(mut self, config: PersonaConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing behaviour registry
    pub fn behaviours(mut self, behaviours: Arc<BehaviourRegistry>) -> Self {
        self.behaviours = Some(behaviours);
        self
    }

    /// Use a custom processor pipeline
    pub fn pipeline(mut self, pipeline: ProcessorPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Use a custom type cache instead of the configured policy
    pub fn type_cache(mut self, cache: Arc<dyn TypeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Create property sets with `factory` instead of the configured storage
    pub fn property_sets(mut self, factory: Arc<dyn PropertySetFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Durable store used when property storage is `durable`
    pub fn store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Decide property getters with a custom predicate
    pub fn candidate_predicate(mut self, predicate: Arc<dyn CandidatePredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Mint handles for `compose_new` with `identity`
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Validate the configuration and assemble the composer
    pub fn build(self) -> std::result::Result<Composer, ConfigurationError> {
        let config = self.config;
        config.validate()?;

        let catalog = self.catalog;
        let behaviours = self
            .behaviours
            .unwrap_or_else(|| Arc::new(BehaviourRegistry::new(catalog.clone())));
        let cache = self.cache.unwrap_or_else(|| match config.composition.cache_policy {
            CachePolicy::Unbounded => Arc::new(UnboundedTypeCache::new()),
        });

        let resolver = Arc::new(match self.predicate {
            Some(predicate) => {
                PropertyResolver::with_predicate(catalog.clone(), config.resolver.clone(), predicate)
            }
            None => PropertyResolver::new(catalog.clone(), config.resolver.clone()),
        });
        let default_resolver = Arc::new(PropertyResolver::with_predicate(
            catalog.clone(),
            config.resolver.clone(),
            Arc::new(AccessorPairPredicate::default()),
        ));
        let hierarchy = Arc::new(CompositionHierarchy::new(
            catalog.clone(),
            behaviours.clone(),
            cache.clone(),
        ));
        let chain = Arc::new(MapperChain::with_default_resolver(
            hierarchy,
            default_resolver,
        ));

        let factory: Arc<dyn PropertySetFactory> = match (self.factory, config.properties.storage) {
            (Some(factory), _) => factory,
            (None, StorageMode::Transient) => Arc::new(TransientFactory),
            (None, StorageMode::Durable) => {
                let store = self.store.ok_or_else(|| ConfigurationError::InvalidConfig {
                    message: "durable property storage requires a property store".into(),
                })?;
                Arc::new(DurableFactory::new(store))
            }
        };

        Ok(Composer {
            role_mapper: Arc::new(RoleMapper::new(catalog.clone())),
            catalog,
            behaviours,
            resolver,
            bindings: Arc::new(PropertyBindings {
                factory,
                chain: chain.clone(),
            }),
            chain,
            pipeline: match self.pipeline {
                Some(pipeline) => pipeline,
                None => ProcessorPipeline::standard()?,
            },
            cache,
            identity: self
                .identity
                .unwrap_or_else(|| Arc::new(UuidIdentityProvider)),
            next_id: AtomicU64::new(1),
            config,
        })
    }
}

/// Composition engine
pub struct Composer {
    config: PersonaConfig,
    catalog: Arc<RoleCatalog>,
    behaviours: Arc<BehaviourRegistry>,
    role_mapper: Arc<RoleMapper>,
    resolver: Arc<PropertyResolver>,
    chain: Arc<MapperChain>,
    bindings: Arc<PropertyBindings>,
    pipeline: ProcessorPipeline,
    cache: Arc<dyn TypeCache>,
    identity: Arc<dyn IdentityProvider>,
    next_id: AtomicU64,
}

impl Composer {
    /// Start building a composer over `catalog`
    pub fn builder(catalog: Arc<RoleCatalog>) -> ComposerBuilder {
        ComposerBuilder {
            catalog,
            config: PersonaConfig::default(),
            behaviours: None,
            pipeline: None,
            cache: None,
            factory: None,
            store: None,
            predicate: None,
            identity: None,
        }
    }

    /// Composer with default configuration and transient property storage
    pub fn new(catalog: Arc<RoleCatalog>) -> std::result::Result<Self, ConfigurationError> {
        Self::builder(catalog).build()
    }

    /// Active configuration
    pub fn config(&self) -> &PersonaConfig {
        &self.config
    }

    /// Role catalog
    pub fn catalog(&self) -> &Arc<RoleCatalog> {
        &self.catalog
    }

    /// Behaviour registry
    pub fn behaviours(&self) -> &Arc<BehaviourRegistry> {
        &self.behaviours
    }

    /// Type fact to role mappings used by `compose_for_types`
    pub fn role_mapper(&self) -> &Arc<RoleMapper> {
        &self.role_mapper
    }

    /// Property mapper chain
    pub fn mapper_chain(&self) -> &Arc<MapperChain> {
        &self.chain
    }

    /// Descriptor resolver behind generated accessors
    pub fn resolver(&self) -> &Arc<PropertyResolver> {
        &self.resolver
    }

    /// Processor pipeline
    pub fn pipeline(&self) -> &ProcessorPipeline {
        &self.pipeline
    }

    /// Type cache
    pub fn type_cache(&self) -> &Arc<dyn TypeCache> {
        &self.cache
    }

    /// Validate and register a behaviour
    pub fn register_behaviour(
        &self,
        def: BehaviourDef,
    ) -> std::result::Result<Arc<BehaviourDef>, ConfigurationError> {
        self.behaviours.register(def)
    }

    /// Compose `roles` from every registered behaviour
    pub fn compose(&self, roles: &[RoleName], handle: EntityId) -> Result<Composite> {
        self.compose_with(roles, &self.behaviours.all(), handle)
    }

    /// Compose `roles` for a freshly minted entity handle
    pub fn compose_new(&self, roles: &[RoleName]) -> Result<Composite> {
        self.compose(roles, self.identity.next_handle())
    }

    /// Compose the roles mapped for `facts`
    pub fn compose_for_types(&self, facts: &[TypeFact], handle: EntityId) -> Result<Composite> {
        let roles = self.role_mapper.roles_for(facts);
        self.compose(&roles, handle)
    }

    /// Compose `roles` from the given candidate behaviours
    #[instrument(
        name = "compose",
        skip(self, roles, candidates, handle),
        fields(entity = %handle, roles = tracing::field::Empty)
    )]
    pub fn compose_with(
        &self,
        roles: &[RoleName],
        candidates: &[Arc<BehaviourDef>],
        handle: EntityId,
    ) -> Result<Composite> {
        let ty = self.composite_type(roles, candidates)?;
        Ok(Composite::instantiate(ty, handle, self.bindings.clone()))
    }

    /// Synthesized type for `roles` and `candidates`, reused when cached
    pub fn composite_type(
        &self,
        roles: &[RoleName],
        candidates: &[Arc<BehaviourDef>],
    ) -> std::result::Result<Arc<CompositeType>, ConfigurationError> {
        if roles.is_empty() {
            return Err(ConfigurationError::EmptyRoleSet);
        }
        let minimal = self.catalog.minimal(roles)?;
        Span::current().record("roles", tracing::field::debug(&minimal));
        if minimal.len() > self.config.composition.max_roles {
            return Err(ConfigurationError::InvalidConfig {
                message: format!(
                    "{} roles requested, at most {} allowed",
                    minimal.len(),
                    self.config.composition.max_roles
                ),
            });
        }

        let closure = self.catalog.closure(&minimal)?;
        let selection = Selection::select(&self.catalog, &closure, candidates)?;
        let key = CompositionKey::new(minimal, &selection);
        if let Some(ty) = self.cache.get(&key) {
            debug!(%key, id = %ty.id(), "Type cache hit");
            return Ok(ty);
        }
        debug!(%key, "Type cache miss");

        let ctx = SynthesisContext {
            catalog: &self.catalog,
            resolver: &self.resolver,
            key: &key,
            closure: &closure,
            selection: &selection,
        };
        let builder = self
            .pipeline
            .run(&ctx, self.config.composition.require_complete_roles)?;
        let id = CompositeTypeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let ty = self.cache.insert(Arc::new(builder.build(id, key)));
        info!(id = %ty.id(), key = %ty.key(), "Synthesized composite type");
        Ok(ty)
    }

    /// Type `compose` would instantiate for `roles`, without an instance
    pub fn describe(
        &self,
        roles: &[RoleName],
    ) -> std::result::Result<Arc<CompositeType>, ConfigurationError> {
        self.composite_type(roles, &self.behaviours.all())
    }

    /// Cached type with the given identity
    pub fn type_by_id(&self, id: CompositeTypeId) -> Option<Arc<CompositeType>> {
        self.cache.get_by_id(id)
    }

    /// Property descriptors of any role, behaviour or synthesized type
    ///
    /// Needs no live composite; usable for introspection and tooling.
    pub fn properties_for(
        &self,
        ty: &TypeRef,
    ) -> std::result::Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        self.chain.properties_for(ty)
    }
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("config", &self.config)
            .field("behaviours", &self.behaviours)
            .field("pipeline", &self.pipeline)
            .field("types", &format!("TypeCache with {} entries", self.cache.len()))
            .finish()
    }
}
