//! Method processor pipeline
//!
//! Processors contribute or rewrite method bindings of a type under
//! construction. A processor may depend on processors with a given id; every
//! processor with that id then runs first. The run order is computed once
//! when the pipeline is built and reused for every composition. A cycle in
//! the declared dependencies fails pipeline construction.

mod processors;

pub use processors::{
    BehaviourMethodProcessor, ConstructorProcessor, DelegationProcessor,
    PropertyAccessorProcessor, RoleMarkerProcessor,
};

use crate::behaviour::MethodRef;
use crate::composite_type::{CompositionKey, TypeBuilder};
use crate::ordering::OrderGraph;
use crate::selection::Selection;
use indexmap::IndexSet;
use persona_core::{ConfigurationError, DeclaredMethod, RoleCatalog, RoleName};
use persona_properties::PropertyResolver;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Inputs shared by every processor during one synthesis
pub struct SynthesisContext<'a> {
    /// Role catalog
    pub catalog: &'a RoleCatalog,
    /// Descriptor resolver for generated accessors
    pub resolver: &'a PropertyResolver,
    /// Key being synthesized
    pub key: &'a CompositionKey,
    /// Closure of the key's roles
    pub closure: &'a IndexSet<RoleName>,
    /// Selected behaviours
    pub selection: &'a Selection,
}

impl SynthesisContext<'_> {
    /// Methods declared by the closure's roles, each under its own role
    pub fn declared_methods(&self) -> Result<Vec<DeclaredMethod>, ConfigurationError> {
        let mut methods = Vec::new();
        for role in self.closure {
            let def = self.catalog.require(role)?;
            methods.extend(def.methods.iter().map(|sig| DeclaredMethod {
                role: role.clone(),
                sig: sig.clone(),
            }));
        }
        Ok(methods)
    }
}

/// One step of type synthesis
pub trait MethodProcessor: Send + Sync {
    /// Identifier other processors depend on
    fn id(&self) -> &'static str;

    /// Ids of processors that must run before this one
    fn depends_on(&self) -> &[&'static str] {
        &[]
    }

    /// Contribute to the type under construction
    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError>;
}

/// Processors in dependency order
#[derive(Clone)]
pub struct ProcessorPipeline {
    processors: Vec<Arc<dyn MethodProcessor>>,
}

impl ProcessorPipeline {
    /// Order `processors` by their declared dependencies
    ///
    /// Dependencies on ids no processor carries are ignored.
    pub fn new(processors: Vec<Arc<dyn MethodProcessor>>) -> Result<Self, ConfigurationError> {
        let mut graph = OrderGraph::new(processors.len());
        for (after, processor) in processors.iter().enumerate() {
            for dependency in processor.depends_on() {
                for (before, candidate) in processors.iter().enumerate() {
                    if candidate.id() == *dependency {
                        graph.edge(before, after);
                    }
                }
            }
        }
        let order = graph
            .order()
            .map_err(|node| ConfigurationError::CyclicProcessors {
                processor: processors[node].id().to_string(),
            })?;

        let pipeline = Self {
            processors: order.into_iter().map(|i| processors[i].clone()).collect(),
        };
        debug!(order = ?pipeline.order(), "Computed processor order");
        Ok(pipeline)
    }

    /// Built-in processors, ordered by their declared dependencies
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::new(vec![
            Arc::new(ConstructorProcessor),
            Arc::new(RoleMarkerProcessor),
            Arc::new(BehaviourMethodProcessor),
            Arc::new(PropertyAccessorProcessor),
            Arc::new(DelegationProcessor),
        ])
    }

    /// Pipeline with one more processor, re-ordered
    pub fn with_processor(
        &self,
        processor: Arc<dyn MethodProcessor>,
    ) -> Result<Self, ConfigurationError> {
        let mut processors = self.processors.clone();
        processors.push(processor);
        Self::new(processors)
    }

    /// Processor ids in run order
    pub fn order(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.id()).collect()
    }

    /// Run every processor, then check that each role method is bound
    pub fn run(
        &self,
        ctx: &SynthesisContext<'_>,
        require_complete: bool,
    ) -> Result<TypeBuilder, ConfigurationError> {
        let mut builder = TypeBuilder::default();
        for processor in &self.processors {
            trace!(processor = processor.id(), key = %ctx.key, "Running method processor");
            processor.process(ctx, &mut builder)?;
        }

        for declared in ctx.declared_methods()? {
            let method = MethodRef::new(declared.role, declared.sig.name);
            if builder.is_bound(&method) {
                continue;
            }
            if require_complete {
                return Err(ConfigurationError::UnresolvedRole {
                    role: method.role,
                    method: method.method,
                });
            }
            warn!(%method, key = %ctx.key, "Role method has no implementation");
            builder.leave_unbound(method);
        }
        Ok(builder)
    }
}

impl std::fmt::Debug for ProcessorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorPipeline")
            .field("order", &self.order())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        id: &'static str,
        deps: Vec<&'static str>,
    }

    impl MethodProcessor for Named {
        fn id(&self) -> &'static str {
            self.id
        }

        fn depends_on(&self) -> &[&'static str] {
            &self.deps
        }

        fn process(
            &self,
            _ctx: &SynthesisContext<'_>,
            _builder: &mut TypeBuilder,
        ) -> Result<(), ConfigurationError> {
            Ok(())
        }
    }

    fn named(id: &'static str, deps: &[&'static str]) -> Arc<dyn MethodProcessor> {
        Arc::new(Named {
            id,
            deps: deps.to_vec(),
        })
    }

    #[test]
    fn test_standard_order_follows_dependencies() {
        let standard = ProcessorPipeline::standard().unwrap();
        assert_eq!(
            standard.order(),
            vec![
                "constructor",
                "role-marker",
                "behaviour-methods",
                "property-accessors",
                "delegation"
            ]
        );
    }

    #[test]
    fn test_dependencies_run_first() {
        let pipeline = ProcessorPipeline::new(vec![
            named("audit", &["stamp"]),
            named("stamp", &[]),
            named("stamp", &[]),
            named("free", &["missing"]),
        ])
        .unwrap();
        assert_eq!(pipeline.order(), vec!["stamp", "stamp", "audit", "free"]);
    }

    #[test]
    fn test_extra_processor_runs_after_its_dependency() {
        let pipeline = ProcessorPipeline::standard()
            .unwrap()
            .with_processor(named("audit", &["delegation"]))
            .unwrap();
        assert_eq!(pipeline.order().last(), Some(&"audit"));
    }

    #[test]
    fn test_cyclic_dependencies_fail_construction() {
        let err = ProcessorPipeline::new(vec![named("a", &["b"]), named("b", &["a"])]).unwrap_err();
        assert!(matches!(err, ConfigurationError::CyclicProcessors { .. }));
    }
}
