//! Persona Composition - runtime role/behaviour composition
//!
//! A caller asks for an object playing a set of roles. The `Composer`
//! selects the behaviours that fit, synthesizes a composite type whose
//! method table binds every role method to a behaviour body, a generated
//! property accessor, or a delegation stub, caches that type by its
//! composition key, and instantiates it for an entity handle.
//!
//! # Pieces
//!
//! - `behaviour` / `registry`: behaviour definitions and their validation
//! - `selection`: applicability, specificity, priority and weave order
//! - `pipeline`: ordered method processors that fill the method table
//! - `composite_type` / `cache`: synthesized types and their cache
//! - `composite`: live instances with dispatch and property access
//! - `hierarchy` / `types`: structural queries and type fact mapping
//!
//! # Example
//!
//! ```ignore
//! let composer = Composer::new(catalog)?;
//! composer.register_behaviour(
//!     BehaviourDef::new("PersonImpl")
//!         .implements("Person")
//!         .method("Person", "greet", |inv| Ok(Value::from("hello").into())),
//! )?;
//! let person = composer.compose_new(&["Person".into()])?;
//! person.invoke(&"Person".into(), "greet", &[])?;
//! ```

#![forbid(unsafe_code)]

/// Behaviour definitions and invocations
pub mod behaviour;

/// Synthesized type cache
pub mod cache;

/// Composition entry point
pub mod composer;

/// Composite instances
pub mod composite;

/// Synthesized composite types and their builder
pub mod composite_type;

/// Type hierarchy over roles, behaviours and synthesized types
pub mod hierarchy;

mod ordering;

/// Method call results
pub mod payload;

/// Method processor pipeline
pub mod pipeline;

/// Behaviour registry
pub mod registry;

/// Behaviour selection and weave order
pub mod selection;

/// Type fact to role mapping
pub mod types;

pub use behaviour::{BehaviourDef, Invocation, MethodBody, MethodRef, StateInit};
pub use cache::{TypeCache, UnboundedTypeCache};
pub use composer::{Composer, ComposerBuilder};
pub use composite::Composite;
pub use composite_type::{CompositeType, CompositionKey, Dispatch, MethodBinding, TypeBuilder};
pub use hierarchy::CompositionHierarchy;
pub use payload::Payload;
pub use pipeline::{
    BehaviourMethodProcessor, ConstructorProcessor, DelegationProcessor, MethodProcessor,
    ProcessorPipeline, PropertyAccessorProcessor, RoleMarkerProcessor, SynthesisContext,
};
pub use registry::BehaviourRegistry;
pub use selection::Selection;
pub use types::RoleMapper;
