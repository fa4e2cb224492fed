//! Persona Core - role model foundation
//!
//! This crate holds the vocabulary shared by the property and composition
//! layers: identifiers, property values, the role model and its catalog,
//! the type-hierarchy seam used by the property mapper chain, the error
//! taxonomy, and configuration.
//!
//! # Model
//!
//! - A **role** (`RoleDef`) is a named set of method signatures. Roles may
//!   extend other roles and are immutable once registered in a `RoleCatalog`.
//! - A **value** (`Value`) is one element of a property; `ValueType`
//!   describes method parameters and return types.
//! - A **type reference** (`TypeRef`) names a role, a behaviour or a
//!   synthesized composite type so tooling can ask for its properties.
//!
//! # Errors
//!
//! Three classes, unified in `PersonaError`:
//! - `ConfigurationError`: detected eagerly, aborts composition
//! - `UsageError`: reported at the call site of a running composite
//! - `StorageError`: propagated unchanged from the durable storage contract

#![forbid(unsafe_code)]

/// Configuration for resolver, composition and property storage
pub mod config;

/// Error taxonomy
pub mod errors;

/// Type hierarchy seam for property mapping
pub mod hierarchy;

/// Role, behaviour, predicate and entity identifiers
pub mod identifiers;

/// Role definitions and the role catalog
pub mod role;

/// Property values and value types
pub mod value;

pub use config::{
    CachePolicy, CompositionConfig, PersonaConfig, PropertyConfig, ResolverConfig, StorageMode,
};
pub use errors::{ConfigurationError, PersonaError, Result, StorageError, UsageError};
pub use hierarchy::{CompositeTypeId, TypeHierarchy, TypeRef};
pub use identifiers::{
    BehaviourName, EntityId, IdentityProvider, Predicate, RoleName, TypeFact, UuidIdentityProvider,
};
pub use role::{DeclaredMethod, MethodSig, PropertyAttribute, RoleCatalog, RoleDef};
pub use value::{Value, ValueType};
