//! Persona Properties - property binding for composed roles
//!
//! Turns role method declarations into property descriptors and stores
//! property values per composite instance.
//!
//! - `resolver`: derives `PropertyDescriptor`s from a role's getters and
//!   setters, following naming conventions or explicit backing identifiers
//! - `mapper`: resolves the properties of any type through a chain of
//!   registered mappers with superclass, interface and default fallback
//! - `property_set`: live value containers (transient, read-only,
//!   durable, positional view) and the factories that create them

#![forbid(unsafe_code)]

/// Property descriptors
pub mod descriptor;

/// Property mapper chain
pub mod mapper;

/// Live property value containers
pub mod property_set;

/// Descriptor derivation from role declarations
pub mod resolver;

pub use descriptor::{Cardinality, PropertyDescriptor, SetterSig};
pub use mapper::{
    DefaultMapper, FixedMapper, MapperChain, MapperSource, PropertyMapper, ResolvedProperties,
    RoleResolverMapper,
};
pub use property_set::{
    Durable, DurableFactory, Element, ListView, PropertySet, PropertySetFactory, PropertyStore,
    Snapshot, Transient, TransientFactory, Unmodifiable,
};
pub use resolver::{
    decapitalize, getter_stem, property_name, AccessorPairPredicate, CandidatePredicate,
    ConventionPredicate, PropertyResolver,
};
