//! Composite instances
//!
//! A composite binds one synthesized type to one entity handle. Every woven
//! behaviour sees the same handle, and reaches the composite itself through
//! the invocation it is called with. Property sets are created lazily per
//! backing identifier on first access and live as long as the composite.

use crate::behaviour::{Invocation, MethodRef};
use crate::composite_type::{CompositeType, Dispatch};
use crate::payload::Payload;
use indexmap::IndexSet;
use parking_lot::RwLock;
use persona_core::{
    BehaviourName, EntityId, Predicate, Result, RoleName, TypeRef, UsageError, Value,
};
use persona_properties::{
    MapperChain, PropertyDescriptor, PropertySet, PropertySetFactory, Unmodifiable,
};
use std::any::Any;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Property plumbing shared by every composite of one composer
pub(crate) struct PropertyBindings {
    pub(crate) factory: Arc<dyn PropertySetFactory>,
    pub(crate) chain: Arc<MapperChain>,
}

struct Inner {
    ty: Arc<CompositeType>,
    handle: EntityId,
    states: Vec<Option<Box<dyn Any + Send + Sync>>>,
    properties: RwLock<HashMap<Predicate, Arc<dyn PropertySet<Value>>>>,
    bindings: Arc<PropertyBindings>,
}

/// One object answering to every role of its composite type
///
/// Cloning is cheap and yields the same instance. Two composites are equal
/// when they are bound to the same entity handle.
#[derive(Clone)]
pub struct Composite {
    inner: Arc<Inner>,
}

impl Composite {
    pub(crate) fn instantiate(
        ty: Arc<CompositeType>,
        handle: EntityId,
        bindings: Arc<PropertyBindings>,
    ) -> Self {
        let states = ty
            .behaviours()
            .iter()
            .map(|def| def.state.as_ref().map(|init| init(&handle)))
            .collect();
        Self {
            inner: Arc::new(Inner {
                ty,
                handle,
                states,
                properties: RwLock::new(HashMap::new()),
                bindings,
            }),
        }
    }

    /// Entity handle shared by every woven behaviour
    pub fn handle(&self) -> &EntityId {
        &self.inner.handle
    }

    /// Synthesized type of this composite
    pub fn composite_type(&self) -> &Arc<CompositeType> {
        &self.inner.ty
    }

    /// Every role this composite plays
    pub fn roles(&self) -> &IndexSet<RoleName> {
        self.inner.ty.roles()
    }

    /// Whether this composite plays `role`
    pub fn is(&self, role: &RoleName) -> bool {
        self.inner.ty.implements(role)
    }

    /// Call `method` as declared by, or inherited into, `role`
    pub fn invoke(&self, role: &RoleName, method: &str, args: &[Value]) -> Result<Payload> {
        if !self.is(role) {
            return Err(UsageError::RoleNotImplemented { role: role.clone() }.into());
        }
        let target = self
            .inner
            .ty
            .resolve_method(role, method)
            .ok_or_else(|| UsageError::NoSuchMethod {
                role: role.clone(),
                method: method.to_string(),
            })?;
        self.call(target, args)
    }

    /// Call a method by its declaration
    pub fn call(&self, method: &MethodRef, args: &[Value]) -> Result<Payload> {
        let dispatch = self
            .inner
            .ty
            .dispatch(method)
            .ok_or_else(|| UsageError::NoSuchMethod {
                role: method.role.clone(),
                method: method.method.clone(),
            })?;
        match dispatch {
            Dispatch::Behaviour { slot, body, .. } => body(&Invocation {
                this: self,
                slot: *slot,
                method,
                args,
            }),
            Dispatch::Getter { descriptor } => {
                if !args.is_empty() {
                    return Err(UsageError::InvalidArguments {
                        method: method.to_string(),
                        reason: format!("getter takes no arguments, got {}", args.len()),
                    }
                    .into());
                }
                self.read(descriptor)
            }
            Dispatch::Setter { descriptor } => {
                self.write(descriptor, args.to_vec())?;
                let fluent = descriptor.setter.as_ref().is_some_and(|s| s.is_fluent());
                Ok(if fluent { Payload::This } else { Payload::Unit })
            }
            Dispatch::Delegate { target } => {
                trace!(%method, %target, "Delegating call");
                self.call(target, args)
            }
        }
    }

    /// Property set backing `descriptor`
    ///
    /// Read-only properties are handed out wrapped so that every mutation
    /// fails with an unsupported-operation error.
    pub fn get(&self, descriptor: &PropertyDescriptor) -> Result<Arc<dyn PropertySet<Value>>> {
        if !self.is(&descriptor.declaring_role) {
            return Err(UsageError::NoSuchProperty {
                property: descriptor.name.clone(),
            }
            .into());
        }
        let set = self.raw_set(descriptor);
        if descriptor.is_read_only() {
            Ok(Arc::new(Unmodifiable::new(set)))
        } else {
            Ok(set)
        }
    }

    /// Property set of the property named `name`
    pub fn property(&self, name: &str) -> Result<Arc<dyn PropertySet<Value>>> {
        let descriptor = self.descriptor(name)?;
        self.get(&descriptor)
    }

    /// Current value of the property named `name`
    pub fn property_value(&self, name: &str) -> Result<Payload> {
        let descriptor = self.descriptor(name)?;
        self.read(&descriptor)
    }

    /// Replace the values of the property named `name`
    pub fn set_property(&self, name: &str, payload: impl Into<Payload>) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        self.write(&descriptor, payload.into().into_values())
    }

    /// Seed the property named `name` with values known to be current
    ///
    /// Bypasses the read-only check and writes nothing to durable storage.
    pub fn init_property(&self, name: &str, values: Vec<Value>) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        self.raw_set(&descriptor).init(values)
    }

    /// Property descriptors of this composite's type, through the mapper chain
    pub fn properties(&self) -> Result<Arc<[PropertyDescriptor]>> {
        let ty = TypeRef::Composite(self.inner.ty.id());
        Ok(self.inner.bindings.chain.properties_for(&ty)?)
    }

    /// Per-instance state declared by `behaviour`
    pub fn state<T: Any + Send + Sync>(&self, behaviour: &BehaviourName) -> Result<&T> {
        let slot = self
            .inner
            .ty
            .behaviours()
            .iter()
            .position(|def| &def.name == behaviour)
            .ok_or_else(|| UsageError::StateUnavailable {
                behaviour: behaviour.clone(),
            })?;
        self.slot_state(slot)
    }

    pub(crate) fn slot_state<T: Any + Send + Sync>(&self, slot: usize) -> Result<&T> {
        self.inner
            .states
            .get(slot)
            .and_then(|state| state.as_deref())
            .and_then(|state| state.downcast_ref::<T>())
            .ok_or_else(|| {
                let behaviour = self
                    .inner
                    .ty
                    .behaviours()
                    .get(slot)
                    .map(|def| def.name.clone())
                    .unwrap_or_else(|| BehaviourName::from(format!("slot-{slot}")));
                UsageError::StateUnavailable { behaviour }.into()
            })
    }

    fn descriptor(&self, name: &str) -> Result<Arc<PropertyDescriptor>> {
        self.inner
            .ty
            .property(name)
            .cloned()
            .ok_or_else(|| {
                UsageError::NoSuchProperty {
                    property: name.to_string(),
                }
                .into()
            })
    }

    fn raw_set(&self, descriptor: &PropertyDescriptor) -> Arc<dyn PropertySet<Value>> {
        if let Some(set) = self.inner.properties.read().get(&descriptor.predicate) {
            return set.clone();
        }
        self.inner
            .properties
            .write()
            .entry(descriptor.predicate.clone())
            .or_insert_with(|| {
                self.inner
                    .bindings
                    .factory
                    .create(&self.inner.handle, descriptor)
            })
            .clone()
    }

    fn read(&self, descriptor: &PropertyDescriptor) -> Result<Payload> {
        let set = self.raw_set(descriptor);
        if descriptor.is_multi() {
            Ok(Payload::Multi(set.get_all()?.iter().cloned().collect()))
        } else {
            Ok(Payload::Single(set.get_single()?))
        }
    }

    fn write(&self, descriptor: &PropertyDescriptor, values: Vec<Value>) -> Result<()> {
        if descriptor.is_read_only() {
            return Err(UsageError::ReadOnlyProperty {
                property: descriptor.name.clone(),
            }
            .into());
        }
        if let Some(actual) = values
            .iter()
            .find(|value| !value.conforms_to(&descriptor.element_type))
        {
            return Err(UsageError::TypeMismatch {
                property: descriptor.name.clone(),
                expected: descriptor.element_type.clone(),
                actual: actual.clone(),
            }
            .into());
        }

        let set = self.raw_set(descriptor);
        if descriptor.is_multi() {
            return set.set_all(values);
        }
        if values.len() > 1 {
            return Err(UsageError::InvalidArguments {
                method: descriptor.name.clone(),
                reason: format!("single-valued property, got {} values", values.len()),
            }
            .into());
        }
        set.set_single(values.into_iter().next())
    }
}

impl PartialEq for Composite {
    fn eq(&self, other: &Self) -> bool {
        self.inner.handle == other.inner.handle
    }
}

impl Eq for Composite {}

impl Hash for Composite {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.handle.hash(state);
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("handle", &self.inner.handle)
            .field("type", &self.inner.ty.id())
            .field("roles", self.inner.ty.roles())
            .finish()
    }
}
