//! Per-instance, per-property value storage
//!
//! A `PropertySet` is the live container behind one property of one
//! composite instance. It moves between empty and populated through `add`,
//! `add_all`, `set_all`, `set_single`, `remove` and `init`; `get_all` hands
//! out an immutable, deduplicated snapshot whose order carries no meaning.
//!
//! - `Transient`: in-memory, copy-on-write, nothing to refresh
//! - `Unmodifiable`: rejects every mutation before touching its delegate
//! - `Durable`: loads from and writes through to a `PropertyStore`
//! - `ListView`: positional adapter over any property set

mod durable;
mod list_view;
mod transient;
mod unmodifiable;

pub use durable::{Durable, PropertyStore};
pub use list_view::ListView;
pub use transient::Transient;
pub use unmodifiable::Unmodifiable;

use crate::descriptor::PropertyDescriptor;
use indexmap::IndexSet;
use persona_core::{EntityId, Result, Value, ValueType};
use std::hash::Hash;
use std::sync::Arc;

/// Element of a property set
pub trait Element: Clone + Eq + Hash + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Send + Sync + 'static> Element for T {}

/// Immutable snapshot returned by `get_all`
pub type Snapshot<E> = Arc<IndexSet<E>>;

/// Live multi-valued container for one property of one entity
pub trait PropertySet<E: Element>: Send + Sync {
    /// Declared type of one element
    fn element_type(&self) -> &ValueType;

    /// Current values as an immutable snapshot
    fn get_all(&self) -> Result<Snapshot<E>>;

    /// First value of the current snapshot, if any
    fn get_single(&self) -> Result<Option<E>>;

    /// Replace all values
    fn set_all(&self, values: Vec<E>) -> Result<()>;

    /// Replace all values with at most one value
    fn set_single(&self, value: Option<E>) -> Result<()>;

    /// Add a value; `false` if already present
    fn add(&self, value: E) -> Result<bool>;

    /// Add several values; `true` if any was new
    fn add_all(&self, values: Vec<E>) -> Result<bool>;

    /// Remove a value; `false` if absent
    fn remove(&self, value: &E) -> Result<bool>;

    /// Reload from the backing store, if there is one
    fn refresh(&self) -> Result<()>;

    /// Seed values known to be current without writing them anywhere
    fn init(&self, values: Vec<E>) -> Result<()>;
}

/// Creates the property set backing one property of one entity
pub trait PropertySetFactory: Send + Sync {
    /// New, empty or lazily loaded property set
    fn create(
        &self,
        entity: &EntityId,
        descriptor: &PropertyDescriptor,
    ) -> Arc<dyn PropertySet<Value>>;
}

/// Factory for in-memory property sets
#[derive(Debug, Default, Clone, Copy)]
pub struct TransientFactory;

impl PropertySetFactory for TransientFactory {
    fn create(
        &self,
        _entity: &EntityId,
        descriptor: &PropertyDescriptor,
    ) -> Arc<dyn PropertySet<Value>> {
        Arc::new(Transient::new(descriptor.element_type.clone()))
    }
}

/// Factory for property sets backed by a durable store
#[derive(Clone)]
pub struct DurableFactory {
    store: Arc<dyn PropertyStore>,
}

impl DurableFactory {
    /// Factory writing through to `store`
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for DurableFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableFactory").finish_non_exhaustive()
    }
}

impl PropertySetFactory for DurableFactory {
    fn create(
        &self,
        entity: &EntityId,
        descriptor: &PropertyDescriptor,
    ) -> Arc<dyn PropertySet<Value>> {
        Arc::new(Durable::new(
            entity.clone(),
            descriptor.predicate.clone(),
            descriptor.element_type.clone(),
            self.store.clone(),
        ))
    }
}
