use super::{Element, PropertySet, Snapshot};
use indexmap::IndexSet;
use parking_lot::RwLock;
use persona_core::{Result, ValueType};
use std::sync::Arc;

/// In-memory property set with copy-on-write semantics
///
/// Every mutation builds a new set and swaps it in atomically. A snapshot
/// obtained from `get_all` is never modified afterwards, so readers never
/// observe a mutation in progress. Writers pay O(n) per mutation.
pub struct Transient<E: Element> {
    element_type: ValueType,
    values: RwLock<Snapshot<E>>,
}

impl<E: Element> Transient<E> {
    /// Empty set of the given element type
    pub fn new(element_type: ValueType) -> Self {
        Self {
            element_type,
            values: RwLock::new(Arc::new(IndexSet::new())),
        }
    }

    /// Set holding the given values
    pub fn with_values(element_type: ValueType, values: impl IntoIterator<Item = E>) -> Self {
        Self {
            element_type,
            values: RwLock::new(Arc::new(values.into_iter().collect())),
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut IndexSet<E>) -> R) -> R {
        let mut current = self.values.write();
        let mut next = IndexSet::clone(&current);
        let result = f(&mut next);
        *current = Arc::new(next);
        result
    }

    fn replace(&self, values: impl IntoIterator<Item = E>) {
        let next: IndexSet<E> = values.into_iter().collect();
        *self.values.write() = Arc::new(next);
    }
}

impl<E: Element> std::fmt::Debug for Transient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transient")
            .field("element_type", &self.element_type)
            .field("len", &self.values.read().len())
            .finish()
    }
}

impl<E: Element> PropertySet<E> for Transient<E> {
    fn element_type(&self) -> &ValueType {
        &self.element_type
    }

    fn get_all(&self) -> Result<Snapshot<E>> {
        Ok(self.values.read().clone())
    }

    fn get_single(&self) -> Result<Option<E>> {
        Ok(self.values.read().first().cloned())
    }

    fn set_all(&self, values: Vec<E>) -> Result<()> {
        self.replace(values);
        Ok(())
    }

    fn set_single(&self, value: Option<E>) -> Result<()> {
        self.replace(value);
        Ok(())
    }

    fn add(&self, value: E) -> Result<bool> {
        Ok(self.mutate(|set| set.insert(value)))
    }

    fn add_all(&self, values: Vec<E>) -> Result<bool> {
        Ok(self.mutate(|set| {
            let before = set.len();
            set.extend(values);
            set.len() != before
        }))
    }

    fn remove(&self, value: &E) -> Result<bool> {
        Ok(self.mutate(|set| set.shift_remove(value)))
    }

    fn refresh(&self) -> Result<()> {
        Ok(())
    }

    fn init(&self, values: Vec<E>) -> Result<()> {
        self.replace(values);
        Ok(())
    }
}
