use super::{Element, PropertySet};
use persona_core::{Result, UsageError};
use std::sync::Arc;

/// Positional view over a property set
///
/// The view takes a snapshot when created and re-reads the backing set on
/// every call to `iter`. `remove`, `set` and `insert` write through to the
/// backing set immediately. Changes made to the backing set by anyone else
/// become visible only on the next `iter` or `reload`, so indices taken
/// before such a change may refer to different elements afterwards.
pub struct ListView<E: Element> {
    set: Arc<dyn PropertySet<E>>,
    items: Vec<E>,
}

impl<E: Element> ListView<E> {
    /// View over the current contents of `set`
    pub fn new(set: Arc<dyn PropertySet<E>>) -> Result<Self> {
        let items = set.get_all()?.iter().cloned().collect();
        Ok(Self { set, items })
    }

    /// Re-read the backing set
    pub fn reload(&mut self) -> Result<()> {
        self.items = self.set.get_all()?.iter().cloned().collect();
        Ok(())
    }

    /// Traverse a fresh snapshot of the backing set
    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, E>> {
        self.reload()?;
        Ok(self.items.iter())
    }

    /// Element at `index` in the current snapshot
    pub fn get(&self, index: usize) -> Option<&E> {
        self.items.get(index)
    }

    /// Number of elements in the current snapshot
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the current snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove the element at `index` from the view and the backing set
    pub fn remove(&mut self, index: usize) -> Result<E> {
        self.check_index("remove", index, self.items.len())?;
        self.set.remove(&self.items[index])?;
        Ok(self.items.remove(index))
    }

    /// Replace the element at `index`, returning the previous one
    ///
    /// The backing set is rewritten in one `set_all`, so a failed write
    /// leaves both the set and the view unchanged. Replacing with a value
    /// held elsewhere in the set is rejected.
    pub fn set(&mut self, index: usize, value: E) -> Result<E> {
        self.check_index("set", index, self.items.len())?;
        if self.items[index] == value {
            return Ok(value);
        }
        let current = self.set.get_all()?;
        if current.contains(&value) {
            return Err(UsageError::InvalidArguments {
                method: "set".to_string(),
                reason: "value already present".to_string(),
            }
            .into());
        }
        let old = &self.items[index];
        let next = current
            .iter()
            .filter(|v| *v != old)
            .cloned()
            .chain(std::iter::once(value.clone()))
            .collect();
        self.set.set_all(next)?;
        Ok(std::mem::replace(&mut self.items[index], value))
    }

    /// Insert `value` at `index`; the snapshot changes only if the value was new
    pub fn insert(&mut self, index: usize, value: E) -> Result<bool> {
        self.check_index("insert", index, self.items.len() + 1)?;
        let added = self.set.add(value.clone())?;
        if added {
            self.items.insert(index, value);
        }
        Ok(added)
    }

    fn check_index(&self, method: &str, index: usize, bound: usize) -> Result<()> {
        if index < bound {
            Ok(())
        } else {
            Err(UsageError::InvalidArguments {
                method: method.to_string(),
                reason: format!("index {index} out of bounds for length {}", self.items.len()),
            }
            .into())
        }
    }
}

impl<E: Element + std::fmt::Debug> std::fmt::Debug for ListView<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
