//! In-memory durable property store

use parking_lot::Mutex;
use persona_core::{EntityId, Predicate, StorageError, Value};
use persona_properties::PropertyStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// `PropertyStore` keeping values in a map, with call counters and
/// switchable failures
#[derive(Default)]
pub struct MemoryPropertyStore {
    values: Mutex<HashMap<(EntityId, Predicate), Vec<Value>>>,
    loads: AtomicUsize,
    stores: AtomicUsize,
    fail_loads: AtomicBool,
    fail_stores: AtomicBool,
}

impl MemoryPropertyStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Put values in place without counting a store
    pub fn seed(&self, entity: &EntityId, predicate: &Predicate, values: Vec<Value>) {
        self.values
            .lock()
            .insert((entity.clone(), predicate.clone()), values);
    }

    /// Values currently held for a property
    pub fn values(&self, entity: &EntityId, predicate: &Predicate) -> Vec<Value> {
        self.values
            .lock()
            .get(&(entity.clone(), predicate.clone()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful and failed loads
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful and failed stores
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Make every following load fail, or succeed again
    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Make every following store fail, or succeed again
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn load(&self, entity: &EntityId, predicate: &Predicate) -> Result<Vec<Value>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Load {
                entity: entity.clone(),
                predicate: predicate.clone(),
                reason: "injected load failure".into(),
            });
        }
        Ok(self.values(entity, predicate))
    }

    fn store(
        &self,
        entity: &EntityId,
        predicate: &Predicate,
        values: &[Value],
    ) -> Result<(), StorageError> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(StorageError::Store {
                entity: entity.clone(),
                predicate: predicate.clone(),
                reason: "injected store failure".into(),
            });
        }
        tracing::trace!(%entity, %predicate, count = values.len(), "stored property values");
        self.seed(entity, predicate, values.to_vec());
        Ok(())
    }
}

impl std::fmt::Debug for MemoryPropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPropertyStore")
            .field(
                "values",
                &format!("HashMap with {} entries", self.values.lock().len()),
            )
            .field("loads", &self.load_count())
            .field("stores", &self.store_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_then_load() {
        let store = MemoryPropertyStore::new();
        let (entity, predicate) = (EntityId::new("e1"), Predicate::new("p"));
        store.store(&entity, &predicate, &[Value::from(1i64)]).unwrap();
        assert_eq!(store.load(&entity, &predicate).unwrap(), vec![Value::from(1i64)]);
        assert_eq!((store.load_count(), store.store_count()), (1, 1));
    }

    #[test]
    fn test_injected_failures_leave_values() {
        let store = MemoryPropertyStore::new();
        let (entity, predicate) = (EntityId::new("e1"), Predicate::new("p"));
        store.seed(&entity, &predicate, vec![Value::from("kept")]);
        store.fail_stores(true);
        assert!(store.store(&entity, &predicate, &[]).is_err());
        assert_eq!(store.values(&entity, &predicate), vec![Value::from("kept")]);

        store.fail_loads(true);
        assert!(matches!(
            store.load(&entity, &predicate),
            Err(StorageError::Load { .. })
        ));
    }
}
