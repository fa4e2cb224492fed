use super::{PropertySet, Snapshot};
use indexmap::IndexSet;
use parking_lot::RwLock;
use persona_core::{EntityId, Predicate, Result, StorageError, Value, ValueType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Backing store for durable property sets
pub trait PropertyStore: Send + Sync {
    /// Current values of `predicate` on `entity`
    fn load(
        &self,
        entity: &EntityId,
        predicate: &Predicate,
    ) -> std::result::Result<Vec<Value>, StorageError>;

    /// Replace the values of `predicate` on `entity`
    fn store(
        &self,
        entity: &EntityId,
        predicate: &Predicate,
        values: &[Value],
    ) -> std::result::Result<(), StorageError>;
}

/// Property set that loads lazily and writes through to a store
///
/// The cache is filled on first read and replaced on `refresh`. Every
/// mutation computes the next value set, stores it, and only then swaps
/// the cache; a failed store leaves the cache unchanged.
pub struct Durable {
    entity: EntityId,
    predicate: Predicate,
    element_type: ValueType,
    store: Arc<dyn PropertyStore>,
    cache: RwLock<Option<Snapshot<Value>>>,
}

impl Durable {
    /// Set for `predicate` on `entity`, not loaded yet
    pub fn new(
        entity: EntityId,
        predicate: Predicate,
        element_type: ValueType,
        store: Arc<dyn PropertyStore>,
    ) -> Self {
        Self {
            entity,
            predicate,
            element_type,
            store,
            cache: RwLock::new(None),
        }
    }

    /// Entity the values belong to
    pub fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Backing identifier
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    fn load(&self) -> Result<Snapshot<Value>> {
        let values = self.store.load(&self.entity, &self.predicate)?;
        debug!(
            entity = %self.entity,
            predicate = %self.predicate,
            count = values.len(),
            "Loaded property values"
        );
        Ok(Arc::new(values.into_iter().collect()))
    }

    fn current(&self) -> Result<Snapshot<Value>> {
        if let Some(snapshot) = self.cache.read().as_ref() {
            return Ok(snapshot.clone());
        }
        let mut cache = self.cache.write();
        if let Some(snapshot) = cache.as_ref() {
            return Ok(snapshot.clone());
        }
        let snapshot = self.load()?;
        *cache = Some(snapshot.clone());
        Ok(snapshot)
    }

    fn write<R>(&self, f: impl FnOnce(&mut IndexSet<Value>) -> R) -> Result<R> {
        let mut cache = self.cache.write();
        let base = match cache.as_ref() {
            Some(snapshot) => snapshot.clone(),
            None => self.load()?,
        };
        let mut next = IndexSet::clone(&base);
        let result = f(&mut next);
        self.commit(&mut cache, next)?;
        Ok(result)
    }

    /// Overwrite without reading the current values first
    fn replace(&self, values: impl IntoIterator<Item = Value>) -> Result<()> {
        let mut cache = self.cache.write();
        self.commit(&mut cache, values.into_iter().collect())
    }

    fn commit(&self, cache: &mut Option<Snapshot<Value>>, next: IndexSet<Value>) -> Result<()> {
        let values: Vec<Value> = next.iter().cloned().collect();
        if let Err(err) = self.store.store(&self.entity, &self.predicate, &values) {
            warn!(
                entity = %self.entity,
                predicate = %self.predicate,
                error = %err,
                "Failed to store property values"
            );
            return Err(err.into());
        }
        *cache = Some(Arc::new(next));
        Ok(())
    }
}

impl std::fmt::Debug for Durable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Durable")
            .field("entity", &self.entity)
            .field("predicate", &self.predicate)
            .field("loaded", &self.cache.read().is_some())
            .finish()
    }
}

impl PropertySet<Value> for Durable {
    fn element_type(&self) -> &ValueType {
        &self.element_type
    }

    fn get_all(&self) -> Result<Snapshot<Value>> {
        self.current()
    }

    fn get_single(&self) -> Result<Option<Value>> {
        Ok(self.current()?.first().cloned())
    }

    fn set_all(&self, values: Vec<Value>) -> Result<()> {
        self.replace(values)
    }

    fn set_single(&self, value: Option<Value>) -> Result<()> {
        self.replace(value)
    }

    fn add(&self, value: Value) -> Result<bool> {
        self.write(|set| set.insert(value))
    }

    fn add_all(&self, values: Vec<Value>) -> Result<bool> {
        self.write(|set| {
            let before = set.len();
            set.extend(values);
            set.len() != before
        })
    }

    fn remove(&self, value: &Value) -> Result<bool> {
        self.write(|set| set.shift_remove(value))
    }

    fn refresh(&self) -> Result<()> {
        let mut cache = self.cache.write();
        *cache = Some(self.load()?);
        Ok(())
    }

    fn init(&self, values: Vec<Value>) -> Result<()> {
        *self.cache.write() = Some(Arc::new(values.into_iter().collect()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_set::ListView;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        data: Mutex<HashMap<(EntityId, Predicate), Vec<Value>>>,
        loads: AtomicUsize,
        stores: AtomicUsize,
        fail: AtomicBool,
        fail_loads: AtomicBool,
    }

    impl PropertyStore for CountingStore {
        fn load(
            &self,
            entity: &EntityId,
            predicate: &Predicate,
        ) -> std::result::Result<Vec<Value>, StorageError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(StorageError::Load {
                    entity: entity.clone(),
                    predicate: predicate.clone(),
                    reason: "store offline".into(),
                });
            }
            Ok(self
                .data
                .lock()
                .get(&(entity.clone(), predicate.clone()))
                .cloned()
                .unwrap_or_default())
        }

        fn store(
            &self,
            entity: &EntityId,
            predicate: &Predicate,
            values: &[Value],
        ) -> std::result::Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Store {
                    entity: entity.clone(),
                    predicate: predicate.clone(),
                    reason: "store offline".into(),
                });
            }
            self.stores.fetch_add(1, Ordering::SeqCst);
            self.data
                .lock()
                .insert((entity.clone(), predicate.clone()), values.to_vec());
            Ok(())
        }
    }

    fn durable(store: &Arc<CountingStore>) -> Durable {
        Durable::new(
            EntityId::new("urn:test:alice"),
            Predicate::new("urn:test:name"),
            ValueType::Text,
            store.clone() as Arc<dyn PropertyStore>,
        )
    }

    #[test]
    fn test_loads_lazily_once() {
        let store = Arc::new(CountingStore::default());
        let set = durable(&store);
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert!(set.get_all().unwrap().is_empty());
        set.get_single().unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_writes_through() {
        let store = Arc::new(CountingStore::default());
        let set = durable(&store);
        assert!(set.add(Value::from("Alice")).unwrap());
        assert_eq!(store.stores.load(Ordering::SeqCst), 1);

        let other = durable(&store);
        assert_eq!(other.get_single().unwrap(), Some(Value::from("Alice")));
    }

    #[test]
    fn test_refresh_picks_up_external_writes() {
        let store = Arc::new(CountingStore::default());
        let set = durable(&store);
        assert!(set.get_all().unwrap().is_empty());

        durable(&store).set_single(Some(Value::from("Bob"))).unwrap();
        assert!(set.get_all().unwrap().is_empty());
        set.refresh().unwrap();
        assert_eq!(set.get_single().unwrap(), Some(Value::from("Bob")));
    }

    #[test]
    fn test_init_does_not_store() {
        let store = Arc::new(CountingStore::default());
        let set = durable(&store);
        set.init(vec![Value::from("seed")]).unwrap();
        assert_eq!(set.get_single().unwrap(), Some(Value::from("seed")));
        assert_eq!(store.stores.load(Ordering::SeqCst), 0);
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failed_store_keeps_cache() {
        let store = Arc::new(CountingStore::default());
        let set = durable(&store);
        set.add(Value::from("kept")).unwrap();

        store.fail.store(true, Ordering::SeqCst);
        let err = set.add(Value::from("lost")).unwrap_err();
        assert!(err.is_storage());
        let values = set.get_all().unwrap();
        assert_eq!(values.len(), 1);
        assert!(values.contains(&Value::from("kept")));
    }

    #[test]
    fn test_overwrite_skips_load() {
        let store = Arc::new(CountingStore::default());
        store.fail_loads.store(true, Ordering::SeqCst);
        let set = durable(&store);

        set.set_all(vec![Value::from("a"), Value::from("b")]).unwrap();
        set.set_single(Some(Value::from("c"))).unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
        assert_eq!(set.get_single().unwrap(), Some(Value::from("c")));

        let fresh = durable(&store);
        assert!(fresh.add(Value::from("d")).unwrap_err().is_storage());
    }

    #[test]
    fn test_list_view_set_survives_store_failure() {
        let store = Arc::new(CountingStore::default());
        let set: Arc<dyn PropertySet<Value>> = Arc::new(durable(&store));
        set.set_all(vec![Value::from("a"), Value::from("b")]).unwrap();
        let mut view = ListView::new(set.clone()).unwrap();

        store.fail.store(true, Ordering::SeqCst);
        assert!(view.set(0, Value::from("z")).unwrap_err().is_storage());
        assert_eq!(view.get(0), Some(&Value::from("a")));
        let values = set.get_all().unwrap();
        assert!(values.contains(&Value::from("a")));
        assert!(!values.contains(&Value::from("z")));

        store.fail.store(false, Ordering::SeqCst);
        assert_eq!(view.set(0, Value::from("z")).unwrap(), Value::from("a"));
        assert!(set.get_all().unwrap().contains(&Value::from("z")));
    }
}
