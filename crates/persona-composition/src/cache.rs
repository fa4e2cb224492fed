//! Synthesized type cache
//!
//! Composition depends only on the `TypeCache` trait, so the retention
//! policy can be replaced without touching synthesis. The unbounded cache
//! keeps every type for the lifetime of its composer.

use crate::composite_type::{CompositeType, CompositionKey};
use parking_lot::RwLock;
use persona_core::CompositeTypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent map from composition key to synthesized type
pub trait TypeCache: Send + Sync {
    /// Type synthesized for `key`, if cached
    fn get(&self, key: &CompositionKey) -> Option<Arc<CompositeType>>;

    /// Type with the given identity, if cached
    fn get_by_id(&self, id: CompositeTypeId) -> Option<Arc<CompositeType>>;

    /// Insert a fully built type, returning the cached type for its key
    ///
    /// When another thread cached a type for the same key first, that type
    /// is returned and `ty` is dropped.
    fn insert(&self, ty: Arc<CompositeType>) -> Arc<CompositeType>;

    /// Number of cached types
    fn len(&self) -> usize;

    /// Whether nothing is cached
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Entries {
    by_key: HashMap<CompositionKey, Arc<CompositeType>>,
    by_id: HashMap<CompositeTypeId, Arc<CompositeType>>,
}

/// Cache that never evicts
#[derive(Default)]
pub struct UnboundedTypeCache {
    entries: RwLock<Entries>,
}

impl UnboundedTypeCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl TypeCache for UnboundedTypeCache {
    fn get(&self, key: &CompositionKey) -> Option<Arc<CompositeType>> {
        self.entries.read().by_key.get(key).cloned()
    }

    fn get_by_id(&self, id: CompositeTypeId) -> Option<Arc<CompositeType>> {
        self.entries.read().by_id.get(&id).cloned()
    }

    fn insert(&self, ty: Arc<CompositeType>) -> Arc<CompositeType> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.by_key.get(ty.key()) {
            return existing.clone();
        }
        entries.by_key.insert(ty.key().clone(), ty.clone());
        entries.by_id.insert(ty.id(), ty.clone());
        ty
    }

    fn len(&self) -> usize {
        self.entries.read().by_key.len()
    }
}

impl std::fmt::Debug for UnboundedTypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnboundedTypeCache")
            .field("types", &format!("HashMap with {} entries", self.len()))
            .finish()
    }
}
