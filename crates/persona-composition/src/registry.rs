//! Behaviour registry
//!
//! Behaviours are validated once at registration: their roles must be known,
//! their parent must already be registered, and every method body must
//! belong to a method visible on one of their roles. Method references are
//! normalized to the role that actually declares the method, so a body
//! registered as `Person.getName` for a method inherited from `Agent` is
//! stored as `Agent.getName`.

use crate::behaviour::{BehaviourDef, MethodRef};
use indexmap::IndexMap;
use parking_lot::RwLock;
use persona_core::{BehaviourName, ConfigurationError, RoleCatalog};
use std::sync::Arc;
use tracing::debug;

/// Registry of validated behaviours
pub struct BehaviourRegistry {
    catalog: Arc<RoleCatalog>,
    behaviours: RwLock<IndexMap<BehaviourName, Arc<BehaviourDef>>>,
}

impl BehaviourRegistry {
    /// Empty registry validating against `catalog`
    pub fn new(catalog: Arc<RoleCatalog>) -> Self {
        Self {
            catalog,
            behaviours: RwLock::new(IndexMap::new()),
        }
    }

    /// Role catalog behaviours are validated against
    pub fn catalog(&self) -> &Arc<RoleCatalog> {
        &self.catalog
    }

    /// Validate and register a behaviour
    pub fn register(&self, def: BehaviourDef) -> Result<Arc<BehaviourDef>, ConfigurationError> {
        let def = Arc::new(self.normalize(def)?);
        let mut behaviours = self.behaviours.write();
        if behaviours.contains_key(&def.name) {
            return Err(ConfigurationError::DuplicateBehaviour {
                behaviour: def.name.clone(),
            });
        }
        if let Some(parent) = &def.parent {
            if !behaviours.contains_key(parent) {
                return Err(ConfigurationError::UnknownBehaviour {
                    behaviour: parent.clone(),
                });
            }
        }
        debug!(
            behaviour = %def.name,
            roles = ?def.roles,
            methods = def.methods.len(),
            "Registered behaviour"
        );
        behaviours.insert(def.name.clone(), def.clone());
        Ok(def)
    }

    /// Look up a behaviour
    pub fn get(&self, name: &BehaviourName) -> Option<Arc<BehaviourDef>> {
        self.behaviours.read().get(name).cloned()
    }

    /// Look up a behaviour that must exist
    pub fn require(&self, name: &BehaviourName) -> Result<Arc<BehaviourDef>, ConfigurationError> {
        self.get(name)
            .ok_or_else(|| ConfigurationError::UnknownBehaviour {
                behaviour: name.clone(),
            })
    }

    /// Look up several behaviours that must exist
    pub fn require_all(
        &self,
        names: &[BehaviourName],
    ) -> Result<Vec<Arc<BehaviourDef>>, ConfigurationError> {
        names.iter().map(|name| self.require(name)).collect()
    }

    /// Whether a behaviour with this name is registered
    pub fn contains(&self, name: &BehaviourName) -> bool {
        self.behaviours.read().contains_key(name)
    }

    /// Every registered behaviour, in registration order
    pub fn all(&self) -> Vec<Arc<BehaviourDef>> {
        self.behaviours.read().values().cloned().collect()
    }

    /// Number of registered behaviours
    pub fn len(&self) -> usize {
        self.behaviours.read().len()
    }

    /// Whether no behaviour is registered
    pub fn is_empty(&self) -> bool {
        self.behaviours.read().is_empty()
    }

    fn normalize(&self, mut def: BehaviourDef) -> Result<BehaviourDef, ConfigurationError> {
        if def.roles.is_empty() {
            return Err(ConfigurationError::RolelessBehaviour {
                behaviour: def.name.clone(),
            });
        }
        for role in &def.roles {
            self.catalog.require(role)?;
        }

        let mut methods = IndexMap::with_capacity(def.methods.len());
        for (method, body) in std::mem::take(&mut def.methods) {
            let declaring = self.declaring(&def, &method)?;
            methods.insert(declaring, body);
        }
        def.methods = methods;
        Ok(def)
    }

    /// The reference of the declaration `method` resolves to
    fn declaring(
        &self,
        def: &BehaviourDef,
        method: &MethodRef,
    ) -> Result<MethodRef, ConfigurationError> {
        let undeclared = || ConfigurationError::UndeclaredMethod {
            behaviour: def.name.clone(),
            role: method.role.clone(),
            method: method.method.clone(),
        };

        let implemented = def
            .roles
            .iter()
            .any(|role| self.catalog.is_assignable(role, &method.role));
        if !implemented {
            return Err(undeclared());
        }

        self.catalog
            .methods_of(&method.role)?
            .into_iter()
            .find(|declared| declared.sig.name == method.method)
            .map(|declared| MethodRef::new(declared.role, declared.sig.name))
            .ok_or_else(undeclared)
    }
}

impl std::fmt::Debug for BehaviourRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviourRegistry")
            .field(
                "behaviours",
                &format!("IndexMap with {} entries", self.behaviours.read().len()),
            )
            .finish()
    }
}
