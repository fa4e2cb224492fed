//! Role definitions and the role catalog
//!
//! A role is an immutable, named set of method signatures. Accessor methods
//! may carry a backing identifier and attribute metadata which the property
//! resolver turns into property descriptors. Roles extend other roles; the
//! catalog only accepts a role once all of its parents are registered, so the
//! inheritance graph is acyclic by construction.

use crate::errors::ConfigurationError;
use crate::identifiers::{Predicate, RoleName};
use crate::value::ValueType;
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// Declarative metadata decorating an accessor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyAttribute {
    /// Values are locale-sensitive literals
    Localized,
    /// Values must be coerced to the given datatype
    ExplicitType(String),
}

/// Signature of one role method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSig {
    /// Method name, e.g. `getName`
    pub name: String,
    /// Parameter types
    pub params: Vec<ValueType>,
    /// Return type
    pub returns: ValueType,
    /// Declared backing identifier, if any
    pub backing: Option<Predicate>,
    /// Attribute metadata
    pub attributes: BTreeSet<PropertyAttribute>,
}

impl MethodSig {
    /// Arbitrary method
    pub fn method(name: impl Into<String>, params: Vec<ValueType>, returns: ValueType) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            backing: None,
            attributes: BTreeSet::new(),
        }
    }

    /// Zero-argument accessor
    pub fn getter(name: impl Into<String>, returns: ValueType) -> Self {
        Self::method(name, Vec::new(), returns)
    }

    /// Single-argument mutator returning nothing
    pub fn setter(name: impl Into<String>, param: ValueType) -> Self {
        Self::method(name, vec![param], ValueType::Void)
    }

    /// Declare the backing identifier
    pub fn with_backing(mut self, predicate: impl Into<Predicate>) -> Self {
        self.backing = Some(predicate.into());
        self
    }

    /// Change the return type (fluent setters)
    pub fn returning(mut self, returns: ValueType) -> Self {
        self.returns = returns;
        self
    }

    /// Mark values as locale-sensitive
    pub fn localized(mut self) -> Self {
        self.attributes.insert(PropertyAttribute::Localized);
        self
    }

    /// Require values of an explicit datatype
    pub fn explicit_type(mut self, datatype: impl Into<String>) -> Self {
        self.attributes
            .insert(PropertyAttribute::ExplicitType(datatype.into()));
        self
    }

    /// Same name and parameter types
    pub fn same_signature(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Definition of a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
    /// Stable role name
    pub name: RoleName,
    /// Directly extended roles
    pub extends: Vec<RoleName>,
    /// Namespace used to derive backing identifiers of convention properties
    pub namespace: Option<String>,
    /// Declared methods
    pub methods: Vec<MethodSig>,
}

impl RoleDef {
    /// Empty role
    pub fn new(name: impl Into<RoleName>) -> Self {
        Self {
            name: name.into(),
            extends: Vec::new(),
            namespace: None,
            methods: Vec::new(),
        }
    }

    /// Add a parent role
    pub fn extends(mut self, parent: impl Into<RoleName>) -> Self {
        self.extends.push(parent.into());
        self
    }

    /// Set the namespace for derived backing identifiers
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Declare a method
    pub fn method(mut self, sig: MethodSig) -> Self {
        self.methods.push(sig);
        self
    }

    /// Declared method by name and parameter types
    pub fn find(&self, name: &str, params: &[ValueType]) -> Option<&MethodSig> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params == params)
    }

    /// Whether a method of this name is declared
    pub fn declares(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }

    /// Backing identifier for a convention property of this role
    pub fn derived_predicate(&self, property: &str) -> Predicate {
        match &self.namespace {
            Some(ns) => Predicate::in_namespace(ns, property),
            None => Predicate::from(format!("{}#{}", self.name, property)),
        }
    }
}

/// A method together with the role that declares it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredMethod {
    /// Declaring role
    pub role: RoleName,
    /// Signature
    pub sig: MethodSig,
}

/// Registry of role definitions
///
/// Read-mostly: roles are registered at configuration time and looked up
/// concurrently afterwards.
#[derive(Debug, Default)]
pub struct RoleCatalog {
    roles: RwLock<IndexMap<RoleName, Arc<RoleDef>>>,
}

impl RoleCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a role; its parents must already be registered
    pub fn register(&self, def: RoleDef) -> Result<Arc<RoleDef>, ConfigurationError> {
        let mut roles = self.roles.write();
        if roles.contains_key(&def.name) {
            return Err(ConfigurationError::DuplicateRole { role: def.name });
        }
        if let Some(parent) = def.extends.iter().find(|p| !roles.contains_key(*p)) {
            return Err(ConfigurationError::UnknownRole {
                role: parent.clone(),
            });
        }
        tracing::debug!(role = %def.name, methods = def.methods.len(), "registered role");
        let def = Arc::new(def);
        roles.insert(def.name.clone(), def.clone());
        Ok(def)
    }

    /// Role by name
    pub fn get(&self, role: &RoleName) -> Option<Arc<RoleDef>> {
        self.roles.read().get(role).cloned()
    }

    /// Role by name, or `UnknownRole`
    pub fn require(&self, role: &RoleName) -> Result<Arc<RoleDef>, ConfigurationError> {
        self.get(role)
            .ok_or_else(|| ConfigurationError::UnknownRole { role: role.clone() })
    }

    /// Whether the role is registered
    pub fn contains(&self, role: &RoleName) -> bool {
        self.roles.read().contains_key(role)
    }

    /// All registered role names, in registration order
    pub fn role_names(&self) -> Vec<RoleName> {
        self.roles.read().keys().cloned().collect()
    }

    /// The role followed by all of its ancestors, breadth-first
    pub fn ancestors(&self, role: &RoleName) -> Result<Vec<RoleName>, ConfigurationError> {
        let roles = self.roles.read();
        let mut seen = IndexSet::new();
        let mut queue = VecDeque::from([role.clone()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let def = roles
                .get(&next)
                .ok_or_else(|| ConfigurationError::UnknownRole { role: next.clone() })?;
            queue.extend(def.extends.iter().cloned());
        }
        Ok(seen.into_iter().collect())
    }

    /// Reflexive-transitive closure of a role set, in breadth-first order
    pub fn closure(&self, roles: &[RoleName]) -> Result<IndexSet<RoleName>, ConfigurationError> {
        let mut closure = IndexSet::new();
        for role in roles {
            closure.extend(self.ancestors(role)?);
        }
        Ok(closure)
    }

    /// Whether `sub` is `sup` or extends it
    pub fn is_assignable(&self, sub: &RoleName, sup: &RoleName) -> bool {
        self.ancestors(sub)
            .map(|ancestors| ancestors.contains(sup))
            .unwrap_or(false)
    }

    /// Declared and inherited methods, most-specific first
    ///
    /// A method redeclared by a more specific role hides the inherited one.
    pub fn methods_of(&self, role: &RoleName) -> Result<Vec<DeclaredMethod>, ConfigurationError> {
        let mut methods: Vec<DeclaredMethod> = Vec::new();
        for ancestor in self.ancestors(role)? {
            let def = self.require(&ancestor)?;
            for sig in &def.methods {
                if methods.iter().any(|m| m.sig.same_signature(sig)) {
                    continue;
                }
                methods.push(DeclaredMethod {
                    role: ancestor.clone(),
                    sig: sig.clone(),
                });
            }
        }
        Ok(methods)
    }

    /// Normalize a requested role set
    ///
    /// Sorted, deduplicated, and without roles implied by another member.
    pub fn minimal(&self, roles: &[RoleName]) -> Result<Vec<RoleName>, ConfigurationError> {
        let unique: BTreeSet<RoleName> = roles.iter().cloned().collect();
        let mut implied = BTreeSet::new();
        for role in &unique {
            for ancestor in self.ancestors(role)?.into_iter().skip(1) {
                implied.insert(ancestor);
            }
        }
        Ok(unique
            .into_iter()
            .filter(|role| !implied.contains(role))
            .collect())
    }
}
