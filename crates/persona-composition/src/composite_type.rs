//! Synthesized composite types
//!
//! A composite type is a dispatch table built once per composition key:
//! every method of every role in the key's closure maps to a behaviour body,
//! a generated property accessor, or a delegation stub forwarding to
//! another role's implementation of the same signature.

use crate::behaviour::{BehaviourDef, MethodBody, MethodRef};
use crate::selection::Selection;
use indexmap::{IndexMap, IndexSet};
use persona_core::{BehaviourName, CompositeTypeId, RoleName};
use persona_properties::PropertyDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifies one synthesized type
///
/// The normalized requested roles together with the ordered, deduplicated
/// (role, behaviour) pairs of the selected behaviours in weave order. Equal
/// keys always map to the same composite type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositionKey {
    roles: Vec<RoleName>,
    pairs: Vec<(RoleName, BehaviourName)>,
}

impl CompositionKey {
    /// Key for normalized `roles` woven from `selection`
    pub fn new(roles: Vec<RoleName>, selection: &Selection) -> Self {
        let pairs: IndexSet<(RoleName, BehaviourName)> = selection
            .behaviours()
            .flat_map(|def| {
                def.roles
                    .iter()
                    .map(move |role| (role.clone(), def.name.clone()))
            })
            .collect();
        Self {
            roles,
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Normalized requested roles
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    /// (role, behaviour) pairs in weave order
    pub fn pairs(&self) -> &[(RoleName, BehaviourName)] {
        &self.pairs
    }

    /// Behaviours in weave order
    pub fn behaviours(&self) -> Vec<&BehaviourName> {
        let unique: IndexSet<&BehaviourName> = self.pairs.iter().map(|(_, b)| b).collect();
        unique.into_iter().collect()
    }
}

impl fmt::Display for CompositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.roles.iter().map(RoleName::as_str).collect();
        let behaviours: Vec<&str> = self.behaviours().into_iter().map(|b| b.as_str()).collect();
        write!(f, "[{}] woven from [{}]", roles.join(", "), behaviours.join(", "))
    }
}

/// How one method is dispatched
#[derive(Clone)]
pub enum Dispatch {
    /// Body provided by the behaviour in `slot`
    Behaviour {
        /// Weave position of the behaviour
        slot: usize,
        /// Behaviour name
        behaviour: BehaviourName,
        /// Method body
        body: MethodBody,
    },
    /// Generated getter reading the property set
    Getter {
        /// Property read
        descriptor: Arc<PropertyDescriptor>,
    },
    /// Generated setter writing the property set
    Setter {
        /// Property written
        descriptor: Arc<PropertyDescriptor>,
    },
    /// Delegation stub calling `target` on the composite itself
    Delegate {
        /// Implementation the call is forwarded to
        target: MethodRef,
    },
}

impl Dispatch {
    /// Introspectable description of this dispatch
    pub fn binding(&self) -> MethodBinding {
        match self {
            Self::Behaviour { behaviour, .. } => MethodBinding::Behaviour(behaviour.clone()),
            Self::Getter { descriptor } => MethodBinding::Getter(descriptor.name.clone()),
            Self::Setter { descriptor } => MethodBinding::Setter(descriptor.name.clone()),
            Self::Delegate { target } => MethodBinding::Delegate(target.clone()),
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.binding(), f)
    }
}

/// Method table entry as seen by tooling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodBinding {
    /// Implemented by the named behaviour
    Behaviour(BehaviourName),
    /// Generated getter of the named property
    Getter(String),
    /// Generated setter of the named property
    Setter(String),
    /// Forwarded to another role's implementation
    Delegate(MethodRef),
    /// No implementation; calls fail
    Unbound,
}

/// Mutable state of a composite type under construction
///
/// Method processors contribute to it in pipeline order.
#[derive(Default)]
pub struct TypeBuilder {
    behaviours: Vec<Arc<BehaviourDef>>,
    roles: IndexSet<RoleName>,
    visible: HashMap<RoleName, HashMap<String, MethodRef>>,
    table: IndexMap<MethodRef, Dispatch>,
    unbound: Vec<MethodRef>,
    properties: IndexMap<String, Arc<PropertyDescriptor>>,
}

impl TypeBuilder {
    /// Append a behaviour slot, returning its position
    pub fn add_behaviour(&mut self, def: Arc<BehaviourDef>) -> usize {
        self.behaviours.push(def);
        self.behaviours.len() - 1
    }

    /// Behaviour slots in weave order
    pub fn behaviours(&self) -> &[Arc<BehaviourDef>] {
        &self.behaviours
    }

    /// Mark the type as playing `role`
    pub fn add_role(&mut self, role: RoleName) {
        self.roles.insert(role);
    }

    /// Roles the type plays
    pub fn roles(&self) -> &IndexSet<RoleName> {
        &self.roles
    }

    /// Make `name` callable through `role`, resolving to `target`
    pub fn expose(&mut self, role: RoleName, name: String, target: MethodRef) {
        self.visible.entry(role).or_default().entry(name).or_insert(target);
    }

    /// Bind a method, replacing any previous binding
    pub fn bind(&mut self, method: MethodRef, dispatch: Dispatch) {
        self.table.insert(method, dispatch);
    }

    /// Whether `method` is bound
    pub fn is_bound(&self, method: &MethodRef) -> bool {
        self.table.contains_key(method)
    }

    /// Current binding of `method`
    pub fn binding(&self, method: &MethodRef) -> Option<&Dispatch> {
        self.table.get(method)
    }

    /// Leave `method` without implementation
    pub fn leave_unbound(&mut self, method: MethodRef) {
        self.unbound.push(method);
    }

    /// Record a property; the first descriptor for a name wins
    pub fn add_property(&mut self, descriptor: Arc<PropertyDescriptor>) {
        self.properties
            .entry(descriptor.name.clone())
            .or_insert(descriptor);
    }

    /// Property recorded under `name`
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDescriptor>> {
        self.properties.get(name)
    }

    pub(crate) fn build(self, id: CompositeTypeId, key: CompositionKey) -> CompositeType {
        CompositeType {
            id,
            key,
            behaviours: self.behaviours,
            roles: self.roles,
            visible: self.visible,
            table: self.table,
            unbound: self.unbound,
            properties: self.properties,
        }
    }
}

/// A synthesized composite type
pub struct CompositeType {
    id: CompositeTypeId,
    key: CompositionKey,
    behaviours: Vec<Arc<BehaviourDef>>,
    roles: IndexSet<RoleName>,
    visible: HashMap<RoleName, HashMap<String, MethodRef>>,
    table: IndexMap<MethodRef, Dispatch>,
    unbound: Vec<MethodRef>,
    properties: IndexMap<String, Arc<PropertyDescriptor>>,
}

impl CompositeType {
    /// Type identity
    pub fn id(&self) -> CompositeTypeId {
        self.id
    }

    /// Key the type was synthesized for
    pub fn key(&self) -> &CompositionKey {
        &self.key
    }

    /// Every role the type plays: the closure of the key's roles
    pub fn roles(&self) -> &IndexSet<RoleName> {
        &self.roles
    }

    /// Whether the type plays `role`
    pub fn implements(&self, role: &RoleName) -> bool {
        self.roles.contains(role)
    }

    /// Woven behaviours in slot order
    pub fn behaviours(&self) -> &[Arc<BehaviourDef>] {
        &self.behaviours
    }

    /// Declaration `name` resolves to when called through `role`
    pub fn resolve_method(&self, role: &RoleName, name: &str) -> Option<&MethodRef> {
        self.visible.get(role).and_then(|methods| methods.get(name))
    }

    /// Dispatch entry of a declaration
    pub fn dispatch(&self, method: &MethodRef) -> Option<&Dispatch> {
        self.table.get(method)
    }

    /// Property descriptor by name
    pub fn property(&self, name: &str) -> Option<&Arc<PropertyDescriptor>> {
        self.properties.get(name)
    }

    /// Property descriptors of all roles, most specific first
    pub fn properties(&self) -> impl Iterator<Item = &Arc<PropertyDescriptor>> {
        self.properties.values()
    }

    /// Every role method and how it is dispatched
    pub fn method_table(&self) -> Vec<(MethodRef, MethodBinding)> {
        self.table
            .iter()
            .map(|(method, dispatch)| (method.clone(), dispatch.binding()))
            .chain(
                self.unbound
                    .iter()
                    .map(|method| (method.clone(), MethodBinding::Unbound)),
            )
            .collect()
    }
}

impl fmt::Debug for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeType")
            .field("id", &self.id)
            .field("key", &self.key.to_string())
            .field("methods", &format!("IndexMap with {} entries", self.table.len()))
            .finish()
    }
}
