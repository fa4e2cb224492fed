//! Behaviour definitions
//!
//! A behaviour supplies method bodies for some of the methods of one or more
//! roles. It never sees the full role set of the composite it is woven
//! into; bodies reach the composite only through `Invocation::this`.

use crate::composite::Composite;
use crate::payload::Payload;
use indexmap::IndexMap;
use persona_core::{BehaviourName, EntityId, Result, RoleName, UsageError, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A role method, identified by the role declaring it and its name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodRef {
    /// Declaring role
    pub role: RoleName,
    /// Method name
    pub method: String,
}

impl MethodRef {
    /// Reference to `role.method`
    pub fn new(role: impl Into<RoleName>, method: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.role, self.method)
    }
}

/// Body of a behaviour method
pub type MethodBody = Arc<dyn Fn(&Invocation<'_>) -> Result<Payload> + Send + Sync>;

/// Per-instance state initializer, called once per composite with its handle
pub type StateInit = Arc<dyn Fn(&EntityId) -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// A concrete implementation of some role methods
#[derive(Clone)]
pub struct BehaviourDef {
    /// Stable name
    pub name: BehaviourName,
    /// Roles this behaviour implements
    pub roles: Vec<RoleName>,
    /// Method bodies keyed by role method
    pub methods: IndexMap<MethodRef, MethodBody>,
    /// Parent behaviour, consulted by the property mapper chain
    pub parent: Option<BehaviourName>,
    /// Tie-breaker between equally specific behaviours, higher wins
    pub priority: Option<i32>,
    /// Behaviours this one must be woven before
    pub precedes: Vec<BehaviourName>,
    /// Behaviours this one must be woven after
    pub after: Vec<BehaviourName>,
    /// Per-instance state
    pub state: Option<StateInit>,
}

impl BehaviourDef {
    /// Empty behaviour
    pub fn new(name: impl Into<BehaviourName>) -> Self {
        Self {
            name: name.into(),
            roles: Vec::new(),
            methods: IndexMap::new(),
            parent: None,
            priority: None,
            precedes: Vec::new(),
            after: Vec::new(),
            state: None,
        }
    }

    /// Declare an implemented role
    pub fn implements(mut self, role: impl Into<RoleName>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Provide the body of `role.method`
    pub fn method<F>(
        mut self,
        role: impl Into<RoleName>,
        method: impl Into<String>,
        body: F,
    ) -> Self
    where
        F: Fn(&Invocation<'_>) -> Result<Payload> + Send + Sync + 'static,
    {
        self.methods.insert(MethodRef::new(role, method), Arc::new(body));
        self
    }

    /// Set the parent behaviour
    pub fn parent(mut self, parent: impl Into<BehaviourName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the priority
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Weave this behaviour before `other`
    pub fn precedes(mut self, other: impl Into<BehaviourName>) -> Self {
        self.precedes.push(other.into());
        self
    }

    /// Weave this behaviour after `other`
    pub fn after(mut self, other: impl Into<BehaviourName>) -> Self {
        self.after.push(other.into());
        self
    }

    /// Give every composite instance its own state
    pub fn state<T, F>(mut self, init: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&EntityId) -> T + Send + Sync + 'static,
    {
        self.state = Some(Arc::new(
            move |handle: &EntityId| -> Box<dyn Any + Send + Sync> { Box::new(init(handle)) },
        ));
        self
    }

    /// Whether a body is provided for `method`
    pub fn implements_method(&self, method: &MethodRef) -> bool {
        self.methods.contains_key(method)
    }
}

impl fmt::Debug for BehaviourDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourDef")
            .field("name", &self.name)
            .field("roles", &self.roles)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("parent", &self.parent)
            .field("priority", &self.priority)
            .field("stateful", &self.state.is_some())
            .finish()
    }
}

/// One call of a behaviour method
pub struct Invocation<'a> {
    pub(crate) this: &'a Composite,
    pub(crate) slot: usize,
    pub(crate) method: &'a MethodRef,
    pub(crate) args: &'a [Value],
}

impl<'a> Invocation<'a> {
    /// The composite the behaviour is woven into
    pub fn this(&self) -> &'a Composite {
        self.this
    }

    /// Entity handle shared by every behaviour of the composite
    pub fn handle(&self) -> &'a EntityId {
        self.this.handle()
    }

    /// Method being invoked
    pub fn method(&self) -> &'a MethodRef {
        self.method
    }

    /// All arguments
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Argument at `index`
    pub fn arg(&self, index: usize) -> Result<&'a Value> {
        self.args.get(index).ok_or_else(|| {
            UsageError::InvalidArguments {
                method: self.method.to_string(),
                reason: format!("missing argument {index}"),
            }
            .into()
        })
    }

    /// State of the behaviour providing this method
    pub fn state<T: Any + Send + Sync>(&self) -> Result<&'a T> {
        self.this.slot_state(self.slot)
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("handle", self.this.handle())
            .field("method", self.method)
            .field("args", &self.args)
            .finish()
    }
}
