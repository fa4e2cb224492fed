//! Property descriptors

use persona_core::{Predicate, PropertyAttribute, RoleName, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Single- or multi-valued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one value; getter returns a single value
    Single,
    /// Any number of values; getter returns a collection
    Multi,
}

/// Setter half of an accessor pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetterSig {
    /// Method name
    pub name: String,
    /// `Void`, or a role the declaring role is assignable to (fluent setter)
    pub returns: ValueType,
}

impl SetterSig {
    /// Whether the setter returns the composite itself
    pub fn is_fluent(&self) -> bool {
        self.returns != ValueType::Void
    }
}

/// Resolved metadata for one property of one role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Property name, e.g. `name` for `getName`
    pub name: String,
    /// Backing identifier the values are stored under
    pub predicate: Predicate,
    /// Role declaring the getter
    pub declaring_role: RoleName,
    /// Getter method name
    pub getter: String,
    /// Setter, absent for read-only properties
    pub setter: Option<SetterSig>,
    /// Single- or multi-valued
    pub cardinality: Cardinality,
    /// Type of one element
    pub element_type: ValueType,
    /// Accumulated attribute metadata
    pub attributes: BTreeSet<PropertyAttribute>,
}

impl PropertyDescriptor {
    /// No setter was found
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Multi-valued property
    pub fn is_multi(&self) -> bool {
        self.cardinality == Cardinality::Multi
    }

    /// Values are locale-sensitive
    pub fn is_localized(&self) -> bool {
        self.attributes.contains(&PropertyAttribute::Localized)
    }

    /// Explicit datatype values are coerced to
    pub fn explicit_type(&self) -> Option<&str> {
        self.attributes.iter().find_map(|a| match a {
            PropertyAttribute::ExplicitType(datatype) => Some(datatype.as_str()),
            PropertyAttribute::Localized => None,
        })
    }

    /// Type of the getter's return value
    pub fn value_type(&self) -> ValueType {
        match self.cardinality {
            Cardinality::Single => self.element_type.clone(),
            Cardinality::Multi => ValueType::collection(self.element_type.clone()),
        }
    }
}
