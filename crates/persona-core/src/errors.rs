//! Error taxonomy for composition and property access
//!
//! Configuration errors are detected eagerly while building pipelines or
//! composing types and are unrecoverable for the affected composition key.
//! Usage errors surface at the call site of a running composite. Storage
//! errors come from the durable storage contract and are passed through
//! unchanged: the engine adds no retry logic.

use crate::identifiers::{BehaviourName, EntityId, Predicate, RoleName};
use crate::value::{Value, ValueType};
use thiserror::Error;

/// Invalid roles, behaviours or pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Role is not registered in the catalog
    #[error("Role '{role}' is not registered")]
    UnknownRole { role: RoleName },

    /// Role name registered twice
    #[error("Role '{role}' is already registered")]
    DuplicateRole { role: RoleName },

    /// Behaviour is not registered
    #[error("Behaviour '{behaviour}' is not registered")]
    UnknownBehaviour { behaviour: BehaviourName },

    /// Behaviour name registered twice
    #[error("Behaviour '{behaviour}' is already registered")]
    DuplicateBehaviour { behaviour: BehaviourName },

    /// Behaviour provides a body for a method its role does not declare
    #[error("Behaviour '{behaviour}' implements '{role}.{method}' which the role does not declare")]
    UndeclaredMethod {
        behaviour: BehaviourName,
        role: RoleName,
        method: String,
    },

    /// Behaviour claims a role it cannot be applied with
    #[error("Behaviour '{behaviour}' declares no roles")]
    RolelessBehaviour { behaviour: BehaviourName },

    /// No behaviour and no generated default implements a role method
    #[error("Role '{role}' is unresolvable: no implementation for '{method}'")]
    UnresolvedRole { role: RoleName, method: String },

    /// Two equally specific behaviours implement the same method without a priority
    #[error("Ambiguous behaviours for '{role}.{method}': '{first}' and '{second}'")]
    AmbiguousBehaviour {
        role: RoleName,
        method: String,
        first: BehaviourName,
        second: BehaviourName,
    },

    /// Method processor dependencies form a cycle
    #[error("Cyclic method processor dependency involving '{processor}'")]
    CyclicProcessors { processor: String },

    /// Behaviour precedence constraints form a cycle
    #[error("Cyclic behaviour precedence involving '{behaviour}'")]
    CyclicBehaviours { behaviour: BehaviourName },

    /// Setter found for a property but its return type is not allowed
    #[error("Setter '{role}.{setter}' must return void or a type assignable from '{role}', found {returns}")]
    InvalidSetter {
        role: RoleName,
        setter: String,
        returns: ValueType,
    },

    /// Composition requested for an empty role set
    #[error("Cannot compose an empty role set")]
    EmptyRoleSet,

    /// Configuration file or environment value rejected
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Misuse of a composite or property set at the call site
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// Mutation attempted on an unmodifiable property set
    #[error("Unsupported operation: {operation}")]
    Unsupported { operation: &'static str },

    /// Property is not present on the composite's roles
    #[error("No such property '{property}'")]
    NoSuchProperty { property: String },

    /// Method is not part of the composite's roles
    #[error("No such method '{role}.{method}'")]
    NoSuchMethod { role: RoleName, method: String },

    /// Composite does not play the requested role
    #[error("Composite does not implement role '{role}'")]
    RoleNotImplemented { role: RoleName },

    /// Write attempted on a property without a setter
    #[error("Property '{property}' is read-only")]
    ReadOnlyProperty { property: String },

    /// Value does not conform to the property's element type
    #[error("Property '{property}' expects {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: ValueType,
        actual: Value,
    },

    /// Wrong number or shape of arguments for a synthesized method
    #[error("Invalid arguments for '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },

    /// Behaviour state requested with the wrong type or for a stateless behaviour
    #[error("No state of the requested type for behaviour '{behaviour}'")]
    StateUnavailable { behaviour: BehaviourName },
}

/// Failure reported by the durable property storage contract
#[derive(Debug, Error)]
pub enum StorageError {
    /// Loading the values of a property failed
    #[error("Failed to load '{predicate}' of '{entity}': {reason}")]
    Load {
        entity: EntityId,
        predicate: Predicate,
        reason: String,
    },

    /// Storing the values of a property failed
    #[error("Failed to store '{predicate}' of '{entity}': {reason}")]
    Store {
        entity: EntityId,
        predicate: Predicate,
        reason: String,
    },

    /// Backend-specific failure
    #[error("Storage backend failure")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap a backend error
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend {
            source: Box::new(source),
        }
    }
}

/// Unified error type for composition and property access
#[derive(Debug, Error)]
pub enum PersonaError {
    /// Eagerly detected configuration problem
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Call-site misuse
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// Durable storage failure, unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PersonaError {
    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Whether this is a usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Whether this is a storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// The configuration error, if any
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Self::Configuration(err) => Some(err),
            _ => None,
        }
    }

    /// The usage error, if any
    pub fn as_usage(&self) -> Option<&UsageError> {
        match self {
            Self::Usage(err) => Some(err),
            _ => None,
        }
    }
}

/// Standard Result type for persona operations
pub type Result<T> = std::result::Result<T, PersonaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = PersonaError::from(ConfigurationError::EmptyRoleSet);
        assert!(err.is_configuration());
        assert!(!err.is_usage());

        let err = PersonaError::from(UsageError::Unsupported { operation: "add" });
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "Unsupported operation: add");
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::other("disk gone");
        let err = PersonaError::from(StorageError::backend(io));
        assert!(err.is_storage());
        // transparent: the backend's source is reported directly
        let source = std::error::Error::source(&err);
        assert_eq!(source.map(|s| s.to_string()), Some("disk gone".to_string()));
    }
}
