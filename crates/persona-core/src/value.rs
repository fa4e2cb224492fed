//! Property values and the value types used in method signatures

use crate::identifiers::{EntityId, RoleName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a method parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// No value (setter returning nothing)
    Void,
    /// Boolean literal; enables the `isX` getter convention
    Boolean,
    /// Signed integer literal
    Integer,
    /// Text literal, plain, localized or explicitly typed
    Text,
    /// Reference to another entity
    Entity,
    /// Reference to an entity playing the given role
    Role(RoleName),
    /// Any single value
    Any,
    /// Multi-valued: a collection of the inner type
    Collection(Box<ValueType>),
}

impl ValueType {
    /// Collection of the given element type
    pub fn collection(element: ValueType) -> Self {
        Self::Collection(Box::new(element))
    }

    /// Whether this is a collection type
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// Element type: the inner type of a collection, otherwise `self`
    pub fn element(&self) -> &ValueType {
        match self {
            Self::Collection(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Text => f.write_str("text"),
            Self::Entity => f.write_str("entity"),
            Self::Role(role) => write!(f, "{role}"),
            Self::Any => f.write_str("any"),
            Self::Collection(inner) => write!(f, "set<{inner}>"),
        }
    }
}

/// One element of a property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    /// Boolean literal
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Plain text literal
    Text(String),
    /// Language-tagged text literal
    Localized {
        /// Literal text
        text: String,
        /// Language tag, e.g. `en` or `de-CH`
        lang: String,
    },
    /// Literal carrying an explicit datatype
    Typed {
        /// Lexical form
        lexical: String,
        /// Datatype identifier
        datatype: String,
    },
    /// Reference to another entity
    Entity(EntityId),
}

impl Value {
    /// Plain text value
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Language-tagged text value
    pub fn localized(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self::Localized {
            text: text.into(),
            lang: lang.into(),
        }
    }

    /// Literal with an explicit datatype
    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Typed {
            lexical: lexical.into(),
            datatype: datatype.into(),
        }
    }

    /// Whether this value may be stored in a property of the given element type
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty.element()) {
            (_, ValueType::Any) => true,
            (Self::Boolean(_), ValueType::Boolean) => true,
            (Self::Integer(_), ValueType::Integer) => true,
            (Self::Text(_) | Self::Localized { .. } | Self::Typed { .. }, ValueType::Text) => true,
            (Self::Entity(_), ValueType::Entity | ValueType::Role(_)) => true,
            _ => false,
        }
    }

    /// Lexical form of literal values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Localized { text, .. } => Some(text.as_str()),
            Self::Typed { lexical, .. } => Some(lexical.as_str()),
            _ => None,
        }
    }

    /// Language tag of a localized literal
    pub fn lang(&self) -> Option<&str> {
        match self {
            Self::Localized { lang, .. } => Some(lang.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Localized { text, lang } => write!(f, "{text:?}@{lang}"),
            Self::Typed { lexical, datatype } => write!(f, "{lexical:?}^^{datatype}"),
            Self::Entity(id) => write!(f, "<{id}>"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Self::Entity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_element_type() {
        let ty = ValueType::collection(ValueType::Text);
        assert!(ty.is_collection());
        assert_eq!(ty.element(), &ValueType::Text);
        assert_eq!(ValueType::Integer.element(), &ValueType::Integer);
    }

    #[test]
    fn test_value_conformance() {
        assert!(Value::from(true).conforms_to(&ValueType::Boolean));
        assert!(!Value::from(true).conforms_to(&ValueType::Text));
        assert!(Value::localized("Hallo", "de").conforms_to(&ValueType::Text));
        assert!(Value::from(EntityId::new("urn:x")).conforms_to(&ValueType::Role("Person".into())));
        assert!(Value::from(3i64).conforms_to(&ValueType::collection(ValueType::Integer)));
        assert!(Value::from("anything").conforms_to(&ValueType::Any));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::localized("hi", "en").to_string(), "\"hi\"@en");
        assert_eq!(
            ValueType::collection(ValueType::Integer).to_string(),
            "set<integer>"
        );
    }
}
