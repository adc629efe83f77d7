//! Catalogue lookup and record validation errors.

use thiserror::Error;

use crate::model::PropertyKind;
use crate::registry::NodeTypeId;

/// A catalogue lookup found no entry.
///
/// Each variant names the kind of key used so callers can tell a qualified
/// miss from a bare-name miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelManagerError {
    /// Nothing registered for a type identity.
    #[error("Model with identity {0} not found")]
    IdNotFound(NodeTypeId),

    /// Nothing registered under `app.type`.
    #[error("Model <{key}> not found by qualified name")]
    QualifiedNotFound { key: String },

    /// Nothing registered under the bare type name.
    #[error("Model <{key}> not found by unqualified name")]
    UnqualifiedNotFound { key: String },
}

/// A property map does not fit a catalogue entry.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Traits and abstract types have no stored instances.
    #[error("{model} is a {reason} and cannot be instantiated")]
    NotInstantiable { model: String, reason: String },

    /// The property is not part of the entry.
    #[error("{model} has no property '{property}'")]
    UnknownProperty { model: String, property: String },

    /// The value does not match the declared kind.
    #[error("{model}.{property} expects a {expected} value")]
    InvalidValue {
        model: String,
        property: String,
        expected: PropertyKind,
    },

    /// The value is not one of the declared choices.
    #[error("{model}.{property} does not allow '{value}'")]
    InvalidChoice {
        model: String,
        property: String,
        value: String,
    },

    /// A required property has neither a value nor a default.
    #[error("{model}.{property} is required")]
    MissingRequired { model: String, property: String },

    /// The relationship is not declared on the entry.
    #[error("{model} has no relationship '{relationship}'")]
    UnknownRelationship { model: String, relationship: String },
}
