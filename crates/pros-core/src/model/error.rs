//! Declaration-time structural errors.

use thiserror::Error;

/// Errors raised while collecting or resolving node type declarations.
///
/// All of these are fatal at startup: a process that reaches request serving
/// has, by construction, a consistent registry.
#[derive(Debug, Error)]
pub enum DeclarationError {
    /// A name cannot be used as a label, key or property in query text.
    #[error("Invalid {context} name '{name}'")]
    InvalidIdentifier { name: String, context: String },

    /// Two declarations share a type name.
    #[error("Node type '{0}' is declared more than once")]
    DuplicateType(String),

    /// A property and a relationship of one type share a name.
    #[error("'{name}' is declared more than once on {type_name}")]
    DuplicateMember { type_name: String, name: String },

    /// A declared name collides with a reserved key.
    #[error("'{name}' on {type_name} is reserved")]
    ReservedName { type_name: String, name: String },

    /// A base names no declared type.
    #[error("{type_name} extends unknown type '{base}'")]
    UnknownBase { type_name: String, base: String },

    /// A relationship names no declared type as its target.
    #[error("{type_name}.{relationship} targets unknown type '{target}'")]
    UnknownTarget {
        type_name: String,
        relationship: String,
        target: String,
    },

    /// The ancestor chain loops back on itself.
    #[error("Inheritance cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// No consistent ancestor order exists for a type.
    #[error("Cannot linearize the bases of {0}")]
    InconsistentHierarchy(String),

    /// Storage bases of one type disagree on the node kind.
    #[error("{type_name} mixes node kinds through its bases")]
    MixedKinds { type_name: String },

    /// A trait extends something that is not a trait.
    #[error("Trait {type_name} cannot extend non-trait '{base}'")]
    TraitBase { type_name: String, base: String },

    /// A trait declares an edge kind traits cannot carry.
    #[error("Trait {type_name} cannot declare child or reification edge '{relationship}'")]
    TraitEdge {
        type_name: String,
        relationship: String,
    },

    /// A plain or reification edge points at a child-node type.
    #[error("{type_name}.{relationship} cannot target child node type '{target}'")]
    ChildTarget {
        type_name: String,
        relationship: String,
        target: String,
    },

    /// A child-node edge points at a type that is not a child node.
    #[error("{type_name}.{relationship} is a child edge but '{target}' is not a child node type")]
    NotAChildType {
        type_name: String,
        relationship: String,
        target: String,
    },

    /// A plain or reification edge has no reverse name.
    #[error("{type_name}.{relationship} needs a reverse name")]
    MissingReverseName {
        type_name: String,
        relationship: String,
    },

    /// Two forward declarations claim the same reverse label on one target.
    #[error(
        "Reverse label '{reverse_label}' on {target} is claimed by {existing} and {incoming}"
    )]
    ConflictingReverseLabel {
        target: String,
        reverse_label: String,
        existing: String,
        incoming: String,
    },

    /// A reverse label shadows a field or relationship of its target.
    #[error("Reverse label '{reverse_label}' collides with a member of {target}")]
    ReverseNameCollision {
        target: String,
        reverse_label: String,
    },

    /// Child-node edges form a loop, so nested documents would never end.
    #[error("Child node ownership cycle: {}", .0.join(" -> "))]
    ChildOwnershipCycle(Vec<String>),

    /// The identifier pattern failed to compile.
    #[error("Identifier pattern error: {0}")]
    Pattern(String),
}
