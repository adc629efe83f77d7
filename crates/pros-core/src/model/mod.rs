//! Node type declarations.
//!
//! Declarations are plain data collected before anything is resolved: a type
//! names its bases by string and a relationship names its target by string.
//! Nothing here knows about other types; [`crate::registry::TypeRegistry`]
//! takes the complete set and resolves it in one pass.
//!
//! # Module Structure
//!
//! - `node_type` - `NodeTypeDecl`, `NodeKind`, declaration files
//! - `property` - scalar property declarations
//! - `relationship` - forward edge declarations and cardinality
//! - `error` - `DeclarationError`

mod error;
mod node_type;
mod property;
mod relationship;

pub use error::DeclarationError;
pub use node_type::{ModelsFile, NodeKind, NodeTypeDecl};
pub use property::{Generator, PropertyDecl, PropertyKind};
pub use relationship::{relation_label, Cardinality, EdgeKind, RelationshipDecl};

use std::sync::OnceLock;

use regex::Regex;

/// Key under which edge properties are nested inside a fetched neighbor.
pub const RELATIONSHIP_DATA_KEY: &str = "_relationship_data";

/// Name of the identifier property every storable type carries.
pub const UID_PROPERTY: &str = "uid";

/// Name of the discriminant property holding the concrete type name.
pub const REAL_TYPE_PROPERTY: &str = "real_type";

/// Display label shown for a neighbor in relation arrays.
pub const LABEL_PROPERTY: &str = "label";

/// Properties that are stored but never projected into read documents.
pub const EXCLUDED_FROM_PROJECTION: &[&str] = &["last_dependent_change"];

/// Names usable as labels, keys and property names in query text.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_]*$";

fn identifier_regex() -> Result<&'static Regex, DeclarationError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(IDENTIFIER_PATTERN))
        .as_ref()
        .map_err(|e| DeclarationError::Pattern(e.to_string()))
}

/// Check that `name` can be spliced into query text.
pub(crate) fn validate_identifier(name: &str, context: &str) -> Result<(), DeclarationError> {
    if identifier_regex()?.is_match(name) {
        Ok(())
    } else {
        Err(DeclarationError::InvalidIdentifier {
            name: name.to_string(),
            context: context.to_string(),
        })
    }
}

/// Normalize a type name for lookup: underscores dropped, lower-cased.
///
/// Two type names with the same key cannot both be declared.
pub fn lookup_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Internal fields are excluded from catalogues by their trailing underscore.
pub fn is_internal_name(name: &str) -> bool {
    name.ends_with('_')
}

/// `owns_pets` -> `OwnsPets`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Built-in properties carried by `node` and `reification` types.
pub(crate) fn node_builtins() -> Vec<(&'static str, PropertyDecl)> {
    vec![
        (LABEL_PROPERTY, PropertyDecl::string()),
        (REAL_TYPE_PROPERTY, PropertyDecl::string()),
        ("created_by", PropertyDecl::string()),
        ("created_when", PropertyDecl::date_time()),
        ("modified_by", PropertyDecl::string()),
        ("modified_when", PropertyDecl::date_time()),
        ("is_deleted", PropertyDecl::boolean().with_default(false)),
        (
            "last_dependent_change",
            PropertyDecl::date_time().with_generator(Generator::Now),
        ),
    ]
}

/// Built-in properties carried by `child_node` types.
pub(crate) fn child_builtins() -> Vec<(&'static str, PropertyDecl)> {
    vec![(REAL_TYPE_PROPERTY, PropertyDecl::string())]
}
