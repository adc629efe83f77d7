//! Response schemas.
//!
//! Schemas are plain data: named [`ObjectSchema`]s whose fields reference one
//! another by name. They mirror exactly what the read query of the same type
//! returns. A renderer turns the graph into JSON Schema for documentation
//! and for the HTTP surface.
//!
//! Three kinds of object exist:
//!
//! - full schemas (`Person`) for roots and child nodes
//! - relation views (`BookRelated`, `PetViaPersonOwnsPets`) for relation
//!   array items: discriminant, label, identifier and edge data if any
//! - relation data (`PersonOwnsPetsRelationData`) for edge properties

mod builder;
mod json;

pub use builder::SchemaBuilder;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::catalogue::{ModelKey, ModelManager, ModelManagerError};
use crate::model::{Cardinality, PropertyKind};

/// Errors raised while deriving or rendering schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A referenced type has no catalogue entry.
    #[error(transparent)]
    Lookup(#[from] ModelManagerError),

    /// Traits have no storage identity and so no read shape.
    #[error("Trait {0} has no response schema")]
    TraitSchema(String),

    /// Abstract types are never returned on their own.
    #[error("Abstract type {0} has no response schema")]
    AbstractSchema(String),

    /// A relation target has no concrete type to return.
    #[error("{model}.{field} targets {target}, which has no concrete members")]
    EmptyUnion {
        model: String,
        field: String,
        target: String,
    },

    /// Schemas were not derived for the catalogue yet.
    #[error("Schema for {0} has not been derived")]
    NotDerived(String),

    /// No object schema with this name exists.
    #[error("Unknown schema '{0}'")]
    UnknownSchema(String),
}

// ============================================================================
// Schema graph
// ============================================================================

/// Array constraints derived from cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArrayBounds {
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
}

impl ArrayBounds {
    pub fn from_cardinality(cardinality: Cardinality) -> Self {
        Self {
            min_items: cardinality.min_items(),
            max_items: cardinality.max_items(),
            unique_items: true,
        }
    }

    pub fn unbounded() -> Self {
        Self {
            min_items: None,
            max_items: None,
            unique_items: true,
        }
    }
}

/// Type tag of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Scalar { kind: PropertyKind },
    /// Single-value enumeration naming the concrete type.
    Discriminant { value: String },
    Array {
        items: Box<FieldType>,
        bounds: ArrayBounds,
    },
    /// Reference to one named object schema.
    Object { schema: String },
    /// Any one of several named object schemas.
    Union { schemas: Vec<String> },
}

impl FieldType {
    /// Object schemas this type refers to.
    pub fn references(&self) -> Vec<&str> {
        match self {
            FieldType::Scalar { .. } | FieldType::Discriminant { .. } => Vec::new(),
            FieldType::Array { items, .. } => items.references(),
            FieldType::Object { schema } => vec![schema.as_str()],
            FieldType::Union { schemas } => schemas.iter().map(String::as_str).collect(),
        }
    }

    pub(crate) fn one_of(mut schemas: Vec<String>) -> Self {
        if schemas.len() == 1 {
            FieldType::Object {
                schema: schemas.remove(0),
            }
        } else {
            FieldType::Union { schemas }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    /// The key is always present.
    pub required: bool,
    /// The value may be null.
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Full,
    RelationView,
    RelationData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSchema {
    pub name: String,
    pub kind: ObjectKind,
    /// Catalogue entry described, absent for relation data.
    pub model_name: Option<String>,
    pub fields: Vec<FieldSchema>,
    pub additional_properties: bool,
}

impl ObjectSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// Named object schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SchemaSet {
    objects: BTreeMap<String, ObjectSchema>,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ObjectSchema> {
        self.objects.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn insert(&mut self, object: ObjectSchema) {
        self.objects.insert(object.name.clone(), object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectSchema> {
        self.objects.values()
    }

    /// Names of every object reachable from `root`, `root` included.
    pub fn reachable(&self, root: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![root.to_string()];
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(object) = self.objects.get(&name) {
                for field in &object.fields {
                    pending.extend(field.field_type.references().into_iter().map(str::to_string));
                }
            }
        }
        seen
    }
}

/// A root schema together with everything it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub root: String,
    pub objects: SchemaSet,
}

impl ResponseSchema {
    pub fn root_object(&self) -> Option<&ObjectSchema> {
        self.objects.get(&self.root)
    }

    pub fn to_json_schema(&self) -> Result<Value, SchemaError> {
        self.objects.to_json_schema(&self.root)
    }
}

/// Derive the schema of one catalogue entry with a fresh builder.
pub fn build_schema<'k>(
    manager: &ModelManager,
    key: impl Into<ModelKey<'k>>,
) -> Result<ResponseSchema, SchemaError> {
    let model = manager.get_model(key)?;
    let mut builder = SchemaBuilder::new(manager);
    let root = builder.build(model)?;
    Ok(ResponseSchema {
        root,
        objects: builder.finish(),
    })
}
