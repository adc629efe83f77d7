//! Model catalogue.
//!
//! One [`AppModel`] per declared type, joining resolved fields, forward
//! relationships split by edge kind, ancestry, subtypes and the merged
//! reverse view. The [`ModelManager`] owns every entry and finds it by type
//! identity, by `app.type` or by the bare type name.
//!
//! The manager is built once at startup and only read afterwards.

mod entry;
mod error;
mod record;

pub use entry::{
    build_catalogue_entry, AppModel, RelationshipType, ReverseRelationshipType,
    SubclassHierarchy,
};
pub use error::{ModelManagerError, RecordError};
pub use record::{validate_edge_properties, NodeRecord};

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

pub use crate::model::lookup_key;

use crate::registry::{Hierarchy, NodeTypeId};
use crate::schema::{SchemaBuilder, SchemaError, SchemaSet};


/// Qualified lookup key, `app.type` normalized.
pub fn qualified_key(app_name: &str, model_name: &str) -> String {
    format!("{}.{}", lookup_key(app_name), lookup_key(model_name))
}

/// Ways to name a catalogue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKey<'a> {
    Id(NodeTypeId),
    /// `app.Type` when it contains a dot, a bare type name otherwise.
    Name(&'a str),
}

impl From<NodeTypeId> for ModelKey<'_> {
    fn from(id: NodeTypeId) -> Self {
        ModelKey::Id(id)
    }
}

impl<'a> From<&'a str> for ModelKey<'a> {
    fn from(name: &'a str) -> Self {
        ModelKey::Name(name)
    }
}

impl<'a> From<&'a String> for ModelKey<'a> {
    fn from(name: &'a String) -> Self {
        ModelKey::Name(name.as_str())
    }
}

impl<'a> From<&'a AppModel> for ModelKey<'a> {
    fn from(model: &'a AppModel) -> Self {
        ModelKey::Id(model.id)
    }
}

/// Registry of catalogue entries and their derived schemas.
#[derive(Debug, Default)]
pub struct ModelManager {
    models: Vec<AppModel>,
    by_id: HashMap<NodeTypeId, usize>,
    by_qualified_name: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    schemas: SchemaSet,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue every type of `hierarchy`, without schemas.
    pub fn from_hierarchy(hierarchy: &Hierarchy) -> Self {
        let mut manager = Self::new();
        for node_type in hierarchy.types() {
            manager.add_model(build_catalogue_entry(hierarchy, node_type.id));
        }
        manager
    }

    /// Catalogue every type and derive every schema.
    pub fn build(hierarchy: &Hierarchy) -> Result<Self, SchemaError> {
        let mut manager = Self::from_hierarchy(hierarchy);
        manager.derive_schemas()?;
        info!(
            models = manager.len(),
            schemas = manager.schemas.len(),
            "model catalogue ready"
        );
        Ok(manager)
    }

    /// Register an entry under all three keys, replacing any entry with the
    /// same identity.
    pub fn add_model(&mut self, model: AppModel) {
        let index = match self.by_id.get(&model.id).copied() {
            Some(existing) => {
                let old = &self.models[existing];
                self.by_qualified_name.remove(&old.qualified_key());
                self.by_name.remove(&old.unqualified_key());
                existing
            }
            None => self.models.len(),
        };

        debug!(key = %model.qualified_key(), "registered model");
        self.by_id.insert(model.id, index);
        self.by_qualified_name.insert(model.qualified_key(), index);
        self.by_name.insert(model.unqualified_key(), index);
        if index == self.models.len() {
            self.models.push(model);
        } else {
            self.models[index] = model;
        }
    }

    pub fn get_model<'k>(
        &self,
        key: impl Into<ModelKey<'k>>,
    ) -> Result<&AppModel, ModelManagerError> {
        let index = match key.into() {
            ModelKey::Id(id) => self
                .by_id
                .get(&id)
                .ok_or(ModelManagerError::IdNotFound(id))?,
            ModelKey::Name(name) => match name.split_once('.') {
                Some((app, model)) => self
                    .by_qualified_name
                    .get(&qualified_key(app, model))
                    .ok_or_else(|| ModelManagerError::QualifiedNotFound {
                        key: name.to_string(),
                    })?,
                None => self.by_name.get(&lookup_key(name)).ok_or_else(|| {
                    ModelManagerError::UnqualifiedNotFound {
                        key: name.to_string(),
                    }
                })?,
            },
        };
        Ok(&self.models[*index])
    }

    pub fn models(&self) -> impl Iterator<Item = &AppModel> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Path segment and entry for every type that can be read by identifier.
    pub fn routes(&self) -> impl Iterator<Item = (String, &AppModel)> {
        self.models
            .iter()
            .filter(|m| m.is_concrete() && m.exposes_reverse_relationships())
            .map(|m| (m.real_type(), m))
    }

    /// Concrete entries a value declared as `model` can actually be, by name.
    pub fn polymorphic_members<'a>(&'a self, model: &'a AppModel) -> Vec<&'a AppModel> {
        let candidates = if model.is_trait() {
            &model.classes_with_trait
        } else {
            &model.subclasses
        };

        let mut members: Vec<&AppModel> = std::iter::once(model)
            .chain(
                candidates
                    .iter()
                    .filter_map(|name| self.get_model(name).ok()),
            )
            .filter(|m| m.is_concrete())
            .collect();
        members.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        members.dedup_by_key(|m| m.id);
        members
    }

    /// Derive the response schema of every concrete entry.
    pub fn derive_schemas(&mut self) -> Result<(), SchemaError> {
        let mut builder = SchemaBuilder::new(self);
        let mut roots = Vec::new();
        for model in self.models.iter().filter(|m| m.is_concrete()) {
            roots.push((model.id, builder.build(model)?));
        }
        let schemas = builder.finish();

        for (id, name) in roots {
            if let Some(&index) = self.by_id.get(&id) {
                self.models[index].response_schema = Some(name);
            }
        }
        self.schemas = schemas;
        Ok(())
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// The derived schema of an entry rendered as JSON Schema.
    pub fn response_schema<'k>(&self, key: impl Into<ModelKey<'k>>) -> Result<Value, SchemaError> {
        let model = self.get_model(key)?;
        let root = model
            .response_schema
            .as_deref()
            .ok_or_else(|| SchemaError::NotDerived(model.model_name.clone()))?;
        self.schemas.to_json_schema(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keys() {
        assert_eq!(lookup_key("Person"), "person");
        assert_eq!(lookup_key("test_app"), "testapp");
        assert_eq!(qualified_key("test_app", "Person"), "testapp.person");
    }

    #[test]
    fn test_empty_manager_reports_key_kind() {
        let manager = ModelManager::new();
        assert_eq!(
            manager.get_model("Nothing").unwrap_err(),
            ModelManagerError::UnqualifiedNotFound {
                key: "Nothing".to_string()
            }
        );
        assert_eq!(
            manager.get_model("app.Nothing").unwrap_err(),
            ModelManagerError::QualifiedNotFound {
                key: "app.Nothing".to_string()
            }
        );
        let err = manager.get_model("app.Nothing").unwrap_err();
        assert!(err.to_string().contains("qualified name"));
        assert!(err.to_string().contains("app.Nothing"));
    }
}
