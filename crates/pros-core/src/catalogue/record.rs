//! Validated property maps ready to persist.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::entry::{AppModel, RelationshipType};
use super::error::RecordError;
use crate::model::{Generator, PropertyDecl, PropertyKind, REAL_TYPE_PROPERTY, UID_PROPERTY};

/// A node about to be stored: its labels and its complete property map.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub model_name: String,
    pub labels: Vec<String>,
    pub properties: Map<String, Value>,
}

impl NodeRecord {
    /// Validate `properties` against `model`, filling defaults.
    ///
    /// The identifier is kept when supplied and generated otherwise;
    /// `real_type` is always the entry's own lower-cased name.
    pub fn new(model: &AppModel, mut properties: Map<String, Value>) -> Result<Self, RecordError> {
        if !model.is_concrete() {
            let reason = if model.is_trait() { "trait" } else { "abstract type" };
            return Err(RecordError::NotInstantiable {
                model: model.model_name.clone(),
                reason: reason.to_string(),
            });
        }

        let uid = match properties.remove(UID_PROPERTY) {
            None | Some(Value::Null) => Generator::Uuid.generate(),
            Some(value) if PropertyKind::UniqueId.accepts(&value) => value,
            Some(_) => {
                return Err(RecordError::InvalidValue {
                    model: model.model_name.clone(),
                    property: UID_PROPERTY.to_string(),
                    expected: PropertyKind::UniqueId,
                })
            }
        };
        properties.remove(REAL_TYPE_PROPERTY);

        let mut values = validate_properties(&model.model_name, &model.properties, properties)?;
        values.insert(UID_PROPERTY.to_string(), uid);
        values.insert(
            REAL_TYPE_PROPERTY.to_string(),
            Value::String(model.real_type()),
        );

        Ok(Self {
            model_name: model.model_name.clone(),
            labels: model.inherited_labels.clone(),
            properties: values,
        })
    }

    pub fn uid(&self) -> Option<&str> {
        self.properties.get(UID_PROPERTY).and_then(Value::as_str)
    }
}

/// Validate the properties carried on an edge.
pub fn validate_edge_properties(
    relationship: &RelationshipType,
    properties: Map<String, Value>,
) -> Result<Map<String, Value>, RecordError> {
    let owner = format!(
        "{}.{}",
        relationship.declared_on, relationship.relation_name
    );
    validate_properties(&owner, &relationship.relation_properties, properties)
}

fn validate_properties(
    owner: &str,
    declared: &BTreeMap<String, PropertyDecl>,
    input: Map<String, Value>,
) -> Result<Map<String, Value>, RecordError> {
    if let Some(unknown) = input.keys().find(|key| !declared.contains_key(*key)) {
        return Err(RecordError::UnknownProperty {
            model: owner.to_string(),
            property: unknown.clone(),
        });
    }

    let mut values = Map::new();
    for (name, decl) in declared {
        let value = match input.get(name) {
            Some(value) if !value.is_null() => Some(value.clone()),
            _ => decl.default_value(),
        };

        let Some(value) = value else {
            if decl.required {
                return Err(RecordError::MissingRequired {
                    model: owner.to_string(),
                    property: name.clone(),
                });
            }
            continue;
        };

        if !decl.kind.accepts(&value) {
            return Err(RecordError::InvalidValue {
                model: owner.to_string(),
                property: name.clone(),
                expected: decl.kind,
            });
        }
        if !decl.choices.is_empty() {
            let allowed = value
                .as_str()
                .is_some_and(|v| decl.choices.iter().any(|c| c == v));
            if !allowed {
                return Err(RecordError::InvalidChoice {
                    model: owner.to_string(),
                    property: name.clone(),
                    value: value.to_string(),
                });
            }
        }
        values.insert(name.clone(), value);
    }
    Ok(values)
}
