//! Schema derivation from catalogue entries.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::debug;

use super::{ArrayBounds, FieldSchema, FieldType, ObjectKind, ObjectSchema, SchemaError, SchemaSet};
use crate::catalogue::{AppModel, ModelManager, RelationshipType, ReverseRelationshipType};
use crate::model::{
    to_pascal_case, PropertyDecl, PropertyKind, LABEL_PROPERTY, REAL_TYPE_PROPERTY,
    RELATIONSHIP_DATA_KEY, UID_PROPERTY,
};
use crate::registry::NodeTypeId;

/// The edge declaration an edge-data view is scoped to.
struct EdgeScope<'a> {
    declared_on: &'a str,
    relation_name: &'a str,
    properties: &'a BTreeMap<String, PropertyDecl>,
}

/// Builds object schemas, sharing them across roots.
///
/// Full schemas are cached by type identity. The cache entry is written
/// before the fields are built, so a type reached again while its own schema
/// is still being built resolves to the name instead of recursing.
pub struct SchemaBuilder<'m> {
    manager: &'m ModelManager,
    cache: HashMap<NodeTypeId, String>,
    objects: SchemaSet,
}

impl<'m> SchemaBuilder<'m> {
    pub fn new(manager: &'m ModelManager) -> Self {
        Self {
            manager,
            cache: HashMap::new(),
            objects: SchemaSet::new(),
        }
    }

    /// Build the full schema of `model`, returning its name.
    pub fn build(&mut self, model: &AppModel) -> Result<String, SchemaError> {
        if let Some(name) = self.cache.get(&model.id) {
            return Ok(name.clone());
        }
        if model.is_trait() {
            return Err(SchemaError::TraitSchema(model.model_name.clone()));
        }
        if model.is_abstract {
            return Err(SchemaError::AbstractSchema(model.model_name.clone()));
        }

        let name = model.model_name.clone();
        self.cache.insert(model.id, name.clone());

        let mut fields = vec![discriminant_field(model), uid_field()];
        fields.extend(
            model
                .projected_properties()
                .filter(|(property, _)| property.as_str() != REAL_TYPE_PROPERTY)
                .map(|(property, decl)| scalar_field(property, decl)),
        );
        for relationship in model.relationships.values() {
            fields.push(self.relationship_field(model, relationship)?);
        }
        for child in model.child_nodes.values() {
            fields.push(self.child_field(model, child)?);
        }
        if model.exposes_reverse_relationships() {
            for reverse in model.reverse_relationships.values() {
                fields.push(self.reverse_field(model, reverse)?);
            }
        }

        debug!(schema = %name, fields = fields.len(), "built full schema");
        self.objects.insert(ObjectSchema {
            name: name.clone(),
            kind: ObjectKind::Full,
            model_name: Some(model.model_name.clone()),
            fields,
            additional_properties: false,
        });
        Ok(name)
    }

    pub fn finish(self) -> SchemaSet {
        self.objects
    }

    fn relationship_field(
        &mut self,
        model: &AppModel,
        relationship: &RelationshipType,
    ) -> Result<FieldSchema, SchemaError> {
        let members = relationship.target_members(self.manager)?;
        if members.is_empty() {
            return Err(empty_union(model, &relationship.relation_name, &relationship.target_model_name));
        }

        let scope = relationship.has_relation_data.then_some(EdgeScope {
            declared_on: &relationship.declared_on,
            relation_name: &relationship.relation_name,
            properties: &relationship.relation_properties,
        });
        let views = members
            .iter()
            .map(|member| self.relation_view(member, scope.as_ref()))
            .collect();

        Ok(array_field(
            &relationship.relation_name,
            FieldType::one_of(views),
            ArrayBounds::from_cardinality(relationship.cardinality),
        ))
    }

    fn child_field(
        &mut self,
        model: &AppModel,
        child: &RelationshipType,
    ) -> Result<FieldSchema, SchemaError> {
        let members = child.target_members(self.manager)?;
        if members.is_empty() {
            return Err(empty_union(model, &child.relation_name, &child.target_model_name));
        }

        let mut schemas = Vec::with_capacity(members.len());
        for member in members {
            schemas.push(self.build(member)?);
        }

        Ok(array_field(
            &child.relation_name,
            FieldType::one_of(schemas),
            ArrayBounds::from_cardinality(child.cardinality),
        ))
    }

    fn reverse_field(
        &mut self,
        model: &AppModel,
        reverse: &ReverseRelationshipType,
    ) -> Result<FieldSchema, SchemaError> {
        let members = reverse.source_members(self.manager)?;
        if members.is_empty() {
            return Err(empty_union(
                model,
                &reverse.reverse_relationship_label,
                reverse.declaring_model(),
            ));
        }

        let scope = reverse.has_relation_data.then_some(EdgeScope {
            declared_on: reverse.declaring_model(),
            relation_name: &reverse.source_relation_name,
            properties: &reverse.relation_properties,
        });
        let views = members
            .iter()
            .map(|member| self.relation_view(member, scope.as_ref()))
            .collect();

        let mut field = array_field(
            &reverse.reverse_relationship_label,
            FieldType::one_of(views),
            ArrayBounds::unbounded(),
        );
        field.required = false;
        field.default = Some(Value::Array(Vec::new()));
        Ok(field)
    }

    /// Minimal view of a neighbor: discriminant, label, identifier and the
    /// edge data when the edge carries any.
    fn relation_view(&mut self, member: &AppModel, scope: Option<&EdgeScope<'_>>) -> String {
        let name = match scope {
            None => format!("{}Related", member.model_name),
            Some(scope) => format!(
                "{}Via{}{}",
                member.model_name,
                scope.declared_on,
                to_pascal_case(scope.relation_name)
            ),
        };
        if self.objects.contains(&name) {
            return name;
        }

        let mut fields = vec![
            discriminant_field(member),
            FieldSchema {
                name: LABEL_PROPERTY.to_string(),
                field_type: FieldType::Scalar {
                    kind: PropertyKind::String,
                },
                required: true,
                nullable: true,
                default: None,
                choices: Vec::new(),
                description: None,
            },
            uid_field(),
        ];
        if let Some(scope) = scope {
            let data = self.relation_data(scope);
            fields.push(FieldSchema {
                name: RELATIONSHIP_DATA_KEY.to_string(),
                field_type: FieldType::Object { schema: data },
                required: true,
                nullable: false,
                default: None,
                choices: Vec::new(),
                description: None,
            });
        }

        self.objects.insert(ObjectSchema {
            name: name.clone(),
            kind: ObjectKind::RelationView,
            model_name: Some(member.model_name.clone()),
            fields,
            additional_properties: true,
        });
        name
    }

    fn relation_data(&mut self, scope: &EdgeScope<'_>) -> String {
        let name = format!(
            "{}{}RelationData",
            scope.declared_on,
            to_pascal_case(scope.relation_name)
        );
        if !self.objects.contains(&name) {
            self.objects.insert(ObjectSchema {
                name: name.clone(),
                kind: ObjectKind::RelationData,
                model_name: None,
                fields: scope
                    .properties
                    .iter()
                    .map(|(property, decl)| scalar_field(property, decl))
                    .collect(),
                additional_properties: false,
            });
        }
        name
    }
}

fn empty_union(model: &AppModel, field: &str, target: &str) -> SchemaError {
    SchemaError::EmptyUnion {
        model: model.model_name.clone(),
        field: field.to_string(),
        target: target.to_string(),
    }
}

fn discriminant_field(model: &AppModel) -> FieldSchema {
    let value = model.real_type();
    FieldSchema {
        name: REAL_TYPE_PROPERTY.to_string(),
        field_type: FieldType::Discriminant {
            value: value.clone(),
        },
        required: true,
        nullable: false,
        default: Some(Value::String(value)),
        choices: Vec::new(),
        description: None,
    }
}

fn uid_field() -> FieldSchema {
    FieldSchema {
        name: UID_PROPERTY.to_string(),
        field_type: FieldType::Scalar {
            kind: PropertyKind::UniqueId,
        },
        required: true,
        nullable: false,
        default: None,
        choices: Vec::new(),
        description: None,
    }
}

fn scalar_field(name: &str, decl: &PropertyDecl) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        field_type: FieldType::Scalar { kind: decl.kind },
        required: decl.is_schema_required(),
        nullable: !decl.required,
        default: decl.default.clone(),
        choices: decl.choices.clone(),
        description: decl.help_text.clone(),
    }
}

fn array_field(name: &str, items: FieldType, bounds: ArrayBounds) -> FieldSchema {
    FieldSchema {
        name: name.to_string(),
        field_type: FieldType::Array {
            items: Box::new(items),
            bounds,
        },
        required: true,
        nullable: false,
        default: None,
        choices: Vec::new(),
        description: None,
    }
}
