//! Catalogue entries.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::error::ModelManagerError;
use super::ModelManager;
use crate::model::{
    relation_label, Cardinality, EdgeKind, NodeKind, PropertyDecl, EXCLUDED_FROM_PROJECTION,
};
use crate::registry::{Hierarchy, NodeTypeId, ReverseEntry};

// ============================================================================
// Relationships
// ============================================================================

/// A resolved forward relationship of a catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipType {
    pub relation_name: String,
    /// Type that declared the relationship; an ancestor for inherited edges.
    pub declared_on: String,
    pub target_model_name: String,
    pub relation_label: String,
    pub reverse_name: Option<String>,
    pub cardinality: Cardinality,
    pub edge_kind: EdgeKind,
    pub inline_createable: bool,
    pub has_relation_data: bool,
    pub relation_properties: BTreeMap<String, PropertyDecl>,
}

impl RelationshipType {
    pub fn target_model<'m>(
        &self,
        manager: &'m ModelManager,
    ) -> Result<&'m AppModel, ModelManagerError> {
        manager.get_model(self.target_model_name.as_str())
    }

    /// Concrete types a neighbor across this edge can be.
    pub fn target_members<'m>(
        &self,
        manager: &'m ModelManager,
    ) -> Result<Vec<&'m AppModel>, ModelManagerError> {
        let target = self.target_model(manager)?;
        Ok(manager.polymorphic_members(target))
    }
}

/// A reverse view of forward edges declared elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseRelationshipType {
    /// Types declaring the forward edge.
    pub source_models: Vec<String>,
    pub source_relation_name: String,
    pub reverse_relationship_label: String,
    pub forward_relationship_label: String,
    pub cardinality: Cardinality,
    pub has_relation_data: bool,
    pub relation_properties: BTreeMap<String, PropertyDecl>,
}

impl ReverseRelationshipType {
    fn from_entry(entry: &ReverseEntry) -> Self {
        Self {
            source_models: entry.sources.iter().map(|s| s.name.clone()).collect(),
            source_relation_name: entry.source_relation_name.clone(),
            reverse_relationship_label: entry.reverse_label.clone(),
            forward_relationship_label: entry.forward_label.clone(),
            cardinality: entry.cardinality,
            has_relation_data: !entry.edge_properties.is_empty(),
            relation_properties: entry.edge_properties.clone(),
        }
    }

    /// Concrete types a neighbor across the reverse edge can be.
    pub fn source_members<'m>(
        &self,
        manager: &'m ModelManager,
    ) -> Result<Vec<&'m AppModel>, ModelManagerError> {
        let mut members: Vec<&AppModel> = Vec::new();
        for source in &self.source_models {
            let model = manager.get_model(source.as_str())?;
            for member in manager.polymorphic_members(model) {
                if !members.iter().any(|m| m.id == member.id) {
                    members.push(member);
                }
            }
        }
        members.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        Ok(members)
    }

    /// Type whose name scopes edge-data schemas for this edge.
    pub fn declaring_model(&self) -> &str {
        self.source_models
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Nested subtype tree, subtype name -> its own subtypes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubclassHierarchy(pub BTreeMap<String, SubclassHierarchy>);

impl SubclassHierarchy {
    fn build(hierarchy: &Hierarchy, id: NodeTypeId) -> Self {
        if hierarchy.get(id).is_trait() {
            return Self(
                hierarchy
                    .classes_with_trait(id)
                    .into_iter()
                    .map(|c| (hierarchy.name(c).to_string(), Self::default()))
                    .collect(),
            );
        }
        Self(
            hierarchy
                .direct_subtypes(id)
                .iter()
                .map(|sub| (hierarchy.name(*sub).to_string(), Self::build(hierarchy, *sub)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// AppModel
// ============================================================================

/// The fully resolved record for one node type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppModel {
    pub id: NodeTypeId,
    pub app_name: String,
    pub model_name: String,
    pub kind: NodeKind,
    pub is_abstract: bool,
    pub meta: BTreeMap<String, Value>,
    /// Scalar fields, identifier excluded.
    pub properties: BTreeMap<String, PropertyDecl>,
    pub relationships: BTreeMap<String, RelationshipType>,
    pub child_nodes: BTreeMap<String, RelationshipType>,
    pub related_reifications: BTreeMap<String, RelationshipType>,
    /// Transitive subtypes; for a trait, the classes with the trait.
    pub subclasses: BTreeSet<String>,
    pub subclass_hierarchy: SubclassHierarchy,
    /// Storage ancestors, nearest first.
    pub parent_classes: Vec<String>,
    pub inherited_labels: Vec<String>,
    pub classes_with_trait: BTreeSet<String>,
    pub reverse_relationships: BTreeMap<String, ReverseRelationshipType>,
    /// Name of the derived root schema, once schemas are built.
    pub response_schema: Option<String>,
}

impl AppModel {
    pub fn is_trait(&self) -> bool {
        self.kind == NodeKind::Trait
    }

    pub fn is_concrete(&self) -> bool {
        !self.is_abstract && !self.is_trait()
    }

    /// Discriminant value stored on every instance.
    pub fn real_type(&self) -> String {
        self.model_name.to_lowercase()
    }

    /// Whether read documents of this type carry reverse relationships.
    ///
    /// Child nodes are only ever read through their parent.
    pub fn exposes_reverse_relationships(&self) -> bool {
        self.kind != NodeKind::ChildNode
    }

    /// Properties read documents carry, in name order.
    pub fn projected_properties(&self) -> impl Iterator<Item = (&String, &PropertyDecl)> {
        self.properties
            .iter()
            .filter(|(name, _)| !EXCLUDED_FROM_PROJECTION.contains(&name.as_str()))
    }

    pub fn qualified_key(&self) -> String {
        super::qualified_key(&self.app_name, &self.model_name)
    }

    pub fn unqualified_key(&self) -> String {
        super::lookup_key(&self.model_name)
    }
}

/// Assemble the catalogue entry of one resolved type.
///
/// Pure over the hierarchy; relationship targets stay names and resolve
/// through the [`ModelManager`] on demand.
pub fn build_catalogue_entry(hierarchy: &Hierarchy, id: NodeTypeId) -> AppModel {
    let node_type = hierarchy.get(id);

    let mut relationships = BTreeMap::new();
    let mut child_nodes = BTreeMap::new();
    let mut related_reifications = BTreeMap::new();

    for (name, (declared_on, decl)) in hierarchy.relationships(id) {
        let target_model_name = hierarchy
            .id(&decl.target)
            .map(|target| hierarchy.name(target).to_string())
            .unwrap_or_else(|| decl.target.clone());

        let relationship = RelationshipType {
            relation_label: relation_label(&name),
            relation_name: name.clone(),
            declared_on: hierarchy.name(declared_on).to_string(),
            target_model_name,
            reverse_name: decl.reverse_key(),
            cardinality: decl.effective_cardinality(),
            edge_kind: decl.edge_kind,
            inline_createable: decl.inline_createable,
            has_relation_data: !decl.edge_properties.is_empty(),
            relation_properties: decl.edge_properties,
        };

        let section = match relationship.edge_kind {
            EdgeKind::Plain => &mut relationships,
            EdgeKind::ChildNode => &mut child_nodes,
            EdgeKind::Reification => &mut related_reifications,
        };
        section.insert(name, relationship);
    }

    let subclasses = hierarchy
        .subtypes(id)
        .into_iter()
        .map(|sub| hierarchy.name(sub).to_string())
        .collect();

    let classes_with_trait = if node_type.is_trait() {
        hierarchy
            .classes_with_trait(id)
            .into_iter()
            .map(|c| hierarchy.name(c).to_string())
            .collect()
    } else {
        BTreeSet::new()
    };

    let parent_classes = hierarchy
        .ancestors_excluding_traits(id)
        .iter()
        .filter(|a| !hierarchy.get(**a).is_trait())
        .map(|a| hierarchy.name(*a).to_string())
        .collect();

    let reverse_relationships = hierarchy
        .reverse_entries(id)
        .iter()
        .map(|(label, entry)| (label.clone(), ReverseRelationshipType::from_entry(entry)))
        .collect::<BTreeMap<_, _>>();

    debug!(
        model = %node_type.name,
        relationships = relationships.len(),
        child_nodes = child_nodes.len(),
        reverse = reverse_relationships.len(),
        "built catalogue entry"
    );

    AppModel {
        id,
        app_name: node_type.app.clone(),
        model_name: node_type.name.clone(),
        kind: node_type.kind,
        is_abstract: node_type.is_abstract,
        meta: hierarchy.meta(id),
        properties: hierarchy.own_fields(id),
        relationships,
        child_nodes,
        related_reifications,
        subclasses,
        subclass_hierarchy: SubclassHierarchy::build(hierarchy, id),
        parent_classes,
        inherited_labels: hierarchy
            .inherited_labels(id)
            .into_iter()
            .map(str::to_string)
            .collect(),
        classes_with_trait,
        reverse_relationships,
        response_schema: None,
    }
}
