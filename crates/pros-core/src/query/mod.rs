//! Read query templates.
//!
//! A [`ReadQuery`] is a plan for fetching one root node by identifier with
//! every relation collapsed into arrays keyed by relation name:
//!
//! - each forward relationship, with the neighbors' own forward
//!   relationships one level further down
//! - each child node, recursively, with the children's forward
//!   relationships one level down; a child whose concrete types differ is
//!   projected per type
//! - each reverse relationship
//!
//! The plan is rendered once into Cypher ([`ReadQuery::text`]) and can also
//! be interpreted directly by drivers that do not speak Cypher.

mod cypher;
mod template;

pub use template::QueryTemplate;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::catalogue::{
    AppModel, ModelKey, ModelManager, ModelManagerError, RelationshipType, ReverseRelationshipType,
};
use crate::model::{LABEL_PROPERTY, REAL_TYPE_PROPERTY, RELATIONSHIP_DATA_KEY, UID_PROPERTY};

/// Errors raised while building read queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A referenced type has no catalogue entry.
    #[error(transparent)]
    Lookup(#[from] ModelManagerError),

    /// Traits have no stored instances to read.
    #[error("Trait {0} cannot be read directly")]
    TraitQuery(String),

    /// Abstract types are only read as one of their concrete subtypes.
    #[error("Abstract type {0} cannot be read directly")]
    AbstractQuery(String),
}

/// Which section of the catalogue a sub-fetch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Relationship,
    ChildNode,
    ReverseRelationship,
}

/// Edge direction as seen from the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One independent neighbor fetch collapsed into an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubFetch {
    /// Key of the array in the parent document.
    pub key: String,
    pub kind: FetchKind,
    /// Storage label of the edge.
    pub label: String,
    pub direction: Direction,
    /// Keys from the root joined by `__`; unique within one query.
    pub path: String,
    /// Neighbor properties, identifier first.
    pub properties: Vec<String>,
    /// Edge properties, nested under the relationship data key.
    pub edge_properties: Vec<String>,
    pub nested: Vec<SubFetch>,
    /// Per-member projections of a polymorphic child fetch, most specific
    /// label first. Empty when every item shares `properties`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<FetchVariant>,
}

/// Projection of one concrete member of a polymorphic child fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchVariant {
    /// Storage label selecting this member.
    pub label: String,
    pub properties: Vec<String>,
    /// Keys of the nested fetches this member owns.
    pub nested: Vec<String>,
}

impl FetchVariant {
    pub fn document_keys(&self) -> BTreeSet<&str> {
        self.properties
            .iter()
            .chain(&self.nested)
            .map(String::as_str)
            .collect()
    }
}

impl SubFetch {
    pub fn node_variable(&self) -> String {
        format!("{}_internal", self.path)
    }

    pub fn relation_variable(&self) -> String {
        format!("{}_relation", self.path)
    }

    /// Name the collected array is returned under.
    pub fn alias(&self) -> &str {
        &self.path
    }

    /// Keys of each collected item.
    pub fn document_keys(&self) -> BTreeSet<&str> {
        let mut keys: BTreeSet<&str> = self.properties.iter().map(String::as_str).collect();
        if !self.edge_properties.is_empty() {
            keys.insert(RELATIONSHIP_DATA_KEY);
        }
        keys.extend(self.nested.iter().map(|n| n.key.as_str()));
        keys
    }

    /// Keys of an item whose concrete type is `model_name`.
    pub fn item_keys(&self, model_name: &str) -> BTreeSet<&str> {
        match self.variant(model_name) {
            Some(variant) => variant.document_keys(),
            None => self.document_keys(),
        }
    }

    pub fn variant(&self, label: &str) -> Option<&FetchVariant> {
        self.variants.iter().find(|v| v.label == label)
    }
}

/// Plan and rendered text of a read query for one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadQuery {
    pub model_name: String,
    /// Storage label matched for the root.
    pub label: String,
    pub properties: Vec<String>,
    pub fetches: Vec<SubFetch>,
    text: String,
}

impl ReadQuery {
    /// Rendered Cypher text, parameterized by `$uid`.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self, uid: &str) -> Map<String, Value> {
        let mut parameters = Map::new();
        parameters.insert(UID_PROPERTY.to_string(), Value::String(uid.to_string()));
        parameters
    }

    /// Keys of the returned root document.
    pub fn document_keys(&self) -> BTreeSet<&str> {
        let mut keys: BTreeSet<&str> = self.properties.iter().map(String::as_str).collect();
        keys.extend(self.fetches.iter().map(|f| f.key.as_str()));
        keys
    }

    pub fn fetch(&self, key: &str) -> Option<&SubFetch> {
        self.fetches.iter().find(|f| f.key == key)
    }
}

/// Build the read query of one catalogue entry.
pub fn build_read_query<'k>(
    manager: &ModelManager,
    key: impl Into<ModelKey<'k>>,
) -> Result<ReadQuery, QueryError> {
    let model = manager.get_model(key)?;
    if model.is_trait() {
        return Err(QueryError::TraitQuery(model.model_name.clone()));
    }
    if model.is_abstract {
        return Err(QueryError::AbstractQuery(model.model_name.clone()));
    }

    let mut properties = vec![UID_PROPERTY.to_string()];
    properties.extend(model.projected_properties().map(|(name, _)| name.clone()));

    let mut fetches = Vec::new();
    for relationship in model.relationships.values() {
        fetches.push(relationship_fetch(manager, "", relationship, true)?);
    }
    for child in model.child_nodes.values() {
        fetches.push(child_fetch(manager, "", child)?);
    }
    if model.exposes_reverse_relationships() {
        for reverse in model.reverse_relationships.values() {
            fetches.push(reverse_fetch(manager, reverse)?);
        }
    }

    let mut query = ReadQuery {
        model_name: model.model_name.clone(),
        label: model.model_name.clone(),
        properties,
        fetches,
        text: String::new(),
    };
    query.text = cypher::render(&query);

    debug!(
        model = %query.model_name,
        fetches = query.fetches.len(),
        "built read query"
    );
    Ok(query)
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}__{}", parent, key)
    }
}

/// Identifier, then every projected property of one member.
fn own_projection(member: &AppModel) -> Vec<String> {
    member_projection(&[member])
}

/// Identifier, then every projected property of any member, in name order.
fn member_projection(members: &[&AppModel]) -> Vec<String> {
    let names: BTreeSet<&String> = members
        .iter()
        .flat_map(|m| m.projected_properties().map(|(name, _)| name))
        .collect();
    std::iter::once(UID_PROPERTY.to_string())
        .chain(names.into_iter().filter(|n| *n != UID_PROPERTY).cloned())
        .collect()
}

/// Member projection widened to the relation view keys, which every
/// neighbor document carries even when a member type lacks one of them.
fn view_projection(members: &[&AppModel]) -> Vec<String> {
    let mut properties = member_projection(members);
    for key in [REAL_TYPE_PROPERTY, LABEL_PROPERTY] {
        if !properties.iter().any(|p| p == key) {
            properties.push(key.to_string());
        }
    }
    properties
}

fn relationships_of(model: &AppModel) -> &BTreeMap<String, RelationshipType> {
    &model.relationships
}

fn child_nodes_of(model: &AppModel) -> &BTreeMap<String, RelationshipType> {
    &model.child_nodes
}

/// A section of every member merged by name, first member winning.
fn merged_section<'a>(
    members: &[&'a AppModel],
    section: fn(&AppModel) -> &BTreeMap<String, RelationshipType>,
) -> Vec<&'a RelationshipType> {
    let mut merged: BTreeMap<&str, &'a RelationshipType> = BTreeMap::new();
    for &member in members {
        for (name, relationship) in section(member) {
            merged.entry(name.as_str()).or_insert(relationship);
        }
    }
    merged.into_values().collect()
}

/// One projection per member of a polymorphic child edge.
///
/// A subtype is ordered before any member it extends: its nodes carry that
/// member's label as well.
fn child_variants(members: &[&AppModel]) -> Vec<FetchVariant> {
    if members.len() < 2 {
        return Vec::new();
    }

    let mut ordered = members.to_vec();
    ordered.sort_by(|a, b| {
        b.inherited_labels
            .len()
            .cmp(&a.inherited_labels.len())
            .then_with(|| a.model_name.cmp(&b.model_name))
    });
    ordered
        .into_iter()
        .map(|member| FetchVariant {
            label: member.model_name.clone(),
            properties: own_projection(member),
            nested: member
                .relationships
                .keys()
                .chain(member.child_nodes.keys())
                .cloned()
                .collect(),
        })
        .collect()
}

fn relationship_fetch(
    manager: &ModelManager,
    parent: &str,
    relationship: &RelationshipType,
    nest: bool,
) -> Result<SubFetch, QueryError> {
    let members = relationship.target_members(manager)?;
    let path = join_path(parent, &relationship.relation_name);

    let mut nested = Vec::new();
    if nest {
        for inner in merged_section(&members, relationships_of) {
            nested.push(relationship_fetch(manager, &path, inner, false)?);
        }
    }

    Ok(SubFetch {
        key: relationship.relation_name.clone(),
        kind: FetchKind::Relationship,
        label: relationship.relation_label.clone(),
        direction: Direction::Outgoing,
        properties: view_projection(&members),
        edge_properties: relationship.relation_properties.keys().cloned().collect(),
        path,
        nested,
        variants: Vec::new(),
    })
}

fn child_fetch(
    manager: &ModelManager,
    parent: &str,
    child: &RelationshipType,
) -> Result<SubFetch, QueryError> {
    let members = child.target_members(manager)?;
    let path = join_path(parent, &child.relation_name);

    let mut nested = Vec::new();
    for inner in merged_section(&members, relationships_of) {
        nested.push(relationship_fetch(manager, &path, inner, false)?);
    }
    for grandchild in merged_section(&members, child_nodes_of) {
        nested.push(child_fetch(manager, &path, grandchild)?);
    }

    Ok(SubFetch {
        key: child.relation_name.clone(),
        kind: FetchKind::ChildNode,
        label: child.relation_label.clone(),
        direction: Direction::Outgoing,
        properties: member_projection(&members),
        // Child documents are full schemas; edge data is not part of them.
        edge_properties: Vec::new(),
        path,
        nested,
        variants: child_variants(&members),
    })
}

fn reverse_fetch(
    manager: &ModelManager,
    reverse: &ReverseRelationshipType,
) -> Result<SubFetch, QueryError> {
    let members = reverse.source_members(manager)?;
    Ok(SubFetch {
        key: reverse.reverse_relationship_label.clone(),
        kind: FetchKind::ReverseRelationship,
        label: reverse.forward_relationship_label.clone(),
        direction: Direction::Incoming,
        path: reverse.reverse_relationship_label.clone(),
        properties: view_projection(&members),
        edge_properties: reverse.relation_properties.keys().cloned().collect(),
        nested: Vec::new(),
        variants: Vec::new(),
    })
}
