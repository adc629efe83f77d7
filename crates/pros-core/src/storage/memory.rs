//! In-memory graph store.
//!
//! Nodes and edges live in a `petgraph` directed graph indexed by
//! identifier. Reads interpret the [`ReadQuery`] plan directly instead of
//! parsing query text, which makes the store a faithful stand-in for the
//! database in tests and local tooling.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde_json::{Map, Value};
use tracing::debug;

use super::{GraphDriver, Row, StorageError};
use crate::catalogue::{validate_edge_properties, AppModel, NodeRecord, RecordError};
use crate::model::RELATIONSHIP_DATA_KEY;
use crate::query::{Direction, ReadQuery, SubFetch};

#[derive(Debug, Clone)]
struct StoredNode {
    labels: Vec<String>,
    properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
struct StoredEdge {
    label: String,
    properties: Map<String, Value>,
}

#[derive(Debug, Default)]
struct GraphState {
    graph: DiGraph<StoredNode, StoredEdge>,
    uids: HashMap<String, NodeIndex>,
}

/// Graph store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `properties` against `model` and store the node.
    ///
    /// Returns the node's identifier.
    pub fn create(
        &self,
        model: &AppModel,
        properties: Map<String, Value>,
    ) -> Result<String, StorageError> {
        let record = NodeRecord::new(model, properties)?;
        self.insert(record)
    }

    /// Store an already validated record.
    pub fn insert(&self, record: NodeRecord) -> Result<String, StorageError> {
        let uid = record
            .uid()
            .map(str::to_string)
            .ok_or_else(|| StorageError::Decode("record has no identifier".to_string()))?;

        let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
        if state.uids.contains_key(&uid) {
            return Err(StorageError::DuplicateUid(uid));
        }

        let index = state.graph.add_node(StoredNode {
            labels: record.labels,
            properties: record.properties,
        });
        state.uids.insert(uid.clone(), index);
        debug!(uid = %uid, model = %record.model_name, "stored node");
        Ok(uid)
    }

    /// Add an edge with `label` between two stored nodes.
    pub fn relate(
        &self,
        from: &str,
        label: &str,
        to: &str,
        properties: Map<String, Value>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
        let source = *state
            .uids
            .get(from)
            .ok_or_else(|| StorageError::NodeNotFound(from.to_string()))?;
        let target = *state
            .uids
            .get(to)
            .ok_or_else(|| StorageError::NodeNotFound(to.to_string()))?;

        state.graph.add_edge(
            source,
            target,
            StoredEdge {
                label: label.to_string(),
                properties,
            },
        );
        Ok(())
    }

    /// Add the edge `model.relation_name` from `from` to `to`, validating
    /// its edge properties.
    pub fn connect(
        &self,
        model: &AppModel,
        from: &str,
        relation_name: &str,
        to: &str,
        properties: Map<String, Value>,
    ) -> Result<(), StorageError> {
        let relationship = model
            .relationships
            .get(relation_name)
            .or_else(|| model.child_nodes.get(relation_name))
            .or_else(|| model.related_reifications.get(relation_name))
            .ok_or_else(|| RecordError::UnknownRelationship {
                model: model.model_name.clone(),
                relationship: relation_name.to_string(),
            })?;

        let properties = validate_edge_properties(relationship, properties)?;
        self.relate(from, &relationship.relation_label, to, properties)
    }

    /// Stored properties of one node.
    pub fn properties(&self, uid: &str) -> Result<Option<Map<String, Value>>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::Poisoned)?;
        Ok(state
            .uids
            .get(uid)
            .map(|index| state.graph[*index].properties.clone()))
    }

    pub fn node_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.graph.node_count())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.state
            .read()
            .map(|state| state.graph.edge_count())
            .unwrap_or_default()
    }

    fn read_document(&self, query: &ReadQuery, uid: &str) -> Result<Option<Value>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::Poisoned)?;
        let Some(&index) = state.uids.get(uid) else {
            return Ok(None);
        };

        let node = &state.graph[index];
        if !node.labels.iter().any(|label| *label == query.label) {
            return Ok(None);
        }

        let mut document = project(&node.properties, &query.properties);
        for fetch in &query.fetches {
            document.insert(fetch.key.clone(), collect(&state.graph, index, fetch));
        }
        Ok(Some(Value::Object(document)))
    }
}

/// Map projection: missing properties come back as null.
fn project(properties: &Map<String, Value>, keys: &[String]) -> Map<String, Value> {
    keys.iter()
        .map(|key| (key.clone(), properties.get(key).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn collect(graph: &DiGraph<StoredNode, StoredEdge>, index: NodeIndex, fetch: &SubFetch) -> Value {
    let direction = match fetch.direction {
        Direction::Outgoing => petgraph::Direction::Outgoing,
        Direction::Incoming => petgraph::Direction::Incoming,
    };

    let mut items: Vec<Value> = graph
        .edges_directed(index, direction)
        .filter(|edge| edge.weight().label == fetch.label)
        .filter_map(|edge| {
            let neighbor = match fetch.direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            };
            let node = &graph[neighbor];

            let (properties, owns): (&[String], Option<&[String]>) = if fetch.variants.is_empty() {
                (fetch.properties.as_slice(), None)
            } else {
                // Same first-match-by-label rule as the rendered CASE.
                let variant = fetch
                    .variants
                    .iter()
                    .find(|v| node.labels.contains(&v.label))?;
                (variant.properties.as_slice(), Some(variant.nested.as_slice()))
            };

            let mut item = project(&node.properties, properties);
            if !fetch.edge_properties.is_empty() {
                item.insert(
                    RELATIONSHIP_DATA_KEY.to_string(),
                    Value::Object(project(&edge.weight().properties, &fetch.edge_properties)),
                );
            }
            for nested in &fetch.nested {
                if owns.is_some_and(|keys| !keys.contains(&nested.key)) {
                    continue;
                }
                item.insert(nested.key.clone(), collect(graph, neighbor, nested));
            }
            Some(Value::Object(item))
        })
        .collect();

    // petgraph walks adjacency lists newest first.
    items.reverse();
    Value::Array(items)
}

#[async_trait]
impl GraphDriver for MemoryGraph {
    async fn execute(
        &self,
        _statement: &str,
        _parameters: Map<String, Value>,
    ) -> Result<Vec<Row>, StorageError> {
        Err(StorageError::Unsupported(
            "the memory graph reads query plans, not query text".to_string(),
        ))
    }

    async fn read(&self, query: &ReadQuery, uid: &str) -> Result<Option<Value>, StorageError> {
        self.read_document(query, uid)
    }
}
