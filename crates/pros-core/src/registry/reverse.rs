//! Reverse relationship index.
//!
//! Every forward declaration leaves an entry on its target, keyed by the
//! reverse label. Plain edges land in the peer bucket; child-node and
//! reification edges land in a separate structural bucket so they never show
//! up as peer navigation.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::NodeTypeId;
use crate::model::{
    relation_label, Cardinality, DeclarationError, EdgeKind, PropertyDecl, RelationshipDecl,
};

/// A type that forward-declares an edge behind a reverse entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseSource {
    pub id: NodeTypeId,
    pub name: String,
}

/// One derived reverse entry on a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseEntry {
    /// Lower-cased reverse name, the key on the target's side.
    pub reverse_label: String,
    /// Storage label of the forward edge.
    pub forward_label: String,
    /// Attribute name on the source side.
    pub source_relation_name: String,
    /// Declaring types, in registration order.
    pub sources: Vec<ReverseSource>,
    pub cardinality: Cardinality,
    pub edge_kind: EdgeKind,
    pub edge_properties: BTreeMap<String, PropertyDecl>,
}

type Bucket = BTreeMap<String, ReverseEntry>;

/// Target type -> reverse label -> entry.
#[derive(Debug, Clone, Default)]
pub struct ReverseIndex {
    peer: HashMap<NodeTypeId, Bucket>,
    structural: HashMap<NodeTypeId, Bucket>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the forward declaration `source.relation_name -> target`.
    ///
    /// A second declaration under the same reverse label merges into the
    /// existing entry when it describes the same edge (same forward label and
    /// edge properties); anything else is a conflict.
    pub fn register(
        &mut self,
        source: ReverseSource,
        relation_name: &str,
        decl: &RelationshipDecl,
        target: NodeTypeId,
        target_name: &str,
    ) -> Result<(), DeclarationError> {
        let reverse_label = decl
            .reverse_key()
            .unwrap_or_else(|| relation_name.to_lowercase());
        let forward_label = relation_label(relation_name);

        let bucket = match decl.edge_kind {
            EdgeKind::Plain => self.peer.entry(target).or_default(),
            EdgeKind::ChildNode | EdgeKind::Reification => {
                self.structural.entry(target).or_default()
            }
        };

        if let Some(existing) = bucket.get_mut(&reverse_label) {
            let same_edge = existing.forward_label == forward_label
                && existing.edge_kind == decl.edge_kind
                && existing.edge_properties == decl.edge_properties;
            if !same_edge {
                let first = existing
                    .sources
                    .first()
                    .map(|s| s.name.as_str())
                    .unwrap_or_default();
                return Err(DeclarationError::ConflictingReverseLabel {
                    target: target_name.to_string(),
                    reverse_label,
                    existing: format!("{}.{}", first, existing.source_relation_name),
                    incoming: format!("{}.{}", source.name, relation_name),
                });
            }
            if !existing.sources.contains(&source) {
                debug!(
                    target_type = target_name,
                    reverse_label = %reverse_label,
                    source = %source.name,
                    "merged reverse entry"
                );
                existing.sources.push(source);
            }
            return Ok(());
        }

        debug!(
            target_type = target_name,
            reverse_label = %reverse_label,
            source = %source.name,
            forward_label = %forward_label,
            "registered reverse entry"
        );
        bucket.insert(
            reverse_label.clone(),
            ReverseEntry {
                reverse_label,
                forward_label,
                source_relation_name: relation_name.to_string(),
                sources: vec![source],
                cardinality: decl.effective_cardinality(),
                edge_kind: decl.edge_kind,
                edge_properties: decl.edge_properties.clone(),
            },
        );
        Ok(())
    }

    /// Remove `source`'s contribution made through `relation_name`.
    ///
    /// Entries left without any source are dropped. Returns whether anything
    /// was removed.
    pub fn retract(&mut self, source: NodeTypeId, relation_name: &str) -> bool {
        let mut removed = false;
        for bucket in self.peer.values_mut().chain(self.structural.values_mut()) {
            bucket.retain(|_, entry| {
                if entry.source_relation_name == relation_name {
                    let before = entry.sources.len();
                    entry.sources.retain(|s| s.id != source);
                    removed |= entry.sources.len() != before;
                }
                !entry.sources.is_empty()
            });
        }
        self.peer.retain(|_, bucket| !bucket.is_empty());
        self.structural.retain(|_, bucket| !bucket.is_empty());
        removed
    }

    /// Peer entries declared directly against `target`.
    pub fn peer_entries(&self, target: NodeTypeId) -> Option<&BTreeMap<String, ReverseEntry>> {
        self.peer.get(&target)
    }

    /// Child-node and reification entries declared directly against `target`.
    pub fn structural_entries(
        &self,
        target: NodeTypeId,
    ) -> Option<&BTreeMap<String, ReverseEntry>> {
        self.structural.get(&target)
    }

    /// Total number of entries across both buckets.
    pub fn len(&self) -> usize {
        self.peer
            .values()
            .chain(self.structural.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
