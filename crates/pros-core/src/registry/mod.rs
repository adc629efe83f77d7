//! Type registry and resolved hierarchy facts.
//!
//! Registration is explicit and two-phase:
//!
//! 1. [`TypeRegistry::declare`] collects declarations as plain data and
//!    checks only what a single declaration can check on its own.
//! 2. [`TypeRegistry::resolve`] takes the complete set, resolves bases and
//!    targets by name, linearizes ancestors, builds the reverse index and
//!    rejects structurally inconsistent declarations.
//!
//! The resulting [`Hierarchy`] answers structural questions about any type
//! without touching storage.

mod linearize;
mod reverse;

pub use reverse::{ReverseEntry, ReverseIndex, ReverseSource};

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::model::{
    child_builtins, is_internal_name, lookup_key, node_builtins, validate_identifier,
    DeclarationError, EdgeKind, NodeKind, NodeTypeDecl, PropertyDecl, RelationshipDecl,
    REAL_TYPE_PROPERTY, UID_PROPERTY,
};

/// Property names a declaration may not use.
const RESERVED_NAMES: &[&str] = &[UID_PROPERTY, REAL_TYPE_PROPERTY];

/// Identity of a declared node type within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeId(pub(crate) usize);

impl NodeTypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Phase 1
// ============================================================================

/// Collects node type declarations before anything is resolved.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    decls: Vec<NodeTypeDecl>,
    by_name: HashMap<String, NodeTypeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one declaration.
    ///
    /// Bases and relationship targets may name types declared later.
    pub fn declare(&mut self, decl: NodeTypeDecl) -> Result<NodeTypeId, DeclarationError> {
        validate_identifier(&decl.name, "type")?;
        if !decl.app.is_empty() {
            validate_identifier(&decl.app, "app")?;
        }

        let key = lookup_key(&decl.name);
        if self.by_name.contains_key(&key) {
            return Err(DeclarationError::DuplicateType(decl.name));
        }

        for name in decl.properties.keys() {
            validate_identifier(name, "property")?;
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(DeclarationError::ReservedName {
                    type_name: decl.name.clone(),
                    name: name.clone(),
                });
            }
        }

        for (name, rel) in &decl.relationships {
            validate_identifier(name, "relationship")?;
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(DeclarationError::ReservedName {
                    type_name: decl.name.clone(),
                    name: name.clone(),
                });
            }
            if decl.properties.contains_key(name) {
                return Err(DeclarationError::DuplicateMember {
                    type_name: decl.name.clone(),
                    name: name.clone(),
                });
            }
            if let Some(reverse) = &rel.reverse_name {
                validate_identifier(reverse, "reverse relationship")?;
            }
            for edge_property in rel.edge_properties.keys() {
                validate_identifier(edge_property, "edge property")?;
            }
        }

        let id = NodeTypeId(self.decls.len());
        debug!(type_name = %decl.name, app = %decl.app, "declared node type");
        self.by_name.insert(key, id);
        self.decls.push(decl);
        Ok(id)
    }

    /// Add every declaration in order, stopping at the first error.
    pub fn declare_all(
        &mut self,
        decls: impl IntoIterator<Item = NodeTypeDecl>,
    ) -> Result<(), DeclarationError> {
        for decl in decls {
            self.declare(decl)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Resolve the complete declaration set.
    pub fn resolve(self) -> Result<Hierarchy, DeclarationError> {
        let TypeRegistry { decls, by_name } = self;
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();

        let mut bases = Vec::with_capacity(decls.len());
        for decl in &decls {
            let mut ids = Vec::with_capacity(decl.bases.len());
            for base in &decl.bases {
                let id = by_name.get(&lookup_key(base)).copied().ok_or_else(|| {
                    DeclarationError::UnknownBase {
                        type_name: decl.name.clone(),
                        base: base.clone(),
                    }
                })?;
                ids.push(id);
            }
            bases.push(ids);
        }

        let order = linearize::topological_order(&bases, &names)?;
        let linearizations = linearize::linearize_all(&bases, &order, &names)?;

        let mut kinds = vec![NodeKind::Node; decls.len()];
        for &id in &order {
            kinds[id.0] = resolve_kind(&decls[id.0], &bases[id.0], &kinds, &names)?;
        }

        let kept = (0..decls.len())
            .map(|i| kept_ancestors(NodeTypeId(i), &bases, &linearizations, &kinds))
            .collect::<Vec<_>>();

        let mut direct_subtypes = vec![Vec::new(); decls.len()];
        for (i, type_bases) in bases.iter().enumerate() {
            for base in type_bases {
                direct_subtypes[base.0].push(NodeTypeId(i));
            }
        }

        let types = decls
            .into_iter()
            .enumerate()
            .map(|(i, decl)| NodeType {
                id: NodeTypeId(i),
                name: decl.name,
                app: decl.app,
                kind: kinds[i],
                is_abstract: decl.is_abstract,
                bases: bases[i].clone(),
                properties: decl.properties,
                relationships: decl.relationships,
                meta: decl.meta,
            })
            .collect::<Vec<_>>();

        let mut hierarchy = Hierarchy {
            types,
            by_name,
            linearizations,
            kept,
            direct_subtypes,
            reverse: ReverseIndex::new(),
        };

        hierarchy.validate_relationships()?;
        hierarchy.build_reverse_index()?;
        hierarchy.validate_members()?;
        hierarchy.check_child_ownership()?;

        info!(
            types = hierarchy.types.len(),
            reverse_entries = hierarchy.reverse.len(),
            "resolved type hierarchy"
        );
        Ok(hierarchy)
    }
}

fn resolve_kind(
    decl: &NodeTypeDecl,
    bases: &[NodeTypeId],
    kinds: &[NodeKind],
    names: &[&str],
) -> Result<NodeKind, DeclarationError> {
    if decl.kind == Some(NodeKind::Trait) {
        if let Some(base) = bases.iter().find(|b| kinds[b.0] != NodeKind::Trait) {
            return Err(DeclarationError::TraitBase {
                type_name: decl.name.clone(),
                base: names[base.0].to_string(),
            });
        }
        return Ok(NodeKind::Trait);
    }

    let mut storage_kinds = bases
        .iter()
        .map(|b| kinds[b.0])
        .filter(|k| *k != NodeKind::Trait);
    let inherited = storage_kinds.next();
    if storage_kinds.any(|k| Some(k) != inherited) {
        return Err(DeclarationError::MixedKinds {
            type_name: decl.name.clone(),
        });
    }

    match (decl.kind, inherited) {
        (Some(explicit), Some(inherited)) if explicit != inherited => {
            Err(DeclarationError::MixedKinds {
                type_name: decl.name.clone(),
            })
        }
        (Some(explicit), _) => Ok(explicit),
        (None, Some(inherited)) => Ok(inherited),
        (None, None) => Ok(NodeKind::Node),
    }
}

/// Storage ancestors plus the trait closure of the direct trait bases.
///
/// A trait reached only through another storage type is dropped so that it
/// is not re-exposed one level further down.
fn kept_ancestors(
    id: NodeTypeId,
    bases: &[Vec<NodeTypeId>],
    linearizations: &[Vec<NodeTypeId>],
    kinds: &[NodeKind],
) -> Vec<NodeTypeId> {
    let mut capabilities = HashSet::new();
    for base in &bases[id.0] {
        if kinds[base.0] == NodeKind::Trait {
            capabilities.insert(*base);
            capabilities.extend(linearizations[base.0].iter().copied());
        }
    }

    linearizations[id.0]
        .iter()
        .copied()
        .filter(|a| kinds[a.0] != NodeKind::Trait || capabilities.contains(a))
        .collect()
}

// ============================================================================
// Phase 2
// ============================================================================

/// A resolved node type.
#[derive(Debug, Clone)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub name: String,
    pub app: String,
    pub kind: NodeKind,
    pub is_abstract: bool,
    /// Direct bases in declaration order.
    pub bases: Vec<NodeTypeId>,
    /// Properties declared on this type only.
    pub properties: BTreeMap<String, PropertyDecl>,
    /// Relationships declared on this type only.
    pub relationships: BTreeMap<String, RelationshipDecl>,
    pub meta: BTreeMap<String, Value>,
}

impl NodeType {
    pub fn is_trait(&self) -> bool {
        self.kind == NodeKind::Trait
    }

    /// Storable and returnable on its own.
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract && !self.is_trait()
    }
}

/// Structural facts about a complete, consistent set of node types.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    types: Vec<NodeType>,
    by_name: HashMap<String, NodeTypeId>,
    linearizations: Vec<Vec<NodeTypeId>>,
    kept: Vec<Vec<NodeTypeId>>,
    direct_subtypes: Vec<Vec<NodeTypeId>>,
    reverse: ReverseIndex,
}

impl Hierarchy {
    pub fn types(&self) -> &[NodeType] {
        &self.types
    }

    pub fn get(&self, id: NodeTypeId) -> &NodeType {
        &self.types[id.0]
    }

    /// Lookup by type name, normalized with [`lookup_key`].
    pub fn id(&self, name: &str) -> Option<NodeTypeId> {
        self.by_name.get(&lookup_key(name)).copied()
    }

    pub fn name(&self, id: NodeTypeId) -> &str {
        &self.types[id.0].name
    }

    /// Full ancestor linearization, nearest first, traits included.
    pub fn linearization(&self, id: NodeTypeId) -> &[NodeTypeId] {
        &self.linearizations[id.0]
    }

    /// Storage ancestors, nearest first, plus traits reachable through a
    /// direct trait base.
    pub fn ancestors_excluding_traits(&self, id: NodeTypeId) -> &[NodeTypeId] {
        &self.kept[id.0]
    }

    /// Storage labels of a node of this type: itself, then kept ancestors.
    pub fn inherited_labels(&self, id: NodeTypeId) -> Vec<&str> {
        std::iter::once(id)
            .chain(self.kept[id.0].iter().copied())
            .map(|a| self.name(a))
            .collect()
    }

    // The type itself followed by its kept ancestors.
    fn chain(&self, id: NodeTypeId) -> impl Iterator<Item = &NodeType> + '_ {
        std::iter::once(id)
            .chain(self.kept[id.0].iter().copied())
            .map(move |a| &self.types[a.0])
    }

    /// Effective scalar fields, nearest declaration winning.
    ///
    /// Includes the built-in fields of the type's storage kind and leaves out
    /// the identifier and internal (trailing underscore) names.
    pub fn own_fields(&self, id: NodeTypeId) -> BTreeMap<String, PropertyDecl> {
        let mut fields = BTreeMap::new();
        for ancestor in self.chain(id) {
            for (name, property) in &ancestor.properties {
                if name == UID_PROPERTY || is_internal_name(name) {
                    continue;
                }
                fields
                    .entry(name.clone())
                    .or_insert_with(|| property.clone());
            }
        }

        let builtins = match self.types[id.0].kind {
            NodeKind::Node | NodeKind::Reification => node_builtins(),
            NodeKind::ChildNode => child_builtins(),
            NodeKind::Trait => Vec::new(),
        };
        for (name, property) in builtins {
            fields.entry(name.to_string()).or_insert(property);
        }
        fields
    }

    /// Effective forward relationships, nearest declaration winning.
    ///
    /// Each value carries the name of the type that declared it.
    pub fn relationships(&self, id: NodeTypeId) -> BTreeMap<String, (NodeTypeId, RelationshipDecl)> {
        let mut relationships = BTreeMap::new();
        for ancestor in self.chain(id) {
            for (name, rel) in &ancestor.relationships {
                relationships
                    .entry(name.clone())
                    .or_insert_with(|| (ancestor.id, rel.clone()));
            }
        }
        relationships
    }

    /// Metadata merged along the same chain as fields.
    pub fn meta(&self, id: NodeTypeId) -> BTreeMap<String, Value> {
        let mut meta = BTreeMap::new();
        for ancestor in self.chain(id) {
            for (key, value) in &ancestor.meta {
                meta.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        meta
    }

    /// Types declaring `id` as a direct base.
    pub fn direct_subtypes(&self, id: NodeTypeId) -> &[NodeTypeId] {
        &self.direct_subtypes[id.0]
    }

    /// Transitive subclasses; for a trait, the classes with that trait.
    pub fn subtypes(&self, id: NodeTypeId) -> BTreeSet<NodeTypeId> {
        if self.types[id.0].is_trait() {
            return self.classes_with_trait(id);
        }
        self.types
            .iter()
            .filter(|t| self.linearizations[t.id.0].contains(&id))
            .map(|t| t.id)
            .collect()
    }

    /// Non-trait types carrying `trait_id` as a capability.
    pub fn classes_with_trait(&self, trait_id: NodeTypeId) -> BTreeSet<NodeTypeId> {
        self.types
            .iter()
            .filter(|t| !t.is_trait() && self.kept[t.id.0].contains(&trait_id))
            .map(|t| t.id)
            .collect()
    }

    /// Concrete types a value declared as `id` can actually be.
    ///
    /// The type itself when concrete plus its concrete subtypes; for a trait,
    /// the concrete classes with that trait.
    pub fn concrete_members(&self, id: NodeTypeId) -> BTreeSet<NodeTypeId> {
        let mut members = self.subtypes(id);
        members.insert(id);
        members.retain(|m| self.types[m.0].is_concrete());
        members
    }

    /// Peer reverse entries: this type's own bucket merged with those of its
    /// kept ancestors, nearest winning.
    pub fn reverse_entries(&self, id: NodeTypeId) -> BTreeMap<String, ReverseEntry> {
        self.merged_reverse(id, ReverseIndex::peer_entries)
    }

    /// Child-node and reification reverse entries, merged the same way.
    pub fn structural_reverse_entries(&self, id: NodeTypeId) -> BTreeMap<String, ReverseEntry> {
        self.merged_reverse(id, ReverseIndex::structural_entries)
    }

    fn merged_reverse(
        &self,
        id: NodeTypeId,
        bucket: fn(&ReverseIndex, NodeTypeId) -> Option<&BTreeMap<String, ReverseEntry>>,
    ) -> BTreeMap<String, ReverseEntry> {
        let mut merged = BTreeMap::new();
        for ancestor in self.chain(id) {
            if let Some(entries) = bucket(&self.reverse, ancestor.id) {
                for (label, entry) in entries {
                    merged
                        .entry(label.clone())
                        .or_insert_with(|| entry.clone());
                }
            }
        }
        merged
    }

    pub fn reverse_index(&self) -> &ReverseIndex {
        &self.reverse
    }

    /// Register an extra forward declaration in the reverse index.
    ///
    /// Meant for out-of-band types in tests; pair with
    /// [`Hierarchy::retract_relationship`].
    pub fn register_relationship(
        &mut self,
        source: NodeTypeId,
        relation_name: &str,
        decl: &RelationshipDecl,
    ) -> Result<(), DeclarationError> {
        let source_type = &self.types[source.0];
        let target = self
            .id(&decl.target)
            .ok_or_else(|| DeclarationError::UnknownTarget {
                type_name: source_type.name.clone(),
                relationship: relation_name.to_string(),
                target: decl.target.clone(),
            })?;
        let reverse_source = ReverseSource {
            id: source,
            name: source_type.name.clone(),
        };
        let target_name = self.types[target.0].name.clone();
        self.reverse
            .register(reverse_source, relation_name, decl, target, &target_name)
    }

    /// Undo [`Hierarchy::register_relationship`].
    pub fn retract_relationship(&mut self, source: NodeTypeId, relation_name: &str) -> bool {
        self.reverse.retract(source, relation_name)
    }

    // ------------------------------------------------------------------------
    // Resolution passes
    // ------------------------------------------------------------------------

    fn validate_relationships(&self) -> Result<(), DeclarationError> {
        for node_type in &self.types {
            for (name, rel) in &node_type.relationships {
                let target = self
                    .id(&rel.target)
                    .ok_or_else(|| DeclarationError::UnknownTarget {
                        type_name: node_type.name.clone(),
                        relationship: name.clone(),
                        target: rel.target.clone(),
                    })?;
                let target_kind = self.types[target.0].kind;

                if node_type.is_trait() && rel.edge_kind != EdgeKind::Plain {
                    return Err(DeclarationError::TraitEdge {
                        type_name: node_type.name.clone(),
                        relationship: name.clone(),
                    });
                }

                match rel.edge_kind {
                    EdgeKind::ChildNode if target_kind != NodeKind::ChildNode => {
                        return Err(DeclarationError::NotAChildType {
                            type_name: node_type.name.clone(),
                            relationship: name.clone(),
                            target: rel.target.clone(),
                        });
                    }
                    EdgeKind::Plain | EdgeKind::Reification => {
                        if target_kind == NodeKind::ChildNode {
                            return Err(DeclarationError::ChildTarget {
                                type_name: node_type.name.clone(),
                                relationship: name.clone(),
                                target: rel.target.clone(),
                            });
                        }
                        if rel.reverse_name.is_none() {
                            return Err(DeclarationError::MissingReverseName {
                                type_name: node_type.name.clone(),
                                relationship: name.clone(),
                            });
                        }
                    }
                    EdgeKind::ChildNode => {}
                }
            }
        }
        Ok(())
    }

    fn build_reverse_index(&mut self) -> Result<(), DeclarationError> {
        let declarations: Vec<(NodeTypeId, String, RelationshipDecl)> = self
            .types
            .iter()
            .flat_map(|t| {
                t.relationships
                    .iter()
                    .map(move |(name, rel)| (t.id, name.clone(), rel.clone()))
            })
            .collect();

        for (source, name, rel) in declarations {
            self.register_relationship(source, &name, &rel)?;
        }
        Ok(())
    }

    fn validate_members(&self) -> Result<(), DeclarationError> {
        for node_type in &self.types {
            let fields = self.own_fields(node_type.id);
            let relationships = self.relationships(node_type.id);

            if let Some(name) = relationships.keys().find(|n| fields.contains_key(*n)) {
                return Err(DeclarationError::DuplicateMember {
                    type_name: node_type.name.clone(),
                    name: name.clone(),
                });
            }

            for label in self.reverse_entries(node_type.id).keys() {
                if label == UID_PROPERTY
                    || fields.contains_key(label)
                    || relationships.contains_key(label)
                {
                    return Err(DeclarationError::ReverseNameCollision {
                        target: node_type.name.clone(),
                        reverse_label: label.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Child documents nest fully, so child edges must not loop.
    fn check_child_ownership(&self) -> Result<(), DeclarationError> {
        let owned: Vec<Vec<NodeTypeId>> = self
            .types
            .iter()
            .map(|t| {
                self.relationships(t.id)
                    .values()
                    .filter(|(_, rel)| rel.edge_kind == EdgeKind::ChildNode)
                    .filter_map(|(_, rel)| self.id(&rel.target))
                    .flat_map(|target| {
                        let mut members = self.subtypes(target);
                        members.insert(target);
                        members
                    })
                    .collect()
            })
            .collect();

        let names: Vec<&str> = self.types.iter().map(|t| t.name.as_str()).collect();
        linearize::topological_order(&owned, &names)
            .map(|_| ())
            .map_err(|err| match err {
                DeclarationError::Cycle(path) => DeclarationError::ChildOwnershipCycle(path),
                other => other,
            })
    }
}
