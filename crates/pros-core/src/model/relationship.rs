//! Forward relationship declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::property::PropertyDecl;

/// How many neighbors a relationship may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one.
    One,
    /// Zero or one.
    ZeroOrOne,
    /// Any number.
    #[default]
    ZeroOrMore,
    /// At least one.
    OneOrMore,
}

impl Cardinality {
    pub fn min_items(&self) -> Option<usize> {
        match self {
            Cardinality::One | Cardinality::OneOrMore => Some(1),
            Cardinality::ZeroOrOne | Cardinality::ZeroOrMore => None,
        }
    }

    pub fn max_items(&self) -> Option<usize> {
        match self {
            Cardinality::One | Cardinality::ZeroOrOne => Some(1),
            Cardinality::ZeroOrMore | Cardinality::OneOrMore => None,
        }
    }
}

/// What an edge means, which decides the catalogue section it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Edge to a peer entity.
    #[default]
    Plain,
    /// Edge to an exclusively owned nested entity.
    ChildNode,
    /// Edge to an entity modelling a fact about a relation.
    Reification,
}

/// Storage label of a relationship: its name upper-cased.
pub fn relation_label(name: &str) -> String {
    name.to_uppercase()
}

/// One forward edge declared on a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDecl {
    /// Target type name, resolved after all declarations are collected.
    pub target: String,

    /// Attribute name on the target's side; required for plain and
    /// reification edges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_name: Option<String>,

    /// Defaults to exactly-one for child edges and zero-or-more otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,

    #[serde(default)]
    pub edge_kind: EdgeKind,

    /// Whether the target may be created inline from the source's form.
    #[serde(default)]
    pub inline_createable: bool,

    /// Properties carried on the edge itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub edge_properties: BTreeMap<String, PropertyDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl RelationshipDecl {
    fn new(target: impl Into<String>, reverse_name: Option<String>, edge_kind: EdgeKind) -> Self {
        Self {
            target: target.into(),
            reverse_name,
            cardinality: None,
            edge_kind,
            inline_createable: false,
            edge_properties: BTreeMap::new(),
            help_text: None,
        }
    }

    /// Plain edge to a peer.
    pub fn to(target: impl Into<String>, reverse_name: impl Into<String>) -> Self {
        Self::new(target, Some(reverse_name.into()), EdgeKind::Plain)
    }

    /// Edge to an owned child node.
    pub fn child(target: impl Into<String>) -> Self {
        Self::new(target, None, EdgeKind::ChildNode)
    }

    /// Edge to a reification.
    pub fn reification(target: impl Into<String>, reverse_name: impl Into<String>) -> Self {
        Self::new(target, Some(reverse_name.into()), EdgeKind::Reification)
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn inline_createable(mut self) -> Self {
        self.inline_createable = true;
        self
    }

    pub fn with_edge_property(mut self, name: impl Into<String>, property: PropertyDecl) -> Self {
        self.edge_properties.insert(name.into(), property);
        self
    }

    pub fn with_help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    pub fn effective_cardinality(&self) -> Cardinality {
        self.cardinality.unwrap_or(match self.edge_kind {
            EdgeKind::ChildNode => Cardinality::One,
            EdgeKind::Plain | EdgeKind::Reification => Cardinality::ZeroOrMore,
        })
    }

    /// Reverse key on the target: the reverse name lower-cased.
    pub fn reverse_key(&self) -> Option<String> {
        self.reverse_name.as_ref().map(|name| name.to_lowercase())
    }
}
