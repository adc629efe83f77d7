//! Node type declarations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::property::PropertyDecl;
use super::relationship::RelationshipDecl;

/// Storage role of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Independently stored entity.
    Node,
    /// Capability mixin with no storage identity of its own.
    Trait,
    /// Entity exclusively owned by a parent.
    ChildNode,
    /// Entity describing a fact about a relation.
    Reification,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Node => "node",
            NodeKind::Trait => "trait",
            NodeKind::ChildNode => "child_node",
            NodeKind::Reification => "reification",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared node type, as written by the application author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeDecl {
    pub name: String,

    /// Owning application, stamped by the loader when left empty.
    #[serde(default)]
    pub app: String,

    /// Direct bases in declaration order; node types and traits alike.
    #[serde(default)]
    pub bases: Vec<String>,

    /// Inherited from the first storage base when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDecl>,

    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipDecl>,

    /// Free-form metadata such as `display_name_plural`.
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

impl NodeTypeDecl {
    fn with_kind(name: impl Into<String>, kind: Option<NodeKind>) -> Self {
        Self {
            name: name.into(),
            app: String::new(),
            bases: Vec::new(),
            kind,
            is_abstract: false,
            properties: BTreeMap::new(),
            relationships: BTreeMap::new(),
            meta: BTreeMap::new(),
        }
    }

    /// A type whose kind follows its bases (`node` for roots).
    pub fn node(name: impl Into<String>) -> Self {
        Self::with_kind(name, None)
    }

    pub fn new_trait(name: impl Into<String>) -> Self {
        Self::with_kind(name, Some(NodeKind::Trait))
    }

    pub fn child_node(name: impl Into<String>) -> Self {
        Self::with_kind(name, Some(NodeKind::ChildNode))
    }

    pub fn reification(name: impl Into<String>) -> Self {
        Self::with_kind(name, Some(NodeKind::Reification))
    }

    pub fn in_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn property(mut self, name: impl Into<String>, property: PropertyDecl) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    pub fn relationship(mut self, name: impl Into<String>, relationship: RelationshipDecl) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Contents of one app's declaration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsFile {
    #[serde(default)]
    pub types: Vec<NodeTypeDecl>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, EdgeKind, PropertyKind};

    #[test]
    fn test_builder() {
        let decl = NodeTypeDecl::node("Person")
            .in_app("test_app")
            .extends("Animal")
            .property("name", PropertyDecl::string())
            .relationship(
                "has_books",
                RelationshipDecl::to("Book", "book_belongs_to_person")
                    .with_cardinality(Cardinality::OneOrMore),
            )
            .meta("display_name_plural", "People");

        assert_eq!(decl.app, "test_app");
        assert_eq!(decl.bases, vec!["Animal"]);
        assert_eq!(decl.kind, None);
        assert!(decl.properties.contains_key("name"));
        assert_eq!(decl.meta["display_name_plural"], "People");
    }

    #[test]
    fn test_models_file_from_toml() {
        let file: ModelsFile = toml::from_str(
            r#"
[[types]]
name = "DateBase"
kind = "child_node"
abstract = true

[[types]]
name = "DatePrecise"
bases = ["DateBase"]

[types.properties.date]
kind = "string"

[types.relationships.calendar_format]
target = "Calendar"
reverse_name = "is_in_calendar_format"
cardinality = "zero_or_one"
"#,
        )
        .unwrap();

        assert_eq!(file.types.len(), 2);
        assert_eq!(file.types[0].kind, Some(NodeKind::ChildNode));
        assert!(file.types[0].is_abstract);
        let precise = &file.types[1];
        assert_eq!(precise.properties["date"].kind, PropertyKind::String);
        let rel = &precise.relationships["calendar_format"];
        assert_eq!(rel.edge_kind, EdgeKind::Plain);
        assert_eq!(rel.cardinality, Some(Cardinality::ZeroOrOne));
    }
}
