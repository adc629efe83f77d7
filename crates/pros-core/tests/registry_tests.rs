mod common;

use pros_core::{DeclarationError, NodeKind, NodeTypeDecl, PropertyDecl, RelationshipDecl, TypeRegistry};

use common::{hierarchy, names};

fn resolve(decls: Vec<NodeTypeDecl>) -> Result<pros_core::Hierarchy, DeclarationError> {
    let mut registry = TypeRegistry::new();
    registry.declare_all(decls)?;
    registry.resolve()
}

#[test]
fn test_classes_with_trait() {
    let hierarchy = hierarchy();
    let ownable = hierarchy.id("Ownable").unwrap();

    assert_eq!(
        names(&hierarchy, hierarchy.classes_with_trait(ownable)),
        vec!["Book", "Pet"]
    );
    assert_eq!(
        names(&hierarchy, hierarchy.subtypes(ownable)),
        vec!["Book", "Pet"]
    );
}

#[test]
fn test_inherited_labels_carry_direct_trait_once() {
    let hierarchy = hierarchy();

    for name in ["Book", "Pet"] {
        let id = hierarchy.id(name).unwrap();
        let labels = hierarchy.inherited_labels(id);
        assert_eq!(
            labels.iter().filter(|l| **l == "Ownable").count(),
            1,
            "{name}: {labels:?}"
        );
    }

    let pet = hierarchy.id("Pet").unwrap();
    assert_eq!(
        hierarchy.inherited_labels(pet),
        vec!["Pet", "Animal", "Entity", "Ownable"]
    );
}

#[test]
fn test_transitive_trait_not_reexposed() {
    let hierarchy = hierarchy();
    let non_ownable = hierarchy.id("NonOwnableBook").unwrap();

    assert_eq!(
        hierarchy.inherited_labels(non_ownable),
        vec!["NonOwnableBook", "Book"]
    );
    assert!(!hierarchy.own_fields(non_ownable).contains_key("ownership_type"));
    assert!(!hierarchy.relationships(non_ownable).contains_key("owner"));
}

#[test]
fn test_ancestors_nearest_first() {
    let hierarchy = hierarchy();
    let person = hierarchy.id("Person").unwrap();

    assert_eq!(
        names_in_order(&hierarchy, hierarchy.ancestors_excluding_traits(person)),
        vec!["Animal", "Entity"]
    );
}

fn names_in_order(hierarchy: &pros_core::Hierarchy, ids: &[pros_core::NodeTypeId]) -> Vec<String> {
    ids.iter().map(|id| hierarchy.name(*id).to_string()).collect()
}

#[test]
fn test_subtypes_transitive() {
    let hierarchy = hierarchy();
    let entity = hierarchy.id("Entity").unwrap();
    let book = hierarchy.id("Book").unwrap();

    assert_eq!(
        names(&hierarchy, hierarchy.subtypes(entity)),
        vec!["Animal", "Organisation", "Person", "Pet"]
    );
    assert_eq!(
        names(&hierarchy, hierarchy.subtypes(book)),
        vec!["DefinitelyNonOwnableBook", "NonOwnableBook"]
    );
}

#[test]
fn test_lookup_is_case_insensitive() {
    let hierarchy = hierarchy();
    assert_eq!(hierarchy.id("person"), hierarchy.id("Person"));
    assert_eq!(hierarchy.id("PERSON"), hierarchy.id("Person"));
    assert!(hierarchy.id("Nobody").is_none());
}

#[test]
fn test_own_fields_merge_nearest_wins() {
    let hierarchy = hierarchy();
    let book = hierarchy.id("Book").unwrap();
    let fields = hierarchy.own_fields(book);

    assert!(fields.contains_key("ownership_type"));
    assert!(fields.contains_key("label"));
    assert!(fields.contains_key("is_deleted"));
    assert!(!fields.contains_key("uid"));
}

#[test]
fn test_internal_fields_excluded() {
    let hierarchy = resolve(vec![NodeTypeDecl::node("Thing")
        .property("name", PropertyDecl::string())
        .property("cache_", PropertyDecl::string())])
    .unwrap();
    let thing = hierarchy.id("Thing").unwrap();
    let fields = hierarchy.own_fields(thing);

    assert!(fields.contains_key("name"));
    assert!(!fields.contains_key("cache_"));
}

#[test]
fn test_child_builtins() {
    let hierarchy = hierarchy();
    let date = hierarchy.id("DatePrecise").unwrap();
    let fields = hierarchy.own_fields(date);

    assert_eq!(hierarchy.get(date).kind, NodeKind::ChildNode);
    assert_eq!(
        fields.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["date", "real_type"]
    );
}

#[test]
fn test_meta_inherited() {
    let hierarchy = hierarchy();
    let pet = hierarchy.id("Pet").unwrap();
    assert_eq!(
        hierarchy.meta(pet).get("something_inheritable"),
        Some(&serde_json::Value::Bool(true))
    );
}

#[test]
fn test_cycle_rejected() {
    let result = resolve(vec![
        NodeTypeDecl::node("A").extends("B"),
        NodeTypeDecl::node("B").extends("A"),
    ]);
    assert!(matches!(result, Err(DeclarationError::Cycle(_))));
}

#[test]
fn test_unknown_base_rejected() {
    let result = resolve(vec![NodeTypeDecl::node("A").extends("Missing")]);
    assert!(matches!(result, Err(DeclarationError::UnknownBase { .. })));
}

#[test]
fn test_unknown_target_rejected() {
    let result = resolve(vec![NodeTypeDecl::node("A")
        .relationship("knows", RelationshipDecl::to("Missing", "known_by"))]);
    assert!(matches!(result, Err(DeclarationError::UnknownTarget { .. })));
}

#[test]
fn test_trait_cannot_extend_node() {
    let result = resolve(vec![
        NodeTypeDecl::node("A"),
        NodeTypeDecl::new_trait("T").extends("A"),
    ]);
    assert!(matches!(result, Err(DeclarationError::TraitBase { .. })));
}

#[test]
fn test_mixed_storage_kinds_rejected() {
    let result = resolve(vec![
        NodeTypeDecl::node("A"),
        NodeTypeDecl::child_node("C"),
        NodeTypeDecl::node("Both").extends("A").extends("C"),
    ]);
    assert!(matches!(result, Err(DeclarationError::MixedKinds { .. })));
}

#[test]
fn test_edge_kinds_checked_against_target() {
    let plain_to_child = resolve(vec![
        NodeTypeDecl::child_node("C"),
        NodeTypeDecl::node("A").relationship("c", RelationshipDecl::to("C", "of_a")),
    ]);
    assert!(matches!(plain_to_child, Err(DeclarationError::ChildTarget { .. })));

    let child_to_node = resolve(vec![
        NodeTypeDecl::node("B"),
        NodeTypeDecl::node("A").relationship("b", RelationshipDecl::child("B")),
    ]);
    assert!(matches!(child_to_node, Err(DeclarationError::NotAChildType { .. })));
}

#[test]
fn test_trait_cannot_own_children() {
    let result = resolve(vec![
        NodeTypeDecl::child_node("C"),
        NodeTypeDecl::new_trait("T").relationship("c", RelationshipDecl::child("C")),
    ]);
    assert!(matches!(result, Err(DeclarationError::TraitEdge { .. })));
}

#[test]
fn test_invalid_identifier_rejected() {
    let mut registry = TypeRegistry::new();
    let result = registry.declare(NodeTypeDecl::node("Bad Name"));
    assert!(matches!(result, Err(DeclarationError::InvalidIdentifier { .. })));

    let result = registry.declare(
        NodeTypeDecl::node("Good").relationship(
            "likes",
            RelationshipDecl::to("Good", "liked_by")
                .with_edge_property("_relationship_data", PropertyDecl::string()),
        ),
    );
    assert!(matches!(result, Err(DeclarationError::InvalidIdentifier { .. })));
}

#[test]
fn test_duplicate_type_rejected() {
    let mut registry = TypeRegistry::new();
    registry.declare(NodeTypeDecl::node("Person")).unwrap();
    let result = registry.declare(NodeTypeDecl::node("person"));
    assert!(matches!(result, Err(DeclarationError::DuplicateType(_))));
}
