mod common;

use pros_core::{Cardinality, DeclarationError, EdgeKind, NodeTypeDecl, RelationshipDecl, TypeRegistry};

use common::{declarations, hierarchy};

fn reverse_labels(hierarchy: &pros_core::Hierarchy, name: &str) -> Vec<String> {
    let id = hierarchy.id(name).unwrap();
    hierarchy.reverse_entries(id).into_keys().collect()
}

#[test]
fn test_reverse_entries_of_person() {
    let hierarchy = hierarchy();
    assert_eq!(
        reverse_labels(&hierarchy, "Person"),
        vec![
            "is_author_of",
            "is_identified_by",
            "is_involved_in_happening",
            "is_member_of",
            "is_owner_of",
        ]
    );
}

#[test]
fn test_reverse_entries_inherited_from_storage_ancestors() {
    let hierarchy = hierarchy();
    for name in ["Entity", "Animal", "Organisation"] {
        assert_eq!(
            reverse_labels(&hierarchy, name),
            vec!["is_involved_in_happening"],
            "{name}"
        );
    }
    assert_eq!(
        reverse_labels(&hierarchy, "Potato"),
        vec!["root_vegetable_belongs_to_person"]
    );
}

#[test]
fn test_direct_trait_contributes_reverse_entries() {
    let hierarchy = hierarchy();
    assert_eq!(
        reverse_labels(&hierarchy, "Pet"),
        vec![
            "is_involved_in_happening",
            "owned_by_person",
            "thing_belongs_to_person",
        ]
    );
    assert_eq!(
        reverse_labels(&hierarchy, "Book"),
        vec!["book_belongs_to_person", "thing_belongs_to_person"]
    );
    // Ownable only reaches NonOwnableBook through Book.
    assert_eq!(
        reverse_labels(&hierarchy, "NonOwnableBook"),
        vec!["book_belongs_to_person"]
    );
}

#[test]
fn test_reverse_entry_records_forward_side() {
    let hierarchy = hierarchy();
    let pet = hierarchy.id("Pet").unwrap();
    let entries = hierarchy.reverse_entries(pet);
    let owned = &entries["owned_by_person"];

    assert_eq!(owned.forward_label, "OWNS_PETS");
    assert_eq!(owned.source_relation_name, "owns_pets");
    assert_eq!(owned.sources.len(), 1);
    assert_eq!(owned.sources[0].name, "Person");
    assert_eq!(owned.cardinality, Cardinality::ZeroOrMore);
    assert!(owned.edge_properties.contains_key("purchased_when"));
}

#[test]
fn test_same_edge_from_siblings_merges() {
    let hierarchy = hierarchy();
    let calendar = hierarchy.id("Calendar").unwrap();
    let entries = hierarchy.reverse_entries(calendar);
    let entry = &entries["is_in_calendar_format"];

    let sources: Vec<&str> = entry.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sources, vec!["DateImprecise", "DatePrecise"]);
    assert_eq!(entry.forward_label, "CALENDAR_FORMAT");
}

#[test]
fn test_structural_edges_kept_out_of_peer_view() {
    let hierarchy = hierarchy();
    let identification = hierarchy.id("PersonIdentification").unwrap();
    let date_base = hierarchy.id("DateBase").unwrap();

    assert!(hierarchy.reverse_entries(identification).is_empty());
    let structural = hierarchy.structural_reverse_entries(identification);
    assert_eq!(structural["is_concerned_in"].edge_kind, EdgeKind::Reification);

    assert!(hierarchy.reverse_entries(date_base).is_empty());
    assert!(hierarchy
        .structural_reverse_entries(date_base)
        .contains_key("date_of_birth"));
}

#[test]
fn test_every_plain_edge_has_exactly_one_reverse_entry() {
    let hierarchy = hierarchy();
    for node_type in hierarchy.types() {
        for (name, (_, decl)) in hierarchy.relationships(node_type.id) {
            if decl.edge_kind != EdgeKind::Plain {
                continue;
            }
            let target = hierarchy.id(&decl.target).unwrap();
            for member in hierarchy.concrete_members(target) {
                let matching = hierarchy
                    .reverse_entries(member)
                    .values()
                    .filter(|entry| entry.forward_label == name.to_uppercase())
                    .count();
                assert_eq!(
                    matching,
                    1,
                    "{}.{} on {}",
                    node_type.name,
                    name,
                    hierarchy.name(member)
                );
            }
        }
    }
}

#[test]
fn test_conflicting_reverse_label_rejected() {
    let mut registry = TypeRegistry::new();
    registry
        .declare_all(vec![
            NodeTypeDecl::node("Target"),
            NodeTypeDecl::node("A").relationship("points_at", RelationshipDecl::to("Target", "pointed")),
            NodeTypeDecl::node("B").relationship("aims_at", RelationshipDecl::to("Target", "pointed")),
        ])
        .unwrap();

    match registry.resolve() {
        Err(DeclarationError::ConflictingReverseLabel {
            target,
            reverse_label,
            ..
        }) => {
            assert_eq!(target, "Target");
            assert_eq!(reverse_label, "pointed");
        }
        other => panic!("expected conflict, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_reverse_name_colliding_with_field_rejected() {
    let mut registry = TypeRegistry::new();
    registry
        .declare_all(vec![
            NodeTypeDecl::node("Target"),
            NodeTypeDecl::node("A").relationship("points_at", RelationshipDecl::to("Target", "label")),
        ])
        .unwrap();
    assert!(matches!(
        registry.resolve(),
        Err(DeclarationError::ReverseNameCollision { .. })
    ));
}

#[test]
fn test_register_and_retract() {
    let mut hierarchy = hierarchy();
    let book = hierarchy.id("Book").unwrap();
    let pet = hierarchy.id("Pet").unwrap();
    let before = hierarchy.reverse_entries(pet);

    let decl = RelationshipDecl::to("Pet", "chewed_by_book");
    hierarchy.register_relationship(book, "chews", &decl).unwrap();
    assert!(hierarchy.reverse_entries(pet).contains_key("chewed_by_book"));

    assert!(hierarchy.retract_relationship(book, "chews"));
    assert_eq!(hierarchy.reverse_entries(pet), before);
    assert!(!hierarchy.retract_relationship(book, "chews"));
}

#[test]
fn test_fresh_registries_are_isolated() {
    let mut first = hierarchy();
    let second = hierarchy();
    let book = first.id("Book").unwrap();

    first
        .register_relationship(book, "chews", &RelationshipDecl::to("Pet", "chewed_by_book"))
        .unwrap();

    let pet = second.id("Pet").unwrap();
    assert!(!second.reverse_entries(pet).contains_key("chewed_by_book"));
    assert_eq!(declarations().len(), second.types().len());
}
