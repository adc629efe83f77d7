//! Reference model set shared by the integration tests.

#![allow(dead_code)]

use pros_core::{
    setup_from_declarations, Cardinality, Hierarchy, ModelManager, NodeTypeDecl, PropertyDecl,
    RelationshipDecl, TypeRegistry,
};

pub const APP: &str = "test_app";

pub fn declarations() -> Vec<NodeTypeDecl> {
    vec![
        NodeTypeDecl::node("NoPropertiesNode"),
        NodeTypeDecl::new_trait("Ownable")
            .property("ownership_type", PropertyDecl::string())
            .relationship("owner", RelationshipDecl::to("Person", "is_owner_of")),
        NodeTypeDecl::node("Happening").relationship(
            "involves_entity",
            RelationshipDecl::to("Entity", "is_involved_in_happening"),
        ),
        NodeTypeDecl::node("Entity"),
        NodeTypeDecl::node("Animal")
            .extends("Entity")
            .meta("something_inheritable", true),
        NodeTypeDecl::node("Pet")
            .extends("Animal")
            .extends("Ownable")
            .property("name", PropertyDecl::string()),
        NodeTypeDecl::node("Calendar").property(
            "type",
            PropertyDecl::string()
                .with_default("Julian")
                .with_choices(["Julian", "Gregorian"]),
        ),
        NodeTypeDecl::child_node("DateBase").abstract_type(),
        NodeTypeDecl::node("DateImprecise")
            .extends("DateBase")
            .property("date", PropertyDecl::string())
            .relationship(
                "calendar_format",
                RelationshipDecl::to("Calendar", "is_in_calendar_format"),
            ),
        NodeTypeDecl::node("DatePrecise")
            .extends("DateBase")
            .property("date", PropertyDecl::string())
            .relationship(
                "calendar_format",
                RelationshipDecl::to("Calendar", "is_in_calendar_format"),
            ),
        NodeTypeDecl::node("Organisation")
            .extends("Entity")
            .relationship("has_member", RelationshipDecl::to("Person", "is_member_of")),
        NodeTypeDecl::node("Person")
            .extends("Animal")
            .property("name", PropertyDecl::string())
            .property("is_male", PropertyDecl::boolean().with_default(true))
            .relationship(
                "has_books",
                RelationshipDecl::to("Book", "book_belongs_to_person"),
            )
            .relationship(
                "date_of_birth",
                RelationshipDecl::child("DateBase").with_cardinality(Cardinality::OneOrMore),
            )
            .relationship(
                "owns_pets",
                RelationshipDecl::to("Pet", "owned_by_person")
                    .inline_createable()
                    .with_edge_property("purchased_when", PropertyDecl::string()),
            )
            .relationship(
                "owns_things",
                RelationshipDecl::to("Ownable", "thing_belongs_to_person")
                    .with_cardinality(Cardinality::ZeroOrOne),
            )
            .relationship(
                "has_root_vegetable",
                RelationshipDecl::to("RootVegetable", "root_vegetable_belongs_to_person")
                    .with_cardinality(Cardinality::One),
            )
            .meta("display_name_plural", "People"),
        NodeTypeDecl::reification("PersonIdentification")
            .property("name_in_text", PropertyDecl::string())
            .relationship(
                "persons_identified",
                RelationshipDecl::to("Person", "is_identified_by"),
            ),
        NodeTypeDecl::node("Factoid").relationship(
            "concerns_person",
            RelationshipDecl::reification("PersonIdentification", "is_concerned_in"),
        ),
        NodeTypeDecl::node("Book")
            .extends("Ownable")
            .property("label", PropertyDecl::string())
            .relationship(
                "author",
                RelationshipDecl::to("Person", "is_author_of")
                    .with_cardinality(Cardinality::OneOrMore),
            ),
        NodeTypeDecl::node("NonOwnableBook").extends("Book"),
        NodeTypeDecl::node("DefinitelyNonOwnableBook").extends("NonOwnableBook"),
        NodeTypeDecl::node("RootVegetable")
            .abstract_type()
            .property("label", PropertyDecl::string()),
        NodeTypeDecl::node("Potato").extends("RootVegetable"),
        NodeTypeDecl::node("Turnip").extends("RootVegetable"),
    ]
    .into_iter()
    .map(|decl| decl.in_app(APP))
    .collect()
}

pub fn hierarchy() -> Hierarchy {
    let mut registry = TypeRegistry::new();
    registry.declare_all(declarations()).unwrap();
    registry.resolve().unwrap()
}

pub fn manager() -> ModelManager {
    setup_from_declarations(declarations()).unwrap()
}

/// Names of `ids` in the hierarchy, sorted.
pub fn names<I>(hierarchy: &Hierarchy, ids: I) -> Vec<String>
where
    I: IntoIterator<Item = pros_core::NodeTypeId>,
{
    let mut names: Vec<String> = ids
        .into_iter()
        .map(|id| hierarchy.name(id).to_string())
        .collect();
    names.sort();
    names
}

/// A child union and a relation union whose members carry different keys.
pub fn divergent_declarations() -> Vec<NodeTypeDecl> {
    vec![
        NodeTypeDecl::node("Calendar").property("type", PropertyDecl::string()),
        NodeTypeDecl::child_node("Timing").abstract_type(),
        NodeTypeDecl::node("Moment")
            .extends("Timing")
            .property("date", PropertyDecl::string()),
        NodeTypeDecl::node("Span")
            .extends("Timing")
            .property("date_from", PropertyDecl::string())
            .property("date_to", PropertyDecl::string())
            .relationship(
                "calendar_format",
                RelationshipDecl::to("Calendar", "is_calendar_of_span"),
            ),
        NodeTypeDecl::node("Vehicle").property("wheels", PropertyDecl::integer()),
        NodeTypeDecl::node("Boat")
            .extends("Vehicle")
            .property("hull", PropertyDecl::string()),
        NodeTypeDecl::node("Trip")
            .property("name", PropertyDecl::string())
            .relationship(
                "timing",
                RelationshipDecl::child("Timing").with_cardinality(Cardinality::ZeroOrMore),
            )
            .relationship("vehicle", RelationshipDecl::to("Vehicle", "used_on_trip")),
    ]
}

pub fn divergent_manager() -> ModelManager {
    setup_from_declarations(divergent_declarations()).unwrap()
}
