mod common;

use pros_core::catalogue::{ModelKey, SubclassHierarchy};
use pros_core::{
    setup_from_declarations, Cardinality, DeclarationError, EdgeKind, ModelManagerError,
    NodeRecord, NodeTypeDecl, RecordError, SetupError,
};
use serde_json::{json, Map, Value};

use common::{manager, APP};

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[test]
fn test_lookup_by_all_three_keys() {
    let manager = manager();
    for model in manager.models() {
        let by_id = manager.get_model(model.id).unwrap();
        let qualified = format!("{}.{}", model.app_name, model.model_name);
        let by_qualified = manager.get_model(qualified.as_str()).unwrap();
        let by_name = manager.get_model(model.model_name.as_str()).unwrap();

        assert!(std::ptr::eq(by_id, by_qualified));
        assert!(std::ptr::eq(by_id, by_name));
    }
}

#[test]
fn test_lookup_normalizes_case_and_underscores() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();
    assert_eq!(manager.get_model("person").unwrap().id, person.id);
    assert_eq!(manager.get_model("testapp.person").unwrap().id, person.id);
    assert_eq!(manager.get_model("Test_App.Person").unwrap().id, person.id);
    assert_eq!(manager.get_model(ModelKey::from(person)).unwrap().id, person.id);
}

#[test]
fn test_lookup_failure_names_key_kind() {
    let manager = manager();

    let err = manager.get_model("Unicorn").unwrap_err();
    assert_eq!(
        err,
        ModelManagerError::UnqualifiedNotFound {
            key: "Unicorn".to_string()
        }
    );
    assert!(err.to_string().contains("unqualified"));

    let err = manager.get_model("other_app.Person").unwrap_err();
    assert_eq!(
        err,
        ModelManagerError::QualifiedNotFound {
            key: "other_app.Person".to_string()
        }
    );
    assert!(err.to_string().contains("other_app.Person"));
}

#[test]
fn test_relationship_sections() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();

    assert_eq!(
        person.relationships.keys().collect::<Vec<_>>(),
        vec!["has_books", "has_root_vegetable", "owns_pets", "owns_things"]
    );
    assert_eq!(person.child_nodes.keys().collect::<Vec<_>>(), vec!["date_of_birth"]);
    assert!(person.related_reifications.is_empty());

    let factoid = manager.get_model("Factoid").unwrap();
    let concerns = &factoid.related_reifications["concerns_person"];
    assert_eq!(concerns.edge_kind, EdgeKind::Reification);
    assert_eq!(concerns.target_model_name, "PersonIdentification");
    assert!(factoid.relationships.is_empty());
}

#[test]
fn test_relationship_type_details() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();

    let owns_pets = &person.relationships["owns_pets"];
    assert_eq!(owns_pets.relation_label, "OWNS_PETS");
    assert_eq!(owns_pets.reverse_name.as_deref(), Some("owned_by_person"));
    assert!(owns_pets.inline_createable);
    assert!(owns_pets.has_relation_data);
    assert!(owns_pets.relation_properties.contains_key("purchased_when"));

    let date_of_birth = &person.child_nodes["date_of_birth"];
    assert_eq!(date_of_birth.cardinality, Cardinality::OneOrMore);
    assert_eq!(date_of_birth.target_model_name, "DateBase");

    assert_eq!(
        person.relationships["has_root_vegetable"].cardinality,
        Cardinality::One
    );
    assert_eq!(
        person.relationships["has_books"].cardinality,
        Cardinality::ZeroOrMore
    );
}

#[test]
fn test_inherited_relationship_keeps_declaring_type() {
    let manager = manager();
    let pet = manager.get_model("Pet").unwrap();
    let owner = &pet.relationships["owner"];
    assert_eq!(owner.declared_on, "Ownable");
    assert_eq!(owner.target_model_name, "Person");
}

#[test]
fn test_target_members_polymorphic() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();

    let member_names = |relation: &str| -> Vec<String> {
        let relationship = person
            .relationships
            .get(relation)
            .or_else(|| person.child_nodes.get(relation))
            .unwrap();
        relationship
            .target_members(&manager)
            .unwrap()
            .into_iter()
            .map(|m| m.model_name.clone())
            .collect()
    };

    assert_eq!(
        member_names("has_books"),
        vec!["Book", "DefinitelyNonOwnableBook", "NonOwnableBook"]
    );
    assert_eq!(member_names("owns_things"), vec!["Book", "Pet"]);
    assert_eq!(member_names("has_root_vegetable"), vec!["Potato", "Turnip"]);
    assert_eq!(member_names("date_of_birth"), vec!["DateImprecise", "DatePrecise"]);
}

#[test]
fn test_polymorphic_members_start_from_the_entry() {
    let manager = manager();
    let book = manager.get_model("Book").unwrap();
    let members = manager.polymorphic_members(book);

    assert!(std::ptr::eq(members[0], book));
    assert_eq!(
        members.iter().map(|m| m.model_name.as_str()).collect::<Vec<_>>(),
        vec!["Book", "DefinitelyNonOwnableBook", "NonOwnableBook"]
    );

    let root_vegetable = manager.get_model("RootVegetable").unwrap();
    assert!(manager
        .polymorphic_members(root_vegetable)
        .iter()
        .all(|m| m.is_concrete()));
}

#[test]
fn test_catalogue_entry_hierarchy_facts() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();

    assert_eq!(person.app_name, APP);
    assert_eq!(person.real_type(), "person");
    assert_eq!(person.parent_classes, vec!["Animal", "Entity"]);
    assert_eq!(person.inherited_labels, vec!["Person", "Animal", "Entity"]);
    assert_eq!(person.meta["display_name_plural"], json!("People"));
    assert_eq!(person.meta["something_inheritable"], json!(true));

    let ownable = manager.get_model("Ownable").unwrap();
    assert!(ownable.is_trait());
    assert_eq!(
        ownable.classes_with_trait.iter().collect::<Vec<_>>(),
        vec!["Book", "Pet"]
    );
    assert_eq!(ownable.subclasses, ownable.classes_with_trait);
}

#[test]
fn test_subclass_hierarchy_nested() {
    let manager = manager();
    let entity = manager.get_model("Entity").unwrap();

    let animal = &entity.subclass_hierarchy.0["Animal"];
    assert!(animal.0.contains_key("Person"));
    assert!(animal.0.contains_key("Pet"));
    assert!(entity.subclass_hierarchy.0["Organisation"].is_empty());
    assert_eq!(
        entity.subclasses.iter().collect::<Vec<_>>(),
        vec!["Animal", "Organisation", "Person", "Pet"]
    );

    let book = manager.get_model("Book").unwrap();
    let expected = SubclassHierarchy(
        [(
            "NonOwnableBook".to_string(),
            SubclassHierarchy(
                [("DefinitelyNonOwnableBook".to_string(), SubclassHierarchy::default())]
                    .into_iter()
                    .collect(),
            ),
        )]
        .into_iter()
        .collect(),
    );
    assert_eq!(book.subclass_hierarchy, expected);
}

#[test]
fn test_reverse_relationship_view() {
    let manager = manager();
    let pet = manager.get_model("Pet").unwrap();
    let owned = &pet.reverse_relationships["owned_by_person"];

    assert_eq!(owned.source_models, vec!["Person"]);
    assert_eq!(owned.source_relation_name, "owns_pets");
    assert_eq!(owned.forward_relationship_label, "OWNS_PETS");
    assert!(owned.has_relation_data);
    assert_eq!(owned.declaring_model(), "Person");

    let person = manager.get_model("Person").unwrap();
    let owner = &person.reverse_relationships["is_owner_of"];
    let members: Vec<&str> = owner
        .source_members(&manager)
        .unwrap()
        .iter()
        .map(|m| m.model_name.as_str())
        .collect();
    assert_eq!(members, vec!["Book", "Pet"]);
}

#[test]
fn test_routes_cover_readable_types() {
    let manager = manager();
    let routes: Vec<String> = manager.routes().map(|(segment, _)| segment).collect();

    assert!(routes.contains(&"person".to_string()));
    assert!(routes.contains(&"personidentification".to_string()));
    assert!(!routes.contains(&"ownable".to_string()));
    assert!(!routes.contains(&"rootvegetable".to_string()));
    assert!(!routes.contains(&"dateprecise".to_string()));
}

#[test]
fn test_every_schema_derived() {
    let manager = manager();
    for model in manager.models() {
        if model.is_concrete() {
            let name = model.response_schema.as_deref().unwrap();
            assert_eq!(name, model.model_name);
            assert!(manager.schemas().contains(name));
        } else {
            assert!(model.response_schema.is_none());
        }
    }
}

#[test]
fn test_record_defaults_and_discriminant() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();

    let record = NodeRecord::new(person, props(json!({"name": "John Smith"}))).unwrap();
    assert_eq!(record.labels, vec!["Person", "Animal", "Entity"]);
    assert_eq!(record.properties["real_type"], json!("person"));
    assert_eq!(record.properties["is_male"], json!(true));
    assert_eq!(record.properties["is_deleted"], json!(false));
    assert!(record.properties["last_dependent_change"].is_string());
    assert!(uuid::Uuid::parse_str(record.uid().unwrap()).is_ok());
}

#[test]
fn test_record_validation() {
    let manager = manager();
    let person = manager.get_model("Person").unwrap();
    let calendar = manager.get_model("Calendar").unwrap();

    assert!(matches!(
        NodeRecord::new(person, props(json!({"shoe_size": 9}))),
        Err(RecordError::UnknownProperty { .. })
    ));
    assert!(matches!(
        NodeRecord::new(person, props(json!({"is_male": "yes"}))),
        Err(RecordError::InvalidValue { .. })
    ));
    assert!(matches!(
        NodeRecord::new(calendar, props(json!({"type": "Lunar"}))),
        Err(RecordError::InvalidChoice { .. })
    ));
    assert_eq!(
        NodeRecord::new(calendar, Map::new()).unwrap().properties["type"],
        json!("Julian")
    );

    let root_vegetable = manager.get_model("RootVegetable").unwrap();
    assert!(matches!(
        NodeRecord::new(root_vegetable, Map::new()),
        Err(RecordError::NotInstantiable { .. })
    ));
}

#[test]
fn test_underscore_variant_names_rejected() {
    let result = setup_from_declarations(vec![
        NodeTypeDecl::node("Foo_Bar").in_app("app"),
        NodeTypeDecl::node("FooBar").in_app("app"),
    ]);
    assert!(matches!(
        result,
        Err(SetupError::Declaration(DeclarationError::DuplicateType(name))) if name == "FooBar"
    ));
}

#[test]
fn test_every_name_resolves_to_its_own_entry() {
    let manager = manager();
    for model in manager.models() {
        let qualified = format!("{}.{}", model.app_name, model.model_name);
        assert_eq!(manager.get_model(model.id).unwrap().id, model.id);
        assert_eq!(manager.get_model(model.model_name.as_str()).unwrap().id, model.id);
        assert_eq!(manager.get_model(qualified.as_str()).unwrap().id, model.id);
    }
}
