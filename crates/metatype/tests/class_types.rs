// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::too_many_lines)] // Scenario tests

//! Class type tests: object identity, reverse attributes, trait bags,
//! subclass conversion, references and publication to a repository.

use metatype::{
    AttributeDefinition, HierarchicalType, HierarchicalTypeDefinition, Id, Multiplicity,
    Referenceable, ReferenceableInstance, TypeError, TypeRepository, TypeSystem, Value,
};
use parking_lot::Mutex;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn company(ts: &TypeSystem) {
    ts.define_types(
        vec![],
        vec![HierarchicalTypeDefinition::new::<&str>(
            "SecurityClearance",
            &[],
            vec![AttributeDefinition::required("level", "int")],
        )],
        vec![
            HierarchicalTypeDefinition::new::<&str>(
                "Department",
                &[],
                vec![
                    AttributeDefinition::required("name", "string"),
                    AttributeDefinition::collection("employees", "array<Person>")
                        .composite()
                        .with_reverse("department"),
                ],
            ),
            HierarchicalTypeDefinition::new::<&str>(
                "Person",
                &[],
                vec![
                    AttributeDefinition::required("name", "string"),
                    AttributeDefinition::required("department", "Department")
                        .with_reverse("employees"),
                    AttributeDefinition::optional("manager", "Manager")
                        .with_reverse("subordinates"),
                ],
            ),
            HierarchicalTypeDefinition::new(
                "Manager",
                &["Person"],
                vec![AttributeDefinition::collection("subordinates", "array<Person>")
                    .with_reverse("manager")],
            ),
        ],
    )
    .unwrap();
}

fn hr_id() -> Id {
    Id::new("1", 0, "Department")
}

fn jane() -> Referenceable {
    let mut jane = Referenceable::new("Manager", &["SecurityClearance"])
        .with("name", "Jane")
        .with("department", hr_id());
    jane.trait_mut("SecurityClearance")
        .unwrap()
        .set("level", 1);
    jane
}

#[test]
fn test_class_object_render() {
    init_logging();
    let ts = TypeSystem::new();
    company(&ts);
    let department = ts.get_class_type("Department").unwrap();

    let hr = Referenceable::new("Department", &[])
        .with_id(hr_id())
        .with("name", "hr")
        .with("employees", Value::Array(vec![]));
    let obj = department
        .convert_referenceable(&hr, Multiplicity::Required)
        .unwrap();
    assert_eq!(
        obj.to_string(),
        "{\n\
\tid : \t(type: Department, id: 1)\n\
\tname : \thr\n\
\temployees : \t[]\n\
}"
    );
}

#[test]
fn test_subclass_with_trait() {
    let ts = TypeSystem::new();
    company(&ts);
    let person = ts.get_class_type("Person").unwrap();

    // Requested as Person, converted as Manager.
    let obj = person
        .convert_referenceable(&jane(), Multiplicity::Required)
        .unwrap();
    assert_eq!(obj.type_name(), "Manager");
    assert!(obj.id().is_unassigned());
    assert_eq!(obj.trait_names().collect::<Vec<_>>(), vec!["SecurityClearance"]);
    assert_eq!(
        obj.to_string(),
        "{\n\
\tid : \t(type: Manager, id: <unassigned>)\n\
\tsubordinates : \t<null>\n\
\tname : \tJane\n\
\tdepartment : \t(type: Department, id: 1)\n\
\tmanager : \t<null>\n\
\tSecurityClearance : \t{\n\
\t\tlevel : \t\t1\n\
\t}\n\
}"
    );

    let clearance = obj.get_trait("SecurityClearance").unwrap();
    assert_eq!(clearance.get_as::<i32>("level").unwrap(), 1);

    let mut as_person = obj.cast_as("Person").unwrap();
    assert_eq!(
        as_person.field_names().collect::<Vec<_>>(),
        vec!["name", "department", "manager"]
    );
    as_person.set("name", "Jane Doe").unwrap();
    assert_eq!(obj.get_as::<String>("name").unwrap(), "Jane Doe");
}

#[test]
fn test_department_with_employees() {
    let ts = TypeSystem::new();
    company(&ts);
    let department = ts.get_class_type("Department").unwrap();

    let john = Referenceable::new("Person", &[])
        .with("name", "John")
        .with("department", hr_id())
        .with("manager", Id::new("2", 0, "Manager"));
    let hr = Referenceable::new("Department", &[])
        .with_id(hr_id())
        .with("name", "hr")
        .with("employees", vec![john, jane()]);

    let obj = department
        .convert_referenceable(&hr, Multiplicity::Required)
        .unwrap();
    let employees = obj
        .get_as::<Vec<ReferenceableInstance>>("employees")
        .unwrap();
    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0].type_name(), "Person");
    assert_eq!(employees[1].type_name(), "Manager");
    assert_eq!(
        employees[0].get_as::<Id>("manager").unwrap(),
        Id::new("2", 0, "Manager")
    );
    assert!(employees[1]
        .get_trait("SecurityClearance")
        .is_some());

    let raw = obj.get("employees").unwrap();
    let items = raw.as_array().unwrap();
    assert_eq!(
        items[1].as_object().map(ReferenceableInstance::type_name),
        Some("Manager")
    );
    assert_eq!(items[0].as_id(), Some(employees[0].id()));
    assert_eq!(
        employees[0].get("manager").unwrap().as_id(),
        Some(&Id::new("2", 0, "Manager"))
    );
    assert!(employees[0].get("name").unwrap().as_id().is_none());
}

#[test]
fn test_reference_must_match_class() {
    let ts = TypeSystem::new();
    company(&ts);
    let person = ts.get_class_type("Person").unwrap();

    let bag = Referenceable::new("Person", &[])
        .with("name", "John")
        .with("department", Id::new("3", 0, "Person"));
    assert!(matches!(
        person.convert_referenceable(&bag, Multiplicity::Required),
        Err(TypeError::TypeMismatch { .. })
    ));

    let bag = Referenceable::new("Person", &[]).with("name", "John");
    assert!(matches!(
        person.convert_referenceable(&bag, Multiplicity::Required),
        Err(TypeError::MissingRequiredAttribute { .. })
    ));

    let bag = Referenceable::new("Person", &["Unknown"])
        .with("name", "John")
        .with("department", hr_id());
    assert!(matches!(
        person.convert_referenceable(&bag, Multiplicity::Required),
        Err(TypeError::TypeNotFound(_))
    ));

    let department = ts.get_class_type("Department").unwrap();
    assert!(matches!(
        department.convert_referenceable(&jane(), Multiplicity::Required),
        Err(TypeError::TypeMismatch { .. })
    ));

    let clearance = ts.get_trait_type("SecurityClearance").unwrap();
    assert!(matches!(
        clearance.convert_referenceable(&jane(), Multiplicity::Required),
        Err(TypeError::TypeMismatch { .. })
    ));
}

#[test]
fn test_reverse_attribute_validation() {
    let ts = TypeSystem::new();
    company(&ts);

    let err = ts
        .define_class_types(vec![HierarchicalTypeDefinition::new::<&str>(
            "Badge",
            &[],
            vec![AttributeDefinition::optional("holder", "Person").with_reverse("badge")],
        )])
        .unwrap_err();
    assert!(matches!(err, TypeError::InvalidDefinition { .. }));

    let err = ts
        .define_class_types(vec![HierarchicalTypeDefinition::new::<&str>(
            "Badge",
            &[],
            vec![AttributeDefinition::optional("code", "string").with_reverse("badge")],
        )])
        .unwrap_err();
    assert!(matches!(err, TypeError::InvalidDefinition { .. }));

    // `department` on Person points at Department, not at Badge.
    let err = ts
        .define_class_types(vec![HierarchicalTypeDefinition::new::<&str>(
            "Badge",
            &[],
            vec![AttributeDefinition::optional("holder", "Person").with_reverse("department")],
        )])
        .unwrap_err();
    assert!(matches!(err, TypeError::InvalidDefinition { .. }));
    assert!(!ts.is_registered("Badge"));
}

#[derive(Default)]
struct RecordingRepository {
    batches: Mutex<Vec<Vec<String>>>,
}

impl TypeRepository for RecordingRepository {
    fn define_types(&self, types: &[Arc<HierarchicalType>]) {
        self.batches
            .lock()
            .push(types.iter().map(|t| t.name().to_string()).collect());
    }
}

#[test]
fn test_publish_sorts_supertypes_first() {
    let ts = TypeSystem::new();
    company(&ts);
    let repo = Arc::new(RecordingRepository::default());

    ts.publish(&repo, &["Manager", "Department", "Person", "SecurityClearance"])
        .unwrap();
    assert_eq!(
        repo.batches.lock().as_slice(),
        &[vec!["Person", "Manager", "Department", "SecurityClearance"]]
    );

    assert!(matches!(
        ts.publish(repo.as_ref(), &["Nope"]),
        Err(TypeError::TypeNotFound(_))
    ));
    assert!(matches!(
        ts.publish(repo.as_ref(), &["int"]),
        Err(TypeError::TypeMismatch { .. })
    ));
    assert_eq!(repo.batches.lock().len(), 1);
}
