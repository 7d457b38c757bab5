// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::too_many_lines)] // Scenario tests

//! Diamond trait hierarchy scenarios.
//!
//! `A(a, b, c, d)`, `B(b) : A`, `C(c) : A`, `D(d) : B, C`. Covers the
//! resolved slot names, the canonical rendering, storage sharing between an
//! instance and its cast views, order independence of registration and
//! cycle rejection, plus smaller shapes that pin which path keeps a short
//! name.

use metatype::{
    AttributeDefinition, HierarchicalTypeDefinition, Instance, Multiplicity, Struct, TypeError,
    TypeSystem, TypeSystemConfig,
};

const RENDERED_D: &str = "{\n\
\td : \t1\n\
\tb : \ttrue\n\
\tc : \t1\n\
\ta : \t1\n\
\tA.B.D.b : \ttrue\n\
\tA.B.D.c : \t2\n\
\tA.B.D.d : \t2\n\
\tA.C.D.a : \t3\n\
\tA.C.D.b : \tfalse\n\
\tA.C.D.c : \t3\n\
\tA.C.D.d : \t3\n\
}";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn def_a() -> HierarchicalTypeDefinition {
    HierarchicalTypeDefinition::new::<&str>(
        "A",
        &[],
        vec![
            AttributeDefinition::required("a", "int"),
            AttributeDefinition::optional("b", "boolean"),
            AttributeDefinition::optional("c", "byte"),
            AttributeDefinition::optional("d", "short"),
        ],
    )
}

fn def_b() -> HierarchicalTypeDefinition {
    HierarchicalTypeDefinition::new(
        "B",
        &["A"],
        vec![AttributeDefinition::optional("b", "boolean")],
    )
}

fn def_c() -> HierarchicalTypeDefinition {
    HierarchicalTypeDefinition::new(
        "C",
        &["A"],
        vec![AttributeDefinition::optional("c", "byte")],
    )
}

fn def_d() -> HierarchicalTypeDefinition {
    HierarchicalTypeDefinition::new(
        "D",
        &["B", "C"],
        vec![AttributeDefinition::optional("d", "short")],
    )
}

fn diamond(ts: &TypeSystem) {
    ts.define_trait_types(vec![def_a(), def_b(), def_c(), def_d()])
        .expect("diamond registers");
}

fn full_bag() -> Struct {
    Struct::new("D")
        .with("d", 1)
        .with("c", 1)
        .with("b", true)
        .with("a", 1)
        .with("A.B.D.b", true)
        .with("A.B.D.c", 2)
        .with("A.B.D.d", 2)
        .with("A.C.D.a", 3)
        .with("A.C.D.b", false)
        .with("A.C.D.c", 3)
        .with("A.C.D.d", 3)
}

fn convert_d(ts: &TypeSystem) -> Instance {
    let d = ts.get_trait_type("D").unwrap();
    d.convert(&full_bag(), Multiplicity::Required).unwrap()
}

#[test]
fn test_diamond_exposes_eleven_names() {
    init_logging();
    let ts = TypeSystem::new();
    diamond(&ts);

    let d = ts.get_trait_type("D").unwrap();
    let names: Vec<&str> = d.field_names().collect();
    assert_eq!(
        names,
        vec![
            "d", "b", "c", "a", "A.B.D.b", "A.B.D.c", "A.B.D.d", "A.C.D.a", "A.C.D.b", "A.C.D.c",
            "A.C.D.d"
        ]
    );
    let primaries: Vec<&str> = d.layout().primary_names().collect();
    assert_eq!(primaries, vec!["d", "b", "c", "a"]);
    assert_eq!(d.layout().qualified_names().count(), 7);

    let b = ts.get_trait_type("B").unwrap();
    let names: Vec<&str> = b.field_names().collect();
    assert_eq!(names, vec!["b", "a", "A.B.b", "c", "d"]);
}

#[test]
fn test_convert_and_render() {
    init_logging();
    let ts = TypeSystem::new();
    diamond(&ts);

    let inst = convert_d(&ts);
    assert_eq!(inst.to_string(), RENDERED_D);
    assert_eq!(inst.get_as::<i16>("d").unwrap(), 1);
    assert_eq!(inst.get_as::<i8>("A.C.D.c").unwrap(), 3);
    assert!(!inst.get_as::<bool>("A.C.D.b").unwrap());
}

#[test]
fn test_cast_shares_storage() {
    init_logging();
    let ts = TypeSystem::new();
    diamond(&ts);
    let inst = convert_d(&ts);

    let mut as_b = inst.cast_as("B").unwrap();
    assert!(inst.shares_storage_with(&as_b));
    assert_eq!(
        as_b.field_names().collect::<Vec<_>>(),
        vec!["b", "a", "A.B.b", "c", "d"]
    );
    assert_eq!(
        as_b.to_string(),
        "{\n\tb : \ttrue\n\ta : \t1\n\tA.B.b : \ttrue\n\tc : \t2\n\td : \t2\n}"
    );

    as_b.set("A.B.b", false).unwrap();
    assert!(!inst.get_as::<bool>("A.B.D.b").unwrap());
    assert!(inst.get_as::<bool>("b").unwrap());
    assert_eq!(
        inst.to_string(),
        RENDERED_D.replace("A.B.D.b : \ttrue", "A.B.D.b : \tfalse")
    );
}

#[test]
fn test_cast_is_transitive() {
    init_logging();
    let ts = TypeSystem::new();
    diamond(&ts);
    let inst = convert_d(&ts);

    let mut as_b = inst.cast_as("B").unwrap();
    as_b.set("A.B.b", false).unwrap();

    let mut as_a = as_b.cast_as("A").unwrap();
    assert_eq!(as_a.field_names().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
    assert!(!as_a.get_as::<bool>("b").unwrap());
    as_a.set("b", true).unwrap();

    assert!(inst.get_as::<bool>("A.B.D.b").unwrap());
    assert!(as_b.get_as::<bool>("A.B.b").unwrap());
    assert_eq!(inst.to_string(), RENDERED_D);

    // Fresh casts of the original see the write too.
    assert!(inst.cast_as("B").unwrap().get_as::<bool>("A.B.b").unwrap());
    let direct = inst.cast_as("A").unwrap();
    assert!(direct.get_as::<bool>("b").unwrap());
    assert_eq!(direct.values(), as_a.values());
}

#[test]
fn test_cast_to_self_and_non_ancestor() {
    let ts = TypeSystem::new();
    diamond(&ts);
    let inst = convert_d(&ts);

    let same = inst.cast_as("D").unwrap();
    assert_eq!(same.to_string(), RENDERED_D);

    let as_b = inst.cast_as("B").unwrap();
    assert!(matches!(
        as_b.cast_as("C"),
        Err(TypeError::NotAnAncestor { .. })
    ));
    assert!(matches!(
        inst.cast_as("Unknown"),
        Err(TypeError::NotAnAncestor { .. })
    ));
    assert_eq!(inst.to_string(), RENDERED_D);
}

#[test]
fn test_cast_view_detached_copy() {
    let ts = TypeSystem::new();
    diamond(&ts);
    let inst = convert_d(&ts);

    let copy = inst.cast_as("C").unwrap().to_instance();
    assert_eq!(copy.type_name(), "C");
    assert_eq!(copy.get_as::<i32>("a").unwrap(), 3);
    assert_eq!(copy.get_as::<i8>("A.C.c").unwrap(), 3);

    let mut copy = copy;
    copy.set("a", 42).unwrap();
    assert_eq!(inst.get_as::<i32>("A.C.D.a").unwrap(), 3);
}

#[test]
fn test_registration_order_does_not_matter() {
    let reference = TypeSystem::new();
    diamond(&reference);

    let permuted = TypeSystem::new();
    permuted
        .define_trait_types(vec![def_b(), def_d(), def_a(), def_c()])
        .unwrap();

    for name in ["A", "B", "C", "D"] {
        let expected = reference.get_trait_type(name).unwrap();
        let actual = permuted.get_trait_type(name).unwrap();
        assert_eq!(expected.layout(), actual.layout(), "layout of {}", name);
    }
    assert_eq!(
        convert_d(&permuted).to_string(),
        convert_d(&reference).to_string()
    );
}

#[test]
fn test_supertypes_across_batches() {
    let ts = TypeSystem::new();
    ts.define_trait_types(vec![def_a()]).unwrap();
    ts.define_trait_types(vec![def_c(), def_b()]).unwrap();
    ts.define_trait_types(vec![def_d()]).unwrap();
    assert_eq!(convert_d(&ts).to_string(), RENDERED_D);
}

#[test]
fn test_cycle_rejected() {
    init_logging();
    let ts = TypeSystem::new();
    let err = ts
        .define_trait_types(vec![
            HierarchicalTypeDefinition::new("X", &["Y"], vec![]),
            HierarchicalTypeDefinition::new("Y", &["X"], vec![]),
        ])
        .unwrap_err();
    assert!(matches!(err, TypeError::CyclicInheritance(_)));
    assert!(!ts.is_registered("X"));
    assert!(!ts.is_registered("Y"));
    assert!(matches!(ts.get_type("X"), Err(TypeError::TypeNotFound(_))));
}

#[test]
fn test_missing_required_attribute() {
    let ts = TypeSystem::new();
    diamond(&ts);
    let d = ts.get_trait_type("D").unwrap();

    let mut bag = full_bag();
    bag.remove("a");
    match d.convert(&bag, Multiplicity::Required) {
        Err(TypeError::MissingRequiredAttribute { attribute, .. }) => assert_eq!(attribute, "a"),
        other => panic!("unexpected {:?}", other),
    }

    // The diamond copy of `a` is required as well.
    let mut bag = full_bag();
    bag.remove("A.C.D.a");
    match d.convert(&bag, Multiplicity::Required) {
        Err(TypeError::MissingRequiredAttribute { attribute, .. }) => {
            assert_eq!(attribute, "A.C.D.a");
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut inst = convert_d(&ts);
    assert!(matches!(
        inst.set("a", metatype::Value::Null),
        Err(TypeError::MissingRequiredAttribute { .. })
    ));
    assert_eq!(inst.get_as::<i32>("a").unwrap(), 1);
}

#[test]
fn test_unknown_and_mistyped_attributes() {
    let ts = TypeSystem::new();
    diamond(&ts);
    let d = ts.get_trait_type("D").unwrap();

    let bag = full_bag().with("z", 1);
    assert!(matches!(
        d.convert(&bag, Multiplicity::Required),
        Err(TypeError::UnknownAttribute { .. })
    ));

    let bag = full_bag().with("c", 300);
    let err = d.convert(&bag, Multiplicity::Required).unwrap_err();
    assert_eq!(err.to_string(), "cannot convert int 300 to byte");

    let mut inst = convert_d(&ts);
    assert!(matches!(
        inst.set("A.B.b", true),
        Err(TypeError::UnknownAttribute { .. })
    ));
}

#[test]
fn test_lenient_registry_skips_unknown_attributes() {
    let ts = TypeSystem::with_config(TypeSystemConfig::lenient());
    diamond(&ts);
    let d = ts.get_trait_type("D").unwrap();
    let inst = d
        .convert(&full_bag().with("z", 1), Multiplicity::Required)
        .unwrap();
    assert_eq!(inst.to_string(), RENDERED_D);
}

#[test]
fn test_trait_value_conversion() {
    let ts = TypeSystem::new();
    diamond(&ts);
    let a = ts.get_trait_type("A").unwrap();

    assert!(a
        .convert_value(&metatype::Value::Null, Multiplicity::Optional)
        .unwrap()
        .is_none());
    assert!(matches!(
        a.convert_value(&metatype::Value::Null, Multiplicity::Required),
        Err(TypeError::TypeMismatch { .. })
    ));

    // A bag naming a subtype is converted with that subtype.
    let inst = a.convert(&full_bag(), Multiplicity::Required).unwrap();
    assert_eq!(inst.type_name(), "D");
    assert!(inst.is_a("A"));

    let bag = Struct::new("B").with("a", 1);
    let c = ts.get_trait_type("C").unwrap();
    assert!(matches!(
        c.convert(&bag, Multiplicity::Required),
        Err(TypeError::TypeMismatch { .. })
    ));
}

fn int_trait(name: &str, supertypes: &[&str], attributes: &[&str]) -> HierarchicalTypeDefinition {
    HierarchicalTypeDefinition::new(
        name,
        supertypes,
        attributes
            .iter()
            .map(|a| AttributeDefinition::optional(*a, "int"))
            .collect(),
    )
}

#[test]
fn test_sibling_supertypes_share_a_name() {
    let ts = TypeSystem::new();
    ts.define_trait_types(vec![
        int_trait("P", &[], &["x", "y"]),
        int_trait("Q", &[], &["x"]),
        int_trait("R", &["P", "Q"], &[]),
    ])
    .unwrap();

    // The first declared supertype keeps the short name, whatever its size.
    let r = ts.get_trait_type("R").unwrap();
    assert_eq!(r.field_names().collect::<Vec<_>>(), vec!["x", "y", "Q.R.x"]);

    let inst = r
        .convert(
            &Struct::new("R").with("x", 1).with("y", 2).with("Q.R.x", 3),
            Multiplicity::Required,
        )
        .unwrap();
    assert_eq!(inst.cast_as("P").unwrap().get_as::<i32>("x").unwrap(), 1);
    assert_eq!(inst.cast_as("Q").unwrap().get_as::<i32>("x").unwrap(), 3);
}

#[test]
fn test_redeclaring_chain() {
    let ts = TypeSystem::new();
    ts.define_trait_types(vec![
        int_trait("C", &["B"], &["a"]),
        int_trait("B", &["A"], &["a"]),
        int_trait("A", &[], &["a"]),
    ])
    .unwrap();

    let c = ts.get_trait_type("C").unwrap();
    assert_eq!(
        c.field_names().collect::<Vec<_>>(),
        vec!["a", "B.C.a", "A.B.C.a"]
    );
    assert_eq!(
        ts.get_trait_type("B").unwrap().field_names().collect::<Vec<_>>(),
        vec!["a", "A.B.a"]
    );

    let inst = c
        .convert(
            &Struct::new("C").with("a", 1).with("B.C.a", 2).with("A.B.C.a", 3),
            Multiplicity::Required,
        )
        .unwrap();
    let as_b = inst.cast_as("B").unwrap();
    assert_eq!(as_b.get_as::<i32>("a").unwrap(), 2);
    assert_eq!(as_b.get_as::<i32>("A.B.a").unwrap(), 3);
    assert_eq!(inst.cast_as("A").unwrap().get_as::<i32>("a").unwrap(), 3);
}

#[test]
fn test_asymmetric_diamond_casts() {
    init_logging();
    let ts = TypeSystem::new();
    ts.define_trait_types(vec![
        int_trait("A", &[], &["a"]),
        int_trait("B", &["A"], &["b"]),
        int_trait("E", &["A", "B"], &[]),
    ])
    .unwrap();

    let e = ts.get_trait_type("E").unwrap();
    assert_eq!(
        e.field_names().collect::<Vec<_>>(),
        vec!["a", "b", "A.B.E.a"]
    );

    let inst = e
        .convert(
            &Struct::new("E").with("a", 1).with("b", 2).with("A.B.E.a", 3),
            Multiplicity::Required,
        )
        .unwrap();

    let mut as_b = inst.cast_as("B").unwrap();
    assert_eq!(as_b.field_names().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(as_b.to_string(), "{\n\tb : \t2\n\ta : \t3\n}");

    // The direct route binds the directly inherited A, the route through B
    // binds the A behind B.
    let direct = inst.cast_as("A").unwrap();
    assert_eq!(direct.to_string(), "{\n\ta : \t1\n}");
    let through_b = as_b.cast_as("A").unwrap();
    assert_eq!(through_b.to_string(), "{\n\ta : \t3\n}");

    as_b.set("a", 5).unwrap();
    assert_eq!(inst.get_as::<i32>("A.B.E.a").unwrap(), 5);
    assert_eq!(through_b.get_as::<i32>("a").unwrap(), 5);
    assert_eq!(direct.get_as::<i32>("a").unwrap(), 1);
    assert_eq!(
        inst.to_string(),
        "{\n\ta : \t1\n\tb : \t2\n\tA.B.E.a : \t5\n}"
    );
}
