// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hierarchical metadata type engine.
//!
//! Declares struct, trait and class types with multiple inheritance, resolves
//! a flat slot layout for each of them (diamond paths included), converts
//! untyped field bags into typed instances and casts instances to ancestor
//! views that share the instance storage.
//!
//! # Features
//!
//! - **Atomic registration**: a batch of types becomes visible entirely or not at all
//! - **Diamond-aware layouts**: every inheritance path gets its own slots, reachable
//!   by a qualified name such as `A.B.D.b`
//! - **Conversion**: field bags are checked against multiplicities and coerced
//!   to the declared primitive kinds
//! - **Cast views**: ancestor-scoped views that read and write the same slots
//! - **Canonical rendering**: a stable tab-indented text form of instances
//!
//! # Architecture
//!
//! ```text
//!   TypesDef / definitions
//!          |
//!          v
//!   TypeSystem (catalog, batch validation)
//!          |
//!          v
//!   FieldLayout (path tree, slots, projections)
//!          |
//!          v
//!   Instance <--shared slots--> CastView
//! ```
//!
//! # Example
//!
//! ```
//! use metatype::{AttributeDefinition, HierarchicalTypeDefinition, Multiplicity, Struct, TypeSystem};
//!
//! let ts = TypeSystem::new();
//! ts.define_class_types(vec![
//!     HierarchicalTypeDefinition::new(
//!         "Person",
//!         &[] as &[&str],
//!         vec![AttributeDefinition::required("name", "string")],
//!     ),
//!     HierarchicalTypeDefinition::new(
//!         "Employee",
//!         &["Person"],
//!         vec![AttributeDefinition::optional("salary", "double")],
//!     ),
//! ])?;
//!
//! let employee = ts.get_class_type("Employee")?;
//! let bag = Struct::new("Employee").with("name", "Ada").with("salary", 10);
//! let instance = employee.convert(&bag, Multiplicity::Required)?;
//!
//! let mut person = instance.cast_as("Person")?;
//! person.set("name", "Grace")?;
//! assert_eq!(instance.get_as::<String>("name")?, "Grace");
//! # Ok::<(), metatype::TypeError>(())
//! ```

pub mod config;
pub mod error;
pub mod instance;
pub mod registry;
pub mod types;

pub use config::{ConfigError, TypeSystemConfig, DEFAULT_DATE_FORMAT};
pub use error::{Result, TypeError};
pub use instance::{
    CastView, FromValue, Id, Instance, Referenceable, ReferenceableInstance, Struct, Value,
};
pub use registry::{TypeRepository, TypeSystem};
pub use types::{
    resolve_layout, AttributeDefinition, AttributeInfo, DataType, FieldLayout, HierarchicalType,
    HierarchicalTypeDefinition, Multiplicity, PathNode, PrimitiveKind, Slot, StructType,
    StructTypeDefinition, Type, TypeCategory, TypeExpr, TypesDef,
};
