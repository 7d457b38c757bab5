// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model: data types, attributes, definitions, resolved layouts and the
//! registered struct/trait/class types built from them.

mod attribute;
mod data_type;
mod definition;
mod hierarchy;
mod layout;

pub use attribute::{AttributeDefinition, AttributeInfo, Multiplicity};
pub(crate) use data_type::is_identifier;
pub use data_type::{DataType, PrimitiveKind, TypeCategory, TypeExpr};
pub use definition::{HierarchicalTypeDefinition, StructTypeDefinition, TypesDef};
pub use hierarchy::{HierarchicalType, StructType, Type};
pub use layout::{resolve_layout, FieldLayout, PathNode, Slot};
