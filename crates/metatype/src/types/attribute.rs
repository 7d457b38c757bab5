// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Attribute definitions (declared) and attribute infos (resolved).

use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many values an attribute holds and whether it must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    /// Exactly one non-null value.
    Required,
    /// Zero or one value.
    Optional,
    /// Ordered values, duplicates allowed.
    Collection,
    /// Unique values.
    Set,
}

impl Multiplicity {
    /// Lower bound on the number of values.
    pub fn lower(&self) -> usize {
        match self {
            Self::Required => 1,
            _ => 0,
        }
    }

    /// Upper bound on the number of values (`usize::MAX` when unbounded).
    pub fn upper(&self) -> usize {
        match self {
            Self::Required | Self::Optional => 1,
            Self::Collection | Self::Set => usize::MAX,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// `true` for `Collection` and `Set`.
    pub fn is_many(&self) -> bool {
        self.upper() > 1
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Set)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Collection => "collection",
            Self::Set => "set",
        };
        f.write_str(s)
    }
}

/// One named slot as declared on a type.
///
/// The data type is named textually (`int`, `array<Person>`) and resolved
/// when the owning type is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    /// Attribute name, unique among the attributes declared on one type.
    pub name: String,
    /// Textual data type name.
    pub data_type_name: String,
    /// Presence and cardinality.
    pub multiplicity: Multiplicity,
    /// The referenced value is owned by the declaring instance.
    #[serde(default)]
    pub is_composite: bool,
    /// Name of the attribute on the referenced class that points back here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse_attribute_name: Option<String>,
}

impl AttributeDefinition {
    /// Create a definition.
    pub fn new(
        name: impl Into<String>,
        data_type: impl ToString,
        multiplicity: Multiplicity,
        is_composite: bool,
        reverse_attribute_name: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type_name: data_type.to_string(),
            multiplicity,
            is_composite,
            reverse_attribute_name: reverse_attribute_name.map(str::to_string),
        }
    }

    /// `Required`, non-composite attribute.
    pub fn required(name: impl Into<String>, data_type: impl ToString) -> Self {
        Self::new(name, data_type, Multiplicity::Required, false, None)
    }

    /// `Optional`, non-composite attribute.
    pub fn optional(name: impl Into<String>, data_type: impl ToString) -> Self {
        Self::new(name, data_type, Multiplicity::Optional, false, None)
    }

    /// `Collection` attribute; the data type must be an array.
    pub fn collection(name: impl Into<String>, data_type: impl ToString) -> Self {
        Self::new(name, data_type, Multiplicity::Collection, false, None)
    }

    /// `Set` attribute; the data type must be an array.
    pub fn set(name: impl Into<String>, data_type: impl ToString) -> Self {
        Self::new(name, data_type, Multiplicity::Set, false, None)
    }

    /// Mark the attribute composite.
    pub fn composite(mut self) -> Self {
        self.is_composite = true;
        self
    }

    /// Set the reverse attribute name.
    pub fn with_reverse(mut self, reverse: impl Into<String>) -> Self {
        self.reverse_attribute_name = Some(reverse.into());
        self
    }
}

/// Attribute after registration: the data type is resolved and the
/// declaring type recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub data_type: DataType,
    pub multiplicity: Multiplicity,
    pub is_composite: bool,
    pub reverse_attribute_name: Option<String>,
    /// Type that declares the attribute.
    pub declaring_type: String,
}

impl AttributeInfo {
    pub(crate) fn new(
        definition: &AttributeDefinition,
        data_type: DataType,
        declaring_type: &str,
    ) -> Self {
        Self {
            name: definition.name.clone(),
            data_type,
            multiplicity: definition.multiplicity,
            is_composite: definition.is_composite,
            reverse_attribute_name: definition.reverse_attribute_name.clone(),
            declaring_type: declaring_type.to_string(),
        }
    }

    /// Rebuild the declared form.
    pub fn to_definition(&self) -> AttributeDefinition {
        AttributeDefinition {
            name: self.name.clone(),
            data_type_name: self.data_type.name(),
            multiplicity: self.multiplicity,
            is_composite: self.is_composite,
            reverse_attribute_name: self.reverse_attribute_name.clone(),
        }
    }
}
