// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type definitions as handed to the registry, and the JSON document
//! ([`TypesDef`]) that bundles them.

use crate::error::Result;
use crate::types::AttributeDefinition;
use serde::{Deserialize, Serialize};

/// Definition of a struct: a standalone composite with no supertypes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

impl StructTypeDefinition {
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeDefinition>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }
}

/// Definition of a trait or class.
///
/// Supertype names behave as an ordered set: declaration order is kept and
/// repeated names are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub supertype_names: Vec<String>,
    #[serde(default)]
    pub own_attributes: Vec<AttributeDefinition>,
}

impl HierarchicalTypeDefinition {
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        supertype_names: &[S],
        own_attributes: Vec<AttributeDefinition>,
    ) -> Self {
        let mut supers: Vec<String> = Vec::with_capacity(supertype_names.len());
        for s in supertype_names {
            let s = s.as_ref();
            if !supers.iter().any(|existing| existing == s) {
                supers.push(s.to_string());
            }
        }
        Self {
            name: name.into(),
            supertype_names: supers,
            own_attributes,
        }
    }

    /// Supertype names with duplicates removed, declaration order kept.
    pub(crate) fn distinct_supertypes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.supertype_names.len());
        for s in &self.supertype_names {
            if !out.contains(&s.as_str()) {
                out.push(s);
            }
        }
        out
    }
}

/// A batch of type definitions, as exchanged in JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesDef {
    #[serde(default)]
    pub struct_types: Vec<StructTypeDefinition>,
    #[serde(default)]
    pub trait_types: Vec<HierarchicalTypeDefinition>,
    #[serde(default)]
    pub class_types: Vec<HierarchicalTypeDefinition>,
}

impl TypesDef {
    pub fn new(
        struct_types: Vec<StructTypeDefinition>,
        trait_types: Vec<HierarchicalTypeDefinition>,
        class_types: Vec<HierarchicalTypeDefinition>,
    ) -> Self {
        Self {
            struct_types,
            trait_types,
            class_types,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.struct_types.is_empty() && self.trait_types.is_empty() && self.class_types.is_empty()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
