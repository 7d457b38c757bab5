// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registered struct, trait and class types.
//!
//! These are the facades callers convert field bags with. Each one owns its
//! resolved [`FieldLayout`] and keeps a weak handle on the registry it was
//! defined in, so nested struct and class values can be looked up by name at
//! conversion time.

use crate::error::{Result, TypeError};
use crate::instance::{
    Converter, Instance, InstanceType, Referenceable, ReferenceableInstance, Struct, Value,
};
use crate::registry::{TypeSystem, TypeSystemHandle};
use crate::types::{
    AttributeInfo, FieldLayout, HierarchicalTypeDefinition, Multiplicity, PrimitiveKind,
    StructTypeDefinition, TypeCategory,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// A registered struct type.
#[derive(Debug)]
pub struct StructType {
    name: String,
    is_abstract: bool,
    attributes: Vec<Arc<AttributeInfo>>,
    layout: Arc<FieldLayout>,
    registry: TypeSystemHandle,
}

impl StructType {
    pub(crate) fn new(
        name: String,
        is_abstract: bool,
        attributes: Vec<Arc<AttributeInfo>>,
        layout: FieldLayout,
        registry: TypeSystemHandle,
    ) -> Self {
        Self {
            name,
            is_abstract,
            attributes,
            layout: Arc::new(layout),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the struct was declared abstract. Recorded only; abstract
    /// structs still convert.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Declared attributes, in declaration order.
    pub fn attributes(&self) -> &[Arc<AttributeInfo>] {
        &self.attributes
    }

    pub fn layout(&self) -> &Arc<FieldLayout> {
        &self.layout
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.layout.names()
    }

    pub(crate) fn registry(&self) -> &TypeSystemHandle {
        &self.registry
    }

    /// Declared form of the type.
    pub fn definition(&self) -> StructTypeDefinition {
        StructTypeDefinition::new(
            self.name.clone(),
            self.attributes.iter().map(|a| a.to_definition()).collect(),
        )
    }

    /// Convert a field bag into a typed instance.
    ///
    /// The bag must be untyped (empty type name) or name this struct.
    pub fn convert(self: &Arc<Self>, bag: &Struct, multiplicity: Multiplicity) -> Result<Instance> {
        if !bag.type_name().is_empty() && bag.type_name() != self.name {
            return Err(TypeError::mismatch(
                &self.name,
                format!("struct {}", bag.type_name()),
            ));
        }
        let registry = self.registry.upgrade(&self.name)?;
        Converter::new(&registry).convert_bag(InstanceType::Struct(self.clone()), bag, multiplicity)
    }

    /// Convert any value that can stand for this struct.
    ///
    /// `Null` yields `None` in optional contexts and fails in required ones.
    pub fn convert_value(
        self: &Arc<Self>,
        value: &Value,
        multiplicity: Multiplicity,
    ) -> Result<Option<Instance>> {
        let registry = self.registry.upgrade(&self.name)?;
        Converter::new(&registry).instance_from_value(
            InstanceType::Struct(self.clone()),
            value,
            multiplicity,
        )
    }
}

/// A registered trait or class type.
#[derive(Debug)]
pub struct HierarchicalType {
    name: String,
    category: TypeCategory,
    supertypes: Vec<Arc<HierarchicalType>>,
    attributes: Vec<Arc<AttributeInfo>>,
    layout: Arc<FieldLayout>,
    ancestors: Vec<String>,
    /// Cast mappings, keyed by ancestor name.
    projections: DashMap<String, Arc<[usize]>>,
    registry: TypeSystemHandle,
}

impl HierarchicalType {
    pub(crate) fn new(
        name: String,
        category: TypeCategory,
        supertypes: Vec<Arc<HierarchicalType>>,
        attributes: Vec<Arc<AttributeInfo>>,
        layout: FieldLayout,
        registry: TypeSystemHandle,
    ) -> Self {
        let ancestors = layout.ancestor_names();
        Self {
            name,
            category,
            supertypes,
            attributes,
            layout: Arc::new(layout),
            ancestors,
            projections: DashMap::new(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Trait` or `Class`.
    pub fn category(&self) -> TypeCategory {
        self.category
    }

    pub fn is_trait(&self) -> bool {
        self.category == TypeCategory::Trait
    }

    pub fn is_class(&self) -> bool {
        self.category == TypeCategory::Class
    }

    /// Direct supertype names, in declaration order.
    pub fn supertype_names(&self) -> Vec<&str> {
        self.supertypes.iter().map(|s| s.name()).collect()
    }

    /// Direct supertypes, in declaration order.
    pub fn supertype_types(&self) -> &[Arc<HierarchicalType>] {
        &self.supertypes
    }

    /// Attributes declared on this type itself.
    pub fn attributes(&self) -> &[Arc<AttributeInfo>] {
        &self.attributes
    }

    pub fn layout(&self) -> &Arc<FieldLayout> {
        &self.layout
    }

    /// Every exposed name, primaries and qualified shadows, in slot order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.layout.names()
    }

    /// Every transitive supertype, breadth-first.
    pub fn all_supertypes(&self) -> &[String] {
        &self.ancestors
    }

    /// `true` if `name` is this type or one of its transitive supertypes.
    pub fn is_subtype_of(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }

    /// First transitive supertype called `name`, breadth-first.
    pub fn find_ancestor(&self, name: &str) -> Option<&Arc<HierarchicalType>> {
        let mut queue: VecDeque<&Arc<HierarchicalType>> = self.supertypes.iter().collect();
        while let Some(ty) = queue.pop_front() {
            if ty.name == name {
                return Some(ty);
            }
            queue.extend(ty.supertypes.iter());
        }
        None
    }

    pub(crate) fn registry(&self) -> &TypeSystemHandle {
        &self.registry
    }

    /// Declared form of the type.
    pub fn definition(&self) -> HierarchicalTypeDefinition {
        HierarchicalTypeDefinition::new(
            self.name.clone(),
            &self.supertype_names(),
            self.attributes.iter().map(|a| a.to_definition()).collect(),
        )
    }

    /// Slot index, in this type's storage, of every slot of `ancestor`.
    pub(crate) fn projection(&self, ancestor: &HierarchicalType) -> Result<Arc<[usize]>> {
        if let Some(hit) = self.projections.get(ancestor.name()) {
            return Ok(Arc::clone(hit.value()));
        }
        let map: Arc<[usize]> = self
            .layout
            .project(&ancestor.layout)
            .ok_or_else(|| TypeError::NotAnAncestor {
                type_name: self.name.clone(),
                ancestor: ancestor.name.clone(),
            })?
            .into();
        log::trace!(
            "[HierarchicalType::projection] {} -> {}: {} slots",
            self.name,
            ancestor.name,
            map.len()
        );
        self.projections
            .insert(ancestor.name.clone(), Arc::clone(&map));
        Ok(map)
    }

    /// Convert a field bag into a typed instance.
    ///
    /// A bag naming a registered subtype of this type is converted with that
    /// subtype.
    pub fn convert(self: &Arc<Self>, bag: &Struct, multiplicity: Multiplicity) -> Result<Instance> {
        let registry = self.registry.upgrade(&self.name)?;
        let target = self.bag_target(&registry, bag.type_name())?;
        Converter::new(&registry).convert_bag(InstanceType::Hierarchy(target), bag, multiplicity)
    }

    /// Convert any value that can stand for this type.
    ///
    /// `Null` yields `None` in optional contexts and fails in required ones.
    pub fn convert_value(
        self: &Arc<Self>,
        value: &Value,
        multiplicity: Multiplicity,
    ) -> Result<Option<Instance>> {
        let registry = self.registry.upgrade(&self.name)?;
        Converter::new(&registry).instance_from_value(
            InstanceType::Hierarchy(self.clone()),
            value,
            multiplicity,
        )
    }

    /// Convert an untyped class bag (with its traits) into a class object.
    pub fn convert_referenceable(
        self: &Arc<Self>,
        bag: &Referenceable,
        multiplicity: Multiplicity,
    ) -> Result<ReferenceableInstance> {
        if !self.is_class() {
            return Err(TypeError::mismatch(
                "class",
                format!("trait {}", self.name),
            ));
        }
        let registry = self.registry.upgrade(&self.name)?;
        let target = self.bag_target(&registry, bag.type_name())?;
        Converter::new(&registry).convert_referenceable(&target, bag, multiplicity)
    }

    /// Type a bag called `bag_type` converts with when `self` is requested.
    pub(crate) fn bag_target(
        self: &Arc<Self>,
        registry: &TypeSystem,
        bag_type: &str,
    ) -> Result<Arc<Self>> {
        if bag_type.is_empty() || bag_type == self.name {
            return Ok(self.clone());
        }
        let found = || TypeError::mismatch(&self.name, format!("{} {}", self.category, bag_type));
        match registry.get_type(bag_type) {
            Ok(Type::Trait(ty)) | Ok(Type::Class(ty))
                if ty.category == self.category && ty.is_subtype_of(&self.name) =>
            {
                Ok(ty)
            }
            _ => Err(found()),
        }
    }
}

/// Any type known to a registry.
#[derive(Debug, Clone)]
pub enum Type {
    Primitive(PrimitiveKind),
    Struct(Arc<StructType>),
    Trait(Arc<HierarchicalType>),
    Class(Arc<HierarchicalType>),
}

impl Type {
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(kind) => kind.name(),
            Self::Struct(ty) => ty.name(),
            Self::Trait(ty) | Self::Class(ty) => ty.name(),
        }
    }

    pub fn category(&self) -> TypeCategory {
        match self {
            Self::Primitive(_) => TypeCategory::Primitive,
            Self::Struct(_) => TypeCategory::Struct,
            Self::Trait(_) => TypeCategory::Trait,
            Self::Class(_) => TypeCategory::Class,
        }
    }

    /// Resolved layout, for struct, trait and class types.
    pub fn layout(&self) -> Option<&Arc<FieldLayout>> {
        match self {
            Self::Primitive(_) => None,
            Self::Struct(ty) => Some(ty.layout()),
            Self::Trait(ty) | Self::Class(ty) => Some(ty.layout()),
        }
    }

    pub fn as_struct(&self) -> Option<&Arc<StructType>> {
        match self {
            Self::Struct(ty) => Some(ty),
            _ => None,
        }
    }

    /// Trait or class type.
    pub fn as_hierarchical(&self) -> Option<&Arc<HierarchicalType>> {
        match self {
            Self::Trait(ty) | Self::Class(ty) => Some(ty),
            _ => None,
        }
    }
}
