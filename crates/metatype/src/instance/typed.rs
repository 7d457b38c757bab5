// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed instances.
//!
//! An [`Instance`] is a type handle plus a slot array laid out by the type's
//! [`FieldLayout`]. The slot array lives behind an `Arc` so cast views can
//! share it; cloning an instance copies the slots into fresh storage.

use crate::config::DEFAULT_DATE_FORMAT;
use crate::error::{Result, TypeError};
use crate::instance::{cast, render, CastView, Converter, FromValue, Id, Value};
use crate::registry::TypeSystem;
use crate::types::{FieldLayout, HierarchicalType, StructType, TypeCategory};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Slot array shared between an instance and its cast views.
pub(crate) type SlotStorage = Arc<RwLock<Vec<Value>>>;

/// Type an instance or view is laid out by.
#[derive(Debug, Clone)]
pub(crate) enum InstanceType {
    Struct(Arc<StructType>),
    Hierarchy(Arc<HierarchicalType>),
}

impl InstanceType {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Struct(ty) => ty.name(),
            Self::Hierarchy(ty) => ty.name(),
        }
    }

    pub(crate) fn category(&self) -> TypeCategory {
        match self {
            Self::Struct(_) => TypeCategory::Struct,
            Self::Hierarchy(ty) => ty.category(),
        }
    }

    pub(crate) fn layout(&self) -> &Arc<FieldLayout> {
        match self {
            Self::Struct(ty) => ty.layout(),
            Self::Hierarchy(ty) => ty.layout(),
        }
    }

    pub(crate) fn hierarchical(&self) -> Option<&Arc<HierarchicalType>> {
        match self {
            Self::Hierarchy(ty) => Some(ty),
            Self::Struct(_) => None,
        }
    }

    /// `true` if instances of this type may stand for `name`.
    pub(crate) fn is_a(&self, name: &str) -> bool {
        match self {
            Self::Struct(ty) => ty.name() == name,
            Self::Hierarchy(ty) => ty.is_subtype_of(name),
        }
    }

    pub(crate) fn registry(&self) -> Result<TypeSystem> {
        match self {
            Self::Struct(ty) => ty.registry().upgrade(ty.name()),
            Self::Hierarchy(ty) => ty.registry().upgrade(ty.name()),
        }
    }

    /// Date format of the owning registry, or the default once detached.
    pub(crate) fn date_format(&self) -> String {
        self.registry()
            .map(|ts| ts.config().date_format.clone())
            .unwrap_or_else(|_| DEFAULT_DATE_FORMAT.to_string())
    }
}

/// Coerce `value` for the slot exposed as `name` and store it.
///
/// `slot_map` translates the layout's slot index into a storage index for
/// cast views.
pub(crate) fn write_slot(
    ty: &InstanceType,
    storage: &SlotStorage,
    slot_map: Option<&[usize]>,
    name: &str,
    value: Value,
) -> Result<()> {
    let layout = ty.layout();
    let (index, slot) = layout
        .index_of(name)
        .and_then(|i| layout.slot(i).map(|s| (i, s)))
        .ok_or_else(|| TypeError::UnknownAttribute {
            type_name: ty.name().to_string(),
            attribute: name.to_string(),
        })?;
    let attr = &slot.attribute;

    let coerced = if value.is_null() {
        if attr.multiplicity.is_required() {
            return Err(TypeError::MissingRequiredAttribute {
                type_name: ty.name().to_string(),
                attribute: name.to_string(),
            });
        }
        Value::Null
    } else {
        let registry = ty.registry()?;
        Converter::new(&registry).coerce(&attr.data_type, attr.multiplicity, &value)?
    };

    let target = slot_map.map_or(index, |m| m[index]);
    storage.write()[target] = coerced;
    log::trace!("[write_slot] {}.{} -> slot {}", ty.name(), name, target);
    Ok(())
}

/// Read the slot exposed as `name`.
pub(crate) fn read_slot(
    ty: &InstanceType,
    storage: &SlotStorage,
    slot_map: Option<&[usize]>,
    name: &str,
) -> Result<Value> {
    let index = ty
        .layout()
        .index_of(name)
        .ok_or_else(|| TypeError::UnknownAttribute {
            type_name: ty.name().to_string(),
            attribute: name.to_string(),
        })?;
    let target = slot_map.map_or(index, |m| m[index]);
    Ok(storage.read()[target].clone())
}

/// Typed struct, trait or class instance.
pub struct Instance {
    ty: InstanceType,
    storage: SlotStorage,
}

impl Instance {
    pub(crate) fn from_slots(ty: InstanceType, slots: Vec<Value>) -> Self {
        Self {
            ty,
            storage: Arc::new(RwLock::new(slots)),
        }
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// `Struct`, `Trait` or `Class`.
    pub fn category(&self) -> TypeCategory {
        self.ty.category()
    }

    pub fn layout(&self) -> &Arc<FieldLayout> {
        self.ty.layout()
    }

    pub fn struct_type(&self) -> Option<&Arc<StructType>> {
        match &self.ty {
            InstanceType::Struct(ty) => Some(ty),
            InstanceType::Hierarchy(_) => None,
        }
    }

    pub fn hierarchical_type(&self) -> Option<&Arc<HierarchicalType>> {
        self.ty.hierarchical()
    }

    /// `true` if the instance's type is `name` or a subtype of it.
    pub fn is_a(&self, name: &str) -> bool {
        self.ty.is_a(name)
    }

    /// Every exposed name, in slot order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.ty.layout().names()
    }

    /// Value of the slot exposed as `name` (short or qualified).
    pub fn get(&self, name: &str) -> Result<Value> {
        read_slot(&self.ty, &self.storage, None, name)
    }

    /// Typed read.
    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        T::from_value(&self.get(name)?)
    }

    /// Coerce and store a value. Visible through every view of this instance.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        write_slot(&self.ty, &self.storage, None, name, value.into())
    }

    /// Snapshot of all slots, in slot order.
    pub fn values(&self) -> Vec<Value> {
        self.storage.read().clone()
    }

    /// View of this instance as `ancestor` (itself or any transitive
    /// supertype), sharing this instance's storage.
    pub fn cast_as(&self, ancestor: &str) -> Result<CastView> {
        cast::cast(&self.ty, &self.storage, None, ancestor)
    }

    /// `true` if `view` reads and writes this instance's slots.
    pub fn shares_storage_with(&self, view: &CastView) -> bool {
        Arc::ptr_eq(&self.storage, view.storage())
    }
}

impl Clone for Instance {
    /// Deep copy: the clone owns fresh storage.
    fn clone(&self) -> Self {
        Self::from_slots(self.ty.clone(), self.storage.read().clone())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && (Arc::ptr_eq(&self.storage, &other.storage)
                || *self.storage.read() == *other.storage.read())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name())
            .field("slots", &*self.storage.read())
            .finish()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        render::write_instance(&mut out, self, "", &self.ty.date_format());
        f.write_str(&out)
    }
}

/// Typed class object: identity, class instance and attached trait instances.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceableInstance {
    id: Id,
    instance: Instance,
    traits: Vec<(String, Instance)>,
}

impl ReferenceableInstance {
    pub(crate) fn new(id: Id, instance: Instance, traits: Vec<(String, Instance)>) -> Self {
        Self {
            id,
            instance,
            traits,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        self.instance.type_name()
    }

    /// Class attributes.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        self.instance.get(name)
    }

    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        self.instance.get_as(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.instance.set(name, value)
    }

    pub fn cast_as(&self, ancestor: &str) -> Result<CastView> {
        self.instance.cast_as(ancestor)
    }

    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.iter().map(|(n, _)| n.as_str())
    }

    pub fn get_trait(&self, name: &str) -> Option<&Instance> {
        self.traits.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn trait_mut(&mut self, name: &str) -> Option<&mut Instance> {
        self.traits
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub(crate) fn traits(&self) -> &[(String, Instance)] {
        &self.traits
    }
}

impl fmt::Display for ReferenceableInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        render::write_object(&mut out, self, "", &self.instance.ty.date_format());
        f.write_str(&out)
    }
}
