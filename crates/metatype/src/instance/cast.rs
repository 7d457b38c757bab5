// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Ancestor-scoped views over an instance's storage.

use crate::error::{Result, TypeError};
use crate::instance::typed::{read_slot, write_slot, InstanceType, SlotStorage};
use crate::instance::{render, FromValue, Instance, Value};
use crate::types::FieldLayout;
use std::fmt;
use std::sync::Arc;

/// An instance seen as one of its ancestor types.
///
/// The view exposes the ancestor's own slot names and reads and writes the
/// original instance's storage; cloning a view yields another handle on the
/// same storage.
#[derive(Debug, Clone)]
pub struct CastView {
    ty: InstanceType,
    storage: SlotStorage,
    /// Storage index of each slot of `ty`'s layout.
    slot_map: Arc<[usize]>,
}

/// Build a view of `ty` (optionally itself a view through `slot_map`) as
/// `ancestor`.
pub(crate) fn cast(
    ty: &InstanceType,
    storage: &SlotStorage,
    slot_map: Option<&Arc<[usize]>>,
    ancestor: &str,
) -> Result<CastView> {
    let not_ancestor = || TypeError::NotAnAncestor {
        type_name: ty.name().to_string(),
        ancestor: ancestor.to_string(),
    };

    let (target, projection): (InstanceType, Arc<[usize]>) = if ty.name() == ancestor {
        (ty.clone(), (0..ty.layout().len()).collect())
    } else {
        let source = ty.hierarchical().ok_or_else(not_ancestor)?;
        let found = source.find_ancestor(ancestor).ok_or_else(not_ancestor)?;
        let projection = source.projection(found)?;
        (InstanceType::Hierarchy(Arc::clone(found)), projection)
    };

    let slot_map: Arc<[usize]> = match slot_map {
        Some(outer) => projection.iter().map(|&i| outer[i]).collect(),
        None => projection,
    };

    log::trace!("[cast] {} as {}", ty.name(), ancestor);
    Ok(CastView {
        ty: target,
        storage: Arc::clone(storage),
        slot_map,
    })
}

impl CastView {
    /// Name of the ancestor type the view is scoped to.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn layout(&self) -> &Arc<FieldLayout> {
        self.ty.layout()
    }

    /// Names in the ancestor's own naming, in its slot order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.ty.layout().names()
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        read_slot(&self.ty, &self.storage, Some(&self.slot_map[..]), name)
    }

    pub fn get_as<T: FromValue>(&self, name: &str) -> Result<T> {
        T::from_value(&self.get(name)?)
    }

    /// Coerce and store a value in the shared storage.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        write_slot(
            &self.ty,
            &self.storage,
            Some(&self.slot_map[..]),
            name,
            value.into(),
        )
    }

    /// Snapshot of the visible slots, in the ancestor's slot order.
    pub fn values(&self) -> Vec<Value> {
        let slots = self.storage.read();
        self.slot_map.iter().map(|&i| slots[i].clone()).collect()
    }

    /// View of the same storage as a further ancestor.
    pub fn cast_as(&self, ancestor: &str) -> Result<CastView> {
        cast(&self.ty, &self.storage, Some(&self.slot_map), ancestor)
    }

    /// Copy the visible slots into a standalone instance of the ancestor type.
    pub fn to_instance(&self) -> Instance {
        Instance::from_slots(self.ty.clone(), self.values())
    }

    /// `true` if both views address the same storage.
    pub fn shares_storage_with(&self, other: &CastView) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    pub(crate) fn storage(&self) -> &SlotStorage {
        &self.storage
    }
}

impl fmt::Display for CastView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.values();
        let mut out = String::new();
        render::write_block(
            &mut out,
            "",
            &self.ty.date_format(),
            self.ty.layout().names().zip(values.iter()),
        );
        f.write_str(&out)
    }
}
