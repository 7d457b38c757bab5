// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field bag to typed instance conversion.
//!
//! Conversion resolves every bag entry against the target layout, coerces it
//! to the slot's declared data type and only then checks that every
//! `Required` slot holds a value. Nothing is observable until the whole
//! instance has been built.

use crate::error::{Result, TypeError};
use crate::instance::typed::InstanceType;
use crate::instance::{Id, Instance, Referenceable, ReferenceableInstance, Struct, Value};
use crate::registry::TypeSystem;
use crate::types::{DataType, HierarchicalType, Multiplicity, PrimitiveKind};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use std::sync::Arc;

/// Converts bags and values against the types of one registry.
pub(crate) struct Converter<'a> {
    registry: &'a TypeSystem,
    strict: bool,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(registry: &'a TypeSystem) -> Self {
        Self {
            registry,
            strict: registry.config().strict_attributes,
        }
    }

    /// Convert a bag whose type has already been checked against `ty`.
    pub(crate) fn convert_bag(
        &self,
        ty: InstanceType,
        bag: &Struct,
        multiplicity: Multiplicity,
    ) -> Result<Instance> {
        log::trace!(
            "[Converter::convert_bag] {} ({} entries, {})",
            ty.name(),
            bag.len(),
            multiplicity
        );
        self.build(ty, bag.iter())
    }

    /// Convert any value standing for an instance of `ty`: an untyped bag, a
    /// string-keyed map or an instance of `ty` (or of a subtype).
    pub(crate) fn instance_from_value(
        &self,
        ty: InstanceType,
        value: &Value,
        multiplicity: Multiplicity,
    ) -> Result<Option<Instance>> {
        match value {
            Value::Null if multiplicity.is_required() => {
                Err(TypeError::mismatch(ty.name(), "null"))
            }
            Value::Null => Ok(None),
            Value::Struct(bag) => {
                let target = self.bag_type(&ty, bag.type_name())?;
                self.build(target, bag.iter()).map(Some)
            }
            Value::Map(entries) => {
                let bag = Struct::from_map(ty.name(), entries)?;
                self.build(ty, bag.iter()).map(Some)
            }
            Value::Instance(inst) if inst.is_a(ty.name()) => Ok(Some((**inst).clone())),
            other => Err(TypeError::mismatch(ty.name(), other.describe())),
        }
    }

    /// Convert a class bag and its trait bags.
    pub(crate) fn convert_referenceable(
        &self,
        class: &Arc<HierarchicalType>,
        bag: &Referenceable,
        multiplicity: Multiplicity,
    ) -> Result<ReferenceableInstance> {
        log::trace!(
            "[Converter::convert_referenceable] {} ({})",
            class.name(),
            multiplicity
        );
        let instance = self.build(InstanceType::Hierarchy(Arc::clone(class)), bag.values().iter())?;

        let mut traits = Vec::with_capacity(bag.traits().len());
        for trait_bag in bag.traits() {
            let trait_type = self.registry.get_trait_type(trait_bag.type_name())?;
            let converted = self.build(InstanceType::Hierarchy(trait_type), trait_bag.iter())?;
            traits.push((trait_bag.type_name().to_string(), converted));
        }

        let id = bag
            .id()
            .cloned()
            .unwrap_or_else(|| Id::unassigned(class.name()));
        Ok(ReferenceableInstance::new(id, instance, traits))
    }

    fn bag_type(&self, ty: &InstanceType, bag_type: &str) -> Result<InstanceType> {
        match ty {
            InstanceType::Struct(st) => {
                if bag_type.is_empty() || bag_type == st.name() {
                    Ok(ty.clone())
                } else {
                    Err(TypeError::mismatch(
                        st.name(),
                        format!("struct {}", bag_type),
                    ))
                }
            }
            InstanceType::Hierarchy(ht) => ht
                .bag_target(self.registry, bag_type)
                .map(InstanceType::Hierarchy),
        }
    }

    fn build<'v, I>(&self, ty: InstanceType, entries: I) -> Result<Instance>
    where
        I: Iterator<Item = (&'v str, &'v Value)>,
    {
        let layout = Arc::clone(ty.layout());
        let mut slots = vec![Value::Null; layout.len()];

        for (name, value) in entries {
            let Some((index, slot)) = layout
                .index_of(name)
                .and_then(|i| layout.slot(i).map(|s| (i, s)))
            else {
                if self.strict {
                    return Err(TypeError::UnknownAttribute {
                        type_name: ty.name().to_string(),
                        attribute: name.to_string(),
                    });
                }
                log::warn!(
                    "[Converter::build] {}: ignoring unknown attribute '{}'",
                    ty.name(),
                    name
                );
                continue;
            };
            let attr = &slot.attribute;
            slots[index] = self.coerce(&attr.data_type, attr.multiplicity, value)?;
        }

        if let Some((slot, _)) = layout
            .slots()
            .iter()
            .zip(&slots)
            .find(|(slot, value)| slot.attribute.multiplicity.is_required() && value.is_null())
        {
            return Err(TypeError::MissingRequiredAttribute {
                type_name: ty.name().to_string(),
                attribute: slot.name.clone(),
            });
        }

        Ok(Instance::from_slots(ty, slots))
    }

    /// Coerce `value` to `data_type`. `Null` passes through; callers decide
    /// whether it is allowed.
    pub(crate) fn coerce(
        &self,
        data_type: &DataType,
        multiplicity: Multiplicity,
        value: &Value,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match data_type {
            DataType::Primitive(kind) => {
                coerce_primitive(*kind, value, &self.registry.config().date_format)
            }
            DataType::Array(element) => self.coerce_array(data_type, element, multiplicity, value),
            DataType::Map(key, val) => self.coerce_map(data_type, key, val, value),
            DataType::Struct(name) => {
                let ty = self.registry.get_struct_type(name)?;
                self.nested(InstanceType::Struct(ty), value)
            }
            DataType::Trait(name) => {
                let ty = self.registry.get_trait_type(name)?;
                self.nested(InstanceType::Hierarchy(ty), value)
            }
            DataType::Class(name) => self.coerce_class(name, value),
        }
    }

    fn nested(&self, ty: InstanceType, value: &Value) -> Result<Value> {
        Ok(self
            .instance_from_value(ty, value, Multiplicity::Required)?
            .map_or(Value::Null, Value::from))
    }

    fn coerce_array(
        &self,
        data_type: &DataType,
        element: &DataType,
        multiplicity: Multiplicity,
        value: &Value,
    ) -> Result<Value> {
        let Value::Array(items) = value else {
            return Err(TypeError::mismatch(data_type.name(), value.describe()));
        };
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if item.is_null() {
                return Err(TypeError::mismatch(element.name(), "null element"));
            }
            let converted = self.coerce(element, Multiplicity::Required, item)?;
            if multiplicity.is_unique() && out.contains(&converted) {
                continue;
            }
            out.push(converted);
        }
        Ok(Value::Array(out))
    }

    fn coerce_map(
        &self,
        data_type: &DataType,
        key_type: &DataType,
        value_type: &DataType,
        value: &Value,
    ) -> Result<Value> {
        let Value::Map(entries) = value else {
            return Err(TypeError::mismatch(data_type.name(), value.describe()));
        };
        let mut out: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            if k.is_null() {
                return Err(TypeError::mismatch(key_type.name(), "null key"));
            }
            let k = self.coerce(key_type, Multiplicity::Required, k)?;
            let v = self.coerce(value_type, Multiplicity::Optional, v)?;
            match out.iter_mut().find(|(existing, _)| *existing == k) {
                Some(entry) => entry.1 = v,
                None => out.push((k, v)),
            }
        }
        Ok(Value::Map(out))
    }

    fn coerce_class(&self, name: &str, value: &Value) -> Result<Value> {
        let class = self.registry.get_class_type(name)?;
        let accepts = |type_name: &str| -> Result<()> {
            let is_subclass = type_name == name
                || self
                    .registry
                    .get_class_type(type_name)
                    .map(|t| t.is_subtype_of(name))
                    .unwrap_or(false);
            if is_subclass {
                Ok(())
            } else {
                Err(TypeError::mismatch(name, format!("class {}", type_name)))
            }
        };

        match value {
            Value::Reference(id) => {
                accepts(&id.type_name)?;
                Ok(value.clone())
            }
            Value::Object(obj) => {
                accepts(obj.type_name())?;
                Ok(value.clone())
            }
            Value::Referenceable(bag) => {
                let target = class.bag_target(self.registry, bag.type_name())?;
                let obj = self.convert_referenceable(&target, bag, Multiplicity::Required)?;
                Ok(Value::Object(Box::new(obj)))
            }
            other => Err(TypeError::mismatch(name, other.describe())),
        }
    }
}

/// Coerce a scalar to the canonical representation of `kind`. Date strings
/// are read as RFC 3339 or, failing that, with `date_format`.
pub(crate) fn coerce_primitive(
    kind: PrimitiveKind,
    value: &Value,
    date_format: &str,
) -> Result<Value> {
    let fail = || TypeError::mismatch(kind.name(), value.describe());
    match kind {
        PrimitiveKind::Boolean => match value {
            Value::Boolean(b) => Ok(Value::Boolean(*b)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => {
                Ok(Value::Boolean(false))
            }
            _ => Err(fail()),
        },
        PrimitiveKind::Byte => integral(value)
            .and_then(|n| i8::try_from(n).ok())
            .map(Value::Byte)
            .ok_or_else(fail),
        PrimitiveKind::Short => integral(value)
            .and_then(|n| i16::try_from(n).ok())
            .map(Value::Short)
            .ok_or_else(fail),
        PrimitiveKind::Int => integral(value)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::Int)
            .ok_or_else(fail),
        PrimitiveKind::Long => integral(value).map(Value::Long).ok_or_else(fail),
        PrimitiveKind::Float => floating(value)
            .and_then(narrow_f32)
            .map(Value::Float)
            .ok_or_else(fail),
        PrimitiveKind::Double => floating(value).map(Value::Double).ok_or_else(fail),
        PrimitiveKind::BigInt => big_integer(value).map(Value::BigInt).ok_or_else(fail),
        PrimitiveKind::BigDecimal => big_decimal(value).map(Value::BigDecimal).ok_or_else(fail),
        PrimitiveKind::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            scalar if scalar.is_scalar() => Ok(Value::String(scalar.to_string())),
            _ => Err(fail()),
        },
        PrimitiveKind::Date => date(value, date_format)
            .map(Value::Date)
            .ok_or_else(fail),
    }
}

/// Integral value of `value`, if it has one that fits an `i64`.
fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Float(f) => whole_f64(f64::from(*f)),
        Value::Double(f) => whole_f64(*f),
        Value::BigInt(b) => b.to_i64(),
        Value::BigDecimal(d) if is_whole(d) => d.to_i64(),
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    }
}

fn whole_f64(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict bound.
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn is_whole(d: &BigDecimal) -> bool {
    let (_, exponent) = d.normalized().as_bigint_and_exponent();
    exponent <= 0
}

fn floating(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_f64(),
    }
}

fn narrow_f32(f: f64) -> Option<f32> {
    if f.is_finite() && f.abs() > f64::from(f32::MAX) {
        None
    } else {
        Some(f as f32)
    }
}

fn big_integer(value: &Value) -> Option<BigInt> {
    match value {
        Value::BigInt(b) => Some(b.clone()),
        Value::BigDecimal(d) if is_whole(d) => Some(d.with_scale(0).as_bigint_and_exponent().0),
        Value::BigDecimal(_) => None,
        Value::Float(_) | Value::Double(_) => {
            let f = value.as_f64()?;
            if f.is_finite() && f.fract() == 0.0 {
                BigInt::from_f64(f)
            } else {
                None
            }
        }
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64().map(BigInt::from),
    }
}

fn big_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::BigDecimal(d) => Some(d.clone()),
        Value::BigInt(b) => Some(BigDecimal::new(b.clone(), 0)),
        // Through the shortest decimal text, so 1.1f32 stays 1.1.
        Value::Float(f) => f.to_string().parse().ok(),
        Value::Double(f) => f.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        other => other.as_i64().map(BigDecimal::from),
    }
}

fn date(value: &Value, format: &str) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(d) => Some(*d),
        Value::String(s) => parse_date(s.trim(), format),
        other => other
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    }
}

fn parse_date(s: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_str(s, format) {
        return Some(d.with_timezone(&Utc));
    }
    // Formats without an offset are read as UTC, date-only ones at midnight.
    NaiveDateTime::parse_from_str(s, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}
