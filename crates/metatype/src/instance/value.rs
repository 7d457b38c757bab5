// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::error::{Result, TypeError};
use crate::instance::{Id, Instance, Referenceable, ReferenceableInstance, Struct};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// A value held by a field bag or an instance slot.
///
/// Typed instances only ever hold the canonical variant of the slot's data
/// type (an `int` slot holds `Int`, a struct slot holds `Instance`); field
/// bags may hold anything the converter can coerce.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    // Primitives
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    String(String),
    Date(DateTime<Utc>),

    // Containers
    Array(Vec<Value>),
    /// Entries in insertion order; keys are unique once converted.
    Map(Vec<(Value, Value)>),

    // Composites
    /// Untyped struct or trait bag.
    Struct(Box<Struct>),
    /// Typed struct or trait instance.
    Instance(Box<Instance>),
    /// Untyped class bag.
    Referenceable(Box<Referenceable>),
    /// Typed class object.
    Object(Box<ReferenceableInstance>),
    /// Reference to a class object by id.
    Reference(Id),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::BigInt(_) => "biginteger",
            Self::BigDecimal(_) => "bigdecimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
            Self::Instance(_) => "instance",
            Self::Referenceable(_) => "referenceable",
            Self::Object(_) => "object",
            Self::Reference(_) => "reference",
        }
    }

    /// Variant plus a short rendering, for error messages (`int 300`).
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::String(s) => format!("string {:?}", s),
            Self::Array(items) => format!("array of {}", items.len()),
            Self::Map(entries) => format!("map of {}", entries.len()),
            Self::Struct(bag) => format!("struct {}", bag.type_name()),
            Self::Instance(inst) => format!("instance of {}", inst.type_name()),
            Self::Referenceable(bag) => format!("referenceable {}", bag.type_name()),
            Self::Object(obj) => format!("object of {}", obj.type_name()),
            Self::Reference(id) => format!("reference {}", id),
            scalar => format!("{} {}", scalar.kind_name(), scalar),
        }
    }

    /// `true` for primitives (everything that renders on one line).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Boolean(_)
                | Self::Byte(_)
                | Self::Short(_)
                | Self::Int(_)
                | Self::Long(_)
                | Self::Float(_)
                | Self::Double(_)
                | Self::BigInt(_)
                | Self::BigDecimal(_)
                | Self::String(_)
                | Self::Date(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Any fixed-width integer, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric value as `f64`, possibly losing precision.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::BigInt(v) => v.to_f64(),
            Self::BigDecimal(v) => v.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Value stored under `key` if this is a map.
    pub fn map_get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ReferenceableInstance> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Id of a referenced or embedded class object.
    pub fn as_id(&self) -> Option<&Id> {
        match self {
            Self::Reference(id) => Some(id),
            Self::Object(obj) => Some(obj.id()),
            Self::Referenceable(bag) => bag.id(),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_scalar!(bool, Boolean);
impl_from_scalar!(i8, Byte);
impl_from_scalar!(i16, Short);
impl_from_scalar!(i32, Int);
impl_from_scalar!(i64, Long);
impl_from_scalar!(f32, Float);
impl_from_scalar!(f64, Double);
impl_from_scalar!(BigInt, BigInt);
impl_from_scalar!(BigDecimal, BigDecimal);
impl_from_scalar!(String, String);
impl_from_scalar!(DateTime<Utc>, Date);
impl_from_scalar!(Id, Reference);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Struct> for Value {
    fn from(v: Struct) -> Self {
        Value::Struct(Box::new(v))
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Self {
        Value::Instance(Box::new(v))
    }
}

impl From<Referenceable> for Value {
    fn from(v: Referenceable) -> Self {
        Value::Referenceable(Box::new(v))
    }
}

impl From<ReferenceableInstance> for Value {
    fn from(v: ReferenceableInstance) -> Self {
        Value::Object(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<&serde_json::Value> for Value {
    /// Integers become `Long` (or `BigInt` past `i64`), other numbers
    /// `Double`, objects string-keyed maps.
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Long(i)
                } else if let Some(u) = n.as_u64() {
                    Value::BigInt(BigInt::from(u))
                } else {
                    n.as_f64().map_or(Value::Null, Value::Double)
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

/// Extraction of Rust values from slot values.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v.to_owned()),
                    other => Err(TypeError::mismatch($name, other.describe())),
                }
            }
        }
    };
}

impl_from_value!(bool, Boolean, "boolean");
impl_from_value!(i8, Byte, "byte");
impl_from_value!(i16, Short, "short");
impl_from_value!(i32, Int, "int");
impl_from_value!(i64, Long, "long");
impl_from_value!(f32, Float, "float");
impl_from_value!(f64, Double, "double");
impl_from_value!(BigInt, BigInt, "biginteger");
impl_from_value!(BigDecimal, BigDecimal, "bigdecimal");
impl_from_value!(String, String, "string");
impl_from_value!(DateTime<Utc>, Date, "date");
impl_from_value!(Id, Reference, "reference");

impl FromValue for Instance {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Instance(inst) => Ok((**inst).clone()),
            other => Err(TypeError::mismatch("instance", other.describe())),
        }
    }
}

impl FromValue for ReferenceableInstance {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(obj) => Ok((**obj).clone()),
            other => Err(TypeError::mismatch("object", other.describe())),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            other => Err(TypeError::mismatch("array", other.describe())),
        }
    }
}
