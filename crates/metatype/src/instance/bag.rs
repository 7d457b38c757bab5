// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Untyped field bags and object ids.
//!
//! A [`Struct`] is what callers build before conversion: a type name plus
//! name/value entries keyed by short or qualified attribute name. A
//! [`Referenceable`] is the class flavour, carrying an optional id and one
//! bag per attached trait.

use crate::error::{Result, TypeError};
use crate::instance::Value;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_UNASSIGNED: AtomicI64 = AtomicI64::new(-1);

/// Identity of a class object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    pub id: String,
    pub version: u32,
    pub type_name: String,
}

impl Id {
    pub fn new(id: impl Into<String>, version: u32, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version,
            type_name: type_name.into(),
        }
    }

    /// Fresh process-unique id for an object not stored yet.
    pub fn unassigned(type_name: impl Into<String>) -> Self {
        let n = NEXT_UNASSIGNED.fetch_sub(1, Ordering::Relaxed);
        Self::new(n.to_string(), 0, type_name)
    }

    /// Unassigned ids are negative.
    pub fn is_unassigned(&self) -> bool {
        self.id.starts_with('-')
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unassigned() {
            write!(f, "(type: {}, id: <unassigned>)", self.type_name)
        } else {
            write!(f, "(type: {}, id: {})", self.type_name, self.id)
        }
    }
}

/// Untyped struct or trait field bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    type_name: String,
    values: Vec<(String, Value)>,
}

impl Struct {
    /// Empty bag for `type_name` (may be empty for an untyped bag).
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set an entry, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.values.push((name, value)),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.values.iter().position(|(n, _)| n == name)?;
        Some(self.values.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Build a bag from a JSON object. Nested objects become string-keyed
    /// maps.
    pub fn from_json(type_name: impl Into<String>, json: &serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(fields) = json else {
            return Err(TypeError::mismatch("JSON object", json.to_string()));
        };
        let mut bag = Self::new(type_name);
        for (name, value) in fields {
            bag.set(name.clone(), Value::from(value));
        }
        Ok(bag)
    }

    /// Bag built from the entries of a string-keyed map.
    pub(crate) fn from_map(type_name: &str, entries: &[(Value, Value)]) -> Result<Self> {
        let mut bag = Self::new(type_name);
        for (key, value) in entries {
            let name = key
                .as_str()
                .ok_or_else(|| TypeError::mismatch("string key", key.describe()))?;
            bag.set(name, value.clone());
        }
        Ok(bag)
    }
}

/// Untyped class field bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Referenceable {
    id: Option<Id>,
    values: Struct,
    traits: Vec<Struct>,
}

impl Referenceable {
    /// Bag for class `type_name` with an empty bag per listed trait.
    pub fn new(type_name: impl Into<String>, trait_names: &[&str]) -> Self {
        Self {
            id: None,
            values: Struct::new(type_name),
            traits: trait_names.iter().map(|t| Struct::new(*t)).collect(),
        }
    }

    pub fn with_id(mut self, id: Id) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<&Id> {
        self.id.as_ref()
    }

    pub fn type_name(&self) -> &str {
        self.values.type_name()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.set(name, value);
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Class attributes as a plain bag.
    pub fn values(&self) -> &Struct {
        &self.values
    }

    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.iter().map(Struct::type_name)
    }

    pub fn get_trait(&self, name: &str) -> Option<&Struct> {
        self.traits.iter().find(|t| t.type_name() == name)
    }

    pub fn trait_mut(&mut self, name: &str) -> Option<&mut Struct> {
        self.traits.iter_mut().find(|t| t.type_name() == name)
    }

    /// Attach a trait bag, replacing one of the same type.
    pub fn add_trait(&mut self, bag: Struct) {
        match self.trait_mut(bag.type_name()) {
            Some(existing) => *existing = bag,
            None => self.traits.push(bag),
        }
    }

    pub(crate) fn traits(&self) -> &[Struct] {
        &self.traits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unassigned_ids_are_unique() {
        let a = Id::unassigned("Person");
        let b = Id::unassigned("Person");
        assert_ne!(a, b);
        assert!(a.is_unassigned());
        assert_eq!(a.to_string(), "(type: Person, id: <unassigned>)");
        assert_eq!(Id::new("42", 1, "Person").to_string(), "(type: Person, id: 42)");
    }

    #[test]
    fn test_set_replaces() {
        let mut bag = Struct::new("t").with("a", 1).with("b", "x");
        bag.set("a", 2);
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.get("a"), Some(&Value::Int(2)));
        assert_eq!(bag.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(bag.remove("b"), Some(Value::from("x")));
        assert!(!bag.contains("b"));
    }

    #[test]
    fn test_from_json_requires_object() {
        let bag = Struct::from_json("t", &json!({"n": 3, "s": "v"})).unwrap();
        assert_eq!(bag.get("n"), Some(&Value::Long(3)));
        assert!(Struct::from_json("t", &json!([1, 2])).is_err());
    }

    #[test]
    fn test_referenceable_traits() {
        let mut r = Referenceable::new("Manager", &["SecurityClearance"]);
        r.set("name", "Jane");
        r.trait_mut("SecurityClearance").unwrap().set("level", 1);
        assert_eq!(r.trait_names().collect::<Vec<_>>(), vec!["SecurityClearance"]);
        assert_eq!(
            r.get_trait("SecurityClearance").unwrap().get("level"),
            Some(&Value::Int(1))
        );
        r.add_trait(Struct::new("SecurityClearance"));
        assert_eq!(r.traits().len(), 1);
        assert!(r.id().is_none());
    }
}
