// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data type model: the algebraic description of every value kind.
//!
//! Attribute definitions name their type textually (`int`, `array<Person>`,
//! `map<string,double>`). [`TypeExpr`] is the parsed, still unresolved form;
//! the registry turns it into a [`DataType`] once it knows whether a user
//! name is a struct, a trait or a class.

use crate::error::{Result, TypeError};
use std::fmt;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigInt,
    BigDecimal,
    String,
    Date,
}

impl PrimitiveKind {
    /// Every built-in primitive, in declaration order.
    pub const ALL: [PrimitiveKind; 11] = [
        Self::Boolean,
        Self::Byte,
        Self::Short,
        Self::Int,
        Self::Long,
        Self::Float,
        Self::Double,
        Self::BigInt,
        Self::BigDecimal,
        Self::String,
        Self::Date,
    ];

    /// Registered name of the primitive.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::BigInt => "biginteger",
            Self::BigDecimal => "bigdecimal",
            Self::String => "string",
            Self::Date => "date",
        }
    }

    /// Look up a primitive by its registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Fixed-width integer kinds.
    pub fn is_integral(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Any numeric kind, including the arbitrary-precision ones.
    pub fn is_numeric(&self) -> bool {
        self.is_integral()
            || matches!(
                self,
                Self::Float | Self::Double | Self::BigInt | Self::BigDecimal
            )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    Primitive,
    Array,
    Map,
    Struct,
    Trait,
    Class,
}

impl fmt::Display for TypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primitive => "primitive",
            Self::Array => "array",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Trait => "trait",
            Self::Class => "class",
        };
        f.write_str(s)
    }
}

/// Resolved data type of an attribute or value.
///
/// Structs, traits and classes are referenced by name and looked up in the
/// registry when a value is converted, which allows recursive definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Primitive(PrimitiveKind),
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Struct(String),
    Class(String),
    Trait(String),
}

impl DataType {
    pub const BOOLEAN: DataType = DataType::Primitive(PrimitiveKind::Boolean);
    pub const BYTE: DataType = DataType::Primitive(PrimitiveKind::Byte);
    pub const SHORT: DataType = DataType::Primitive(PrimitiveKind::Short);
    pub const INT: DataType = DataType::Primitive(PrimitiveKind::Int);
    pub const LONG: DataType = DataType::Primitive(PrimitiveKind::Long);
    pub const FLOAT: DataType = DataType::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: DataType = DataType::Primitive(PrimitiveKind::Double);
    pub const BIGINT: DataType = DataType::Primitive(PrimitiveKind::BigInt);
    pub const BIGDECIMAL: DataType = DataType::Primitive(PrimitiveKind::BigDecimal);
    pub const STRING: DataType = DataType::Primitive(PrimitiveKind::String);
    pub const DATE: DataType = DataType::Primitive(PrimitiveKind::Date);

    /// `array<element>`.
    pub fn array(element: DataType) -> Self {
        Self::Array(Box::new(element))
    }

    /// `map<key,value>`.
    pub fn map(key: DataType, value: DataType) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Category of this type.
    pub fn category(&self) -> TypeCategory {
        match self {
            Self::Primitive(_) => TypeCategory::Primitive,
            Self::Array(_) => TypeCategory::Array,
            Self::Map(_, _) => TypeCategory::Map,
            Self::Struct(_) => TypeCategory::Struct,
            Self::Trait(_) => TypeCategory::Trait,
            Self::Class(_) => TypeCategory::Class,
        }
    }

    /// Canonical textual name (`array<map<string,int>>`).
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// Innermost class name reached through arrays, if any.
    ///
    /// `Person` and `array<Person>` both yield `Some("Person")`.
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            Self::Array(elem) => elem.referenced_class(),
            _ => None,
        }
    }
}

impl From<PrimitiveKind> for DataType {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p),
            Self::Array(elem) => write!(f, "array<{}>", elem),
            Self::Map(k, v) => write!(f, "map<{},{}>", k, v),
            Self::Struct(name) | Self::Class(name) | Self::Trait(name) => f.write_str(name),
        }
    }
}

/// Parsed but unresolved type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Primitive(PrimitiveKind),
    Array(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    Named(String),
}

impl TypeExpr {
    /// Parse a textual type name.
    pub fn parse(text: &str) -> Result<Self> {
        let s = text.trim();
        if let Some(inner) = strip_generic(s, "array") {
            return Ok(Self::Array(Box::new(Self::parse(inner)?)));
        }
        if let Some(inner) = strip_generic(s, "map") {
            let (k, v) =
                split_top_level(inner).ok_or_else(|| TypeError::InvalidTypeName(text.into()))?;
            return Ok(Self::Map(
                Box::new(Self::parse(k)?),
                Box::new(Self::parse(v)?),
            ));
        }
        if let Some(p) = PrimitiveKind::from_name(s) {
            return Ok(Self::Primitive(p));
        }
        if is_identifier(s) {
            return Ok(Self::Named(s.to_string()));
        }
        Err(TypeError::InvalidTypeName(text.into()))
    }

    /// User type names mentioned anywhere in the expression.
    pub fn named_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Primitive(_) => {}
            Self::Array(elem) => elem.collect_names(out),
            Self::Map(k, v) => {
                k.collect_names(out);
                v.collect_names(out);
            }
            Self::Named(name) => out.push(name),
        }
    }

    /// Resolve user names to their categories.
    ///
    /// `lookup` returns the category of a user type, or `None` when unknown;
    /// the first unknown name is returned as the error value.
    pub fn resolve<F>(&self, lookup: &F) -> std::result::Result<DataType, String>
    where
        F: Fn(&str) -> Option<TypeCategory>,
    {
        Ok(match self {
            Self::Primitive(p) => DataType::Primitive(*p),
            Self::Array(elem) => DataType::array(elem.resolve(lookup)?),
            Self::Map(k, v) => DataType::map(k.resolve(lookup)?, v.resolve(lookup)?),
            Self::Named(name) => match lookup(name) {
                Some(TypeCategory::Struct) => DataType::Struct(name.clone()),
                Some(TypeCategory::Trait) => DataType::Trait(name.clone()),
                Some(TypeCategory::Class) => DataType::Class(name.clone()),
                _ => return Err(name.clone()),
            },
        })
    }

    /// `true` for `array<..>` expressions.
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

fn strip_generic<'a>(s: &'a str, head: &str) -> Option<&'a str> {
    s.strip_prefix(head)?
        .trim_start()
        .strip_prefix('<')?
        .strip_suffix('>')
}

fn split_top_level(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Valid user type name: letters, digits, `_`, not starting with a digit.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
