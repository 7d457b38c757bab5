// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for type registration, conversion and casting.
//!
//! Every failure here is a schema or programmer error: nothing is retried and
//! nothing is left half-applied (a rejected batch registers no type, a failed
//! conversion yields no instance, a failed cast leaves its source untouched).

use thiserror::Error;

/// Errors produced by the type system.
#[derive(Debug, Error)]
pub enum TypeError {
    /// A type with this name is already registered (or appears twice in a batch).
    #[error("type '{0}' is already defined")]
    DuplicateTypeName(String),

    /// A supertype or attribute type name does not resolve.
    #[error("type '{type_name}' references unknown type '{reference}'")]
    UnresolvedReference {
        /// Type whose definition holds the reference.
        type_name: String,
        /// Name that could not be resolved.
        reference: String,
    },

    /// The supertype graph reaches the named type from itself.
    #[error("type '{0}' has a cyclic supertype chain")]
    CyclicInheritance(String),

    /// Lookup of an unregistered type.
    #[error("unknown type '{0}'")]
    TypeNotFound(String),

    /// A field bag or accessor used a name the layout does not expose.
    #[error("type '{type_name}' has no attribute '{attribute}'")]
    UnknownAttribute { type_name: String, attribute: String },

    /// A `Required` attribute was absent or null.
    #[error("required attribute '{attribute}' of type '{type_name}' is missing")]
    MissingRequiredAttribute { type_name: String, attribute: String },

    /// A value cannot be coerced to the declared data type.
    #[error("cannot convert {found} to {expected}")]
    TypeMismatch { expected: String, found: String },

    /// Cast target is not the instance type nor one of its supertypes.
    #[error("'{ancestor}' is not a supertype of '{type_name}'")]
    NotAnAncestor { type_name: String, ancestor: String },

    /// A definition is structurally invalid (wrong supertype kind, bad attribute, ...).
    #[error("invalid definition of type '{type_name}': {reason}")]
    InvalidDefinition { type_name: String, reason: String },

    /// A data type name could not be parsed (e.g. `array<int`).
    #[error("malformed type name '{0}'")]
    InvalidTypeName(String),

    /// The registry owning a type was dropped while the type was still in use.
    #[error("type '{0}' is no longer attached to a type system")]
    Detached(String),

    /// Type definition document could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TypeError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn invalid(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TypeError>;
