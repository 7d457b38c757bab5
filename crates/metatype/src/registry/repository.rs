// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::types::HierarchicalType;
use std::sync::Arc;

/// Storage collaborator that persists resolved class and trait types.
///
/// Implementations receive the types supertypes first. Whether and when the
/// repository stores them is its own business.
pub trait TypeRepository {
    /// Register a resolved, topologically sorted set of types.
    fn define_types(&self, types: &[Arc<HierarchicalType>]);
}

impl<T: TypeRepository + ?Sized> TypeRepository for Arc<T> {
    fn define_types(&self, types: &[Arc<HierarchicalType>]) {
        (**self).define_types(types);
    }
}
