// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry.
//!
//! [`TypeSystem`] is a cheap, cloneable handle on a catalog of struct, trait
//! and class types. Registration always goes through a batch: the catalog
//! write lock is held from validation to commit, so readers see either none
//! or all of a batch and concurrent batches are serialized.

mod batch;
mod repository;

pub use repository::TypeRepository;

use crate::config::TypeSystemConfig;
use crate::error::{Result, TypeError};
use crate::types::{
    AttributeDefinition, DataType, HierarchicalType, HierarchicalTypeDefinition, PrimitiveKind,
    StructType, StructTypeDefinition, Type, TypeCategory, TypeExpr, TypesDef,
};
use batch::Batch;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, Weak};

static GLOBAL: OnceLock<TypeSystem> = OnceLock::new();

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Registered user types, in registration order.
#[derive(Default)]
pub(crate) struct Catalog {
    types: HashMap<String, Type>,
    order: Vec<String>,
}

impl Catalog {
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub(crate) fn category_of(&self, name: &str) -> Option<TypeCategory> {
        self.types.get(name).map(Type::category)
    }

    pub(crate) fn hierarchical(&self, name: &str) -> Option<Arc<HierarchicalType>> {
        self.types.get(name).and_then(Type::as_hierarchical).cloned()
    }

    fn insert(&mut self, ty: Type) {
        let name = ty.name().to_string();
        self.order.push(name.clone());
        self.types.insert(name, ty);
    }
}

// ---------------------------------------------------------------------------
// TypeSystem
// ---------------------------------------------------------------------------

struct Inner {
    config: TypeSystemConfig,
    catalog: RwLock<Catalog>,
}

/// Weak handle types keep on the registry that defined them.
#[derive(Debug, Clone)]
pub(crate) struct TypeSystemHandle(Weak<Inner>);

impl TypeSystemHandle {
    /// Registry of the type called `owner`, unless it was dropped.
    pub(crate) fn upgrade(&self, owner: &str) -> Result<TypeSystem> {
        self.0
            .upgrade()
            .map(|inner| TypeSystem { inner })
            .ok_or_else(|| TypeError::Detached(owner.to_string()))
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSystem")
            .field("config", &self.config)
            .field("types", &self.catalog.read().order)
            .finish()
    }
}

/// Catalog of struct, trait and class types.
#[derive(Debug, Clone)]
pub struct TypeSystem {
    inner: Arc<Inner>,
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// Empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TypeSystemConfig::default())
    }

    pub fn with_config(config: TypeSystemConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                catalog: RwLock::new(Catalog::default()),
            }),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static TypeSystem {
        GLOBAL.get_or_init(TypeSystem::new)
    }

    pub fn config(&self) -> &TypeSystemConfig {
        &self.inner.config
    }

    fn handle(&self) -> TypeSystemHandle {
        TypeSystemHandle(Arc::downgrade(&self.inner))
    }

    // -- registration -------------------------------------------------------

    /// Register one struct type. Its attributes may reference the struct
    /// itself.
    pub fn define_struct_type(
        &self,
        name: &str,
        is_abstract: bool,
        attributes: Vec<AttributeDefinition>,
    ) -> Result<Arc<StructType>> {
        let def = StructTypeDefinition::new(name, attributes);
        let defined = self.commit("define_struct_type", |batch| {
            batch.with_struct(def, is_abstract)
        })?;
        defined
            .get(name)
            .and_then(Type::as_struct)
            .cloned()
            .ok_or_else(|| TypeError::TypeNotFound(name.to_string()))
    }

    /// Register a batch of trait types.
    pub fn define_trait_types(
        &self,
        traits: Vec<HierarchicalTypeDefinition>,
    ) -> Result<HashMap<String, Type>> {
        self.define_types(Vec::new(), traits, Vec::new())
    }

    /// Register a batch of class types.
    pub fn define_class_types(
        &self,
        classes: Vec<HierarchicalTypeDefinition>,
    ) -> Result<HashMap<String, Type>> {
        self.define_types(Vec::new(), Vec::new(), classes)
    }

    /// Register structs, traits and classes atomically: either every type of
    /// the batch becomes visible or none does.
    pub fn define_types(
        &self,
        structs: Vec<StructTypeDefinition>,
        traits: Vec<HierarchicalTypeDefinition>,
        classes: Vec<HierarchicalTypeDefinition>,
    ) -> Result<HashMap<String, Type>> {
        self.commit("define_types", |batch| {
            batch
                .with_structs(structs)
                .with_traits(traits)
                .with_classes(classes)
        })
    }

    /// Register every type of a definition document atomically.
    pub fn define_types_def(&self, doc: &TypesDef) -> Result<HashMap<String, Type>> {
        self.define_types(
            doc.struct_types.clone(),
            doc.trait_types.clone(),
            doc.class_types.clone(),
        )
    }

    fn commit<F>(&self, op: &str, fill: F) -> Result<HashMap<String, Type>>
    where
        F: FnOnce(Batch<'_>) -> Batch<'_>,
    {
        let mut catalog = self.inner.catalog.write();
        let built = fill(Batch::new(&catalog, &self.inner.config, self.handle())).build();
        let built = match built {
            Ok(types) => types,
            Err(e) => {
                log::debug!("[TypeSystem::{}] batch rejected: {}", op, e);
                return Err(e);
            }
        };

        let mut defined = HashMap::with_capacity(built.len());
        for ty in built {
            defined.insert(ty.name().to_string(), ty.clone());
            catalog.insert(ty);
        }
        log::info!("[TypeSystem::{}] registered {} type(s)", op, defined.len());
        Ok(defined)
    }

    /// Drop every user type. Types already handed out keep working.
    pub fn reset(&self) {
        let mut catalog = self.inner.catalog.write();
        let count = catalog.order.len();
        *catalog = Catalog::default();
        log::info!("[TypeSystem::reset] dropped {} type(s)", count);
    }

    // -- lookup -------------------------------------------------------------

    /// Look up a primitive or user type by name.
    pub fn get_type(&self, name: &str) -> Result<Type> {
        if let Some(kind) = PrimitiveKind::from_name(name) {
            return Ok(Type::Primitive(kind));
        }
        self.inner
            .catalog
            .read()
            .types
            .get(name)
            .cloned()
            .ok_or_else(|| TypeError::TypeNotFound(name.to_string()))
    }

    pub fn get_struct_type(&self, name: &str) -> Result<Arc<StructType>> {
        match self.get_type(name)? {
            Type::Struct(ty) => Ok(ty),
            other => Err(TypeError::mismatch("struct", format!("{} {}", other.category(), name))),
        }
    }

    pub fn get_trait_type(&self, name: &str) -> Result<Arc<HierarchicalType>> {
        match self.get_type(name)? {
            Type::Trait(ty) => Ok(ty),
            other => Err(TypeError::mismatch("trait", format!("{} {}", other.category(), name))),
        }
    }

    pub fn get_class_type(&self, name: &str) -> Result<Arc<HierarchicalType>> {
        match self.get_type(name)? {
            Type::Class(ty) => Ok(ty),
            other => Err(TypeError::mismatch("class", format!("{} {}", other.category(), name))),
        }
    }

    /// `true` for registered user types and primitive names.
    pub fn is_registered(&self, name: &str) -> bool {
        PrimitiveKind::from_name(name).is_some() || self.inner.catalog.read().contains(name)
    }

    /// User type names in registration order.
    pub fn type_names(&self) -> Vec<String> {
        self.inner.catalog.read().order.clone()
    }

    /// User type names of one category, in registration order.
    pub fn type_names_of(&self, category: TypeCategory) -> Vec<String> {
        let catalog = self.inner.catalog.read();
        catalog
            .order
            .iter()
            .filter(|n| catalog.category_of(n) == Some(category))
            .cloned()
            .collect()
    }

    /// Parse and resolve a data type name such as `map<string,array<Person>>`.
    pub fn data_type(&self, name: &str) -> Result<DataType> {
        let expr = TypeExpr::parse(name)?;
        let catalog = self.inner.catalog.read();
        expr.resolve(&|n: &str| catalog.category_of(n))
            .map_err(|reference| TypeError::UnresolvedReference {
                type_name: name.to_string(),
                reference,
            })
    }

    // -- hierarchy export ---------------------------------------------------

    /// The named trait and class types, supertypes before subtypes.
    pub fn sorted_hierarchy(&self, names: &[&str]) -> Result<Vec<Arc<HierarchicalType>>> {
        let mut requested: Vec<Arc<HierarchicalType>> = Vec::with_capacity(names.len());
        for name in names {
            let ty = self.get_type(name)?;
            let ty = ty.as_hierarchical().cloned().ok_or_else(|| {
                TypeError::mismatch("trait or class", format!("{} {}", ty.category(), name))
            })?;
            requested.push(ty);
        }

        let wanted: HashSet<&str> = names.iter().copied().collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(requested.len());
        for ty in &requested {
            push_post_order(ty, &wanted, &mut seen, &mut out);
        }
        Ok(out)
    }

    /// Hand the named types, supertypes first, to a repository.
    pub fn publish<R>(&self, repository: &R, names: &[&str]) -> Result<()>
    where
        R: TypeRepository + ?Sized,
    {
        let sorted = self.sorted_hierarchy(names)?;
        log::debug!("[TypeSystem::publish] {} type(s)", sorted.len());
        repository.define_types(&sorted);
        Ok(())
    }

    /// Definition document of the named types.
    pub fn export(&self, names: &[&str]) -> Result<TypesDef> {
        let mut doc = TypesDef::default();
        let mut hierarchical: Vec<&str> = Vec::new();
        for name in names {
            match self.get_type(name)? {
                Type::Struct(ty) => doc.struct_types.push(ty.definition()),
                Type::Trait(_) | Type::Class(_) => hierarchical.push(*name),
                Type::Primitive(kind) => {
                    return Err(TypeError::mismatch("user type", format!("primitive {}", kind)))
                }
            }
        }
        for ty in self.sorted_hierarchy(&hierarchical)? {
            if ty.is_trait() {
                doc.trait_types.push(ty.definition());
            } else {
                doc.class_types.push(ty.definition());
            }
        }
        Ok(doc)
    }
}

fn push_post_order(
    ty: &Arc<HierarchicalType>,
    wanted: &HashSet<&str>,
    seen: &mut HashSet<String>,
    out: &mut Vec<Arc<HierarchicalType>>,
) {
    if !seen.insert(ty.name().to_string()) {
        return;
    }
    for sup in ty.supertype_types() {
        push_post_order(sup, wanted, seen, out);
    }
    if wanted.contains(ty.name()) {
        out.push(Arc::clone(ty));
    }
}
