// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Validation and construction of one registration batch.
//!
//! A batch is checked as a whole against the current catalog and only then
//! built; the caller commits the result while still holding the catalog
//! write lock, so a rejected batch leaves no trace.

use crate::config::TypeSystemConfig;
use crate::error::{Result, TypeError};
use crate::registry::{Catalog, TypeSystemHandle};
use crate::types::{
    is_identifier, resolve_layout, AttributeDefinition, AttributeInfo, HierarchicalType,
    HierarchicalTypeDefinition, PrimitiveKind, StructType, StructTypeDefinition, Type,
    TypeCategory, TypeExpr,
};
use std::collections::HashMap;
use std::sync::Arc;

/// DFS colouring used for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

pub(crate) struct Batch<'a> {
    catalog: &'a Catalog,
    config: &'a TypeSystemConfig,
    handle: TypeSystemHandle,
    structs: Vec<(StructTypeDefinition, bool)>,
    traits: Vec<HierarchicalTypeDefinition>,
    classes: Vec<HierarchicalTypeDefinition>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(
        catalog: &'a Catalog,
        config: &'a TypeSystemConfig,
        handle: TypeSystemHandle,
    ) -> Self {
        Self {
            catalog,
            config,
            handle,
            structs: Vec::new(),
            traits: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub(crate) fn with_struct(mut self, def: StructTypeDefinition, is_abstract: bool) -> Self {
        self.structs.push((def, is_abstract));
        self
    }

    pub(crate) fn with_structs(mut self, defs: Vec<StructTypeDefinition>) -> Self {
        self.structs.extend(defs.into_iter().map(|d| (d, false)));
        self
    }

    pub(crate) fn with_traits(mut self, defs: Vec<HierarchicalTypeDefinition>) -> Self {
        self.traits.extend(defs);
        self
    }

    pub(crate) fn with_classes(mut self, defs: Vec<HierarchicalTypeDefinition>) -> Self {
        self.classes.extend(defs);
        self
    }

    /// Validate and build every type of the batch, in dependency order.
    /// Nothing is registered here.
    pub(crate) fn build(self) -> Result<Vec<Type>> {
        let categories = self.check_names()?;
        let lookup = |name: &str| -> Option<TypeCategory> {
            categories
                .get(name)
                .copied()
                .or_else(|| self.catalog.category_of(name))
        };

        // Attribute types.
        let mut attributes: HashMap<&str, Vec<Arc<AttributeInfo>>> = HashMap::new();
        for (def, _) in &self.structs {
            attributes.insert(
                def.name.as_str(),
                resolve_attributes(&def.name, &def.attributes, &lookup)?,
            );
        }
        for def in self.traits.iter().chain(&self.classes) {
            attributes.insert(
                def.name.as_str(),
                resolve_attributes(&def.name, &def.own_attributes, &lookup)?,
            );
        }

        // Supertype references and kinds.
        let hierarchical: Vec<(&HierarchicalTypeDefinition, TypeCategory)> = self
            .traits
            .iter()
            .map(|d| (d, TypeCategory::Trait))
            .chain(self.classes.iter().map(|d| (d, TypeCategory::Class)))
            .collect();
        for (def, category) in &hierarchical {
            for sup in def.distinct_supertypes() {
                if sup == def.name {
                    return Err(TypeError::CyclicInheritance(def.name.clone()));
                }
                match lookup(sup) {
                    None => {
                        return Err(TypeError::UnresolvedReference {
                            type_name: def.name.clone(),
                            reference: sup.to_string(),
                        })
                    }
                    Some(found) if found != *category => {
                        return Err(TypeError::invalid(
                            &def.name,
                            format!("supertype '{}' is a {}, expected a {}", sup, found, category),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }

        let order = topological_order(&hierarchical)?;

        let mut built: Vec<Type> = Vec::with_capacity(attributes.len());
        for (def, is_abstract) in &self.structs {
            let attrs = attributes.remove(def.name.as_str()).unwrap_or_default();
            let layout = resolve_layout(&def.name, &attrs, &[], self.config.max_inheritance_depth)?;
            built.push(Type::Struct(Arc::new(StructType::new(
                def.name.clone(),
                *is_abstract,
                attrs,
                layout,
                self.handle.clone(),
            ))));
        }

        let mut by_name: HashMap<&str, Arc<HierarchicalType>> = HashMap::new();
        for (def, category) in order {
            let mut supertypes = Vec::with_capacity(def.supertype_names.len());
            for sup in def.distinct_supertypes() {
                let resolved = match by_name.get(sup) {
                    Some(ty) => Arc::clone(ty),
                    None => self.catalog.hierarchical(sup).ok_or_else(|| {
                        TypeError::UnresolvedReference {
                            type_name: def.name.clone(),
                            reference: sup.to_string(),
                        }
                    })?,
                };
                supertypes.push(resolved);
            }
            let attrs = attributes.remove(def.name.as_str()).unwrap_or_default();
            let layout = resolve_layout(
                &def.name,
                &attrs,
                &supertypes,
                self.config.max_inheritance_depth,
            )?;
            let ty = Arc::new(HierarchicalType::new(
                def.name.clone(),
                category,
                supertypes,
                attrs,
                layout,
                self.handle.clone(),
            ));
            by_name.insert(def.name.as_str(), Arc::clone(&ty));
            built.push(match category {
                TypeCategory::Trait => Type::Trait(ty),
                _ => Type::Class(ty),
            });
        }

        self.check_reverse_attributes(&built, &by_name)?;
        Ok(built)
    }

    /// Names are valid identifiers, unique in the batch and not registered yet.
    fn check_names(&self) -> Result<HashMap<&str, TypeCategory>> {
        let mut categories: HashMap<&str, TypeCategory> = HashMap::new();
        let names = self
            .structs
            .iter()
            .map(|(d, _)| (d.name.as_str(), TypeCategory::Struct))
            .chain(self.traits.iter().map(|d| (d.name.as_str(), TypeCategory::Trait)))
            .chain(self.classes.iter().map(|d| (d.name.as_str(), TypeCategory::Class)));
        for (name, category) in names {
            if !is_identifier(name) || PrimitiveKind::from_name(name).is_some() {
                return Err(TypeError::invalid(name, "not a valid type name"));
            }
            if self.catalog.contains(name) || categories.insert(name, category).is_some() {
                return Err(TypeError::DuplicateTypeName(name.to_string()));
            }
        }
        Ok(categories)
    }

    /// Every reverse attribute names an attribute of the referenced class
    /// that points back at the declaring type (or a type related to it).
    fn check_reverse_attributes(
        &self,
        built: &[Type],
        batch: &HashMap<&str, Arc<HierarchicalType>>,
    ) -> Result<()> {
        let class = |name: &str| -> Option<Arc<HierarchicalType>> {
            batch
                .get(name)
                .cloned()
                .or_else(|| self.catalog.hierarchical(name))
                .filter(|t| t.is_class())
        };
        let related = |a: &str, b: &str| -> bool {
            let is_a = |x: &str, y: &str| class(x).map(|t| t.is_subtype_of(y)).unwrap_or(x == y);
            is_a(a, b) || is_a(b, a)
        };

        for ty in built {
            let (owner, attrs) = match ty {
                Type::Struct(st) => (st.name(), st.attributes()),
                Type::Trait(ht) | Type::Class(ht) => (ht.name(), ht.attributes()),
                Type::Primitive(_) => continue,
            };
            for attr in attrs {
                let Some(reverse) = &attr.reverse_attribute_name else {
                    continue;
                };
                let invalid = |reason: String| TypeError::invalid(owner, reason);
                let target_name = attr.data_type.referenced_class().ok_or_else(|| {
                    invalid(format!(
                        "attribute '{}' has a reverse attribute but does not reference a class",
                        attr.name
                    ))
                })?;
                let target = class(target_name).ok_or_else(|| TypeError::UnresolvedReference {
                    type_name: owner.to_string(),
                    reference: target_name.to_string(),
                })?;
                let back = target.layout().slot_named(reverse).ok_or_else(|| {
                    invalid(format!(
                        "reverse attribute '{}' is not an attribute of '{}'",
                        reverse,
                        target.name()
                    ))
                })?;
                let points_back = back
                    .attribute
                    .data_type
                    .referenced_class()
                    .is_some_and(|c| related(c, owner));
                if !points_back {
                    return Err(invalid(format!(
                        "reverse attribute '{}.{}' does not reference '{}'",
                        target.name(),
                        reverse,
                        owner
                    )));
                }
            }
        }
        Ok(())
    }
}

fn resolve_attributes<F>(
    owner: &str,
    defs: &[AttributeDefinition],
    lookup: &F,
) -> Result<Vec<Arc<AttributeInfo>>>
where
    F: Fn(&str) -> Option<TypeCategory>,
{
    let mut out: Vec<Arc<AttributeInfo>> = Vec::with_capacity(defs.len());
    for def in defs {
        if def.name.is_empty() || def.name.contains('.') {
            return Err(TypeError::invalid(
                owner,
                format!("'{}' is not a valid attribute name", def.name),
            ));
        }
        if out.iter().any(|a| a.name == def.name) {
            return Err(TypeError::invalid(
                owner,
                format!("attribute '{}' is declared twice", def.name),
            ));
        }
        let expr = TypeExpr::parse(&def.data_type_name)?;
        if def.multiplicity.is_many() && !expr.is_array() {
            return Err(TypeError::invalid(
                owner,
                format!(
                    "attribute '{}' is a {} but its type '{}' is not an array",
                    def.name, def.multiplicity, def.data_type_name
                ),
            ));
        }
        let data_type = expr
            .resolve(lookup)
            .map_err(|reference| TypeError::UnresolvedReference {
                type_name: owner.to_string(),
                reference,
            })?;
        out.push(Arc::new(AttributeInfo::new(def, data_type, owner)));
    }
    Ok(out)
}

/// Order batch types so every supertype precedes its subtypes.
///
/// Depth-first with a colouring: reaching a type that is still in progress
/// closes a cycle.
fn topological_order<'d>(
    defs: &[(&'d HierarchicalTypeDefinition, TypeCategory)],
) -> Result<Vec<(&'d HierarchicalTypeDefinition, TypeCategory)>> {
    let index: HashMap<&str, usize> = defs
        .iter()
        .enumerate()
        .map(|(i, (d, _))| (d.name.as_str(), i))
        .collect();
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut order = Vec::with_capacity(defs.len());

    fn visit<'d>(
        at: usize,
        defs: &[(&'d HierarchicalTypeDefinition, TypeCategory)],
        index: &HashMap<&str, usize>,
        marks: &mut HashMap<&'d str, Mark>,
        order: &mut Vec<(&'d HierarchicalTypeDefinition, TypeCategory)>,
    ) -> Result<()> {
        let (def, category) = defs[at];
        match marks.get(def.name.as_str()) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(TypeError::CyclicInheritance(def.name.clone())),
            None => {}
        }
        marks.insert(def.name.as_str(), Mark::InProgress);
        for sup in def.distinct_supertypes() {
            if let Some(&next) = index.get(sup) {
                visit(next, defs, index, marks, order)?;
            }
        }
        marks.insert(def.name.as_str(), Mark::Done);
        order.push((def, category));
        Ok(())
    }

    for at in 0..defs.len() {
        visit(at, defs, &index, &mut marks, &mut order)?;
    }
    Ok(order)
}
