// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hierarchical layout resolution.
//!
//! A type's layout is built by walking its inheritance *path tree*
//! breadth-first. The root is the type itself; each node has one child per
//! declared supertype, in declaration order. A node's path name is the
//! dot-joined chain from that node down to the root (`A.B.D` is `A` reached
//! from `D` through `B`).
//!
//! Every node contributes one slot per attribute its type declares. The first
//! slot seen for an attribute name takes the short name; later ones are
//! exposed as `<path name>.<attribute>`. Diamonds therefore yield one slot
//! per distinct path, never a merged one:
//!
//! ```text
//! A(a,b,c,d)   B(b): A   C(c): A   D(d): B, C
//!
//! path tree of D        slots (in order)
//! D                     d
//! +-- B.D               b
//! |   +-- A.B.D         a  A.B.D.b  A.B.D.c  A.B.D.d
//! +-- C.D               c
//!     +-- A.C.D         A.C.D.a  A.C.D.b  A.C.D.c  A.C.D.d
//! ```
//!
//! The result depends only on the definitions, never on the order in which
//! a batch listed them.

use crate::error::{Result, TypeError};
use crate::types::{AttributeInfo, HierarchicalType};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// One node of the inheritance path tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    /// Type reached at this node.
    pub type_name: String,
    /// Dot-joined path from this node down to the root.
    pub path_name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Number of inheritance steps from the root.
    pub depth: usize,
}

/// One storage slot of a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Name the slot is addressed by: the short attribute name for the
    /// primary binding, `<path>.<attribute>` otherwise.
    pub name: String,
    pub attribute: Arc<AttributeInfo>,
    /// Index of the path node that contributed the slot.
    pub path: usize,
}

impl Slot {
    /// `true` when the slot owns the short name of its attribute.
    pub fn is_primary(&self) -> bool {
        self.name == self.attribute.name
    }
}

/// Flattened attribute layout of a struct, trait or class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    type_name: String,
    slots: Vec<Slot>,
    paths: Vec<PathNode>,
    by_name: HashMap<String, usize>,
    by_path_attr: HashMap<(usize, String), usize>,
}

impl FieldLayout {
    /// Name of the type the layout belongs to.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of storage slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots in storage order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Storage index of an exposed name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Slot bound to an exposed name.
    pub fn slot_named(&self, name: &str) -> Option<&Slot> {
        self.index_of(name).and_then(|i| self.slots.get(i))
    }

    /// Every exposed name, in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Short names bound to a slot.
    pub fn primary_names(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| s.is_primary())
            .map(|s| s.name.as_str())
    }

    /// Path-qualified names of shadowed slots.
    pub fn qualified_names(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| !s.is_primary())
            .map(|s| s.name.as_str())
    }

    /// Inheritance path tree, breadth-first; index 0 is the type itself.
    pub fn paths(&self) -> &[PathNode] {
        &self.paths
    }

    /// Distinct ancestor names in breadth-first order (the type itself excluded).
    pub fn ancestor_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for node in self.paths.iter().skip(1) {
            if node.type_name != self.type_name && !out.contains(&node.type_name) {
                out.push(node.type_name.clone());
            }
        }
        out
    }

    fn slot_at(&self, path: usize, attribute: &str) -> Option<usize> {
        self.by_path_attr
            .get(&(path, attribute.to_string()))
            .copied()
    }

    /// Map every slot of `ancestor` onto the slot of `self` that holds it.
    ///
    /// The ancestor is located at its first occurrence in the path tree
    /// (breadth-first); the subtree rooted there mirrors the ancestor's own
    /// path tree node for node. Returns `None` if `ancestor` is not reachable.
    ///
    /// Composing projections does not always match the direct one: with
    /// `E: A, B` and `B: A`, `E -> A` lands on the directly inherited `A`
    /// while `E -> B -> A` lands on the `A` reached through `B`.
    pub(crate) fn project(&self, ancestor: &FieldLayout) -> Option<Vec<usize>> {
        let start = self
            .paths
            .iter()
            .position(|p| p.type_name == ancestor.type_name)?;

        let mut node_map = vec![usize::MAX; ancestor.paths.len()];
        let mut stack = vec![(0usize, start)];
        while let Some((a, s)) = stack.pop() {
            let (a_node, s_node) = (&ancestor.paths[a], &self.paths[s]);
            if a_node.type_name != s_node.type_name
                || a_node.children.len() != s_node.children.len()
            {
                return None;
            }
            node_map[a] = s;
            stack.extend(
                a_node
                    .children
                    .iter()
                    .copied()
                    .zip(s_node.children.iter().copied()),
            );
        }

        ancestor
            .slots
            .iter()
            .map(|slot| self.slot_at(node_map[slot.path], &slot.attribute.name))
            .collect()
    }
}

/// Resolve the layout of `type_name` from its own attributes and its
/// (already registered) supertypes.
///
/// `max_depth` bounds the longest supertype chain; a chain that returns to a
/// type already on it fails with [`TypeError::CyclicInheritance`].
pub fn resolve_layout(
    type_name: &str,
    own_attributes: &[Arc<AttributeInfo>],
    supertypes: &[Arc<HierarchicalType>],
    max_depth: usize,
) -> Result<FieldLayout> {
    let mut paths = vec![PathNode {
        type_name: type_name.to_string(),
        path_name: type_name.to_string(),
        parent: None,
        children: Vec::new(),
        depth: 0,
    }];
    // Type behind each path node; the root is still being defined.
    let mut sources: Vec<Option<Arc<HierarchicalType>>> = vec![None];
    let mut slots: Vec<Slot> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    let mut by_path_attr: HashMap<(usize, String), usize> = HashMap::new();

    let mut queue = VecDeque::from([0usize]);
    while let Some(idx) = queue.pop_front() {
        let source = sources[idx].clone();
        let (attributes, supers): (&[Arc<AttributeInfo>], &[Arc<HierarchicalType>]) =
            match &source {
                None => (own_attributes, supertypes),
                Some(ty) => (ty.attributes(), ty.supertype_types()),
            };

        for attr in attributes {
            let exposed = if by_name.contains_key(&attr.name) {
                format!("{}.{}", paths[idx].path_name, attr.name)
            } else {
                attr.name.clone()
            };
            if by_name.contains_key(&exposed) {
                return Err(TypeError::invalid(
                    type_name,
                    format!("attribute name '{}' is bound twice", exposed),
                ));
            }
            by_name.insert(exposed.clone(), slots.len());
            by_path_attr.insert((idx, attr.name.clone()), slots.len());
            slots.push(Slot {
                name: exposed,
                attribute: attr.clone(),
                path: idx,
            });
        }

        for sup in supers {
            if on_chain(&paths, idx, sup.name()) {
                return Err(TypeError::CyclicInheritance(type_name.to_string()));
            }
            let depth = paths[idx].depth + 1;
            if depth > max_depth {
                return Err(TypeError::invalid(
                    type_name,
                    format!("supertype chain deeper than {}", max_depth),
                ));
            }
            let child = paths.len();
            paths.push(PathNode {
                type_name: sup.name().to_string(),
                path_name: format!("{}.{}", sup.name(), paths[idx].path_name),
                parent: Some(idx),
                children: Vec::new(),
                depth,
            });
            paths[idx].children.push(child);
            sources.push(Some(sup.clone()));
            queue.push_back(child);
        }
    }

    log::trace!(
        "[resolve_layout] {}: {} slots over {} paths",
        type_name,
        slots.len(),
        paths.len()
    );

    Ok(FieldLayout {
        type_name: type_name.to_string(),
        slots,
        paths,
        by_name,
        by_path_attr,
    })
}

/// `true` if `name` is the type at `idx` or at any node between it and the root.
fn on_chain(paths: &[PathNode], mut idx: usize, name: &str) -> bool {
    loop {
        if paths[idx].type_name == name {
            return true;
        }
        match paths[idx].parent {
            Some(parent) => idx = parent,
            None => return false,
        }
    }
}
