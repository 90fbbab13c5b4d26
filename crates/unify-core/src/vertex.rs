//! `Vertex`: a node in the mutable evaluation graph.
//!
//! The spec's data model describes a vertex as owned by its parent's arc
//! list with a non-owning parent back-pointer. That shape does not type in
//! safe Rust once arbitrary `FieldReference`s need to reach an ancestor or
//! sibling vertex while the unifier is still mutating a different branch of
//! the graph. Instead, every vertex lives in one `VertexArena` and is
//! addressed by `VertexId`, the same trade the teacher makes for its own
//! graph-shaped state (the call-frame arena in `env.rs` is the in-core
//! precedent). `Parent` becomes an `Option<VertexId>` rather than a raw
//! pointer; nothing else about the shape changes.

use indexmap::IndexMap;
use std::rc::Rc;

use crate::closedef::CloseTree;
use crate::env::EnvId;
use crate::error::Bottom;
use crate::expr::Expr;
use crate::feature::Feature;
use crate::value::Value;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct VertexId(u32);

impl VertexId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// One pending constraint on a vertex: an ADT expression plus the
/// environment it must be evaluated in.
#[derive(Clone, Debug)]
pub struct Conjunct {
    pub env: EnvId,
    pub expr: Rc<Expr>,
}

impl Conjunct {
    pub fn new(env: EnvId, expr: Rc<Expr>) -> Self {
        Conjunct { env, expr }
    }
}

/// A list literal conjunct's contribution to a vertex's length agreement:
/// how many indexed arcs it produced, and whether its tail is closed (a
/// plain literal) or open (a `...` tail).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ListShape {
    pub len: u32,
    pub closed: bool,
}

/// A vertex's evaluation progress, tracked so the unifier can tell a
/// still-open vertex from one a cycle has looped back onto.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VertexStatus {
    Unprocessed,
    Unifying,
    Finalized,
}

/// A node of the evaluation graph.
#[derive(Clone, Debug)]
pub struct Vertex {
    pub parent: Option<VertexId>,
    /// The label this vertex is filed under in its parent's arcs, or
    /// `None` for the root.
    pub label: Option<Feature>,
    /// Ordered child vertices, keyed by the label they were unified under.
    /// `IndexMap` keeps field order insertion-stable the way source order
    /// in a CUE struct literal is observable in its output.
    pub arcs: IndexMap<Feature, VertexId>,
    pub conjuncts: Vec<Conjunct>,
    /// The vertex's settled scalar/structural value once one exists. Kept
    /// separate from `arcs` because a struct's scalar-ish companion value
    /// (e.g. a definition unified with a bound) and its fields are
    /// orthogonal (structs and scalars can coexist pre-final).
    pub value: Option<Value>,
    pub closed: Option<Rc<CloseTree>>,
    /// Composed length/openness of every `ListLit` conjunct seen so far,
    /// or `None` if this vertex has never received one.
    pub list_shape: Option<ListShape>,
    pub status: VertexStatus,
    /// Set while a cycle is being detected and resolved ("cycle
    /// sentinel"): a vertex that refers to its own not-yet-finalized value
    /// gets this marker instead of recursing forever.
    pub cycle_sentinel: bool,
}

impl Vertex {
    fn new(parent: Option<VertexId>, label: Option<Feature>) -> Self {
        Vertex {
            parent,
            label,
            arcs: IndexMap::new(),
            conjuncts: Vec::new(),
            value: None,
            closed: None,
            list_shape: None,
            status: VertexStatus::Unprocessed,
            cycle_sentinel: false,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.status, VertexStatus::Finalized)
    }

    pub fn bottom(&self) -> Option<&Bottom> {
        self.value.as_ref().and_then(Value::as_bottom)
    }
}

/// The arena every `Vertex` in one evaluation lives in (ownership
/// model, made addressable instead of pointer-owned; see module docs).
#[derive(Debug, Default)]
pub struct VertexArena {
    vertices: Vec<Vertex>,
}

impl VertexArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a parentless vertex (the top of an evaluation, or a
    /// standalone vertex created for a disjunction branch's scratch copy).
    pub fn alloc_root(&mut self) -> VertexId {
        self.alloc(None, None)
    }

    pub fn alloc_child(&mut self, parent: VertexId, label: Feature) -> VertexId {
        self.alloc(Some(parent), Some(label))
    }

    fn alloc(&mut self, parent: Option<VertexId>, label: Option<Feature>) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Vertex::new(parent, label));
        id
    }

    pub fn get(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.0 as usize]
    }

    /// Look up or create the child arc under `label`, the operation the
    /// unifier's `addStruct` step performs for every field it processes.
    pub fn arc_or_insert(&mut self, parent: VertexId, label: Feature) -> VertexId {
        if let Some(existing) = self.get(parent).arcs.get(&label).copied() {
            return existing;
        }
        let child = self.alloc_child(parent, label);
        self.get_mut(parent).arcs.insert(label, child);
        child
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Interner;

    #[test]
    fn alloc_root_has_no_parent_or_label() {
        let mut arena = VertexArena::new();
        let v = arena.alloc_root();
        assert!(arena.get(v).parent.is_none());
        assert!(arena.get(v).label.is_none());
        assert_eq!(arena.get(v).status, VertexStatus::Unprocessed);
    }

    #[test]
    fn arc_or_insert_reuses_existing_child() {
        let mut i = Interner::new();
        let label = Feature::string_label(i.intern("x"));
        let mut arena = VertexArena::new();
        let root = arena.alloc_root();
        let a = arena.arc_or_insert(root, label);
        let b = arena.arc_or_insert(root, label);
        assert_eq!(a, b);
        assert_eq!(arena.get(root).arcs.len(), 1);
    }

    #[test]
    fn child_records_parent_and_label() {
        let mut i = Interner::new();
        let label = Feature::string_label(i.intern("y"));
        let mut arena = VertexArena::new();
        let root = arena.alloc_root();
        let child = arena.arc_or_insert(root, label);
        assert_eq!(arena.get(child).parent, Some(root));
        assert_eq!(arena.get(child).label, Some(label));
    }
}
