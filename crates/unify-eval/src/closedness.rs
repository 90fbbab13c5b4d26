//! Closedness bookkeeping: building a `CloseTree` leaf for one
//! struct literal conjunct and composing it with whatever close-tree the
//! vertex already carries.
//!
//! The tree shape itself (`Leaf`/`And`/`Or`) lives in `unify-core`; this
//! module is the algorithm that decides *when* a new leaf is introduced and
//! how it combines with a vertex's existing `closed` field as `addStruct`
//! (step 2) walks each struct conjunct.

use std::rc::Rc;

use unify_core::{CloseId, CloseTree, Feature, Kind, Matcher, StructLit, Vertex};

use crate::fieldset::FieldSet;

/// Allocates fresh `CloseId`s for one evaluation. A plain counter: close
/// IDs only need to be distinct within the run, never stable across runs.
#[derive(Default)]
pub struct CloseIdAllocator {
    next: u32,
}

impl CloseIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> CloseId {
        let id = CloseId(self.next);
        self.next += 1;
        id
    }
}

/// Whether a struct literal should introduce closedness at all (only
/// `#Name`-style definitions and embeddings of a closed struct close their
/// fields; a plain `{...}` literal embedded without a definition stays
/// open even without `...`, per the "closed only definitions introduce a
/// close-ID" note in the Design Notes).
pub fn introduces_close_id(is_definition: bool) -> bool {
    is_definition
}

/// Builds the `CloseTree` leaf for one struct literal, given whether it is
/// itself a definition body (the only case that actually closes its
/// fields — see [`introduces_close_id`]).
pub fn leaf_for_struct(id: CloseId, lit: &StructLit) -> Rc<CloseTree> {
    let fields = FieldSet::new(lit);
    let mut labels: Vec<Feature> = fields.declared_labels().collect();
    let mut kinds = Kind::NONE;
    for (matcher, _) in fields.bulk_optionals() {
        match matcher {
            Matcher::Label(l) => labels.push(*l),
            Matcher::Kind(k) => kinds |= *k,
            Matcher::Dynamic(_) | Matcher::Validator(_) => {
                // Can't be enumerated without evaluating every candidate
                // label up front; `FieldSet::matches`/`validator_matches`
                // decide admission per-label at `addStruct` time instead,
                // so these matchers contribute no static leaf entry.
            }
        }
    }
    CloseTree::leaf_with_kinds(id, fields.has_ellipsis(), labels, kinds)
}

/// Composes a newly-built leaf onto whatever close-tree `vertex` already
/// carries (sibling conjuncts AND their closedness together — every
/// struct conjunct's own admitted-label set must agree).
pub fn compose_onto(vertex: &mut Vertex, new_leaf: Rc<CloseTree>) {
    vertex.closed = Some(match vertex.closed.take() {
        Some(existing) => CloseTree::and(vec![existing, new_leaf]),
        None => new_leaf,
    });
}

/// Whether inserting `label` as a new arc on `vertex` is legal. A vertex
/// with no closedness at all is open; definitions matter only once at
/// least one conjunct actually closed it ("rejects a label
/// admitted by none of the ANDed definitions").
pub fn admits(vertex: &Vertex, label: Feature) -> bool {
    match &vertex.closed {
        Some(tree) => tree.admits(label),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unify_core::{Decl, Interner, VertexArena};

    fn feat(i: &mut Interner, s: &str) -> Feature {
        Feature::string_label(i.intern(s))
    }

    #[test]
    fn closed_struct_rejects_undeclared_label() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let b = feat(&mut i, "b");
        let lit = StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: unify_core::Expr::value(unify_core::Value::Null),
            }],
            is_definition: true,
        };
        let mut alloc = CloseIdAllocator::new();
        let leaf = leaf_for_struct(alloc.alloc(), &lit);
        let mut vertices = VertexArena::new();
        let v = vertices.alloc_root();
        compose_onto(vertices.get_mut(v), leaf);
        assert!(admits(vertices.get(v), a));
        assert!(!admits(vertices.get(v), b));
    }

    #[test]
    fn ellipsis_keeps_struct_open() {
        let lit = StructLit {
            decls: vec![Decl::Ellipsis(None)],
            is_definition: true,
        };
        let mut alloc = CloseIdAllocator::new();
        let leaf = leaf_for_struct(alloc.alloc(), &lit);
        let mut vertices = VertexArena::new();
        let v = vertices.alloc_root();
        compose_onto(vertices.get_mut(v), leaf);
        let mut i = Interner::new();
        assert!(admits(vertices.get(v), feat(&mut i, "anything")));
    }

    #[test]
    fn two_definitions_and_together() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let b = feat(&mut i, "b");
        let lit_a = StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: unify_core::Expr::value(unify_core::Value::Null),
            }],
            is_definition: true,
        };
        let lit_b = StructLit {
            decls: vec![Decl::Field {
                label: b,
                value: unify_core::Expr::value(unify_core::Value::Null),
            }],
            is_definition: true,
        };
        let mut alloc = CloseIdAllocator::new();
        let mut vertices = VertexArena::new();
        let v = vertices.alloc_root();
        compose_onto(vertices.get_mut(v), leaf_for_struct(alloc.alloc(), &lit_a));
        compose_onto(vertices.get_mut(v), leaf_for_struct(alloc.alloc(), &lit_b));
        assert!(!admits(vertices.get(v), a));
        assert!(!admits(vertices.get(v), b));
    }
}
