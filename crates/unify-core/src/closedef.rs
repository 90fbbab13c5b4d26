//! The `CloseDef` tree: an AND/OR tree of close-IDs that decides
//! whether a new arc label is admitted into a closed struct.
//!
//! Building and querying the tree is the evaluator's job
//! (`unify-eval::closedness`); this module only owns the data shape, since
//! it hangs off `Vertex::closed` in the data model.

use std::rc::Rc;

use crate::feature::Feature;
use crate::kind::Kind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CloseId(pub u32);

/// One struct's admitted-label set: either every definition/embedding that
/// introduced this close-ID is open (`Ellipsis`), or it lists the labels
/// that definition declared plus any kind-wide admission a `[string]:`/
/// `[int]:` bulk-optional matcher contributes (a kind matcher admits
/// every label of that kind, not just the ones actually present yet).
#[derive(Clone, Debug)]
pub struct CloseLeaf {
    pub id: CloseId,
    pub open: bool,
    pub labels: Vec<Feature>,
    pub kinds: Kind,
}

/// "Close-IDs compose AND (both parts must admit) and OR (either
/// admits)". Shared via `Rc` since many vertices reuse the same
/// sub-tree (e.g. every field of a struct literal shares its enclosing
/// closedness).
#[derive(Clone, Debug)]
pub enum CloseTree {
    Leaf(CloseLeaf),
    And(Vec<Rc<CloseTree>>),
    Or(Vec<Rc<CloseTree>>),
}

impl CloseTree {
    pub fn leaf(id: CloseId, open: bool, labels: Vec<Feature>) -> Rc<CloseTree> {
        Self::leaf_with_kinds(id, open, labels, Kind::NONE)
    }

    /// Like [`Self::leaf`] but also admitting every label of `kinds`
    /// (populated from `[string]:`/`[int]:` bulk-optional matchers, which
    /// admit a whole kind rather than a finite label set).
    pub fn leaf_with_kinds(id: CloseId, open: bool, labels: Vec<Feature>, kinds: Kind) -> Rc<CloseTree> {
        Rc::new(CloseTree::Leaf(CloseLeaf {
            id,
            open,
            labels,
            kinds,
        }))
    }

    pub fn and(parts: Vec<Rc<CloseTree>>) -> Rc<CloseTree> {
        match parts.len() {
            1 => parts.into_iter().next().unwrap(),
            _ => Rc::new(CloseTree::And(parts)),
        }
    }

    pub fn or(parts: Vec<Rc<CloseTree>>) -> Rc<CloseTree> {
        match parts.len() {
            1 => parts.into_iter().next().unwrap(),
            _ => Rc::new(CloseTree::Or(parts)),
        }
    }

    /// Whether this tree admits `label` ("answers whether at least
    /// one branch admits it" composed with AND across independently
    /// required definitions).
    pub fn admits(&self, label: Feature) -> bool {
        match self {
            CloseTree::Leaf(leaf) => {
                leaf.open
                    || leaf.labels.contains(&label)
                    || (label.is_string() && leaf.kinds.contains(Kind::STRING))
                    || (label.is_int() && leaf.kinds.contains(Kind::INT))
            }
            CloseTree::And(parts) => parts.iter().all(|p| p.admits(label)),
            CloseTree::Or(parts) => parts.iter().any(|p| p.admits(label)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::Interner;

    fn feat(i: &mut Interner, s: &str) -> Feature {
        Feature::string_label(i.intern(s))
    }

    #[test]
    fn leaf_admits_declared_labels_only() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let b = feat(&mut i, "b");
        let leaf = CloseTree::leaf(CloseId(0), false, vec![a]);
        assert!(leaf.admits(a));
        assert!(!leaf.admits(b));
    }

    #[test]
    fn open_leaf_admits_everything() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let leaf = CloseTree::leaf(CloseId(0), true, vec![]);
        assert!(leaf.admits(a));
    }

    #[test]
    fn and_requires_both_branches_to_admit() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let b = feat(&mut i, "b");
        let only_a = CloseTree::leaf(CloseId(0), false, vec![a]);
        let only_b = CloseTree::leaf(CloseId(1), false, vec![b]);
        let both = CloseTree::and(vec![only_a, only_b]);
        assert!(!both.admits(a));
        assert!(!both.admits(b));
    }

    #[test]
    fn or_admits_if_either_branch_admits() {
        let mut i = Interner::new();
        let a = feat(&mut i, "a");
        let b = feat(&mut i, "b");
        let only_a = CloseTree::leaf(CloseId(0), false, vec![a]);
        let only_b = CloseTree::leaf(CloseId(1), false, vec![b]);
        let either = CloseTree::or(vec![only_a, only_b]);
        assert!(either.admits(a));
        assert!(either.admits(b));
    }
}
