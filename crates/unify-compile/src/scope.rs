//! Lexical scope stack used to turn parse-tree identifiers into
//! `UpCount`-based ADT references.
//!
//! Mirrors the teacher's `scope_stack: Vec<StructScope>` on `Compiler`
//! (innermost scope at the end), generalized from "member index lookup" to
//! the richer binder shapes this language's fields, `for`/`let` clauses, and
//! pattern-bound labels introduce.

use unify_core::Feature;

use crate::parsetree::NodeId;

/// What a scope frame binds, used to decide which `Expr` reference variant
/// an identifier resolving to it compiles to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// A file or struct literal: identifiers resolve to `FieldReference`.
    Fields,
    /// A `for` clause's key/value bindings.
    ForBinding { key: Option<Feature>, value: Feature },
    /// A `let` clause or top-level alias: resolves to `LetReference`.
    LetBinding { label: Feature },
    /// A pattern binding (`[X=pattern]: ...`): resolves to `LabelReference`
    /// when referring to the label itself, `DynamicReference` when the
    /// identifier instead names the fallback computed-label slot.
    PatternBinding { label: Feature },
    /// An import declaration's alias: resolves to `ImportReference`.
    Import { path: String },
}

#[derive(Clone, Debug)]
struct Frame {
    node_id: NodeId,
    kind: ScopeKind,
}

/// A push-only-while-descending stack, popped on the way back out of each
/// scope-introducing node. Never shared between compiler invocations.
#[derive(Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node_id: NodeId, kind: ScopeKind) {
        self.frames.push(Frame { node_id, kind });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Resolve `binder` against the stack, innermost frame first. Returns
    /// the `UpCount` (distance from the top of the stack) and the frame's
    /// kind, or `None` if `binder` is not currently in scope (a genuinely
    /// unresolved identifier).
    pub fn resolve(&self, binder: NodeId) -> Option<(u32, ScopeKind)> {
        self.frames
            .iter()
            .rev()
            .position(|f| f.node_id == binder)
            .map(|up_count| {
                let frame = &self.frames[self.frames.len() - 1 - up_count];
                (up_count as u32, frame.kind.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_frame_has_up_count_zero() {
        let mut s = ScopeStack::new();
        s.push(1, ScopeKind::Fields);
        s.push(2, ScopeKind::Fields);
        assert_eq!(s.resolve(2).unwrap().0, 0);
        assert_eq!(s.resolve(1).unwrap().0, 1);
    }

    #[test]
    fn pop_removes_innermost_frame() {
        let mut s = ScopeStack::new();
        s.push(1, ScopeKind::Fields);
        s.push(2, ScopeKind::Fields);
        s.pop();
        assert!(s.resolve(2).is_none());
        assert!(s.resolve(1).is_some());
    }

    #[test]
    fn unresolved_binder_is_none() {
        let s = ScopeStack::new();
        assert!(s.resolve(99).is_none());
    }
}
