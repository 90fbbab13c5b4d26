//! Evaluator instrumentation.
//!
//! The teacher's VM has no `log`/`tracing` dependency anywhere; instead it
//! drives a hand-rolled `Tracer` trait so a no-op implementation optimizes
//! away entirely in release builds while a collecting implementation can be
//! swapped in for debugging. This evaluator follows the same shape rather
//! than reaching for an external logging crate the rest of this stack never
//! uses.

use unify_core::{Feature, VertexId};

/// Instrumentation hooks for one evaluation. All methods have empty default
/// bodies so a partial tracer only overrides what it cares about.
pub trait Tracer {
    fn trace_unify_enter(&mut self, _vertex: VertexId) {}
    fn trace_unify_exit(&mut self, _vertex: VertexId) {}
    fn trace_conjunct_drained(&mut self, _vertex: VertexId, _remaining: usize) {}
    fn trace_expand_iteration(&mut self, _vertex: VertexId, _iteration: u32, _progress: bool) {}
    fn trace_cycle_detected(&mut self, _vertex: VertexId) {}
    fn trace_arc_inserted(&mut self, _parent: VertexId, _label: Feature, _child: VertexId) {}
    fn trace_closedness_reject(&mut self, _vertex: VertexId, _label: Feature) {}
    fn trace_disjunct_try(&mut self, _vertex: VertexId, _alternative: usize) {}
    fn trace_disjunct_commit(&mut self, _vertex: VertexId, _surviving: usize) {}
    fn trace_disjunct_discard(&mut self, _vertex: VertexId, _alternative: usize) {}
}

/// The default tracer: every call is a no-op the compiler removes entirely.
#[derive(Default)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}
