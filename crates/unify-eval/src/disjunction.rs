//! The disjunction driver: `tryDisjuncts` attempts every branch of a
//! compiled `Disjunction` in its own scratch vertex, discards the ones that
//! bottom out, and applies CUE's default-selection algebra to what's left.
//!
//! Dedup of surviving branches (an open question) is decided here as
//! plain structural equality (`Value::struct_eq`), not subsumption: two
//! branches that merely overlap (e.g. `int` and `>0`) both survive as
//! distinct alternatives, while only byte-for-byte identical results
//! collapse. Subsumption-aware dedup would need a second round of mutual
//! unification-equivalence checks per surviving pair, which costs an extra
//! `O(n^2)` set of tentative unifications for a refinement real CUE configs
//! rarely depend on (`DESIGN.md` records the trade-off).

use unify_core::{Conjunct, DisjunctTerm, EnvId, Value, VertexId};

use crate::error::EvalError;
use crate::opctx::OpContext;

/// Attempts every branch of `terms`, returning the single surviving value,
/// a `Value::Disjunction` of the survivors, or a `Value::Bottom` if none
/// survive. `vertex` is only used for tracing.
pub fn try_disjuncts(
    ctx: &mut OpContext,
    vertex: VertexId,
    env: EnvId,
    terms: &[DisjunctTerm],
) -> Result<Value, EvalError> {
    let mut survivors: Vec<(Value, bool)> = Vec::new();

    for (i, term) in terms.iter().enumerate() {
        ctx.record_disjunct_attempt()?;
        ctx.tracer.trace_disjunct_try(vertex, i);

        let scratch = ctx.vertices.alloc_root();
        ctx.vertices.get_mut(scratch).conjuncts.push(Conjunct::new(env, term.expr.clone()));

        // A branch that rejects is a branch-local failure, not a hard
        // error for the whole disjunction; `is_tentative` lets nested
        // bulk-optional/validator checks know to stay quiet too.
        let outcome = {
            let mut guard = ctx.enter_tentative();
            guard.unify(scratch)
        };

        match outcome {
            Err(e) => return Err(e),
            Ok(()) => {
                let settled = ctx.vertices.get(scratch).value.clone();
                let is_bottom = settled.as_ref().map(Value::is_bottom).unwrap_or(false);
                if is_bottom {
                    ctx.tracer.trace_disjunct_discard(vertex, i);
                    continue;
                }
                let has_arcs = !ctx.vertices.get(scratch).arcs.is_empty();
                let value = if has_arcs {
                    Value::Vertex(scratch)
                } else {
                    settled.unwrap_or(Value::Top)
                };
                survivors.push((value, term.is_default));
            }
        }
    }

    let any_default_survived = survivors.iter().any(|(_, d)| *d);
    let chosen: Vec<Value> = if any_default_survived {
        survivors.into_iter().filter(|(_, d)| *d).map(|(v, _)| v).collect()
    } else {
        survivors.into_iter().map(|(v, _)| v).collect()
    };

    let mut deduped: Vec<Value> = Vec::new();
    for v in chosen {
        if !deduped.iter().any(|existing| existing.struct_eq(&v)) {
            deduped.push(v);
        }
    }

    match deduped.len() {
        0 => Ok(Value::Bottom(unify_core::Bottom::eval(
            ctx.current_pos(),
            "no disjunction branch survived unification",
        ))),
        1 => {
            ctx.tracer.trace_disjunct_commit(vertex, 1);
            Ok(deduped.into_iter().next().unwrap())
        }
        n => {
            ctx.tracer.trace_disjunct_commit(vertex, n);
            let num_defaults = if any_default_survived { n } else { 0 };
            Ok(Value::Disjunction {
                values: deduped,
                num_defaults,
            })
        }
    }
}
