//! Evaluator-level fatal errors.
//!
//! `unify_core::Bottom` is a *value* — the lattice least element, something
//! a vertex can legitimately settle on and that still unifies, renders, and
//! propagates per/. The errors here are a different thing: conditions
//! under which the evaluator itself refuses to keep running (a resource
//! limit blew past its budget, an import path never resolved). These never
//! become a `Value::Bottom` sitting on a vertex; they abort the call that
//! produced them.

use unify_core::Pos;

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("recursion limit exceeded at {0}")]
    RecursionLimitExceeded(Pos),

    #[error("expandOne did not reach a fixed point after {iterations} iterations at {pos}")]
    ExpandIterationsExhausted { pos: Pos, iterations: u32 },

    #[error("disjunction combination budget exhausted at {0}")]
    DisjunctionBudgetExhausted(Pos),

    #[error("import {path:?} failed: {reason}")]
    ImportFailed { path: String, reason: String },

    #[error("unknown builtin {package}.{name}")]
    UnknownBuiltin { package: String, name: String },

    /// A catch-all for compiler-consistency failures the evaluator can
    /// detect but has no dedicated variant for (an `UpCount` past the
    /// environment depth, a comprehension clause in the wrong terminal
    /// shape). These indicate a bug upstream of the evaluator, not a
    /// malformed configuration, so they abort rather than render as
    /// `Bottom`.
    #[error("{0} at {1}")]
    Internal(String, Pos),
}

pub type EvalResult<T> = Result<T, EvalError>;
