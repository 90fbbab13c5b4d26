//! The evaluator: turns a compiled [`unify_compile::CompileOutput`] into a
//! fully unified graph, then hands back a [`valueapi::ValueRef`] onto the
//! root for external consumers to project.
//!
//! Module map:
//! - [`opctx`] — the threaded [`OpContext`], `Evaluate`/`Resolve`/`Yield`.
//! - [`builtins`] — a small illustrative [`BuiltinRegistry`] (`len`,
//!   `strings.ToUpper`, `math.Abs`); hosts supply their own for real use.
//! - [`unifier`] — the `Unify` fixed-point algorithm.
//! - [`disjunction`] — the disjunction driver.
//! - [`fieldset`] — struct-literal field-set classification.
//! - [`closedness`] — the `CloseTree` AND/OR bookkeeping.
//! - [`binop`]/[`index`] — pure operator/index-slice evaluation.
//! - [`valueapi`] — the read-only value-projection surface.
//! - [`limits`]/[`tracer`]/[`error`] — resource budgets, instrumentation
//!   hooks, and the fatal-error type.
//!
//! Comprehension expansion has no dedicated module: the chain-walk
//! recursion lives in `OpContext::yield_chain` (it needs the same
//! env/vertex plumbing every other `OpContext` method already has) and the
//! two places that drive it — inserting a struct field vs. a list element
//! at the chain's terminal — are `unifier::add_struct`/`add_list`, since
//! that insertion logic is identical to what a plain field or element decl
//! already does. See `DESIGN.md` for the reasoning.

pub mod binop;
pub mod builtins;
pub mod closedness;
pub mod disjunction;
pub mod error;
pub mod fieldset;
pub mod index;
pub mod limits;
pub mod opctx;
pub mod tracer;
pub mod unifier;
pub mod valueapi;

pub use builtins::StdBuiltins;
pub use error::{EvalError, EvalResult};
pub use limits::EvalLimits;
pub use opctx::{Builtin, BuiltinRegistry, EmptyBuiltinRegistry, ImportResolver, NoImports, OpContext};
pub use tracer::{NoopTracer, Tracer};
pub use valueapi::{FieldOptions, Op, ValueRef};

use unify_compile::CompileOutput;

/// Owns a compiled package's arenas and drives it to a finalized root
/// (`Unify(ctx, root)` called once, with the root's own conjunct
/// being the file-level struct literals `unify-compile` already queued).
pub struct Evaluator {
    output: CompileOutput,
}

impl Evaluator {
    pub fn new(output: CompileOutput) -> Self {
        Evaluator { output }
    }

    /// Unifies the whole package against the given builtin registry,
    /// import resolver, limits, and tracer, returning a [`ValueRef`] onto
    /// the finalized root. Errors reaching here are [`EvalError`]s — fatal
    /// evaluator conditions (termination backstops, a budget exhausted); a
    /// configuration error instead settles as `Value::Bottom` on the root
    /// and is visible via [`ValueRef::err`].
    pub fn evaluate(
        &mut self,
        builtins: &dyn BuiltinRegistry,
        imports: &mut dyn ImportResolver,
        limits: EvalLimits,
        tracer: &mut dyn Tracer,
    ) -> EvalResult<ValueRef<'_>> {
        let mut ctx = OpContext::new(
            &mut self.output.vertices,
            &mut self.output.envs,
            &mut self.output.interner,
            builtins,
            imports,
            limits,
            tracer,
            unifier::unify,
        );
        unifier::unify(&mut ctx, self.output.root)?;
        Ok(ValueRef::new(&self.output.vertices, &self.output.interner, self.output.root))
    }

    /// Evaluates with an empty builtin registry and no import resolver,
    /// for self-contained packages (tests, or a host that hasn't wired
    /// either capability in yet).
    pub fn evaluate_standalone(&mut self) -> EvalResult<ValueRef<'_>> {
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut self.output.vertices,
            &mut self.output.envs,
            &mut self.output.interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unifier::unify,
        );
        unifier::unify(&mut ctx, self.output.root)?;
        Ok(ValueRef::new(&self.output.vertices, &self.output.interner, self.output.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use unify_core::{Conjunct, Decl, Expr, Feature, StructLit, Value};

    #[test]
    fn evaluator_projects_a_finalized_struct() {
        let mut vertices = unify_core::VertexArena::new();
        let mut envs = unify_core::EnvArena::new();
        let mut interner = unify_core::Interner::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        let a = Feature::string_label(interner.intern("a"));
        let lit = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: Expr::value(Value::int(7)),
            }],
            is_definition: false,
        });
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit))));

        let output = CompileOutput {
            root,
            root_env: env,
            vertices,
            envs,
            interner,
        };
        let mut evaluator = Evaluator::new(output);
        let result = evaluator.evaluate_standalone().expect("evaluation should not abort");
        let field = result.lookup("a").expect("field a");
        assert_eq!(field.int64(), Some(7));
    }
}
