//! `OpContext`: the single object every evaluator operation threads
//! through. It owns the mutable graph (`VertexArena`/`EnvArena`/
//! `Interner`), the accumulated error, the source-position stack, and the
//! external capability objects (`BuiltinRegistry`, `ImportResolver`) the
//! unifier and comprehension driver call out to.
//!
//! `Resolve`/`Yield` both need to force a sub-vertex to at least partial
//! completion (a comprehension source, an import root) without `OpContext`
//! owning the unifier itself — that would make `unify-core`'s ADT and this
//! file mutually dependent on the unification algorithm. Instead
//! `OpContext` is handed a plain function pointer into `unifier::unify`
//! when the evaluator constructs it, the same indirection the teacher's own
//! `vm.rs` uses to let a builtin call back into bytecode dispatch without
//! the two modules importing each other.

use std::collections::HashMap;

use unify_core::{
    BoundOp, BuiltinRef, ComprehensionBody, Conjunct, EnvArena, EnvId, Expr, Feature, Interner, Kind, Pos,
    Value, VertexArena, VertexId, Yielder,
};

use unify_core::Bottom;

use crate::closedness::CloseIdAllocator;
use crate::error::EvalError;
use crate::limits::EvalLimits;
use crate::tracer::Tracer;

/// One registered builtin: its declared parameter/result kinds
/// plus the function that implements it. Builtins are pure over their
/// argument values; anything that needs graph access (an import, a
/// comprehension) is modeled separately, not as a builtin.
pub struct Builtin {
    pub params: Vec<Kind>,
    pub result: Kind,
    pub func: fn(&[Value]) -> Result<Value, Bottom>,
}

/// External lookup table for `package.name` builtins. The evaluator
/// never bundles builtin bodies itself; a caller supplies this.
pub trait BuiltinRegistry {
    fn lookup(&self, package: &str, name: &str) -> Option<&Builtin>;
}

/// An empty registry, useful for evaluating packages that reference no
/// builtins at all (tests, or a host that hasn't wired one in yet).
#[derive(Default)]
pub struct EmptyBuiltinRegistry;

impl BuiltinRegistry for EmptyBuiltinRegistry {
    fn lookup(&self, _package: &str, _name: &str) -> Option<&Builtin> {
        None
    }
}

/// External import loader (`LoadImport(path) -> Vertex`). Implementors
/// build (or look up) the imported package's vertices directly into the
/// shared arenas and hand back its root; `OpContext` caches the result per
/// path so each import is only loaded once per evaluation.
pub trait ImportResolver {
    fn load_import(
        &mut self,
        path: &str,
        vertices: &mut VertexArena,
        envs: &mut EnvArena,
        interner: &mut Interner,
    ) -> Result<VertexId, Bottom>;
}

/// An import resolver that rejects every path, for evaluating
/// self-contained packages that import nothing.
#[derive(Default)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn load_import(
        &mut self,
        path: &str,
        _vertices: &mut VertexArena,
        _envs: &mut EnvArena,
        _interner: &mut Interner,
    ) -> Result<VertexId, Bottom> {
        Err(Bottom::eval(Pos::NONE, format!("no import resolver configured for {path:?}")))
    }
}

/// Callback into `unifier::unify`, supplied by the evaluator at
/// construction time. See module docs for why this is a function pointer
/// rather than a direct dependency.
pub type UnifyFn = fn(&mut OpContext, VertexId) -> Result<(), EvalError>;

/// RAII guard returned by [`OpContext::enter_tentative`]; decrements the
/// tentative-evaluation depth on drop so an early `?` return can't leave
/// the context stuck reporting "tentative" forever.
pub struct TentativeGuard<'ctx, 'a> {
    ctx: &'ctx mut OpContext<'a>,
}

impl Drop for TentativeGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.tentative_depth -= 1;
    }
}

impl<'a> std::ops::Deref for TentativeGuard<'_, 'a> {
    type Target = OpContext<'a>;
    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<'a> std::ops::DerefMut for TentativeGuard<'_, 'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

/// The threaded evaluation context.
pub struct OpContext<'a> {
    pub vertices: &'a mut VertexArena,
    pub envs: &'a mut EnvArena,
    pub interner: &'a mut Interner,
    pub builtins: &'a dyn BuiltinRegistry,
    pub imports: &'a mut dyn ImportResolver,
    pub limits: EvalLimits,
    pub tracer: &'a mut dyn Tracer,
    unify_fn: UnifyFn,
    pos_stack: Vec<Pos>,
    error: Option<Bottom>,
    tentative_depth: u32,
    import_cache: HashMap<String, VertexId>,
    depth: u32,
    close_ids: CloseIdAllocator,
    disjunction_attempts: u32,
}

impl<'a> OpContext<'a> {
    pub fn new(
        vertices: &'a mut VertexArena,
        envs: &'a mut EnvArena,
        interner: &'a mut Interner,
        builtins: &'a dyn BuiltinRegistry,
        imports: &'a mut dyn ImportResolver,
        limits: EvalLimits,
        tracer: &'a mut dyn Tracer,
        unify_fn: UnifyFn,
    ) -> Self {
        OpContext {
            vertices,
            envs,
            interner,
            builtins,
            imports,
            limits,
            tracer,
            unify_fn,
            pos_stack: Vec::new(),
            error: None,
            tentative_depth: 0,
            import_cache: HashMap::new(),
            depth: 0,
            close_ids: CloseIdAllocator::new(),
            disjunction_attempts: 0,
        }
    }

    /// Allocates a fresh `CloseId` for a struct literal conjunct `addStruct`
    /// is about to compose onto a vertex.
    pub fn alloc_close_id(&mut self) -> unify_core::CloseId {
        self.close_ids.alloc()
    }

    /// Counts one disjunction branch attempt against the cumulative budget
    /// for this evaluation ("maximum alternatives considered
    /// across all disjunctions in one evaluation").
    pub fn record_disjunct_attempt(&mut self) -> Result<(), EvalError> {
        self.disjunction_attempts += 1;
        if self.disjunction_attempts > self.limits.get_disjunction_combinations() {
            return Err(EvalError::DisjunctionBudgetExhausted(self.current_pos()));
        }
        Ok(())
    }

    // -- position tracking --------------------------------------------

    pub fn current_pos(&self) -> Pos {
        self.pos_stack.last().copied().unwrap_or(Pos::NONE)
    }

    pub fn push_pos(&mut self, pos: Pos) {
        if !pos.is_none() {
            self.pos_stack.push(pos);
        } else {
            self.pos_stack.push(self.current_pos());
        }
    }

    pub fn pop_pos(&mut self) {
        self.pos_stack.pop();
    }

    // -- error accumulation ---------------------------------------------

    /// Record an error, combining with whatever is already pending rather
    /// than overwriting it (`CombineRecursiveError`).
    pub fn push_error(&mut self, err: Bottom) {
        self.error = Some(match self.error.take() {
            Some(existing) => existing.combine(err),
            None => err,
        });
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Take and clear the accumulated error. Matches description of
    /// `Err` as a mutator, not a pure getter: once read, a fresh
    /// operation starts error-free.
    pub fn take_error(&mut self) -> Option<Bottom> {
        self.error.take()
    }

    // -- tentative evaluation --------------------------------------------

    /// Disjunction branch attempts and bulk-optional re-scans
    /// run "tentatively" — a failure there is a branch-local rejection, not
    /// a hard package-level error. Nested calls compose: only the outermost
    /// guard's drop matters to callers checking `is_tentative`.
    pub fn enter_tentative(&mut self) -> TentativeGuard<'_, 'a> {
        self.tentative_depth += 1;
        TentativeGuard { ctx: self }
    }

    pub fn is_tentative(&self) -> bool {
        self.tentative_depth > 0
    }

    // -- recursion bookkeeping --------------------------------------------

    pub fn enter_recursion(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > self.limits.get_recursion_limit() {
            return Err(EvalError::RecursionLimitExceeded(self.current_pos()));
        }
        Ok(())
    }

    pub fn exit_recursion(&mut self) {
        self.depth -= 1;
    }

    /// Recursively force `vertex` to at least partial completion via the
    /// unifier, respecting the recursion limit.
    pub fn unify(&mut self, vertex: VertexId) -> Result<(), EvalError> {
        (self.unify_fn)(self, vertex)
    }

    // -- Evaluate --------------------------------------------------

    /// Evaluates an `Expr` that is not one of the unifier's directly-handled
    /// shapes (`Value`, `&`-binary, `StructLit`, `ListLit`, `Disjunction`,
    /// `Resolver`). Returns the resulting value plus whether it is concrete
    /// enough to use; an incomplete result means "come back after another
    /// `expandOne` pass" rather than an error.
    pub fn evaluate(&mut self, env: EnvId, expr: &Expr) -> (Value, bool) {
        match expr {
            Expr::Value(v) => (v.clone(), true),
            Expr::Binary { op, lhs, rhs } => {
                let (lv, lc) = self.evaluate(env, lhs);
                let (rv, rc) = self.evaluate(env, rhs);
                if !lc || !rc {
                    return (Value::Top, false);
                }
                match crate::binop::apply(*op, &lv, &rv, self.vertices, self.current_pos()) {
                    Ok(v) => (v, true),
                    Err(e) => {
                        self.push_error(e);
                        (Value::Bottom(self.error.clone().unwrap()), true)
                    }
                }
            }
            Expr::Unary { op, operand } => {
                let (v, complete) = self.evaluate(env, operand);
                if !complete {
                    return (Value::Top, false);
                }
                (self.apply_unary(*op, &v), true)
            }
            Expr::Interpolation(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        unify_core::InterpPart::Str(s) => out.push_str(s),
                        unify_core::InterpPart::Expr(e) => {
                            let (v, complete) = self.evaluate(env, e);
                            if !complete {
                                return (Value::Top, false);
                            }
                            match v {
                                Value::String { value, .. } => out.push_str(&value),
                                other => out.push_str(&other.to_string()),
                            }
                        }
                    }
                }
                (Value::string(out), true)
            }
            Expr::Call { builtin, args } => self.evaluate_call(env, builtin, args),
            Expr::Comprehension(_) => {
                // A bare comprehension in expression position only makes
                // sense as a list-comprehension element, which the unifier
                // drives directly via `addLists`; reaching `Evaluate` here
                // means the source is not yet concrete.
                (Value::Top, false)
            }
            Expr::StructLit(_) | Expr::ListLit(_) | Expr::Disjunction(_) => {
                // The unifier's `addExprConjunct` dispatch is responsible
                // for these; `Evaluate` is never supposed to receive them.
                (Value::Top, false)
            }
            _ if expr.is_resolver() => match self.resolve(env, expr) {
                Ok(vertex) => {
                    let v = self.vertices.get(vertex).value.clone().unwrap_or(Value::Vertex(vertex));
                    let complete = self.vertices.get(vertex).is_finalized() || v.kind() != Kind::ANY;
                    (v, complete)
                }
                Err(e) => {
                    self.push_error(Bottom::eval(self.current_pos(), e.to_string()));
                    (Value::Top, false)
                }
            },
            _ => unreachable!("every Expr variant is either handled above or is_resolver"),
        }
    }

    fn evaluate_call(&mut self, env: EnvId, builtin: &BuiltinRef, args: &[std::rc::Rc<Expr>]) -> (Value, bool) {
        let mut values = Vec::with_capacity(args.len());
        for a in args {
            let (v, complete) = self.evaluate(env, a);
            if !complete {
                return (Value::Top, false);
            }
            values.push(v);
        }
        match self.call_builtin(builtin, &values) {
            Ok(v) => (v, true),
            Err(e) => {
                self.push_error(e);
                (Value::Top, false)
            }
        }
    }

    pub fn call_builtin(&mut self, builtin: &BuiltinRef, args: &[Value]) -> Result<Value, Bottom> {
        if builtin.package.is_empty() && builtin.name == "__index" {
            return crate::index::index(args, self.vertices, self.interner, self.current_pos());
        }
        if builtin.package.is_empty() && builtin.name == "__slice" {
            return crate::index::slice(args, self.vertices, self.current_pos());
        }
        let pos = self.current_pos();
        let Some(def) = self.builtins.lookup(&builtin.package, &builtin.name) else {
            return Err(Bottom::eval(
                pos,
                format!("unknown builtin {}.{}", builtin.package, builtin.name),
            ));
        };
        if def.params.len() != args.len() {
            return Err(Bottom::eval(
                pos,
                format!(
                    "{}.{} expects {} argument(s), got {}",
                    builtin.package,
                    builtin.name,
                    def.params.len(),
                    args.len()
                ),
            ));
        }
        for (param_kind, arg) in def.params.iter().zip(args) {
            if !param_kind.contains(arg.kind()) {
                return Err(Bottom::eval(
                    pos,
                    format!("{}.{} argument kind mismatch", builtin.package, builtin.name),
                ));
            }
        }
        (def.func)(args)
    }

    fn apply_unary(&mut self, op: unify_core::UnaryOp, v: &Value) -> Value {
        use unify_core::{Num, NumKind, UnaryOp};
        match (op, v) {
            (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
            (UnaryOp::Neg, Value::Num(n)) => match n.kind {
                NumKind::Int => Value::Num(Num::int(-n.as_bigint().cloned().unwrap_or_default())),
                NumKind::Float => Value::float(-n.as_f64()),
            },
            (UnaryOp::Plus, Value::Num(_)) => v.clone(),
            (UnaryOp::Neg, Value::BoundValue { op: bop, rhs }) => {
                let flipped = match bop {
                    BoundOp::Lt => BoundOp::Gt,
                    BoundOp::Le => BoundOp::Ge,
                    BoundOp::Gt => BoundOp::Lt,
                    BoundOp::Ge => BoundOp::Le,
                    other => *other,
                };
                Value::BoundValue {
                    op: flipped,
                    rhs: Box::new(self.apply_unary(UnaryOp::Neg, rhs)),
                }
            }
            _ => Value::Bottom(Bottom::eval(self.current_pos(), "invalid unary operand")),
        }
    }

    // -- Resolve ---------------------------------------------------

    /// Resolves one of `Expr`'s `Resolver` variants to the vertex it names,
    /// forcing it via the unifier first.
    pub fn resolve(&mut self, env: EnvId, expr: &Expr) -> Result<VertexId, EvalError> {
        let target = match expr {
            Expr::FieldReference { up_count, label } => {
                let up_env = self
                    .envs
                    .up(env, *up_count)
                    .ok_or_else(|| EvalError::Internal("UpCount exceeds environment depth".into(), self.current_pos()))?;
                let base = self.envs.vertex(up_env);
                self.vertices.arc_or_insert(base, *label)
            }
            Expr::LabelReference { up_count } => {
                let up_env = self
                    .envs
                    .up(env, *up_count)
                    .ok_or_else(|| EvalError::Internal("UpCount exceeds environment depth".into(), self.current_pos()))?;
                self.envs.vertex(up_env)
            }
            Expr::LetReference { up_count, target } => {
                let up_env = self
                    .envs
                    .up(env, *up_count)
                    .ok_or_else(|| EvalError::Internal("UpCount exceeds environment depth".into(), self.current_pos()))?;
                let scratch = self.vertices.alloc_root();
                self.vertices
                    .get_mut(scratch)
                    .conjuncts
                    .push(Conjunct::new(up_env, target.clone()));
                scratch
            }
            Expr::DynamicReference { up_count, label_expr } => {
                let up_env = self
                    .envs
                    .up(env, *up_count)
                    .ok_or_else(|| EvalError::Internal("UpCount exceeds environment depth".into(), self.current_pos()))?;
                let scratch = self.vertices.alloc_root();
                self.vertices
                    .get_mut(scratch)
                    .conjuncts
                    .push(Conjunct::new(up_env, label_expr.clone()));
                scratch
            }
            Expr::ImportReference { path } => {
                if let Some(cached) = self.import_cache.get(path) {
                    *cached
                } else {
                    let loaded =
                        self.imports
                            .load_import(path, self.vertices, self.envs, self.interner)
                            .map_err(|e| EvalError::ImportFailed {
                                path: path.clone(),
                                reason: e.to_string(),
                            })?;
                    self.import_cache.insert(path.clone(), loaded);
                    loaded
                }
            }
            _ => {
                return Err(EvalError::Internal(
                    "resolve called on a non-resolver expression".into(),
                    self.current_pos(),
                ))
            }
        };
        self.unify(target)?;
        Ok(target)
    }

    // -- Validate --------------------------------------------

    /// Runs a `BuiltinValidator` against a candidate value (bulk-optional
    /// field-set matchers, `=~` string patterns compiled to a validator).
    pub fn validate(&mut self, builtin: &BuiltinRef, args: &[Value], candidate: &Value) -> Result<(), Bottom> {
        let mut full_args = args.to_vec();
        full_args.push(candidate.clone());
        let result = self.call_builtin(builtin, &full_args)?;
        match result {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => Err(Bottom::eval(self.current_pos(), "validator rejected value")),
            other => Err(Bottom::eval(
                self.current_pos(),
                format!("validator returned non-bool {other}"),
            )),
        }
    }

    // -- Yield ------------------------------------------------

    /// Drives one `Yielder` chain, invoking `sink` once per surviving
    /// iteration at the chain's terminal with the environment extended by
    /// every `for`/`let` binding collected along the way.
    pub fn yield_chain(
        &mut self,
        env: EnvId,
        yielder: &Yielder,
        sink: &mut dyn FnMut(&mut OpContext, EnvId, &ComprehensionBody) -> Result<(), EvalError>,
    ) -> Result<(), EvalError> {
        match yielder {
            Yielder::Value(body) => sink(self, env, body),
            Yielder::If { condition, dst } => {
                let (v, complete) = self.evaluate(env, condition);
                if !complete {
                    return Err(EvalError::Internal(
                        "comprehension `if` condition not concrete".into(),
                        self.current_pos(),
                    ));
                }
                match v {
                    Value::Bool(true) => self.yield_chain(env, dst, sink),
                    Value::Bool(false) => Ok(()),
                    _ => Err(EvalError::Internal(
                        "comprehension `if` condition is not boolean".into(),
                        self.current_pos(),
                    )),
                }
            }
            Yielder::Let { label, expr, dst } => {
                let scratch = self.vertices.alloc_root();
                self.vertices
                    .get_mut(scratch)
                    .conjuncts
                    .push(Conjunct::new(env, expr.clone()));
                self.unify(scratch)?;
                let bound = self.envs.extend(env, scratch, self.envs.close_id(env));
                let _ = label;
                self.yield_chain(bound, dst, sink)
            }
            Yielder::For { key: _, value, source, dst } => {
                // The compiler resolves a `for` clause's `key` name to a
                // `LabelReference` (this frame's own vertex) and its
                // `value` name to a `FieldReference` that looks up `value`
                // as an arc on this frame's vertex (see `compile_ident`'s
                // `ScopeKind::ForBinding` arm). One synthetic "binding
                // vertex" per iteration satisfies both: its own value is
                // the current key/index, and it carries a single arc named
                // `value` pointing at the actual element vertex.
                let scratch = self.vertices.alloc_root();
                self.vertices
                    .get_mut(scratch)
                    .conjuncts
                    .push(Conjunct::new(env, source.clone()));
                self.unify(scratch)?;
                let arcs: Vec<(Feature, VertexId)> = self
                    .vertices
                    .get(scratch)
                    .arcs
                    .iter()
                    .map(|(l, v)| (*l, *v))
                    .collect();
                let mut iterations = 0u32;
                for (label, child) in arcs {
                    iterations += 1;
                    if iterations > self.limits.get_expand_iterations() {
                        return Err(EvalError::ExpandIterationsExhausted {
                            pos: self.current_pos(),
                            iterations,
                        });
                    }
                    let binding_vertex = self.vertices.alloc_root();
                    self.vertices.get_mut(binding_vertex).value =
                        Some(feature_as_value(label, self.interner));
                    self.vertices.get_mut(binding_vertex).arcs.insert(*value, child);
                    let binding_env = self.envs.extend(env, binding_vertex, self.envs.close_id(env));
                    self.yield_chain(binding_env, dst, sink)?;
                }
                Ok(())
            }
        }
    }
}

fn feature_as_value(label: Feature, interner: &Interner) -> Value {
    if let Some(idx) = label.as_int_index() {
        Value::int(idx as i64)
    } else if let Some(sym) = label.as_symbol() {
        Value::string(interner.resolve(sym).to_string())
    } else {
        Value::Top
    }
}
