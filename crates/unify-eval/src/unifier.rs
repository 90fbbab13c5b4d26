//! `Unify`: the core fixed-point algorithm. Drains a vertex's
//! conjunct queue — combining plain values, recursing through `&`,
//! expanding struct/list literals into arcs, forcing disjunctions and
//! references — until nothing is left to do, then finalizes and recurses
//! into every arc the vertex accumulated.
//!
//! This module supplies the concrete function `OpContext` is handed as its
//! `UnifyFn` callback; see `opctx`'s module docs for why that indirection
//! exists instead of a direct dependency.

use std::rc::Rc;

use unify_core::{
    Bottom, BoundOp, ComprehensionBody, Conjunct, Decl, Elem, EnvId, Expr, Feature, ListLit,
    ListShape, Matcher, Pos, StructLit, Value, VertexId, VertexStatus,
};

use crate::closedness;
use crate::error::EvalError;
use crate::fieldset;
use crate::opctx::OpContext;

/// Entry point matching `opctx::UnifyFn` (`Unify(ctx, v)`).
pub fn unify(ctx: &mut OpContext, id: VertexId) -> Result<(), EvalError> {
    match ctx.vertices.get(id).status {
        VertexStatus::Finalized => return Ok(()),
        VertexStatus::Unifying => {
            // A structural cycle: `id` is already being unified higher up
            // this same call stack. Mark the sentinel and return — whatever
            // partial value `id` has so far stands for this reference; a
            // cycle that never bottoms out on a concrete value stays
            // incomplete rather than looping forever.
            ctx.vertices.get_mut(id).cycle_sentinel = true;
            ctx.tracer.trace_cycle_detected(id);
            return Ok(());
        }
        VertexStatus::Unprocessed => {}
    }

    ctx.enter_recursion()?;
    ctx.vertices.get_mut(id).status = VertexStatus::Unifying;
    ctx.tracer.trace_unify_enter(id);

    let result = drain(ctx, id);

    ctx.vertices.get_mut(id).status = VertexStatus::Finalized;
    ctx.tracer.trace_unify_exit(id);
    ctx.exit_recursion();
    result
}

/// step 3's `expandOne` fixed-point loop: repeatedly drains whatever
/// conjuncts are pending, since processing one can push more onto the same
/// vertex (an incomplete sub-expression re-enqueuing itself, a `let` or
/// bulk-optional match discovering a new arc). Stops once a pass finds
/// nothing left, or the iteration budget runs out (termination
/// backstop).
fn drain(ctx: &mut OpContext, id: VertexId) -> Result<(), EvalError> {
    let mut iterations = 0u32;
    loop {
        let pending = std::mem::take(&mut ctx.vertices.get_mut(id).conjuncts);
        if pending.is_empty() {
            break;
        }
        iterations += 1;
        if iterations > ctx.limits.get_expand_iterations() {
            return Err(EvalError::ExpandIterationsExhausted {
                pos: ctx.current_pos(),
                iterations,
            });
        }
        for c in pending {
            add_expr_conjunct(ctx, id, c.env, c.expr)?;
        }
        ctx.tracer.trace_expand_iteration(id, iterations, true);
    }

    check_closedness(ctx, id);

    let arcs: Vec<VertexId> = ctx.vertices.get(id).arcs.values().copied().collect();
    for child in arcs {
        unify(ctx, child)?;
    }
    Ok(())
}

/// Rejects any arc whose label the vertex's fully-composed `CloseTree`
/// doesn't admit ("rejects a label admitted by none of the ANDed
/// definitions"). Runs once per `drain`, after every conjunct this pass
/// contributed has had a chance to compose its own closedness.
fn check_closedness(ctx: &mut OpContext, id: VertexId) {
    let labels: Vec<Feature> = ctx.vertices.get(id).arcs.keys().copied().collect();
    for label in labels {
        if !closedness::admits(ctx.vertices.get(id), label) {
            ctx.tracer.trace_closedness_reject(id, label);
            let pos = ctx.current_pos();
            let bottom = unify_core::Bottom::eval(pos, "field not allowed by closed struct");
            let vertex = ctx.vertices.get_mut(id);
            vertex.value = Some(match vertex.value.take() {
                Some(existing) => unify_scalar(existing, Value::Bottom(bottom), pos),
                None => Value::Bottom(bottom),
            });
        }
    }
}

/// Adds one `Conjunct`'s expression to `vertex` (step 2's dispatch).
fn add_expr_conjunct(ctx: &mut OpContext, vertex: VertexId, env: EnvId, expr: Rc<Expr>) -> Result<(), EvalError> {
    if let Some((l, r)) = expr.as_unify() {
        let (l, r) = (l.clone(), r.clone());
        add_expr_conjunct(ctx, vertex, env, l)?;
        return add_expr_conjunct(ctx, vertex, env, r);
    }
    match expr.as_ref() {
        Expr::Value(v) => combine_value(ctx, vertex, v.clone()),
        Expr::StructLit(lit) => add_struct(ctx, vertex, env, lit),
        Expr::ListLit(lit) => add_list(ctx, vertex, env, lit),
        Expr::Disjunction(terms) => {
            let result = crate::disjunction::try_disjuncts(ctx, vertex, env, terms)?;
            combine_value(ctx, vertex, result)
        }
        _ if expr.is_resolver() => {
            let target = ctx.resolve(env, &expr)?;
            merge_vertex_into(ctx, vertex, target)
        }
        _ => {
            let (v, complete) = ctx.evaluate(env, &expr);
            if complete {
                combine_value(ctx, vertex, v)
            } else {
                // Come back next `expandOne` pass once its operands settle.
                ctx.vertices.get_mut(vertex).conjuncts.push(Conjunct::new(env, expr.clone()));
                Ok(())
            }
        }
    }
}

/// step 2's struct-literal arm: composes this conjunct's closedness,
/// walks its declarations in source order (so `let` bindings extend the
/// environment the way the compiler's scope stack assumed they would for
/// every decl compiled after them), then matches every bulk-optional
/// matcher against the full set of arcs the struct (and any earlier sibling
/// conjunct) produced.
fn add_struct(ctx: &mut OpContext, vertex: VertexId, env: EnvId, lit: &StructLit) -> Result<(), EvalError> {
    if closedness::introduces_close_id(lit.is_definition) {
        let close_id = ctx.alloc_close_id();
        let leaf = closedness::leaf_for_struct(close_id, lit);
        closedness::compose_onto(ctx.vertices.get_mut(vertex), leaf);
    }

    let mut cur_env = env;
    let mut bulk_matchers: Vec<(Matcher, Rc<Expr>, EnvId)> = Vec::new();
    let mut declared_labels: Vec<Feature> = Vec::new();
    let mut ellipsis_value: Option<(Rc<Expr>, EnvId)> = None;

    for decl in &lit.decls {
        match decl {
            Decl::Field { label, value } => {
                declared_labels.push(*label);
                insert_field(ctx, vertex, *label, value.clone(), cur_env)
            }
            // A declared-but-unmatched optional field only materializes
            // when something looks it up; a bare struct literal
            // evaluated in isolation never forces one into existence.
            Decl::OptionalField { label, .. } => declared_labels.push(*label),
            Decl::BulkOptionalField { matcher, value } => {
                bulk_matchers.push((matcher.clone(), value.clone(), cur_env));
            }
            Decl::DynamicField { label_expr, value } => {
                let (v, complete) = ctx.evaluate(cur_env, label_expr);
                if !complete {
                    return Err(EvalError::Internal(
                        "dynamic field label is not concrete".into(),
                        ctx.current_pos(),
                    ));
                }
                let label = concrete_label(ctx, &v)?;
                declared_labels.push(label);
                insert_field(ctx, vertex, label, value.clone(), cur_env);
            }
            Decl::Ellipsis(constraint) => {
                if let Some(c) = constraint {
                    ellipsis_value = Some((c.clone(), cur_env));
                }
            }
            Decl::Embed(e) => add_expr_conjunct(ctx, vertex, cur_env, e.clone())?,
            Decl::LetClause { expr, .. } => {
                let scratch = ctx.vertices.alloc_root();
                ctx.vertices.get_mut(scratch).conjuncts.push(Conjunct::new(cur_env, expr.clone()));
                ctx.unify(scratch)?;
                cur_env = ctx.envs.extend(cur_env, scratch, ctx.envs.close_id(cur_env));
            }
            Decl::Comprehension(yielder) => {
                let yielder = yielder.clone();
                ctx.yield_chain(cur_env, &yielder, &mut |ctx, final_env, body| match body {
                    ComprehensionBody::Struct(inner) => add_struct(ctx, vertex, final_env, inner),
                    ComprehensionBody::Elem(_) => Err(EvalError::Internal(
                        "struct comprehension terminal must be a value clause".into(),
                        ctx.current_pos(),
                    )),
                })?;
            }
        }
    }

    // Bulk-optional matching is declaration-order-independent across the
    // whole struct: re-scan every arc this conjunct (or an earlier
    // sibling conjunct on the same vertex) produced, using the matcher's
    // own recorded environment rather than the arc's. A label this
    // conjunct neither declared nor bulk-matched falls to its ellipsis
    // constraint, if it named one.
    let existing: Vec<Feature> = ctx.vertices.get(vertex).arcs.keys().copied().collect();
    for label in existing {
        let label_value = fieldset::label_as_value(label, ctx);
        let mut matched_bulk = false;
        for (matcher, value, bulk_env) in &bulk_matchers {
            let admitted = match matcher {
                Matcher::Validator(pattern_expr) => {
                    let (pattern, complete) = ctx.evaluate(*bulk_env, pattern_expr);
                    complete && fieldset::satisfies_constraint(&label_value, &pattern)
                }
                other => fieldset::matcher_admits_eagerly(other, label, ctx, *bulk_env),
            };
            if admitted {
                matched_bulk = true;
                let child = ctx.vertices.arc_or_insert(vertex, label);
                ctx.vertices.get_mut(child).conjuncts.push(Conjunct::new(*bulk_env, value.clone()));
            }
        }
        if !matched_bulk && !declared_labels.contains(&label) {
            if let Some((constraint, cenv)) = &ellipsis_value {
                let child = ctx.vertices.arc_or_insert(vertex, label);
                ctx.vertices.get_mut(child).conjuncts.push(Conjunct::new(*cenv, constraint.clone()));
            }
        }
    }

    Ok(())
}

fn insert_field(ctx: &mut OpContext, vertex: VertexId, label: Feature, value: Rc<Expr>, env: EnvId) {
    let child = ctx.vertices.arc_or_insert(vertex, label);
    ctx.tracer.trace_arc_inserted(vertex, label, child);
    ctx.vertices.get_mut(child).conjuncts.push(Conjunct::new(env, value));
}

fn concrete_label(ctx: &mut OpContext, v: &Value) -> Result<Feature, EvalError> {
    match v {
        Value::String { value, .. } => Ok(Feature::string_label(ctx.interner.intern(value))),
        Value::Num(n) => {
            use num_traits::ToPrimitive;
            n.as_bigint()
                .and_then(|b| b.to_i64())
                .and_then(|i| u32::try_from(i).ok())
                .map(Feature::int_label)
                .ok_or_else(|| {
                    EvalError::Internal("dynamic field label must be a non-negative integer".into(), ctx.current_pos())
                })
        }
        _ => Err(EvalError::Internal(
            "dynamic field label must be a string or integer".into(),
            ctx.current_pos(),
        )),
    }
}

/// step 2's list-literal arm: sequential indices across plain
/// elements, ellipsis tails, and interleaved comprehensions alike.
fn add_list(ctx: &mut OpContext, vertex: VertexId, env: EnvId, lit: &ListLit) -> Result<(), EvalError> {
    let mut index = 0u32;
    for elem in &lit.elems {
        match elem {
            Elem::Expr(e) => {
                let label = Feature::int_label(index);
                index += 1;
                let child = ctx.vertices.arc_or_insert(vertex, label);
                ctx.vertices.get_mut(child).conjuncts.push(Conjunct::new(env, e.clone()));
            }
            Elem::Ellipsis(constraint) => {
                // An open-ended tail just means "more elements may legally
                // follow"; there is no concrete peer list here to supply
                // them against, so only the tail's own type constraint (if
                // any) needs forcing for its side effects (e.g. a bad
                // constraint expression reporting an error now rather than
                // silently later).
                if let Some(c) = constraint {
                    let scratch = ctx.vertices.alloc_root();
                    ctx.vertices.get_mut(scratch).conjuncts.push(Conjunct::new(env, c.clone()));
                    ctx.unify(scratch)?;
                }
            }
            Elem::Comprehension(yielder) => {
                ctx.yield_chain(env, yielder, &mut |ctx, final_env, body| match body {
                    ComprehensionBody::Elem(e) => {
                        let label = Feature::int_label(index);
                        index += 1;
                        let child = ctx.vertices.arc_or_insert(vertex, label);
                        ctx.vertices.get_mut(child).conjuncts.push(Conjunct::new(final_env, e.clone()));
                        Ok(())
                    }
                    ComprehensionBody::Struct(_) => Err(EvalError::Internal(
                        "list comprehension terminal must be an element clause".into(),
                        ctx.current_pos(),
                    )),
                })?;
            }
        }
    }

    let closed = !lit.elems.iter().any(|e| matches!(e, Elem::Ellipsis(_)));
    compose_list_shape(ctx, vertex, index, closed);
    Ok(())
}

/// Merges one list literal conjunct's length/openness into whatever
/// shape `vertex` already carries, bottoming its value the way
/// [`check_closedness`] bottoms a struct on a disallowed label: two
/// closed lists of different lengths conflict outright, and a shorter
/// open list cannot stretch to cover a longer closed one.
fn compose_list_shape(ctx: &mut OpContext, vertex: VertexId, len: u32, closed: bool) {
    let new = ListShape { len, closed };
    let pos = ctx.current_pos();
    let merged = match ctx.vertices.get(vertex).list_shape {
        None => Ok(new),
        Some(existing) => merge_list_shape(existing, new, pos),
    };
    match merged {
        Ok(shape) => ctx.vertices.get_mut(vertex).list_shape = Some(shape),
        Err(bottom) => {
            let vtx = ctx.vertices.get_mut(vertex);
            vtx.value = Some(match vtx.value.take() {
                Some(existing) => unify_scalar(existing, Value::Bottom(bottom), pos),
                None => Value::Bottom(bottom),
            });
        }
    }
}

fn merge_list_shape(existing: ListShape, new: ListShape, pos: Pos) -> Result<ListShape, Bottom> {
    match (existing.closed, new.closed) {
        (true, true) => {
            if existing.len == new.len {
                Ok(existing)
            } else {
                Err(Bottom::eval(pos, format!("conflicting list lengths: {} and {}", existing.len, new.len)))
            }
        }
        (true, false) => {
            if new.len <= existing.len {
                Ok(existing)
            } else {
                Err(Bottom::eval(pos, format!("list of length {} too short for closed length {}", existing.len, new.len)))
            }
        }
        (false, true) => {
            if existing.len <= new.len {
                Ok(new)
            } else {
                Err(Bottom::eval(pos, format!("list of length {} too short for closed length {}", new.len, existing.len)))
            }
        }
        (false, false) => Ok(ListShape {
            len: existing.len.max(new.len),
            closed: false,
        }),
    }
}

/// Combines `value` into `vertex`'s settled value. A `Value::Vertex` is not
/// a scalar to lattice-combine — it names another vertex whose value and
/// arcs must be grafted on (a field reference, an embedded struct result),
/// so it's routed to [`merge_vertex_into`] instead.
fn combine_value(ctx: &mut OpContext, vertex: VertexId, value: Value) -> Result<(), EvalError> {
    if let Value::Vertex(src) = value {
        return merge_vertex_into(ctx, vertex, src);
    }
    let pos = ctx.current_pos();
    let current = ctx.vertices.get_mut(vertex).value.take();
    let combined = match current {
        None => value,
        Some(existing) => combine_scalar(ctx, existing, value, pos),
    };
    ctx.vertices.get_mut(vertex).value = Some(combined);
    Ok(())
}

/// `unify_scalar` plus the one case it can't decide on its own: a
/// `BuiltinValidator` needs `ctx.validate` to actually call out to the
/// registry, so it's handled here instead of in the pure lattice table. A
/// validator meeting a non-concrete operand (`Top`, a bound, another
/// validator) stays an unresolved `Conjunction` until a concrete candidate
/// shows up to check against.
fn combine_scalar(ctx: &mut OpContext, a: Value, b: Value, pos: Pos) -> Value {
    match (a, b) {
        (Value::BuiltinValidator { builtin, args }, candidate) | (candidate, Value::BuiltinValidator { builtin, args })
            if is_plain_scalar(&candidate) =>
        {
            match ctx.validate(&builtin, &args, &candidate) {
                Ok(()) => candidate,
                Err(bottom) => Value::Bottom(bottom),
            }
        }
        (a, b) => unify_scalar(a, b, pos),
    }
}

fn is_plain_scalar(v: &Value) -> bool {
    matches!(v, Value::Null | Value::Bool(_) | Value::Num(_) | Value::String { .. } | Value::Bytes { .. })
}

/// Grafts `src`'s settled value, arcs, and closedness onto `dest` (a
/// resolved field reference, or an embedded expression that evaluated to
/// another vertex). Arcs are merged recursively, label by label, rather
/// than replaced — `dest` may already have a same-named arc from a sibling
/// conjunct, which must itself unify with `src`'s.
fn merge_vertex_into(ctx: &mut OpContext, dest: VertexId, src: VertexId) -> Result<(), EvalError> {
    ctx.unify(src)?;
    if dest == src {
        return Ok(());
    }
    if let Some(v) = ctx.vertices.get(src).value.clone() {
        combine_value(ctx, dest, v)?;
    }
    let arcs: Vec<(Feature, VertexId)> = ctx.vertices.get(src).arcs.iter().map(|(l, c)| (*l, *c)).collect();
    for (label, child) in arcs {
        let dest_child = ctx.vertices.arc_or_insert(dest, label);
        ctx.tracer.trace_arc_inserted(dest, label, dest_child);
        merge_vertex_into(ctx, dest_child, child)?;
    }
    if let Some(closed) = ctx.vertices.get(src).closed.clone() {
        closedness::compose_onto(ctx.vertices.get_mut(dest), closed);
    }
    Ok(())
}

/// Pure scalar/type/bound lattice combination (unification
/// table). `Value::Vertex` never reaches here — [`combine_value`] routes it
/// to [`merge_vertex_into`] first.
fn unify_scalar(a: Value, b: Value, pos: Pos) -> Value {
    match (a, b) {
        (Value::Top, x) | (x, Value::Top) => x,
        (Value::Bottom(x), Value::Bottom(y)) => Value::Bottom(x.combine(y)),
        (Value::Bottom(x), _) | (_, Value::Bottom(x)) => Value::Bottom(x),
        (Value::Disjunction { values, num_defaults }, other) | (other, Value::Disjunction { values, num_defaults }) => {
            let mut survivors = Vec::new();
            let mut surviving_defaults = 0;
            for (i, v) in values.into_iter().enumerate() {
                let combined = unify_scalar(v, other.clone(), pos);
                if !combined.is_bottom() {
                    if i < num_defaults {
                        surviving_defaults += 1;
                    }
                    survivors.push(combined);
                }
            }
            match survivors.len() {
                0 => Value::Bottom(unify_core::Bottom::eval(pos, "no disjunction branch survived unification")),
                1 => survivors.into_iter().next().unwrap(),
                _ => Value::Disjunction {
                    values: survivors,
                    num_defaults: surviving_defaults,
                },
            }
        }
        (Value::BasicType(k1), Value::BasicType(k2)) => {
            let inter = k1.intersection(k2);
            if inter.is_none() {
                Value::Bottom(unify_core::Bottom::eval(pos, "incompatible types"))
            } else {
                Value::BasicType(inter)
            }
        }
        (Value::BasicType(k), v) | (v, Value::BasicType(k)) => {
            if k.contains(v.kind()) {
                v
            } else {
                Value::Bottom(unify_core::Bottom::eval(pos, format!("{v} does not match {k}")))
            }
        }
        (Value::BoundValue { op, rhs }, v) | (v, Value::BoundValue { op, rhs }) => {
            if bound_holds(op, &v, &rhs) {
                v
            } else {
                Value::Bottom(unify_core::Bottom::eval(pos, format!("{v} does not satisfy bound {op}{rhs}")))
            }
        }
        (a, b) => {
            if a.struct_eq(&b) {
                a
            } else {
                Value::Bottom(unify_core::Bottom::eval(pos, format!("conflicting values: {a} and {b}")))
            }
        }
    }
}

fn bound_holds(op: BoundOp, value: &Value, rhs: &Value) -> bool {
    let constraint = Value::BoundValue {
        op,
        rhs: Box::new(rhs.clone()),
    };
    fieldset::satisfies_constraint(value, &constraint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use unify_core::{BinaryOp, EnvArena, Expr, Feature, Interner, VertexArena};

    use crate::limits::EvalLimits;
    use crate::opctx::{EmptyBuiltinRegistry, NoImports, OpContext};
    use crate::tracer::NoopTracer;

    fn run(expr: Rc<Expr>) -> (Value, unify_core::Vertex) {
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let mut interner = Interner::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        vertices.get_mut(root).conjuncts.push(Conjunct::new(env, expr));
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut vertices,
            &mut envs,
            &mut interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unify,
        );
        unify(&mut ctx, root).expect("unify should not abort");
        (vertices.get(root).value.clone().unwrap_or(Value::Top), vertices.get(root).clone())
    }

    #[test]
    fn unify_combines_two_bounds_with_a_scalar() {
        // `>0 & <10 & 5` should settle on the concrete scalar.
        let gt0 = Expr::value(Value::BoundValue {
            op: BoundOp::Gt,
            rhs: Box::new(Value::int(0)),
        });
        let lt10 = Expr::value(Value::BoundValue {
            op: BoundOp::Lt,
            rhs: Box::new(Value::int(10)),
        });
        let five = Expr::value(Value::int(5));
        let combined = Rc::new(Expr::Binary {
            op: BinaryOp::Unify,
            lhs: Rc::new(Expr::Binary {
                op: BinaryOp::Unify,
                lhs: gt0,
                rhs: lt10,
            }),
            rhs: five,
        });
        let (v, _) = run(combined);
        assert!(matches!(v, Value::Num(n) if n == unify_core::Num::int_i64(5)));
    }

    #[test]
    fn unify_rejects_bound_violation() {
        let gt10 = Expr::value(Value::BoundValue {
            op: BoundOp::Gt,
            rhs: Box::new(Value::int(10)),
        });
        let five = Expr::value(Value::int(5));
        let combined = Rc::new(Expr::Binary {
            op: BinaryOp::Unify,
            lhs: gt10,
            rhs: five,
        });
        let (v, _) = run(combined);
        assert!(v.is_bottom());
    }

    #[test]
    fn struct_literal_builds_arcs() {
        let mut interner = Interner::new();
        let a = Feature::string_label(interner.intern("a"));
        let lit = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: Expr::value(Value::int(1)),
            }],
            is_definition: false,
        });
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit))));
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut vertices,
            &mut envs,
            &mut interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unify,
        );
        unify(&mut ctx, root).expect("unify should not abort");
        let child = vertices.get(root).arcs.get(&a).copied().expect("arc a");
        assert_eq!(vertices.get(child).value, Some(Value::int(1)));
    }

    #[test]
    fn plain_struct_siblings_merge_fields() {
        let mut interner = Interner::new();
        let a = Feature::string_label(interner.intern("a"));
        let b = Feature::string_label(interner.intern("b"));
        let lit_a = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: Expr::value(Value::int(1)),
            }],
            is_definition: false,
        });
        let lit_b = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: b,
                value: Expr::value(Value::int(2)),
            }],
            is_definition: false,
        });
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit_a))));
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit_b))));
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut vertices,
            &mut envs,
            &mut interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unify,
        );
        unify(&mut ctx, root).expect("unify should not abort");
        // Plain struct literals carry no closedness at all, so `&`-ing two
        // of them together onto the same vertex just merges their fields.
        assert!(vertices.get(root).bottom().is_none());
        let child_a = vertices.get(root).arcs.get(&a).copied().expect("arc a");
        let child_b = vertices.get(root).arcs.get(&b).copied().expect("arc b");
        assert_eq!(vertices.get(child_a).value, Some(Value::int(1)));
        assert_eq!(vertices.get(child_b).value, Some(Value::int(2)));
    }

    #[test]
    fn closed_definition_rejects_unknown_sibling_field() {
        let mut interner = Interner::new();
        let a = Feature::string_label(interner.intern("a"));
        let b = Feature::string_label(interner.intern("b"));
        let lit_a = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: a,
                value: Expr::value(Value::int(1)),
            }],
            is_definition: true,
        });
        let lit_b = Rc::new(StructLit {
            decls: vec![Decl::Field {
                label: b,
                value: Expr::value(Value::int(2)),
            }],
            is_definition: true,
        });
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit_a))));
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::StructLit(lit_b))));
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut vertices,
            &mut envs,
            &mut interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unify,
        );
        unify(&mut ctx, root).expect("unify should not abort");
        // Neither leaf admits the other's label, so the AND-composed
        // close-tree on `root` rejects both once both sibling definitions
        // have contributed their arcs.
        assert!(vertices.get(root).bottom().is_some());
    }

    #[test]
    fn list_literal_rejects_conflicting_closed_lengths() {
        let one = Expr::value(Value::int(1));
        let two = Expr::value(Value::int(2));
        let three = Expr::value(Value::int(3));
        let short = Rc::new(ListLit {
            elems: vec![Elem::Expr(one.clone()), Elem::Expr(two.clone())],
        });
        let long = Rc::new(ListLit {
            elems: vec![Elem::Expr(one), Elem::Expr(two), Elem::Expr(three)],
        });
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let mut interner = Interner::new();
        let root = vertices.alloc_root();
        let env = envs.root(root);
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::ListLit(short))));
        vertices
            .get_mut(root)
            .conjuncts
            .push(Conjunct::new(env, Rc::new(Expr::ListLit(long))));
        let registry = EmptyBuiltinRegistry;
        let mut imports = NoImports;
        let mut tracer = NoopTracer;
        let mut ctx = OpContext::new(
            &mut vertices,
            &mut envs,
            &mut interner,
            &registry,
            &mut imports,
            EvalLimits::new(),
            &mut tracer,
            unify,
        );
        unify(&mut ctx, root).expect("unify should not abort");
        assert!(vertices.get(root).bottom().is_some());
    }
}
