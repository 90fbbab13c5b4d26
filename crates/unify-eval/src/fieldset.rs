//! `FieldSet`: decides, for one struct literal and one candidate
//! label, which of its declarations apply — the exact `Field`/
//! `OptionalField` match, every `BulkOptionalField` whose `Matcher` admits
//! the label, and whether an unmatched label is even allowed to exist
//! (ellipsis vs. closed).
//!
//! This module only classifies; inserting the resulting conjuncts onto an
//! arc and deciding closedness for the *struct itself* belong to
//! `unifier::add_struct` and `closedness`, respectively.

use std::rc::Rc;

use unify_core::{Decl, Expr, Feature, Kind, Matcher, StructLit, Value, Yielder};

use crate::opctx::OpContext;
use unify_core::EnvId;

/// A struct literal's declarations, classified by shape for repeated
/// lookups during `addStruct` (step 2's struct-literal arm runs this
/// once per struct conjunct, then calls [`FieldSet::matches`] once per
/// label it discovers across every conjunct on the vertex).
pub struct FieldSet<'d> {
    decls: &'d [Decl],
}

/// Why a label was (or wasn't) admitted, and what extra conjuncts a bulk
/// match contributes.
pub struct MatchOutcome {
    /// Exact declared field conjuncts for this label (0 or 1; duplicate
    /// `Field` decls for the same label are legal and each contributes a
    /// conjunct, so this is a `Vec` rather than an `Option`).
    pub declared: Vec<Rc<Expr>>,
    /// Conjuncts contributed by bulk-optional matchers that admitted this
    /// label at lookup time (kind/label/dynamic matchers — decided without
    /// needing the candidate's settled value).
    pub bulk: Vec<Rc<Expr>>,
    /// Whether this label was named by an exact `Field`/`OptionalField`.
    pub is_declared: bool,
}

impl<'d> FieldSet<'d> {
    pub fn new(lit: &'d StructLit) -> Self {
        FieldSet { decls: &lit.decls }
    }

    pub fn fields(&self) -> impl Iterator<Item = (Feature, &Rc<Expr>, bool)> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Field { label, value } => Some((*label, value, false)),
            Decl::OptionalField { label, value } => Some((*label, value, true)),
            _ => None,
        })
    }

    pub fn bulk_optionals(&self) -> impl Iterator<Item = (&Matcher, &Rc<Expr>)> {
        self.decls.iter().filter_map(|d| match d {
            Decl::BulkOptionalField { matcher, value } => Some((matcher, value)),
            _ => None,
        })
    }

    pub fn dynamic_fields(&self) -> impl Iterator<Item = (&Rc<Expr>, &Rc<Expr>)> {
        self.decls.iter().filter_map(|d| match d {
            Decl::DynamicField { label_expr, value } => Some((label_expr, value)),
            _ => None,
        })
    }

    pub fn embeds(&self) -> impl Iterator<Item = &Rc<Expr>> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Embed(e) => Some(e),
            _ => None,
        })
    }

    pub fn let_clauses(&self) -> impl Iterator<Item = (Feature, &Rc<Expr>)> {
        self.decls.iter().filter_map(|d| match d {
            Decl::LetClause { label, expr } => Some((*label, expr)),
            _ => None,
        })
    }

    pub fn comprehensions(&self) -> impl Iterator<Item = &Rc<Yielder>> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Comprehension(y) => Some(y),
            _ => None,
        })
    }

    pub fn has_ellipsis(&self) -> bool {
        self.decls.iter().any(|d| matches!(d, Decl::Ellipsis(_)))
    }

    /// The `...T` additional-property constraint, if this struct's
    /// ellipsis decl named one. `None` for a bare `...` or no ellipsis at
    /// all — the caller distinguishes those with [`FieldSet::has_ellipsis`].
    pub fn ellipsis_constraint(&self) -> Option<&Rc<Expr>> {
        self.decls.iter().find_map(|d| match d {
            Decl::Ellipsis(t) => t.as_ref(),
            _ => None,
        })
    }

    /// Every declared and admitting-bulk label this struct literal names
    /// without needing a candidate value — the set `addStruct` walks to
    /// discover which arcs to create (step 2).
    pub fn declared_labels(&self) -> impl Iterator<Item = Feature> + '_ {
        self.fields().map(|(l, _, _)| l)
    }

    /// Classifies `label` against every exact and bulk-optional decl.
    /// `Matcher::Validator` matchers are intentionally excluded here: they
    /// need the candidate arc's settled value, so the unifier re-checks
    /// them separately via [`validator_matches`] once the arc has a value
    /// (bulk-optional validator re-scan open question — resolved
    /// in `DESIGN.md` as "re-run on every value change up to the expand
    /// budget").
    pub fn matches(&self, label: Feature, ctx: &mut OpContext, env: EnvId) -> MatchOutcome {
        let mut declared = Vec::new();
        let mut is_declared = false;
        for (decl_label, value, _optional) in self.fields() {
            if decl_label == label {
                declared.push(value.clone());
                is_declared = true;
            }
        }
        let mut bulk = Vec::new();
        for (matcher, value) in self.bulk_optionals() {
            if let Matcher::Validator(_) = matcher {
                continue;
            }
            if matcher_admits_eagerly(matcher, label, ctx, env) {
                bulk.push(value.clone());
            }
        }
        MatchOutcome {
            declared,
            bulk,
            is_declared,
        }
    }

    /// `[X=pattern]: value` bulk matchers where `pattern` is itself a
    /// computed constraint (a bound, basic type, or disjunction of
    /// literals) rather than a plain kind/label/expression match. CUE
    /// admits a label under such a pattern when the label, treated as a
    /// string/int `Value`, satisfies the constraint — so this needs the
    /// pattern evaluated (any env suffices; the pattern may reference outer
    /// fields but never the candidate label itself) and is re-run each time
    /// `addStruct` discovers a new label, not gated on the arc's value
    /// (open question: resolved here as "admission is decided from
    /// the label text alone, independent of how the matched arc's own
    /// value later resolves").
    pub fn validator_matches(&self, label: Feature, ctx: &mut OpContext, env: EnvId) -> Vec<Rc<Expr>> {
        let mut out = Vec::new();
        let label_value = label_as_value(label, ctx);
        for (matcher, value) in self.bulk_optionals() {
            let Matcher::Validator(pattern_expr) = matcher else {
                continue;
            };
            let (pattern, complete) = ctx.evaluate(env, pattern_expr);
            if complete && satisfies_constraint(&label_value, &pattern) {
                out.push(value.clone());
            }
        }
        out
    }
}

pub(crate) fn label_as_value(label: Feature, ctx: &OpContext) -> Value {
    if let Some(idx) = label.as_int_index() {
        Value::int(idx as i64)
    } else if let Some(sym) = label.as_symbol() {
        Value::string(ctx.interner.resolve(sym).to_string())
    } else {
        Value::Top
    }
}

/// Whether `value` satisfies a compiled pattern constraint: a basic type,
/// a bound (`>`, `=~`, ...), a disjunction of alternatives (any branch
/// satisfying), or an exact scalar.
pub(crate) fn satisfies_constraint(value: &Value, constraint: &Value) -> bool {
    use unify_core::BoundOp;
    match constraint {
        Value::Top => true,
        Value::BasicType(k) => k.contains(value.kind()),
        Value::BoundValue { op, rhs } => match (value, rhs.as_ref()) {
            (Value::Num(a), Value::Num(b)) => match op {
                BoundOp::Lt => a < b,
                BoundOp::Le => a <= b,
                BoundOp::Gt => a > b,
                BoundOp::Ge => a >= b,
                BoundOp::Ne => a != b,
                _ => false,
            },
            (Value::String { value: a, .. }, Value::String { value: b, .. }) => match op {
                BoundOp::Ne => a != b,
                BoundOp::Matches | BoundOp::NotMatches => {
                    let matched = regex::Regex::new(b).map(|re| re.is_match(a)).unwrap_or(false);
                    matched == matches!(op, BoundOp::Matches)
                }
                _ => false,
            },
            _ => false,
        },
        Value::Disjunction { values, .. } => values.iter().any(|v| satisfies_constraint(value, v)),
        other => value.struct_eq(other),
    }
}

pub(crate) fn matcher_admits_eagerly(matcher: &Matcher, label: Feature, ctx: &mut OpContext, env: EnvId) -> bool {
    match matcher {
        Matcher::Label(want) => *want == label,
        Matcher::Kind(kind) => {
            if label.is_int() {
                kind.contains(Kind::INT)
            } else {
                kind.contains(Kind::STRING)
            }
        }
        Matcher::Dynamic(expr) => {
            let (v, complete) = ctx.evaluate(env, expr);
            if !complete {
                return false;
            }
            match v {
                Value::String { value, .. } => {
                    let sym = ctx.interner.intern(&value);
                    Feature::string_label(sym) == label
                }
                Value::Num(n) => {
                    use num_traits::ToPrimitive;
                    n.as_bigint()
                        .and_then(|b| b.to_i64())
                        .and_then(|i| u32::try_from(i).ok())
                        .map(|i| Feature::int_label(i) == label)
                        .unwrap_or(false)
                }
                _ => false,
            }
        }
        Matcher::Validator(_) => false,
    }
}
