//! The compiled expression ADT: `Expr`, `Decl`, `Elem`,
//! `Yielder`.
//!
//! Per the spec's design notes, node categories overlap (an `Expr` can also
//! be a `Resolver`; a `Decl` can also be a `Yielder`) — rather than modeling
//! that with trait objects or inheritance, this is one tagged union per
//! category plus small total predicate functions (`is_resolver`,
//! `is_yielder`, ...) that classify a node by its tag. Nodes share
//! structure through `Rc`, matching the design notes' "sharing is by
//! reference count" option for read-only, compile-time-fixed ADT nodes
//! (as opposed to `Vertex`, which needs arena indices because it is
//! mutated and graph-shaped at evaluation time).

use std::rc::Rc;

use crate::feature::Feature;
use crate::kind::Kind;
use crate::value::{BuiltinRef, Value};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Unify, // &
    Disjoin, // | (only used to mark a raw parse-level `|`; compiled disjunctions use `Expr::Disjunction`)
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Matches,
    NotMatches,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    IntMod,
    IntQuo,
    IntRem,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOp {
    Neg,
    Not,
    Plus,
}

/// One branch of a compiled disjunction, with its explicit-default mark
/// ("alternatives with explicit default marks").
#[derive(Clone, Debug)]
pub struct DisjunctTerm {
    pub expr: Rc<Expr>,
    pub is_default: bool,
}

#[derive(Clone, Debug)]
pub enum InterpPart {
    Str(String),
    Expr(Rc<Expr>),
}

/// A field-set pattern matcher used by `BulkOptionalField`.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// `[X]: ...` against `X` resolving to an exact label.
    Label(Feature),
    /// `[string]: ...` / `[int]: ...`: kind match.
    Kind(Kind),
    /// `[X= =~"pat"]: ...`: predicate-value match.
    Validator(Rc<Expr>),
    /// `[X]: ...` where `X` is itself a computed expression, not a
    /// constant label or basic kind.
    Dynamic(Rc<Expr>),
}

#[derive(Clone, Debug)]
pub struct StructLit {
    pub decls: Vec<Decl>,
    /// Whether this literal closes its fields: the current vertex is
    /// itself a definition, or the literal embeds one by reference. Set by
    /// the compiler; a plain `{...}` with neither stays open even without
    /// an explicit `...` decl.
    pub is_definition: bool,
}

#[derive(Clone, Debug)]
pub struct ListLit {
    pub elems: Vec<Elem>,
}

/// `Elem` category: a list literal element.
#[derive(Clone, Debug)]
pub enum Elem {
    Expr(Rc<Expr>),
    /// `...` or `...T`: an open-ended tail, optionally typed.
    Ellipsis(Option<Rc<Expr>>),
    Comprehension(Rc<Yielder>),
}

/// The terminal of a `Yielder` chain (`ValueClause{StructLit}`, plus
/// the list-comprehension analogue of yielding one element per iteration).
#[derive(Clone, Debug)]
pub enum ComprehensionBody {
    Struct(Rc<StructLit>),
    Elem(Rc<Expr>),
}

/// The comprehension clause chain: `ForClause{Key,Value,Source,Dst}`,
/// `IfClause{Condition,Dst}`, `LetClause{Label,Expr,Dst}`, terminating in
/// `ValueClause` (here `Yielder::Value`).
#[derive(Clone, Debug)]
pub enum Yielder {
    For {
        key: Option<Feature>,
        value: Feature,
        source: Rc<Expr>,
        dst: Rc<Yielder>,
    },
    If {
        condition: Rc<Expr>,
        dst: Rc<Yielder>,
    },
    Let {
        label: Feature,
        expr: Rc<Expr>,
        dst: Rc<Yielder>,
    },
    Value(ComprehensionBody),
}

impl Yielder {
    /// ordering: "`if`-chains expand before `for`-chains in a single
    /// iteration". `rank` lets the driver sort pending clause heads by this
    /// rule without a second pass.
    pub fn expansion_rank(&self) -> u8 {
        match self {
            Yielder::If { .. } => 0,
            Yielder::Let { .. } => 0,
            Yielder::For { .. } => 1,
            Yielder::Value(_) => 2,
        }
    }
}

/// `Decl` category: one entry of a compiled struct literal.
#[derive(Clone, Debug)]
pub enum Decl {
    Field { label: Feature, value: Rc<Expr> },
    OptionalField { label: Feature, value: Rc<Expr> },
    BulkOptionalField { matcher: Matcher, value: Rc<Expr> },
    DynamicField { label_expr: Rc<Expr>, value: Rc<Expr> },
    /// `...` or `...T`: an additional-property slot for any label matched
    /// by neither a declared field nor a bulk-optional matcher.
    Ellipsis(Option<Rc<Expr>>),
    Embed(Rc<Expr>),
    LetClause { label: Feature, expr: Rc<Expr> },
    /// A `for`/`if` comprehension embedded as a struct member; its
    /// terminal is always `ComprehensionBody::Struct`.
    Comprehension(Rc<Yielder>),
}

impl Decl {
    pub fn is_yielder(&self) -> bool {
        matches!(self, Decl::Comprehension(_) | Decl::LetClause { .. })
    }

    pub fn is_field_like(&self) -> bool {
        matches!(
            self,
            Decl::Field { .. } | Decl::OptionalField { .. } | Decl::DynamicField { .. }
        )
    }
}

/// The ADT expression tree. Every identifier the compiler could
/// not fold into a predeclared `Value` becomes one of the
/// `*Reference`/`ImportReference` resolver variants.
#[derive(Clone, Debug)]
pub enum Expr {
    Value(Value),
    Binary {
        op: BinaryOp,
        lhs: Rc<Expr>,
        rhs: Rc<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Rc<Expr>,
    },
    StructLit(Rc<StructLit>),
    ListLit(Rc<ListLit>),
    Disjunction(Vec<DisjunctTerm>),
    Interpolation(Vec<InterpPart>),
    Call {
        builtin: BuiltinRef,
        args: Vec<Rc<Expr>>,
    },
    /// A comprehension used directly in expression position (uncommon, but
    /// the ADT must represent it since `Yielder`s can terminate in a bare
    /// element as well as a struct).
    Comprehension(Rc<Yielder>),

    /// resolves by walking `up_count` `Environment` links then
    /// looking up `label` on the resulting vertex.
    FieldReference { up_count: u32, label: Feature },
    /// Resolves to the *label* of the enclosing pattern binding
    /// (`[X=pattern]: ...`), not its value.
    LabelReference { up_count: u32 },
    /// Resolves to a cached `let`/alias expression, evaluated in the
    /// environment where the `let` was declared.
    LetReference { up_count: u32, target: Rc<Expr> },
    /// A bulk-pattern binding (`[X=pattern]: ...`) referenced from the
    /// pattern's value expression.
    DynamicReference { up_count: u32, label_expr: Rc<Expr> },
    /// Resolves via the external `ImportResolver`.
    ImportReference { path: String },
}

impl Expr {
    pub fn value(v: Value) -> Rc<Expr> {
        Rc::new(Expr::Value(v))
    }

    /// Whether this node is one of the `Resolver` capability's variants
    /// ("Resolver(env, resolver) -> (Vertex | error)").
    pub fn is_resolver(&self) -> bool {
        matches!(
            self,
            Expr::FieldReference { .. }
                | Expr::LabelReference { .. }
                | Expr::LetReference { .. }
                | Expr::DynamicReference { .. }
                | Expr::ImportReference { .. }
        )
    }

    pub fn is_struct_lit(&self) -> bool {
        matches!(self, Expr::StructLit(_))
    }

    pub fn is_list_lit(&self) -> bool {
        matches!(self, Expr::ListLit(_))
    }

    pub fn is_disjunction(&self) -> bool {
        matches!(self, Expr::Disjunction(_))
    }

    /// `&`-combined binary expression (step 2: "BinaryExpr with `&`
    /// recurses on both sides with the same closeID").
    pub fn as_unify(&self) -> Option<(&Rc<Expr>, &Rc<Expr>)> {
        match self {
            Expr::Binary {
                op: BinaryOp::Unify,
                lhs,
                rhs,
            } => Some((lhs, rhs)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_predicate_covers_all_reference_kinds() {
        let field = Expr::FieldReference {
            up_count: 0,
            label: Feature::INVALID,
        };
        let label = Expr::LabelReference { up_count: 0 };
        let import = Expr::ImportReference {
            path: "pkg".into(),
        };
        assert!(field.is_resolver());
        assert!(label.is_resolver());
        assert!(import.is_resolver());
        assert!(!Expr::Value(Value::Null).is_resolver());
    }

    #[test]
    fn yielder_expansion_rank_orders_if_before_for() {
        let terminal = Rc::new(Yielder::Value(ComprehensionBody::Elem(Expr::value(
            Value::Null,
        ))));
        let iff = Yielder::If {
            condition: Expr::value(Value::Bool(true)),
            dst: terminal.clone(),
        };
        let forr = Yielder::For {
            key: None,
            value: Feature::INVALID,
            source: Expr::value(Value::Null),
            dst: terminal,
        };
        assert!(iff.expansion_rank() < forr.expansion_rank());
    }

    #[test]
    fn decl_comprehension_and_let_are_yielders() {
        let terminal = Rc::new(Yielder::Value(ComprehensionBody::Struct(Rc::new(
            StructLit { decls: vec![], is_definition: false },
        ))));
        let d = Decl::Comprehension(terminal);
        assert!(d.is_yielder());
        let l = Decl::LetClause {
            label: Feature::INVALID,
            expr: Expr::value(Value::Null),
        };
        assert!(l.is_yielder());
        assert!(!Decl::Ellipsis(None).is_yielder());
    }
}
