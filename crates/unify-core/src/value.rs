//! The ADT `Value` sum type.
//!
//! A `Value` is simultaneously a concrete scalar, a type, a bound, or a
//! structural marker; `Kind`/`Concreteness` (see `kind.rs`) classify which.
//! `Num` uses `BigInt` for the integer kind so that integer arithmetic
//! never silently wraps (the spec calls for "arbitrary-precision decimal");
//! floats stay `f64` since the spec's numeric examples never need
//! arbitrary float precision and a full decimal type is out of scope for
//! this core (`DESIGN.md` records the trade-off).

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;

use crate::error::Bottom;
use crate::kind::Kind;
use crate::vertex::VertexId;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NumKind {
    Int,
    Float,
}

/// Arbitrary-precision number.
#[derive(Clone, Debug)]
pub struct Num {
    pub kind: NumKind,
    int: Option<BigInt>,
    float: Option<f64>,
}

impl Num {
    pub fn int(v: BigInt) -> Self {
        Num {
            kind: NumKind::Int,
            int: Some(v),
            float: None,
        }
    }

    pub fn int_i64(v: i64) -> Self {
        Self::int(BigInt::from(v))
    }

    pub fn float(v: f64) -> Self {
        Num {
            kind: NumKind::Float,
            int: None,
            float: Some(v),
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        self.int.as_ref()
    }

    pub fn as_f64(&self) -> f64 {
        match self.kind {
            NumKind::Int => {
                // BigInt -> f64 is lossy for huge magnitudes; acceptable for
                // the mixed-arithmetic coercions in `BinOp`, which only use
                // this path when promoting an int operand to float context.
                self.int
                    .as_ref()
                    .and_then(|b| {
                        use num_traits::ToPrimitive;
                        b.to_f64()
                    })
                    .unwrap_or(f64::NAN)
            }
            NumKind::Float => self.float.unwrap_or(f64::NAN),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self.kind {
            NumKind::Int => self
                .int
                .as_ref()
                .map(|b| b.sign() == num_bigint::Sign::NoSign)
                .unwrap_or(false),
            NumKind::Float => self.float == Some(0.0),
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (NumKind::Int, NumKind::Int) => self.int == other.int,
            (NumKind::Float, NumKind::Float) => self.float == other.float,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.kind, other.kind) {
            (NumKind::Int, NumKind::Int) => self.int.partial_cmp(&other.int),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NumKind::Int => write!(f, "{}", self.int.as_ref().expect("int Num has int payload")),
            NumKind::Float => write!(f, "{}", self.float.expect("float Num has float payload")),
        }
    }
}

/// Relational/bound operator for `BoundValue` (e.g. `>0`, `<=10`, `!= "x"`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoundOp {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
    /// `=~`/`!~` as a bound, e.g. a field declared `=~"^[a-z]+$"`.
    Matches,
    NotMatches,
}

impl fmt::Display for BoundOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BoundOp::Lt => "<",
            BoundOp::Le => "<=",
            BoundOp::Gt => ">",
            BoundOp::Ge => ">=",
            BoundOp::Ne => "!=",
            BoundOp::Matches => "=~",
            BoundOp::NotMatches => "!~",
        };
        write!(f, "{s}")
    }
}

/// Identifies a registered validator/builtin for `BuiltinValidator`. The
/// evaluator never inlines builtin bodies; it calls out to the
/// external `BuiltinRegistry` (see `unify-eval::opctx`).
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct BuiltinRef {
    pub package: String,
    pub name: String,
}

/// A leaf or composite value in the ADT.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    String {
        value: String,
        /// Present once a `=~`/`!~` bound or pattern has compiled a regex
        /// against this string; cached so repeated matches against the
        /// same literal don't recompile.
        compiled_regex: Option<std::sync::Arc<regex::Regex>>,
    },
    Bytes {
        value: Vec<u8>,
        compiled_regex: Option<std::sync::Arc<regex::bytes::Regex>>,
    },
    /// The lattice top: matches anything (`_`).
    Top,
    /// The lattice bottom: an error.
    Bottom(Bottom),
    /// A type constraint such as predeclared `int`/`string`/`number`.
    BasicType(Kind),
    /// A bound such as `>0` or `!="x"`: operator plus a concrete RHS.
    BoundValue { op: BoundOp, rhs: Box<Value> },
    /// A reference to an externally-registered validator/predicate.
    BuiltinValidator {
        builtin: BuiltinRef,
        args: Vec<Value>,
    },
    /// Multiple values AND-ed together that have not yet collapsed to a
    /// single representative value (the unifier collapses these as it
    /// drains conjuncts; a `Conjunction` surviving to the end means the
    /// constraints are still only partially resolved, e.g. a bound with no
    /// concrete scalar yet).
    Conjunction(Vec<Value>),
    /// Multiple alternatives OR-ed together, with the number of
    /// explicitly-marked (`*`) defaults recorded for the default-selection
    /// algebra.
    Disjunction { values: Vec<Value>, num_defaults: usize },
    /// A reference to a vertex in the evaluation graph: either the value
    /// *is* that vertex's evaluated shape (struct/list), or a conjunct
    /// whose value needs to be merged arc-wise into the current vertex.
    Vertex(VertexId),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String {
            value: s.into(),
            compiled_regex: None,
        }
    }

    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Value::Bytes {
            value: b.into(),
            compiled_regex: None,
        }
    }

    pub fn int(v: i64) -> Self {
        Value::Num(Num::int_i64(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Num(Num::float(v))
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Value::Bottom(_))
    }

    pub fn as_bottom(&self) -> Option<&Bottom> {
        match self {
            Value::Bottom(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Value::Top)
    }

    /// The `Kind` bitmask this value occupies. Constraint/type values
    /// report the kind(s) they *admit*, not a single concrete kind.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::NULL,
            Value::Bool(_) => Kind::BOOL,
            Value::Num(n) => match n.kind {
                NumKind::Int => Kind::INT,
                NumKind::Float => Kind::FLOAT,
            },
            Value::String { .. } => Kind::STRING,
            Value::Bytes { .. } => Kind::BYTES,
            Value::Top => Kind::ANY,
            Value::Bottom(_) => Kind::NONE,
            Value::BasicType(k) => *k,
            Value::BoundValue { rhs, .. } => rhs.kind(),
            Value::BuiltinValidator { .. } => Kind::ANY,
            Value::Conjunction(vs) => vs.iter().fold(Kind::ANY, |acc, v| acc.intersection(v.kind())),
            Value::Disjunction { values, .. } => {
                values.iter().fold(Kind::NONE, |acc, v| acc.union(v.kind()))
            }
            Value::Vertex(_) => Kind::STRUCT | Kind::LIST,
        }
    }

    /// Structural equality used for disjunct deduplication and the
    /// `==`/`!=` scalar comparisons in `BinOp`. Does *not* attempt
    /// semantic unification-equivalence for non-scalar shapes; those are
    /// compared by the unifier via vertex identity instead.
    pub fn struct_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::String { value: a, .. }, Value::String { value: b, .. }) => a == b,
            (Value::Bytes { value: a, .. }, Value::Bytes { value: b, .. }) => a == b,
            (Value::Top, Value::Top) => true,
            (Value::BasicType(a), Value::BasicType(b)) => a == b,
            (
                Value::BoundValue { op: a_op, rhs: a_rhs },
                Value::BoundValue { op: b_op, rhs: b_rhs },
            ) => a_op == b_op && a_rhs.struct_eq(b_rhs),
            (Value::Conjunction(a), Value::Conjunction(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.struct_eq(y))
            }
            (
                Value::Disjunction { values: a, num_defaults: ad },
                Value::Disjunction { values: b, num_defaults: bd },
            ) => ad == bd && a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.struct_eq(y)),
            (Value::Vertex(a), Value::Vertex(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.struct_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Num(n) => write!(f, "{n}"),
            Value::String { value, .. } => write!(f, "{value:?}"),
            Value::Bytes { value, .. } => write!(f, "'{}'", String::from_utf8_lossy(value)),
            Value::Top => write!(f, "_"),
            Value::Bottom(b) => write!(f, "_|_({b})"),
            Value::BasicType(k) => write!(f, "{k}"),
            Value::BoundValue { op, rhs } => write!(f, "{op}{rhs}"),
            Value::BuiltinValidator { builtin, .. } => write!(f, "{}.{}(...)", builtin.package, builtin.name),
            Value::Conjunction(vs) => {
                write!(f, "{}", vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" & "))
            }
            Value::Disjunction { values, .. } => {
                write!(f, "{}", values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" | "))
            }
            Value::Vertex(id) => write!(f, "<vertex {}>", id.as_u32()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_and_float_kinds() {
        assert_eq!(Value::int(3).kind(), Kind::INT);
        assert_eq!(Value::float(3.0).kind(), Kind::FLOAT);
    }

    #[test]
    fn struct_eq_matches_equal_scalars() {
        assert!(Value::int(4).struct_eq(&Value::int(4)));
        assert!(!Value::int(4).struct_eq(&Value::int(5)));
    }

    #[test]
    fn bottom_is_never_top() {
        let b = Value::Bottom(Bottom::eval(crate::error::Pos::NONE, "x"));
        assert!(!b.is_top());
        assert!(b.is_bottom());
    }

    #[test]
    fn disjunction_kind_is_union_of_branches() {
        let d = Value::Disjunction {
            values: vec![Value::int(1), Value::string("a")],
            num_defaults: 0,
        };
        assert!(d.kind().contains(Kind::INT));
        assert!(d.kind().contains(Kind::STRING));
    }
}
