//! `BinOp`: every scalar/list/string/bytes operator except `&` and
//! `|`, which the unifier and disjunction driver own directly.
//!
//! Preconditions: both operands are concrete. The caller (`OpContext::
//! evaluate`) is responsible for checking concreteness first and marking
//! the conjunct incomplete instead of calling in; this module only ever
//! sees values it can act on immediately.

use unify_core::{BinaryOp, Bottom, Feature, Num, NumKind, Pos, Value, VertexArena, VertexId};

/// A binary operator applied to two concrete values either produces a
/// value, or fails outright (division by zero, mismatched kinds).
pub fn apply(
    op: BinaryOp,
    lhs: &Value,
    rhs: &Value,
    vertices: &mut VertexArena,
    pos: Pos,
) -> Result<Value, Bottom> {
    use BinaryOp::*;
    match op {
        Unify | Disjoin => {
            unreachable!("`&`/`|` are handled by the unifier and disjunction driver, not BinOp")
        }
        Eq => Ok(Value::Bool(values_eq(lhs, rhs, vertices))),
        Neq => Ok(Value::Bool(!values_eq(lhs, rhs, vertices))),
        Lt | Le | Gt | Ge => compare(op, lhs, rhs, pos),
        And => Ok(Value::Bool(as_bool(lhs, pos)? && as_bool(rhs, pos)?)),
        Or => Ok(Value::Bool(as_bool(lhs, pos)? || as_bool(rhs, pos)?)),
        Matches | NotMatches => regex_match(op, lhs, rhs, pos),
        Add => add(lhs, rhs, vertices, pos),
        Sub => numeric(lhs, rhs, pos, |a, b| a - b, |a, b| a - b),
        Mul => mul(lhs, rhs, vertices, pos),
        Div => {
            let a = as_f64(lhs, pos)?;
            let b = as_f64(rhs, pos)?;
            if b == 0.0 {
                return Err(Bottom::eval(pos, "division by zero"));
            }
            Ok(Value::float(a / b))
        }
        IntDiv | IntMod | IntQuo | IntRem => int_divmod(op, lhs, rhs, pos),
    }
}

fn values_eq(a: &Value, b: &Value, vertices: &VertexArena) -> bool {
    match (a, b) {
        (Value::Vertex(va), Value::Vertex(vb)) => vertex_eq(*va, *vb, vertices),
        _ => a.struct_eq(b),
    }
}

fn vertex_eq(a: VertexId, b: VertexId, vertices: &VertexArena) -> bool {
    let (va, vb) = (vertices.get(a), vertices.get(b));
    if va.arcs.len() != vb.arcs.len() {
        return false;
    }
    va.arcs.iter().zip(vb.arcs.iter()).all(|((la, ca), (lb, cb))| {
        la == lb
            && match (&vertices.get(*ca).value, &vertices.get(*cb).value) {
                (Some(x), Some(y)) => values_eq(x, y, vertices),
                _ => false,
            }
    })
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value, pos: Pos) -> Result<Value, Bottom> {
    use std::cmp::Ordering;
    let ord = match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
        (Value::String { value: a, .. }, Value::String { value: b, .. }) => Some(a.cmp(b)),
        (Value::Bytes { value: a, .. }, Value::Bytes { value: b, .. }) => Some(a.cmp(b)),
        _ => None,
    };
    let Some(ord) = ord else {
        return Err(Bottom::eval(pos, "incomparable operands"));
    };
    let result = match op {
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Le => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::Ge => ord != Ordering::Less,
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn regex_match(op: BinaryOp, lhs: &Value, rhs: &Value, pos: Pos) -> Result<Value, Bottom> {
    let (subject, pattern) = match (lhs, rhs) {
        (Value::String { value: s, .. }, Value::String { value: p, .. }) => (s.clone(), p.clone()),
        (Value::Bytes { value: s, .. }, Value::Bytes { value: p, .. }) => (
            String::from_utf8_lossy(s).into_owned(),
            String::from_utf8_lossy(p).into_owned(),
        ),
        _ => return Err(Bottom::eval(pos, "=~/!~ requires string or bytes operands")),
    };
    let re = regex::Regex::new(&pattern).map_err(|e| Bottom::eval(pos, format!("bad regex: {e}")))?;
    let matched = re.is_match(&subject);
    Ok(Value::Bool(match op {
        BinaryOp::Matches => matched,
        BinaryOp::NotMatches => !matched,
        _ => unreachable!(),
    }))
}

fn as_bool(v: &Value, pos: Pos) -> Result<bool, Bottom> {
    match v {
        Value::Bool(b) => Ok(*b),
        _ => Err(Bottom::eval(pos, "expected bool operand")),
    }
}

fn as_f64(v: &Value, pos: Pos) -> Result<f64, Bottom> {
    match v {
        Value::Num(n) => Ok(n.as_f64()),
        _ => Err(Bottom::eval(pos, "expected numeric operand")),
    }
}

fn numeric(
    lhs: &Value,
    rhs: &Value,
    pos: Pos,
    f_int: impl Fn(&num_bigint::BigInt, &num_bigint::BigInt) -> num_bigint::BigInt,
    f_float: impl Fn(f64, f64) -> f64,
) -> Result<Value, Bottom> {
    let (Value::Num(a), Value::Num(b)) = (lhs, rhs) else {
        return Err(Bottom::eval(pos, "mixed-kind arithmetic"));
    };
    if a.kind == NumKind::Int && b.kind == NumKind::Int {
        let (Some(x), Some(y)) = (a.as_bigint(), b.as_bigint()) else {
            return Err(Bottom::eval(pos, "missing integer payload"));
        };
        Ok(Value::Num(Num::int(f_int(x, y))))
    } else {
        Ok(Value::float(f_float(a.as_f64(), b.as_f64())))
    }
}

fn add(lhs: &Value, rhs: &Value, vertices: &mut VertexArena, pos: Pos) -> Result<Value, Bottom> {
    match (lhs, rhs) {
        (Value::Num(_), Value::Num(_)) => numeric(lhs, rhs, pos, |a, b| a + b, |a, b| a + b),
        (Value::String { value: a, .. }, Value::String { value: b, .. }) => {
            Ok(Value::string(format!("{a}{b}")))
        }
        (Value::Bytes { value: a, .. }, Value::Bytes { value: b, .. }) => {
            let mut out = a.clone();
            out.extend_from_slice(b);
            Ok(Value::bytes(out))
        }
        (Value::Vertex(a), Value::Vertex(b)) if is_list(*a, vertices) && is_list(*b, vertices) => {
            let elems = list_elems(*a, vertices)
                .into_iter()
                .chain(list_elems(*b, vertices))
                .collect();
            Ok(Value::Vertex(build_list(elems, vertices)))
        }
        _ => Err(Bottom::eval(pos, "mixed-kind `+` operands")),
    }
}

fn mul(lhs: &Value, rhs: &Value, vertices: &mut VertexArena, pos: Pos) -> Result<Value, Bottom> {
    if let (Value::Num(_), Value::Num(_)) = (lhs, rhs) {
        return numeric(lhs, rhs, pos, |a, b| a * b, |a, b| a * b);
    }
    // `*` also repeats a string/bytes/list by an integer factor on either
    // side.
    let (factor, other) = match (lhs, rhs) {
        (Value::Num(n), other) if n.kind == NumKind::Int => (n, other),
        (other, Value::Num(n)) if n.kind == NumKind::Int => (n, other),
        _ => return Err(Bottom::eval(pos, "`*` requires a numeric factor")),
    };
    let count: i64 = factor
        .as_bigint()
        .and_then(|b| {
            use num_traits::ToPrimitive;
            b.to_i64()
        })
        .ok_or_else(|| Bottom::eval(pos, "repeat factor out of range"))?;
    if count < 0 {
        return Err(Bottom::eval(pos, "negative repeat factor"));
    }
    match other {
        Value::String { value, .. } => Ok(Value::string(value.repeat(count as usize))),
        Value::Bytes { value, .. } => Ok(Value::bytes(value.repeat(count as usize))),
        Value::Vertex(id) if is_list(*id, vertices) => {
            let base = list_elems(*id, vertices);
            let mut elems = Vec::with_capacity(base.len() * count as usize);
            for _ in 0..count {
                elems.extend(base.iter().cloned());
            }
            Ok(Value::Vertex(build_list(elems, vertices)))
        }
        _ => Err(Bottom::eval(pos, "`*` requires a string, bytes, or list operand")),
    }
}

fn int_divmod(op: BinaryOp, lhs: &Value, rhs: &Value, pos: Pos) -> Result<Value, Bottom> {
    let (Value::Num(a), Value::Num(b)) = (lhs, rhs) else {
        return Err(Bottom::eval(pos, "div/mod/quo/rem require integers"));
    };
    if a.kind != NumKind::Int || b.kind != NumKind::Int {
        return Err(Bottom::eval(pos, "div/mod/quo/rem require integers"));
    }
    let (Some(x), Some(y)) = (a.as_bigint(), b.as_bigint()) else {
        return Err(Bottom::eval(pos, "missing integer payload"));
    };
    if y.sign() == num_bigint::Sign::NoSign {
        return Err(Bottom::eval(pos, "division by zero"));
    }
    let result = match op {
        // Euclidean division/modulus: remainder always non-negative.
        BinaryOp::IntDiv => euclid_div(x, y),
        BinaryOp::IntMod => euclid_mod(x, y),
        // Truncated division/remainder: sign follows the dividend.
        BinaryOp::IntQuo => x / y,
        BinaryOp::IntRem => x % y,
        _ => unreachable!(),
    };
    Ok(Value::Num(Num::int(result)))
}

fn euclid_div(a: &num_bigint::BigInt, b: &num_bigint::BigInt) -> num_bigint::BigInt {
    let q = a / b;
    let r = a - &q * b;
    if r.sign() == num_bigint::Sign::Minus {
        if b.sign() == num_bigint::Sign::Plus {
            q - 1
        } else {
            q + 1
        }
    } else {
        q
    }
}

fn euclid_mod(a: &num_bigint::BigInt, b: &num_bigint::BigInt) -> num_bigint::BigInt {
    let r = a % b;
    if r.sign() == num_bigint::Sign::Minus {
        if b.sign() == num_bigint::Sign::Plus {
            r + b
        } else {
            r - b
        }
    } else {
        r
    }
}

fn is_list(id: VertexId, vertices: &VertexArena) -> bool {
    vertices.get(id).arcs.keys().all(|f| f.is_int()) || vertices.get(id).arcs.is_empty()
}

fn list_elems(id: VertexId, vertices: &VertexArena) -> Vec<Value> {
    vertices
        .get(id)
        .arcs
        .values()
        .map(|child| {
            vertices
                .get(*child)
                .value
                .clone()
                .unwrap_or(Value::Top)
        })
        .collect()
}

fn build_list(elems: Vec<Value>, vertices: &mut VertexArena) -> VertexId {
    let root = vertices.alloc_root();
    for (i, v) in elems.into_iter().enumerate() {
        let label = Feature::int_label(i as u32);
        let child = vertices.arc_or_insert(root, label);
        vertices.get_mut(child).value = Some(v);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use unify_core::Pos;

    #[test]
    fn int_add() {
        let mut vertices = VertexArena::new();
        let r = apply(BinaryOp::Add, &Value::int(2), &Value::int(3), &mut vertices, Pos::NONE).unwrap();
        assert!(matches!(r, Value::Num(n) if n == Num::int_i64(5)));
    }

    #[test]
    fn division_by_zero_is_eval_error() {
        let mut vertices = VertexArena::new();
        let err = apply(BinaryOp::Div, &Value::int(1), &Value::int(0), &mut vertices, Pos::NONE);
        assert!(err.is_err());
    }

    #[test]
    fn string_concat() {
        let mut vertices = VertexArena::new();
        let r = apply(
            BinaryOp::Add,
            &Value::string("a"),
            &Value::string("b"),
            &mut vertices,
            Pos::NONE,
        )
        .unwrap();
        assert!(matches!(r, Value::String { value, .. } if value == "ab"));
    }

    #[test]
    fn int_mod_is_euclidean() {
        let mut vertices = VertexArena::new();
        let r = apply(BinaryOp::IntMod, &Value::int(-7), &Value::int(3), &mut vertices, Pos::NONE)
            .unwrap();
        assert!(matches!(r, Value::Num(n) if n == Num::int_i64(2)));
    }

    #[test]
    fn int_rem_follows_dividend_sign() {
        let mut vertices = VertexArena::new();
        let r = apply(BinaryOp::IntRem, &Value::int(-7), &Value::int(3), &mut vertices, Pos::NONE)
            .unwrap();
        assert!(matches!(r, Value::Num(n) if n == Num::int_i64(-1)));
    }

    #[test]
    fn mul_repeats_string() {
        let mut vertices = VertexArena::new();
        let r = apply(BinaryOp::Mul, &Value::int(3), &Value::string("ab"), &mut vertices, Pos::NONE)
            .unwrap();
        assert!(matches!(r, Value::String { value, .. } if value == "ababab"));
    }
}
