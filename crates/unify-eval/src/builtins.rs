//! A small illustrative builtin registry (`SPEC_FULL.md`'s "Builtin
//! registry shape"): just enough pure builtins to exercise
//! `OpContext::call_builtin`'s dispatch and argument-kind checking in
//! tests. A full standard library is out of scope; a host embedding the
//! evaluator for real is expected to supply its own [`BuiltinRegistry`].

use unify_core::{Bottom, Kind, Num, Pos, Value};

use crate::opctx::{Builtin, BuiltinRegistry};

/// `len(x)`: string length in bytes, list length in elements.
fn len(args: &[Value]) -> Result<Value, Bottom> {
    match &args[0] {
        Value::String { value, .. } => Ok(Value::int(value.len() as i64)),
        Value::Bytes { value, .. } => Ok(Value::int(value.len() as i64)),
        other => Err(Bottom::eval(Pos::NONE, format!("len: unsupported operand {other}"))),
    }
}

/// `strings.ToUpper(s)`.
fn to_upper(args: &[Value]) -> Result<Value, Bottom> {
    match &args[0] {
        Value::String { value, .. } => Ok(Value::string(value.to_uppercase())),
        other => Err(Bottom::eval(Pos::NONE, format!("strings.ToUpper: unsupported operand {other}"))),
    }
}

/// `math.Abs(n)`.
fn abs(args: &[Value]) -> Result<Value, Bottom> {
    use num_traits::Signed;
    use unify_core::NumKind;
    match &args[0] {
        Value::Num(n) => match n.kind {
            NumKind::Int => Ok(Value::Num(Num::int(n.as_bigint().cloned().unwrap_or_default().abs()))),
            NumKind::Float => Ok(Value::Num(Num::float(n.as_f64().abs()))),
        },
        other => Err(Bottom::eval(Pos::NONE, format!("math.Abs: unsupported operand {other}"))),
    }
}

/// A fixed, read-only table of the builtins above. `lookup` is a linear
/// scan over three entries; not worth a `HashMap` at this size.
pub struct StdBuiltins {
    entries: Vec<((&'static str, &'static str), Builtin)>,
}

impl Default for StdBuiltins {
    fn default() -> Self {
        StdBuiltins {
            entries: vec![
                (
                    ("", "len"),
                    Builtin {
                        params: vec![Kind::STRING | Kind::BYTES],
                        result: Kind::INT,
                        func: len,
                    },
                ),
                (
                    ("strings", "ToUpper"),
                    Builtin {
                        params: vec![Kind::STRING],
                        result: Kind::STRING,
                        func: to_upper,
                    },
                ),
                (
                    ("math", "Abs"),
                    Builtin {
                        params: vec![Kind::NUMBER],
                        result: Kind::NUMBER,
                        func: abs,
                    },
                ),
            ],
        }
    }
}

impl BuiltinRegistry for StdBuiltins {
    fn lookup(&self, package: &str, name: &str) -> Option<&Builtin> {
        self.entries
            .iter()
            .find(|((p, n), _)| *p == package && *n == name)
            .map(|(_, b)| b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_reports_byte_length() {
        assert_eq!(len(&[Value::string("hi")]).unwrap().kind(), Kind::INT);
    }

    #[test]
    fn to_upper_uppercases() {
        let Value::String { value, .. } = to_upper(&[Value::string("ok")]).unwrap() else {
            panic!("expected string");
        };
        assert_eq!(value, "OK");
    }

    #[test]
    fn registry_looks_up_by_package_and_name() {
        let registry = StdBuiltins::default();
        assert!(registry.lookup("strings", "ToUpper").is_some());
        assert!(registry.lookup("strings", "nope").is_none());
    }
}
