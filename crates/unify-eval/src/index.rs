//! `__index`/`__slice`: the internal pseudo-builtins `unify-compile`
//! compiles `IndexExpr`/`SliceExpr` into (`BinOp` table has no
//! index/slice operator; see `DESIGN.md`). Kept separate from `binop.rs`
//! since these operate on lists/structs by walking `VertexArena` arcs
//! rather than combining two scalar `Value`s.

use unify_core::{Bottom, Feature, Interner, Pos, Value, VertexArena, VertexId};

pub fn index(
    args: &[Value],
    vertices: &mut VertexArena,
    interner: &Interner,
    pos: Pos,
) -> Result<Value, Bottom> {
    let [base, idx] = args else {
        return Err(Bottom::eval(pos, "__index expects 2 arguments"));
    };
    match (base, idx) {
        (Value::Vertex(id), Value::Num(n)) => {
            let i = int_index(n, pos)?;
            let child = vertices
                .get(*id)
                .arcs
                .get(&Feature::int_label(i as u32))
                .copied()
                .ok_or_else(|| Bottom::eval(pos, format!("index {i} out of range")))?;
            Ok(vertices.get(child).value.clone().unwrap_or(Value::Top))
        }
        (Value::Vertex(id), Value::String { value: key, .. }) => {
            let child = find_string_arc(*id, key, vertices, interner)
                .ok_or_else(|| Bottom::eval(pos, format!("no field {key:?}")))?;
            Ok(vertices.get(child).value.clone().unwrap_or(Value::Top))
        }
        (Value::String { value, .. }, Value::Num(n)) => {
            let i = int_index(n, pos)? as usize;
            let byte = value
                .as_bytes()
                .get(i)
                .ok_or_else(|| Bottom::eval(pos, format!("index {i} out of range")))?;
            Ok(Value::int(*byte as i64))
        }
        (Value::Bytes { value, .. }, Value::Num(n)) => {
            let i = int_index(n, pos)? as usize;
            let byte = value
                .get(i)
                .ok_or_else(|| Bottom::eval(pos, format!("index {i} out of range")))?;
            Ok(Value::int(*byte as i64))
        }
        _ => Err(Bottom::eval(pos, "index operand is not a list, struct, string, or bytes")),
    }
}

pub fn slice(args: &[Value], vertices: &mut VertexArena, pos: Pos) -> Result<Value, Bottom> {
    let [base, lo, hi] = args else {
        return Err(Bottom::eval(pos, "__slice expects 3 arguments"));
    };
    match base {
        Value::Vertex(id) => {
            let elems = list_values(*id, vertices);
            let (lo, hi) = bounds(lo, hi, elems.len(), pos)?;
            let sliced = elems
                .get(lo..hi)
                .ok_or_else(|| Bottom::eval(pos, "slice bounds out of range"))?
                .to_vec();
            Ok(Value::Vertex(build_list(sliced, vertices)))
        }
        Value::String { value, .. } => {
            let (lo, hi) = bounds(lo, hi, value.len(), pos)?;
            let sliced = value
                .get(lo..hi)
                .ok_or_else(|| Bottom::eval(pos, "slice bounds out of range"))?;
            Ok(Value::string(sliced))
        }
        Value::Bytes { value, .. } => {
            let (lo, hi) = bounds(lo, hi, value.len(), pos)?;
            let sliced = value
                .get(lo..hi)
                .ok_or_else(|| Bottom::eval(pos, "slice bounds out of range"))?;
            Ok(Value::bytes(sliced.to_vec()))
        }
        _ => Err(Bottom::eval(pos, "slice operand is not a list, string, or bytes")),
    }
}

fn int_index(n: &unify_core::Num, pos: Pos) -> Result<i64, Bottom> {
    use num_traits::ToPrimitive;
    n.as_bigint()
        .and_then(|b| b.to_i64())
        .ok_or_else(|| Bottom::eval(pos, "index is not an integer"))
}

fn bounds(lo: &Value, hi: &Value, len: usize, pos: Pos) -> Result<(usize, usize), Bottom> {
    let lo = match lo {
        Value::Null => 0,
        Value::Num(n) => int_index(n, pos)? as usize,
        _ => return Err(Bottom::eval(pos, "slice bound is not an integer")),
    };
    let hi = match hi {
        Value::Null => len,
        Value::Num(n) => int_index(n, pos)? as usize,
        _ => return Err(Bottom::eval(pos, "slice bound is not an integer")),
    };
    if lo > hi || hi > len {
        return Err(Bottom::eval(pos, "slice bounds out of range"));
    }
    Ok((lo, hi))
}

fn find_string_arc(id: VertexId, key: &str, vertices: &VertexArena, interner: &Interner) -> Option<VertexId> {
    vertices.get(id).arcs.iter().find_map(|(label, child)| {
        let sym = label.as_symbol()?;
        (interner.try_resolve(sym) == Some(key)).then_some(*child)
    })
}

fn list_values(id: VertexId, vertices: &VertexArena) -> Vec<Value> {
    let mut entries: Vec<(u32, Value)> = vertices
        .get(id)
        .arcs
        .iter()
        .filter_map(|(label, child)| {
            label
                .as_int_index()
                .map(|i| (i, vertices.get(*child).value.clone().unwrap_or(Value::Top)))
        })
        .collect();
    entries.sort_by_key(|(i, _)| *i);
    entries.into_iter().map(|(_, v)| v).collect()
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
