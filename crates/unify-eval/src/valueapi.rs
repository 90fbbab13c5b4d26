//! Value projection: a read-only view over a finalized vertex for
//! external consumers (formatters, language bindings). Everything here
//! borrows the arenas the evaluator already built; there is no separate
//! output tree to construct.

use unify_core::{Bottom, Feature, Interner, Kind, Pos, Value, VertexArena, VertexId};

/// A projected operator, for [`ValueRef::expr`]'s introspection of a value
/// that has not yet collapsed to a single representative (a disjunction or
/// an un-drained conjunction).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op {
    And,
    Or,
}

/// Which arcs [`ValueRef::fields`] includes. Mirrors the label-kind bits on
/// `Feature`: regular fields are always included; hidden and definition
/// labels are opt-in, matching CUE's default iteration (`_foo` and `#Def`
/// fields don't show up in a plain "print my struct" walk).
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldOptions {
    pub include_hidden: bool,
    pub include_definitions: bool,
}

impl FieldOptions {
    pub fn all() -> Self {
        FieldOptions {
            include_hidden: true,
            include_definitions: true,
        }
    }

    fn admits(&self, label: Feature) -> bool {
        (self.include_hidden || !label.is_hidden()) && (self.include_definitions || !label.is_def())
    }
}

/// A read-only handle onto one vertex's settled value ("value
/// projection"). Cheap to copy; every accessor borrows from the same
/// arenas rather than cloning the graph.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    vertices: &'a VertexArena,
    interner: &'a Interner,
    vertex: VertexId,
}

impl<'a> ValueRef<'a> {
    pub fn new(vertices: &'a VertexArena, interner: &'a Interner, vertex: VertexId) -> Self {
        ValueRef { vertices, interner, vertex }
    }

    fn raw(&self) -> Value {
        self.vertices.get(self.vertex).value.clone().unwrap_or(Value::Top)
    }

    fn child(&self, id: VertexId) -> ValueRef<'a> {
        ValueRef::new(self.vertices, self.interner, id)
    }

    pub fn kind(&self) -> Kind {
        let own = self.raw().kind();
        if self.vertices.get(self.vertex).arcs.is_empty() {
            own
        } else {
            // A vertex with arcs is struct- or list-shaped regardless of
            // what scalar companion value it settled on.
            own | Kind::STRUCT | Kind::LIST
        }
    }

    /// Looks up a string-labeled arc by name.
    pub fn lookup(&self, name: &str) -> Option<ValueRef<'a>> {
        self.vertices.get(self.vertex).arcs.iter().find_map(|(label, child)| {
            let sym = label.as_symbol()?;
            (self.interner.try_resolve(sym) == Some(name)).then(|| self.child(*child))
        })
    }

    /// Iterates list elements in index order. Empty for a non-list vertex.
    pub fn list(&self) -> impl Iterator<Item = ValueRef<'a>> + 'a {
        let mut entries: Vec<(u32, VertexId)> = self
            .vertices
            .get(self.vertex)
            .arcs
            .iter()
            .filter_map(|(label, child)| label.as_int_index().map(|i| (i, *child)))
            .collect();
        entries.sort_by_key(|(i, _)| *i);
        let vertices = self.vertices;
        let interner = self.interner;
        entries.into_iter().map(move |(_, id)| ValueRef::new(vertices, interner, id))
    }

    /// Iterates struct fields in declaration order, filtered by `opts`.
    pub fn fields(&self, opts: FieldOptions) -> impl Iterator<Item = (String, ValueRef<'a>)> + 'a {
        let vertices = self.vertices;
        let interner = self.interner;
        let entries: Vec<(Feature, VertexId)> = self
            .vertices
            .get(self.vertex)
            .arcs
            .iter()
            .filter(|(label, _)| label.is_string() && opts.admits(**label))
            .map(|(label, child)| (*label, *child))
            .collect();
        entries.into_iter().filter_map(move |(label, id)| {
            let sym = label.as_symbol()?;
            let name = interner.try_resolve(sym)?.to_string();
            Some((name, ValueRef::new(vertices, interner, id)))
        })
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.raw() {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn int64(&self) -> Option<i64> {
        use num_traits::ToPrimitive;
        match self.raw() {
            Value::Num(n) => n.as_bigint().and_then(|b| b.to_i64()),
            _ => None,
        }
    }

    pub fn float64(&self) -> Option<f64> {
        match self.raw() {
            Value::Num(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn string_value(&self) -> Option<String> {
        match self.raw() {
            Value::String { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn bytes_value(&self) -> Option<Vec<u8>> {
        match self.raw() {
            Value::Bytes { value, .. } => Some(value),
            _ => None,
        }
    }

    /// `(default, has_default)` per the default-selection algebra: a
    /// disjunction with surviving defaults reports the defaulted subset
    /// collapsed the same way `&` against a concrete value would: if only
    /// one default survives it is reported standalone, otherwise as a
    /// narrower disjunction of just the defaults.
    pub fn default(&self) -> (Value, bool) {
        match self.raw() {
            Value::Disjunction { values, num_defaults } if num_defaults > 0 => {
                let defaults: Vec<Value> = values.into_iter().take(num_defaults).collect();
                let v = if defaults.len() == 1 {
                    defaults.into_iter().next().unwrap()
                } else {
                    Value::Disjunction { values: defaults, num_defaults: 0 }
                };
                (v, true)
            }
            other => (other, false),
        }
    }

    /// `(Op, operands)` for a value that has not collapsed to a single
    /// representative: `Or` for a surviving disjunction, `And` for an
    /// undrained conjunction. `None` once the value is a plain scalar,
    /// bound, or struct/list shape.
    pub fn expr(&self) -> Option<(Op, Vec<Value>)> {
        match self.raw() {
            Value::Disjunction { values, .. } => Some((Op::Or, values)),
            Value::Conjunction(values) => Some((Op::And, values)),
            _ => None,
        }
    }

    /// `(instance, path)` for a value that is itself a resolved reference.
    /// Always `None`: once a `FieldReference`/`LetReference` conjunct
    /// drains, `merge_vertex_into` grafts the target's shape directly onto
    /// the referencing vertex and the originating reference expression is
    /// gone — there is nothing left here to point back at it. A caller
    /// that needs reference provenance must capture it before evaluation
    /// (from the compiled ADT) rather than after.
    pub fn reference(&self) -> Option<(VertexId, Vec<Feature>)> {
        None
    }

    /// Source position for this value's settled error, if any. Concrete
    /// scalars don't carry a position of their own once unified (`Value`
    /// has no position field); only a `Bottom` does.
    pub fn pos(&self) -> Pos {
        match self.raw() {
            Value::Bottom(b) => b.chain().first().map(|e| e.pos).unwrap_or(Pos::NONE),
            _ => Pos::NONE,
        }
    }

    /// The settled error, if this value is `Bottom`.
    pub fn err(&self) -> Option<Bottom> {
        self.raw().as_bottom().cloned()
    }
}
