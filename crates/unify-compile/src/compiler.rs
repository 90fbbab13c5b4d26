//! Walks a package's parse trees into the ADT.
//!
//! One `Compiler` handles one package compile: it owns the string interner,
//! the scope stack, and the predeclared-name table, and produces a root
//! vertex whose conjuncts are one `(nil env, StructLit)` per input file.

use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use num_bigint::BigInt;

use unify_core::{
    BinaryOp, BoundOp, ComprehensionBody as AdtComprehensionBody, Decl as AdtDecl, Elem as AdtElem,
    EnvArena, EnvId, Expr as AdtExpr, Feature, Interner, InterpPart, Kind, ListLit, Matcher,
    StructLit as AdtStructLit, UnaryOp, Value, VertexArena, VertexId, Yielder,
};

use crate::error::{CompileError, CompileResult};
use crate::parsetree::{
    BinOpToken, Clause, Comprehension, ComprehensionBody, Decl, Elem, Expr, File, IdentRef,
    InterpSegment, Label, LabelText, Lit, NodeId, UnaryOpToken,
};
use crate::scope::{ScopeKind, ScopeStack};

/// Output of compiling one package: the root vertex plus the arenas and
/// interner that own everything the evaluator will need to keep allocating
/// into as unification proceeds.
pub struct CompileOutput {
    pub root: VertexId,
    pub root_env: EnvId,
    pub vertices: VertexArena,
    pub envs: EnvArena,
    pub interner: Interner,
}

pub struct Compiler {
    interner: Interner,
    scopes: ScopeStack,
    predeclared: HashMap<&'static str, Value>,
    next_node_id: NodeId,
}

impl Compiler {
    pub fn new() -> Self {
        let mut predeclared = HashMap::new();
        predeclared.insert("null", Value::Null);
        predeclared.insert("bool", Value::BasicType(Kind::BOOL));
        predeclared.insert("int", Value::BasicType(Kind::INT));
        predeclared.insert("float", Value::BasicType(Kind::FLOAT));
        predeclared.insert("number", Value::BasicType(Kind::NUMBER));
        predeclared.insert("string", Value::BasicType(Kind::STRING));
        predeclared.insert("bytes", Value::BasicType(Kind::BYTES));
        predeclared.insert("_", Value::Top);
        predeclared.insert(
            "_|_",
            Value::Bottom(unify_core::Bottom::eval(
                unify_core::Pos::NONE,
                "explicit bottom",
            )),
        );
        Compiler {
            interner: Interner::new(),
            scopes: ScopeStack::new(),
            predeclared,
            next_node_id: u32::MAX, // synthetic ids for nodes the parse tree doesn't name
        }
    }

    /// Compile every file of one package into a single root vertex.
    pub fn compile_package(mut self, files: &[File]) -> CompileResult<CompileOutput> {
        let mut vertices = VertexArena::new();
        let mut envs = EnvArena::new();
        let root = vertices.alloc_root();
        let root_env = envs.root(root);

        for file in files {
            let depth_before = self.scopes.depth();
            for import in &file.imports {
                self.scopes.push(
                    import.node_id,
                    ScopeKind::Import { path: import.path.clone() },
                );
            }
            self.scopes.push(file.node_id, ScopeKind::Fields);
            let decls = file
                .decls
                .iter()
                .map(|d| self.compile_decl(d))
                .collect::<CompileResult<Vec<_>>>();
            self.scopes.truncate(depth_before);
            let decls = decls?;
            let is_definition = struct_embeds_definition(&file.decls);
            let struct_lit = Rc::new(AdtStructLit { decls, is_definition });
            let expr = Rc::new(AdtExpr::StructLit(struct_lit));
            vertices
                .get_mut(root)
                .conjuncts
                .push(unify_core::Conjunct::new(root_env, expr));
        }

        Ok(CompileOutput {
            root,
            root_env,
            vertices,
            envs,
            interner: self.interner,
        })
    }

    fn fresh_node_id(&mut self) -> NodeId {
        self.next_node_id -= 1;
        self.next_node_id
    }

    // ---- expressions ----------------------------------------------------

    fn compile_expr(&mut self, e: &Expr) -> CompileResult<Rc<AdtExpr>> {
        let expr = match e {
            Expr::BasicLit(lit) => AdtExpr::Value(self.compile_lit(lit)?),
            Expr::Ident(ident) => return self.compile_ident(ident),
            Expr::StructLit(decls) => {
                let node_id = self.fresh_node_id();
                let depth_before = self.scopes.depth();
                self.scopes.push(node_id, ScopeKind::Fields);
                let compiled = decls
                    .iter()
                    .map(|d| self.compile_decl(d))
                    .collect::<CompileResult<Vec<_>>>();
                self.scopes.truncate(depth_before);
                let is_definition = struct_embeds_definition(decls);
                AdtExpr::StructLit(Rc::new(AdtStructLit { decls: compiled?, is_definition }))
            }
            Expr::ListLit(elems) => {
                let compiled = elems
                    .iter()
                    .map(|el| self.compile_elem(el))
                    .collect::<CompileResult<Vec<_>>>()?;
                AdtExpr::ListLit(Rc::new(ListLit { elems: compiled }))
            }
            Expr::Ellipsis(_) => {
                // A bare `...` only makes sense as a list/struct element,
                // never as a standalone expression; the caller routes
                // `Elem`/`Decl::Ellipsis` separately and never asks us to
                // compile this variant directly.
                return Err(CompileError::BadNode { pos: unify_core::Pos::NONE });
            }
            Expr::Binary { op, lhs, rhs, pos } => {
                let lhs = self.compile_expr(lhs)?;
                let rhs = self.compile_expr(rhs)?;
                match op {
                    BinOpToken::Unify => AdtExpr::Binary {
                        op: BinaryOp::Unify,
                        lhs,
                        rhs,
                    },
                    BinOpToken::Disjoin => {
                        // A raw `|` outside of a fully-formed disjunction
                        // (with default marks already attached by the
                        // parser) degrades to an unmarked two-way
                        // disjunction.
                        let _ = pos;
                        AdtExpr::Disjunction(vec![
                            unify_core::DisjunctTerm {
                                expr: lhs,
                                is_default: false,
                            },
                            unify_core::DisjunctTerm {
                                expr: rhs,
                                is_default: false,
                            },
                        ])
                    }
                    _ => AdtExpr::Binary {
                        op: map_binop(*op),
                        lhs,
                        rhs,
                    },
                }
            }
            Expr::Unary { op, operand, pos: _ } => {
                let operand = self.compile_expr(operand)?;
                match op {
                    UnaryOpToken::Neg => AdtExpr::Unary {
                        op: UnaryOp::Neg,
                        operand,
                    },
                    UnaryOpToken::Not => AdtExpr::Unary {
                        op: UnaryOp::Not,
                        operand,
                    },
                    UnaryOpToken::Plus => AdtExpr::Unary {
                        op: UnaryOp::Plus,
                        operand,
                    },
                }
            }
            Expr::Call { func, args, pos } => {
                let builtin = self.compile_builtin_ref(func, *pos)?;
                let args = args
                    .iter()
                    .map(|a| self.compile_expr(a))
                    .collect::<CompileResult<Vec<_>>>()?;
                AdtExpr::Call { builtin, args }
            }
            Expr::Selector { base, field, pos } => {
                // A bare `pkg.member` where `pkg` is an import alias is
                // handled by `compile_builtin_ref` when it appears in call
                // position; in value position it has no ADT representation
                // other than resolving as a call with no arguments, since
                // this core has no field-selector-on-struct-literal sugar
                // beyond a plain `FieldReference`.
                let _ = (base, field, pos);
                return Err(CompileError::BadNode { pos: *pos });
            }
            Expr::Index { base, index, pos: _ } => {
                let base = self.compile_expr(base)?;
                let index = self.compile_expr(index)?;
                AdtExpr::Call {
                    builtin: unify_core::BuiltinRef {
                        package: String::new(),
                        name: "__index".to_string(),
                    },
                    args: vec![base, index],
                }
            }
            Expr::Slice { base, lo, hi, pos: _ } => {
                let base = self.compile_expr(base)?;
                let lo = match lo {
                    Some(e) => self.compile_expr(e)?,
                    None => AdtExpr::value(Value::Null),
                };
                let hi = match hi {
                    Some(e) => self.compile_expr(e)?,
                    None => AdtExpr::value(Value::Null),
                };
                AdtExpr::Call {
                    builtin: unify_core::BuiltinRef {
                        package: String::new(),
                        name: "__slice".to_string(),
                    },
                    args: vec![base, lo, hi],
                }
            }
            Expr::Interpolation(segments) => {
                let parts = segments
                    .iter()
                    .map(|seg| match seg {
                        InterpSegment::Str(s) => Ok(InterpPart::Str(s.clone())),
                        InterpSegment::Expr(e) => Ok(InterpPart::Expr(self.compile_expr(e)?)),
                    })
                    .collect::<CompileResult<Vec<_>>>()?;
                AdtExpr::Interpolation(parts)
            }
            Expr::Comprehension(c) => AdtExpr::Comprehension(self.compile_comprehension(c)?),
            Expr::Alias { name, expr, node_id, pos } => {
                let compiled = self.compile_expr(expr)?;
                let label = self.definition_feature_for_alias(name);
                self.scopes.push(
                    *node_id,
                    ScopeKind::LetBinding { label },
                );
                let _ = pos;
                // The alias's own binding is visible to its right-hand
                // side's continuation, not to the expression just
                // compiled (CUE aliases do not see themselves); callers
                // that need the bound name in later siblings keep this
                // frame pushed after we return.
                AdtExpr::LetReference {
                    up_count: 0,
                    target: compiled,
                }
            }
            Expr::Bad(pos) => return Err(CompileError::BadNode { pos: *pos }),
        };
        Ok(Rc::new(expr))
    }

    fn definition_feature_for_alias(&mut self, name: &str) -> Feature {
        Feature::hidden_label(self.interner.intern(name))
    }

    fn compile_lit(&mut self, lit: &Lit) -> CompileResult<Value> {
        Ok(match lit {
            Lit::Null => Value::Null,
            Lit::Bool(b) => Value::Bool(*b),
            Lit::Int(text) => {
                let n = BigInt::from_str(text)
                    .map_err(|_| CompileError::IntLabelOutOfRange { pos: unify_core::Pos::NONE })?;
                Value::Num(unify_core::Num::int(n))
            }
            Lit::Float(f) => Value::float(*f),
            Lit::Str(s) => Value::string(s.clone()),
            Lit::Bytes(b) => Value::bytes(b.clone()),
        })
    }

    fn compile_ident(&mut self, ident: &IdentRef) -> CompileResult<Rc<AdtExpr>> {
        if let Some(v) = self.predeclared.get(ident.name.as_str()) {
            return Ok(Rc::new(AdtExpr::Value(v.clone())));
        }
        let Some(binder) = ident.binder else {
            return Err(CompileError::UnresolvedReference {
                name: ident.name.clone(),
                pos: ident.pos,
            });
        };
        let Some((up_count, kind)) = self.scopes.resolve(binder) else {
            return Err(CompileError::UnresolvedReference {
                name: ident.name.clone(),
                pos: ident.pos,
            });
        };
        let label = Feature::string_label(self.interner.intern(&ident.name));
        let expr = match kind {
            ScopeKind::Fields => AdtExpr::FieldReference { up_count, label },
            ScopeKind::ForBinding { key, value } => {
                if Some(label) == key {
                    AdtExpr::LabelReference { up_count }
                } else if label == value {
                    AdtExpr::FieldReference { up_count, label }
                } else {
                    AdtExpr::FieldReference { up_count, label }
                }
            }
            ScopeKind::LetBinding { .. } => AdtExpr::LetReference {
                up_count,
                target: AdtExpr::value(Value::Top),
            },
            ScopeKind::PatternBinding { .. } => AdtExpr::LabelReference { up_count },
            ScopeKind::Import { path } => {
                // Import bindings aren't reached by `UpCount` — the
                // referenced package is looked up by path through the
                // `ImportResolver`, not by walking the vertex graph.
                let _ = up_count;
                AdtExpr::ImportReference { path }
            }
        };
        Ok(Rc::new(expr))
    }

    fn compile_builtin_ref(
        &mut self,
        func: &Expr,
        pos: unify_core::Pos,
    ) -> CompileResult<unify_core::BuiltinRef> {
        match func {
            Expr::Selector { base, field, .. } => {
                if let Expr::Ident(pkg) = base.as_ref() {
                    return Ok(unify_core::BuiltinRef {
                        package: pkg.name.clone(),
                        name: field.clone(),
                    });
                }
                Err(CompileError::BadNode { pos })
            }
            Expr::Ident(ident) => Ok(unify_core::BuiltinRef {
                package: String::new(),
                name: ident.name.clone(),
            }),
            _ => Err(CompileError::BadNode { pos }),
        }
    }

    // ---- struct decls -----------------------------------------------------

    fn compile_decl(&mut self, d: &Decl) -> CompileResult<AdtDecl> {
        Ok(match d {
            Decl::Field {
                label,
                optional,
                value,
                pos,
            } => {
                // A pattern alias (`[X=pattern]: value`) is only in scope
                // for this field's own value expression, never for sibling
                // decls.
                let depth_before = self.scopes.depth();
                let (matcher_label, is_dynamic) = self.compile_label(label, *pos)?;
                let value = self.compile_expr(value);
                self.scopes.truncate(depth_before);
                let value = value?;
                if is_dynamic {
                    AdtDecl::DynamicField {
                        label_expr: matcher_as_expr(label, self)?,
                        value,
                    }
                } else if *optional {
                    let feature = matcher_label.expect("constant label");
                    let value = if feature.is_def() { mark_definition(value) } else { value };
                    AdtDecl::OptionalField { label: feature, value }
                } else {
                    let feature = matcher_label.expect("constant label");
                    // A definition field's value closes every struct literal
                    // ANDed directly into it.
                    let value = if feature.is_def() { mark_definition(value) } else { value };
                    AdtDecl::Field { label: feature, value }
                }
            }
            Decl::BulkOptional { label, value, pos } => {
                let depth_before = self.scopes.depth();
                let matcher = self.compile_matcher(label, *pos)?;
                let value = self.compile_expr(value);
                self.scopes.truncate(depth_before);
                AdtDecl::BulkOptionalField { matcher, value: value? }
            }
            Decl::Ellipsis(t) => {
                let t = t.as_ref().map(|e| self.compile_expr(e)).transpose()?;
                AdtDecl::Ellipsis(t)
            }
            Decl::Embed(e) => AdtDecl::Embed(self.compile_expr(e)?),
            Decl::LetClause {
                name,
                expr,
                node_id,
                pos: _,
            } => {
                let value = self.compile_expr(expr)?;
                let label = Feature::hidden_label(self.interner.intern(name));
                self.scopes.push(*node_id, ScopeKind::LetBinding { label });
                AdtDecl::LetClause { label, expr: value }
            }
            Decl::Alias {
                name,
                expr,
                node_id,
                pos: _,
            } => {
                let value = self.compile_expr(expr)?;
                let label = Feature::hidden_label(self.interner.intern(name));
                self.scopes.push(*node_id, ScopeKind::LetBinding { label });
                AdtDecl::LetClause { label, expr: value }
            }
            Decl::Comprehension(c) => AdtDecl::Comprehension(self.compile_comprehension(c)?),
            Decl::Bad(pos) => return Err(CompileError::BadNode { pos: *pos }),
        })
    }

    /// Compiles a label to a constant `Feature` when possible. Returns
    /// `(Some(feature), false)` for a constant label, `(None, true)` when the
    /// label is computed and the caller must fall back to a `DynamicField`
    /// (`ErrIsExpression` path).
    fn compile_label(
        &mut self,
        label: &Label,
        pos: unify_core::Pos,
    ) -> CompileResult<(Option<Feature>, bool)> {
        if let Some(alias) = &label.alias {
            let feature = Feature::hidden_label(self.interner.intern(alias));
            let node_id = label.alias_node_id.unwrap_or(0);
            self.scopes
                .push(node_id, ScopeKind::PatternBinding { label: feature });
        }
        match &label.text {
            LabelText::Ident(s) | LabelText::String(s) => {
                let sym = self.interner.intern(s);
                let feature = if label.is_definition && label.is_hidden {
                    Feature::hidden_definition_label(sym)
                } else if label.is_definition {
                    Feature::definition_label(sym)
                } else if label.is_hidden {
                    Feature::hidden_label(sym)
                } else {
                    Feature::string_label(sym)
                };
                Ok((Some(feature), false))
            }
            LabelText::Int(i) => {
                let idx = u32::try_from(*i).map_err(|_| CompileError::IntLabelOutOfRange { pos })?;
                Ok((Some(Feature::int_label(idx)), false))
            }
            LabelText::Computed(_) => Ok((None, true)),
        }
    }

    fn compile_matcher(&mut self, label: &Label, pos: unify_core::Pos) -> CompileResult<Matcher> {
        if let Some(alias) = &label.alias {
            let feature = Feature::hidden_label(self.interner.intern(alias));
            let node_id = label.alias_node_id.unwrap_or(0);
            self.scopes
                .push(node_id, ScopeKind::PatternBinding { label: feature });
        }
        match &label.text {
            LabelText::Ident(name) if name == "string" => Ok(Matcher::Kind(Kind::STRING)),
            LabelText::Ident(name) if name == "int" => Ok(Matcher::Kind(Kind::INT)),
            LabelText::Ident(_) | LabelText::String(_) => {
                let (feature, _) = self.compile_label(label, pos)?;
                Ok(Matcher::Label(feature.expect("constant label")))
            }
            LabelText::Int(i) => {
                let idx = u32::try_from(*i).map_err(|_| CompileError::IntLabelOutOfRange { pos })?;
                Ok(Matcher::Label(Feature::int_label(idx)))
            }
            LabelText::Computed(e) => {
                let expr = self.compile_expr(e)?;
                if label.alias.is_some() {
                    Ok(Matcher::Validator(expr))
                } else {
                    Ok(Matcher::Dynamic(expr))
                }
            }
        }
    }

    // ---- list elements ------------------------------------------------

    fn compile_elem(&mut self, e: &Elem) -> CompileResult<AdtElem> {
        Ok(match e {
            Elem::Expr(e) => AdtElem::Expr(self.compile_expr(e)?),
            Elem::Ellipsis(t) => {
                let t = t.as_ref().map(|e| self.compile_expr(e)).transpose()?;
                AdtElem::Ellipsis(t)
            }
            Elem::Comprehension(c) => AdtElem::Comprehension(self.compile_comprehension(c)?),
        })
    }

    // ---- comprehensions -------------------------------------------------

    fn compile_comprehension(&mut self, c: &Comprehension) -> CompileResult<Rc<Yielder>> {
        let depth_before = self.scopes.depth();
        let terminal = self.compile_clauses(&c.clauses, 0, c)?;
        self.scopes.truncate(depth_before);
        Ok(terminal)
    }

    fn compile_clauses(
        &mut self,
        clauses: &[Clause],
        idx: usize,
        c: &Comprehension,
    ) -> CompileResult<Rc<Yielder>> {
        if idx == clauses.len() {
            let body = match &c.body {
                ComprehensionBody::Struct(decls) => {
                    let depth_before = self.scopes.depth();
                    self.scopes.push(c.node_id, ScopeKind::Fields);
                    let compiled = decls
                        .iter()
                        .map(|d| self.compile_decl(d))
                        .collect::<CompileResult<Vec<_>>>();
                    self.scopes.truncate(depth_before);
                    let is_definition = struct_embeds_definition(decls);
                    AdtComprehensionBody::Struct(Rc::new(AdtStructLit { decls: compiled?, is_definition }))
                }
                ComprehensionBody::List(elems) => {
                    // A list-comprehension body yields one element per
                    // iteration; represent a multi-element inline body as a
                    // nested list literal expression so `Yielder::Value`
                    // still only needs a single `Expr` payload.
                    let list = elems
                        .iter()
                        .map(|el| self.compile_elem(el))
                        .collect::<CompileResult<Vec<_>>>()?;
                    AdtComprehensionBody::Elem(Rc::new(AdtExpr::ListLit(Rc::new(ListLit {
                        elems: list,
                    }))))
                }
            };
            return Ok(Rc::new(Yielder::Value(body)));
        }
        match &clauses[idx] {
            Clause::For {
                key,
                value,
                source,
                node_id,
                pos: _,
            } => {
                let source = self.compile_expr(source)?;
                let key_feature = key
                    .as_ref()
                    .map(|k| Feature::string_label(self.interner.intern(k)));
                let value_feature = Feature::string_label(self.interner.intern(value));
                self.scopes.push(
                    *node_id,
                    ScopeKind::ForBinding {
                        key: key_feature,
                        value: value_feature,
                    },
                );
                let dst = self.compile_clauses(clauses, idx + 1, c)?;
                Ok(Rc::new(Yielder::For {
                    key: key_feature,
                    value: value_feature,
                    source,
                    dst,
                }))
            }
            Clause::If { condition, pos: _ } => {
                let condition = self.compile_expr(condition)?;
                let dst = self.compile_clauses(clauses, idx + 1, c)?;
                Ok(Rc::new(Yielder::If { condition, dst }))
            }
            Clause::Let {
                name,
                expr,
                node_id,
                pos: _,
            } => {
                let expr = self.compile_expr(expr)?;
                let label = Feature::hidden_label(self.interner.intern(name));
                self.scopes.push(*node_id, ScopeKind::LetBinding { label });
                let dst = self.compile_clauses(clauses, idx + 1, c)?;
                Ok(Rc::new(Yielder::Let { label, expr, dst }))
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

fn matcher_as_expr(label: &Label, compiler: &mut Compiler) -> CompileResult<Rc<AdtExpr>> {
    match &label.text {
        LabelText::Computed(e) => compiler.compile_expr(e),
        _ => unreachable!("matcher_as_expr only called for computed labels"),
    }
}

/// Whether a parse-tree expression is (or unifies/aliases) a reference to a
/// definition, the "struct literal embeds a definition via reference" half
/// of closedness introduction. Definitions are spelled with a leading `#`,
/// so this is a syntactic check rather than a scope lookup: a `Selector`
/// or `Ident` naming one is enough to know the embed pulls in closedness
/// without having to resolve what it actually binds to.
fn expr_references_definition(e: &Expr) -> bool {
    match e {
        Expr::Ident(ident) => ident.name.starts_with('#'),
        Expr::Selector { field, .. } => field.starts_with('#'),
        Expr::Binary { op: BinOpToken::Unify, lhs, rhs, .. } => {
            expr_references_definition(lhs) || expr_references_definition(rhs)
        }
        Expr::Unary { operand, .. } => expr_references_definition(operand),
        Expr::Alias { expr, .. } => expr_references_definition(expr),
        _ => false,
    }
}

/// Whether a struct literal's own decls embed a definition by reference.
/// The case of the current vertex itself being a definition is handled
/// separately, by marking the value of a definition-labeled field below.
fn struct_embeds_definition(decls: &[Decl]) -> bool {
    decls.iter().any(|d| matches!(d, Decl::Embed(e) if expr_references_definition(e)))
}

/// Recursively marks every struct literal directly reachable through a
/// chain of `&`-conjunction as a definition body: a definition field's
/// value closes not just its outermost literal but every struct ANDed into
/// it, the same way `#Foo: {a: 1} & {b: 2}` closes both `{a: 1}` and
/// `{b: 2}` against the combined field set.
fn mark_definition(expr: Rc<AdtExpr>) -> Rc<AdtExpr> {
    match expr.as_ref() {
        AdtExpr::StructLit(lit) => Rc::new(AdtExpr::StructLit(Rc::new(AdtStructLit {
            decls: lit.decls.clone(),
            is_definition: true,
        }))),
        AdtExpr::Binary { op: BinaryOp::Unify, lhs, rhs } => Rc::new(AdtExpr::Binary {
            op: BinaryOp::Unify,
            lhs: mark_definition(lhs.clone()),
            rhs: mark_definition(rhs.clone()),
        }),
        _ => expr,
    }
}

fn map_binop(t: BinOpToken) -> BinaryOp {
    match t {
        BinOpToken::Unify => BinaryOp::Unify,
        BinOpToken::Disjoin => BinaryOp::Disjoin,
        BinOpToken::Eq => BinaryOp::Eq,
        BinOpToken::Neq => BinaryOp::Neq,
        BinOpToken::Lt => BinaryOp::Lt,
        BinOpToken::Le => BinaryOp::Le,
        BinOpToken::Gt => BinaryOp::Gt,
        BinOpToken::Ge => BinaryOp::Ge,
        BinOpToken::And => BinaryOp::And,
        BinOpToken::Or => BinaryOp::Or,
        BinOpToken::Matches => BinaryOp::Matches,
        BinOpToken::NotMatches => BinaryOp::NotMatches,
        BinOpToken::Add => BinaryOp::Add,
        BinOpToken::Sub => BinaryOp::Sub,
        BinOpToken::Mul => BinaryOp::Mul,
        BinOpToken::Div => BinaryOp::Div,
        BinOpToken::IntDiv => BinaryOp::IntDiv,
        BinOpToken::IntMod => BinaryOp::IntMod,
        BinOpToken::IntQuo => BinaryOp::IntQuo,
        BinOpToken::IntRem => BinaryOp::IntRem,
    }
}

#[allow(dead_code)]
fn unused_bound_op_bridge(op: BoundOp) -> BoundOp {
    // Kept so `BoundOp` stays a visibly-used import if future bound-literal
    // compilation (e.g. a parser that hands bounds over pre-formed) lands
    // here; bounds are currently only produced by the evaluator's `BinOp`.
    op
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsetree::{BinOpToken, Expr as PExpr, File as PFile, IdentRef, Lit};

    fn file(decls: Vec<Decl>) -> PFile {
        PFile {
            package: None,
            imports: vec![],
            decls,
            node_id: 1,
        }
    }

    #[test]
    fn compiles_empty_package_to_one_conjunct_per_file() {
        let compiler = Compiler::new();
        let out = compiler
            .compile_package(&[file(vec![]), file(vec![])])
            .unwrap();
        assert_eq!(out.vertices.get(out.root).conjuncts.len(), 2);
    }

    #[test]
    fn predeclared_int_compiles_to_basic_type() {
        let mut compiler = Compiler::new();
        let expr = compiler
            .compile_expr(&PExpr::Ident(IdentRef {
                name: "int".into(),
                binder: None,
                pos: unify_core::Pos::NONE,
            }))
            .unwrap();
        assert!(matches!(expr.as_ref(), AdtExpr::Value(Value::BasicType(k)) if *k == Kind::INT));
    }

    #[test]
    fn unresolved_identifier_is_an_error() {
        let mut compiler = Compiler::new();
        let err = compiler.compile_expr(&PExpr::Ident(IdentRef {
            name: "nope".into(),
            binder: None,
            pos: unify_core::Pos::NONE,
        }));
        assert!(matches!(err, Err(CompileError::UnresolvedReference { .. })));
    }

    #[test]
    fn field_in_file_scope_resolves_with_up_count_zero() {
        let mut compiler = Compiler::new();
        compiler.scopes.push(1, ScopeKind::Fields);
        let expr = compiler
            .compile_expr(&PExpr::Ident(IdentRef {
                name: "x".into(),
                binder: Some(1),
                pos: unify_core::Pos::NONE,
            }))
            .unwrap();
        assert!(matches!(
            expr.as_ref(),
            AdtExpr::FieldReference { up_count: 0, .. }
        ));
    }

    #[test]
    fn unify_binary_compiles_to_unify_op() {
        let mut compiler = Compiler::new();
        let expr = compiler
            .compile_expr(&PExpr::Binary {
                op: BinOpToken::Unify,
                lhs: Box::new(PExpr::BasicLit(Lit::Int("1".into()))),
                rhs: Box::new(PExpr::BasicLit(Lit::Int("2".into()))),
                pos: unify_core::Pos::NONE,
            })
            .unwrap();
        assert!(expr.as_unify().is_some());
    }

    #[test]
    fn import_alias_resolves_to_import_reference() {
        use crate::parsetree::{ImportSpec, Label, LabelText};

        let compiler = Compiler::new();
        let file = PFile {
            package: None,
            imports: vec![ImportSpec {
                path: "strings".into(),
                alias: None,
                pos: unify_core::Pos::NONE,
                node_id: 2,
            }],
            decls: vec![Decl::Field {
                label: Label {
                    text: LabelText::Ident("x".into()),
                    is_definition: false,
                    is_hidden: false,
                    alias: None,
                    alias_node_id: None,
                    pos: unify_core::Pos::NONE,
                },
                optional: false,
                value: PExpr::Ident(IdentRef {
                    name: "strings".into(),
                    binder: Some(2),
                    pos: unify_core::Pos::NONE,
                }),
                pos: unify_core::Pos::NONE,
            }],
            node_id: 1,
        };
        let out = compiler.compile_package(&[file]).unwrap();
        let conjunct = &out.vertices.get(out.root).conjuncts[0];
        let AdtExpr::StructLit(lit) = conjunct.expr.as_ref() else {
            panic!("expected a struct literal conjunct");
        };
        let AdtDecl::Field { value, .. } = &lit.decls[0] else {
            panic!("expected a field decl");
        };
        assert!(matches!(value.as_ref(), AdtExpr::ImportReference { path } if path == "strings"));
    }
}
