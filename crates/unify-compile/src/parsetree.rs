//! The external parse-tree contract: the node shapes a lexer/parser
//! collaborator hands to the compiler. Lexing, parsing, and file/package
//! resolution are explicitly out of scope for this crate — this module only
//! declares the data the compiler consumes, the same way the teacher's
//! `parser::ast` types are a pure data layer its `compile` module walks.

use unify_core::Pos;

/// Identity of an AST node that introduces a lexical scope (a `File`, a
/// `StructLit`, a comprehension clause, a `LetClause`/`Alias`, or a pattern
/// binding `[X=pattern]:`). The external parser assigns these; the compiler
/// never allocates them itself, it only compares them for scope-stack
/// lookups ("walks the AST's lexical-scope back-links").
pub type NodeId = u32;

#[derive(Clone, Debug)]
pub struct File {
    pub package: Option<String>,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub node_id: NodeId,
}

#[derive(Clone, Debug)]
pub struct ImportSpec {
    pub path: String,
    pub alias: Option<String>,
    pub pos: Pos,
    /// Scope-introducing identity for this import binding: an `IdentRef`
    /// naming the alias (or the default package name) carries this as its
    /// `binder` (same back-link scheme as any other scope).
    pub node_id: NodeId,
}

#[derive(Clone, Debug)]
pub enum Lit {
    Null,
    Bool(bool),
    /// Decimal text, kept as a string so the compiler can parse it straight
    /// into a `BigInt` without an intermediate lossy `i64`/`f64` hop.
    Int(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

/// An identifier with the lexical back-pointer the parse tree is required
/// to carry ("`Ident` (with lexical `Scope`/`Node` back-pointers)").
/// `binder` is `None` for predeclared names (`int`, `_`, ...) and genuinely
/// unresolved identifiers — the compiler tells those two cases apart by
/// checking the predeclared table first.
#[derive(Clone, Debug)]
pub struct IdentRef {
    pub name: String,
    pub binder: Option<NodeId>,
    pub pos: Pos,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BinOpToken {
    Unify,
    Disjoin,
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
pub enum UnaryOpToken {
    Neg,
    Not,
    Plus,
}

#[derive(Clone, Debug)]
pub enum InterpSegment {
    Str(String),
    Expr(Box<Expr>),
}

#[derive(Clone, Debug)]
pub enum Expr {
    BasicLit(Lit),
    Ident(IdentRef),
    StructLit(Vec<Decl>),
    ListLit(Vec<Elem>),
    Ellipsis(Option<Box<Expr>>),
    Binary {
        op: BinOpToken,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        pos: Pos,
    },
    Unary {
        op: UnaryOpToken,
        operand: Box<Expr>,
        pos: Pos,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        pos: Pos,
    },
    Selector {
        base: Box<Expr>,
        field: String,
        pos: Pos,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        pos: Pos,
    },
    Slice {
        base: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
        pos: Pos,
    },
    Interpolation(Vec<InterpSegment>),
    Comprehension(Comprehension),
    /// `X=expr`, binding `X` for later `X.field`/pattern-label references.
    Alias {
        name: String,
        expr: Box<Expr>,
        node_id: NodeId,
        pos: Pos,
    },
    Bad(Pos),
}

/// A field label, already classified by the lexer into its definition/hidden
/// flags ("definitional labels force `DefinitionLabel`..."). `alias`
/// captures a pattern binding such as `[X=string]: ...`.
#[derive(Clone, Debug)]
pub enum LabelText {
    Ident(String),
    String(String),
    Int(i64),
    /// `[expr]: ...`: a bulk-optional or dynamic label computed at
    /// evaluation time.
    Computed(Box<Expr>),
}

#[derive(Clone, Debug)]
pub struct Label {
    pub text: LabelText,
    pub is_definition: bool,
    pub is_hidden: bool,
    /// `X` in `[X=pattern]: ...`, if the pattern binds an alias to itself.
    pub alias: Option<String>,
    pub alias_node_id: Option<NodeId>,
    pub pos: Pos,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Field {
        label: Label,
        optional: bool,
        value: Expr,
        pos: Pos,
    },
    /// `[pattern]: value` where `pattern` is not reducible to a single
    /// constant label.
    BulkOptional {
        label: Label,
        value: Expr,
        pos: Pos,
    },
    Ellipsis(Option<Expr>),
    Embed(Expr),
    LetClause {
        name: String,
        expr: Expr,
        node_id: NodeId,
        pos: Pos,
    },
    Alias {
        name: String,
        expr: Expr,
        node_id: NodeId,
        pos: Pos,
    },
    Comprehension(Comprehension),
    Bad(Pos),
}

#[derive(Clone, Debug)]
pub enum Elem {
    Expr(Expr),
    Ellipsis(Option<Expr>),
    Comprehension(Comprehension),
}

#[derive(Clone, Debug)]
pub enum ComprehensionBody {
    Struct(Vec<Decl>),
    List(Vec<Elem>),
}

#[derive(Clone, Debug)]
pub enum Clause {
    For {
        key: Option<String>,
        value: String,
        source: Expr,
        node_id: NodeId,
        pos: Pos,
    },
    If {
        condition: Expr,
        pos: Pos,
    },
    Let {
        name: String,
        expr: Expr,
        node_id: NodeId,
        pos: Pos,
    },
}

#[derive(Clone, Debug)]
pub struct Comprehension {
    pub clauses: Vec<Clause>,
    pub body: ComprehensionBody,
    pub node_id: NodeId,
}
