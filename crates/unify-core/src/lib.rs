//! The data model shared by the compiler and the evaluator: the interned
//! label/feature representation, the `Value`/`Expr` ADT, the `Vertex` graph,
//! and the scope-chain and closedness bookkeeping the unifier walks.
//!
//! This crate owns shapes, not algorithms: unification, disjunction
//! resolution, field-set matching, and comprehension expansion all live in
//! `unify-eval`; compiling an external parse tree into this ADT lives in
//! `unify-compile`.

pub mod closedef;
pub mod env;
pub mod error;
pub mod expr;
pub mod feature;
pub mod interner;
pub mod kind;
pub mod value;
pub mod vertex;

pub use closedef::{CloseId, CloseLeaf, CloseTree};
pub use env::{EnvArena, EnvId};
pub use error::{Bottom, ErrorCode, ErrorEntry, Pos};
pub use expr::{
    BinaryOp, ComprehensionBody, Decl, DisjunctTerm, Elem, Expr, InterpPart, ListLit, Matcher,
    StructLit, UnaryOp, Yielder,
};
pub use feature::{Feature, FeatureType};
pub use interner::{Interner, Symbol};
pub use kind::{Concreteness, Kind};
pub use value::{BoundOp, BuiltinRef, Num, NumKind, Value};
pub use vertex::{Conjunct, ListShape, Vertex, VertexArena, VertexId, VertexStatus};
