//! Compiles an externally-produced parse tree into the evaluator's
//! ADT: scope resolution, label normalization, and reference
//! compilation. Lexing and parsing themselves are out of scope — callers
//! hand in already-parsed [`parsetree::File`]s.

pub mod compiler;
pub mod error;
pub mod parsetree;
pub mod scope;

pub use compiler::{CompileOutput, Compiler};
pub use error::{CompileError, CompileResult};
