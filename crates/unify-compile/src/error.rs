//! Compile-time errors (error list), modeled the way the teacher's
//! `compile::error::CompileError` is: one `thiserror` enum, no position
//! formatting (that belongs to the external diagnostics layer).

use unify_core::Pos;

#[derive(Clone, Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{pos}: invalid identifier")]
    InvalidIdentifier { pos: Pos },

    #[error("{pos}: reference to undeclared field {name:?}")]
    UnresolvedReference { name: String, pos: Pos },

    #[error("{pos}: alias {name:?} already declared in this scope")]
    DuplicateAlias { name: String, pos: Pos },

    #[error("{pos}: integer label out of range")]
    IntLabelOutOfRange { pos: Pos },

    /// `ErrIsExpression`: a label could not be reduced to a constant, so the
    /// caller must treat it as a dynamic/bulk-optional field instead of a
    /// plain one.
    #[error("{pos}: label is an expression, not a constant")]
    LabelIsExpression { pos: Pos },

    #[error("{pos}: malformed syntax node")]
    BadNode { pos: Pos },
}

pub type CompileResult<T> = Result<T, CompileError>;
