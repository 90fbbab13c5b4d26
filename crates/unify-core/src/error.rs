//! `Bottom`: the lattice least element and the evaluator's sole error
//! carrier. Every `Bottom` has a code and a chain of
//! `(Pos, message)` entries; `Pos` is opaque here since file/offset
//! resolution belongs to the external parse-tree producer — the core
//! only ever passes positions through.

use std::fmt;

/// Source position, as handed in by the parse tree (`(file, offset)`;
/// no position is `Pos::NONE`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub file: u32,
    pub offset: u32,
}

impl Pos {
    pub const NONE: Pos = Pos {
        file: u32::MAX,
        offset: u32::MAX,
    };

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "-")
        } else {
            write!(f, "file{}:{}", self.file, self.offset)
        }
    }
}

/// error kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum ErrorCode {
    /// Conflicting concrete values, kind mismatch, division by zero,
    /// disjunction with zero survivors, closedness violation.
    #[error("eval error")]
    Eval,
    /// Reference to a not-yet-finalized vertex, non-concrete operand to a
    /// builtin or operator, comprehension over a non-concrete source.
    #[error("incomplete")]
    Incomplete,
    /// Structural cycle: a vertex's own evaluation depends on its own
    /// finalized value.
    #[error("cycle")]
    Cycle,
    /// Raised by a builtin.
    #[error("user error")]
    User,
}

impl ErrorCode {
    pub fn is_incomplete(self) -> bool {
        matches!(self, ErrorCode::Incomplete)
    }
}

/// One link in a `Bottom`'s message chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorEntry {
    pub pos: Pos,
    pub message: String,
}

/// The lattice bottom: an error value that unifies to itself with anything
/// (`a & Bottom == Bottom`). Carries a code plus a chain of positioned
/// messages so `CombineRecursiveError` can merge per-child errors into
/// one tree without losing provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bottom {
    pub code: ErrorCode,
    chain: Vec<ErrorEntry>,
}

impl Bottom {
    pub fn new(code: ErrorCode, pos: Pos, message: impl Into<String>) -> Self {
        Bottom {
            code,
            chain: vec![ErrorEntry {
                pos,
                message: message.into(),
            }],
        }
    }

    pub fn eval(pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Eval, pos, message)
    }

    pub fn incomplete(pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Incomplete, pos, message)
    }

    pub fn cycle(pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Cycle, pos, message)
    }

    pub fn user(pos: Pos, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::User, pos, message)
    }

    pub fn is_incomplete(&self) -> bool {
        self.code.is_incomplete()
    }

    pub fn chain(&self) -> &[ErrorEntry] {
        &self.chain
    }

    /// Merge another `Bottom`'s chain into this one, deduplicating entries
    /// at the same position with the same message (disjunction
    /// survivor errors "deduplicated by source position").
    ///
    /// The combined code is `Eval` unless both sides agree on a more
    /// specific code (mirrors the non-monotonic code promotion: an
    /// `Incomplete` sibling never silently upgrades a concrete `Eval`
    /// failure, but two agreeing codes are preserved).
    pub fn combine(mut self, other: Bottom) -> Bottom {
        let code = if self.code == other.code {
            self.code
        } else {
            ErrorCode::Eval
        };
        for entry in other.chain {
            if !self.chain.contains(&entry) {
                self.chain.push(entry);
            }
        }
        Bottom {
            code,
            chain: self.chain,
        }
    }

    /// Render the full chain, one message per line, innermost first.
    pub fn render(&self) -> String {
        self.chain
            .iter()
            .map(|e| format!("{}: {}", e.pos, e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Bottom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chain.first() {
            Some(e) => write!(f, "{}", e.message),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Bottom {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_keeps_matching_code() {
        let a = Bottom::eval(Pos::NONE, "conflicting values 4 and 5");
        let b = Bottom::eval(Pos::NONE, "field not allowed");
        let c = a.combine(b);
        assert_eq!(c.code, ErrorCode::Eval);
        assert_eq!(c.chain.len(), 2);
    }

    #[test]
    fn combine_dedups_identical_entries() {
        let a = Bottom::eval(Pos::NONE, "dup");
        let b = Bottom::eval(Pos::NONE, "dup");
        let c = a.combine(b);
        assert_eq!(c.chain.len(), 1);
    }

    #[test]
    fn combine_mismatched_codes_falls_back_to_eval() {
        let a = Bottom::incomplete(Pos::NONE, "waiting");
        let b = Bottom::cycle(Pos::NONE, "looped");
        let c = a.combine(b);
        assert_eq!(c.code, ErrorCode::Eval);
    }

    #[test]
    fn incomplete_is_flagged() {
        let b = Bottom::incomplete(Pos::NONE, "x");
        assert!(b.is_incomplete());
    }
}
