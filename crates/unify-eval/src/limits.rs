//! Evaluator resource limits (termination argument gets a hard
//! backstop here, the same way the teacher's VM caps total steps and call
//! depth rather than trusting proof-by-construction alone).

/// Caps on one evaluation. The algorithm is proven to terminate
/// on any finite configuration, but a malformed or adversarial input (e.g.
/// a compiler bug emitting a non-deduplicating conjunct stream) should fail
/// loudly instead of spinning forever.
#[derive(Clone, Copy, Debug)]
pub struct EvalLimits {
    /// Maximum `expandOne` iterations per vertex before giving up (the
    /// fixed-point loop).
    pub(crate) expand_iterations: u32,
    /// Maximum recursive `Unify` call depth ("the call stack is the
    /// only scheduler").
    pub(crate) recursion_limit: u32,
    /// Maximum alternatives considered across all disjunctions in one
    /// `tryDisjuncts` cross-product.
    pub(crate) disjunction_combinations: u32,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            expand_iterations: 10_000,
            recursion_limit: 1_000,
            disjunction_combinations: 1_000_000,
        }
    }
}

impl EvalLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand_iterations(mut self, n: u32) -> Self {
        self.expand_iterations = n;
        self
    }

    pub fn recursion_limit(mut self, n: u32) -> Self {
        self.recursion_limit = n;
        self
    }

    pub fn disjunction_combinations(mut self, n: u32) -> Self {
        self.disjunction_combinations = n;
        self
    }

    pub fn get_expand_iterations(&self) -> u32 {
        self.expand_iterations
    }

    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    pub fn get_disjunction_combinations(&self) -> u32 {
        self.disjunction_combinations
    }
}
