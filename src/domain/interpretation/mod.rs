//! Step interpretation - mapping a reply onto one of the current step's branches.
//!
//! [`RuleStepInterpreter`] is purely deterministic. [`OracleStepInterpreter`]
//! runs the same rules first and consults the language oracle only when
//! they are inconclusive.

mod condition;
mod oracle;
mod rules;

pub use condition::{
    branch_matches, branch_strength, requested_link, BranchCondition, Comparison, MatchStrength,
    NumericPredicate, Reply,
};
pub use oracle::OracleStepInterpreter;
pub use rules::{RuleStepInterpreter, RuleVerdict};

use async_trait::async_trait;

use crate::domain::workflow::Step;

/// Which branch a reply selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The label of the selected branch.
    Branch(String),
    /// No single branch could be chosen; the step should be re-asked.
    Unclear,
}

/// Maps a user reply to a branch of the given step.
///
/// Implementations never fail: problems surface as [`Decision::Unclear`].
/// A returned [`Decision::Branch`] always names a label of `step`.
#[async_trait]
pub trait StepInterpreter: Send + Sync {
    async fn interpret(&self, step: &Step, reply: &str) -> Decision;
}
