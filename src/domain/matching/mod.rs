//! Intent matching - mapping a free-form problem description to a workflow.
//!
//! Two implementations share the [`IntentMatcher`] capability:
//!
//! - [`KeywordIntentMatcher`]: deterministic token-overlap scoring
//! - [`OracleIntentMatcher`]: keyword first, language oracle as fallback
//!
//! Which one runs is decided by configuration at startup.

mod keyword;
mod oracle;

pub use keyword::{KeywordIntentMatcher, WorkflowScore};
pub use oracle::OracleIntentMatcher;

use async_trait::async_trait;

use crate::domain::foundation::WorkflowId;
use crate::domain::workflow::WorkflowCatalogue;

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Keyword,
    Oracle,
}

/// Result of matching a problem description against the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Matched {
        workflow_id: WorkflowId,
        /// Score in `[0, 1]`.
        confidence: f64,
        method: MatchMethod,
    },
    NoMatch,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Matched { .. })
    }

    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        match self {
            MatchResult::Matched { workflow_id, .. } => Some(workflow_id),
            MatchResult::NoMatch => None,
        }
    }
}

/// Chooses a workflow for a problem description.
///
/// Implementations have no side effects and never fail: anything that
/// goes wrong is reported as [`MatchResult::NoMatch`].
#[async_trait]
pub trait IntentMatcher: Send + Sync {
    async fn match_problem(&self, problem_text: &str, catalogue: &WorkflowCatalogue)
        -> MatchResult;
}
