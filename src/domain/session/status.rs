//! SessionStatus enum for tracking the lifecycle of troubleshooting sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;
use crate::domain::workflow::Outcome;

/// Lifecycle status of a troubleshooting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, no message processed yet.
    #[default]
    New,
    /// At least one problem description did not match a workflow.
    Matching,
    /// Walking a workflow.
    InProgress,
    /// Workflow reached a resolution.
    Resolved,
    /// Workflow reached an escalation.
    Escalated,
    /// Closed by the retention policy before finishing.
    Abandoned,
}

impl SessionStatus {
    /// Status reached when a workflow ends with the given outcome.
    pub fn for_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Resolved => SessionStatus::Resolved,
            Outcome::Escalated => SessionStatus::Escalated,
        }
    }

    /// Returns true while the session still accepts messages.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Stable string form used in storage columns and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::New => "NEW",
            SessionStatus::Matching => "MATCHING",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Resolved => "RESOLVED",
            SessionStatus::Escalated => "ESCALATED",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (New, Matching)
                | (New, InProgress)
                | (New, Abandoned)
                | (Matching, InProgress)
                | (Matching, Abandoned)
                | (InProgress, Resolved)
                | (InProgress, Escalated)
                | (InProgress, Abandoned)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            New => vec![Matching, InProgress, Abandoned],
            Matching => vec![InProgress, Abandoned],
            InProgress => vec![Resolved, Escalated, Abandoned],
            Resolved | Escalated | Abandoned => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
