//! Session aggregate entity.
//!
//! A session is one user's troubleshooting dialogue. It records which
//! workflow was matched, the step the dialogue is on, an optional helper
//! workflow opened from that step, and the full transcript. All changes go through [`Session::apply_turn`] and
//! [`Session::abandon`], which enforce the lifecycle rules.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, SessionId, StateMachine, StepId, Timestamp, WorkflowId,
};
use crate::domain::workflow::Outcome;

use super::{SessionStatus, Turn, TurnRole};

/// State change computed from one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A workflow matched; the dialogue starts at its root step.
    Matched { workflow_id: WorkflowId, root: StepId },
    /// No workflow matched; keep asking for a description.
    Unmatched,
    /// Moved to another step. `outcome` is set when that step is terminal.
    Advanced {
        step: StepId,
        outcome: Option<Outcome>,
    },
    /// A branch ended the dialogue without visiting another step.
    Finished { outcome: Outcome },
    /// The reply was unclear; stay on the current step.
    Held,
    /// A helper workflow was opened from the current step.
    HelperOpened { workflow_id: WorkflowId, root: StepId },
    /// Moved to another step of the open helper.
    HelperAdvanced { step: StepId },
    /// The helper ended; the dialogue is back on the step that opened it.
    HelperClosed,
}

/// Position inside a helper workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperFrame {
    pub workflow_id: WorkflowId,
    pub step: StepId,
}

/// Session aggregate - one troubleshooting dialogue.
///
/// # Invariants
///
/// - `workflow_id` and `current_step` are both unset iff status is NEW or
///   MATCHING (or ABANDONED before a match)
/// - the workflow never changes once set; helpers do not replace it
/// - at most one helper is open, only while IN_PROGRESS (it stays recorded
///   if the session is abandoned mid-helper), and `current_step` keeps
///   pointing at the step that opened it
/// - every status change appends exactly one user turn then one agent turn
/// - terminal statuses are sticky
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    status: SessionStatus,
    workflow_id: Option<WorkflowId>,
    current_step: Option<StepId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    helper: Option<HelperFrame>,
    turns: Vec<Turn>,
    /// Number of persisted changes since creation.
    version: u64,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Create a new, empty session in NEW.
    pub fn new(id: SessionId, now: Timestamp) -> Self {
        Self {
            id,
            status: SessionStatus::New,
            workflow_id: None,
            current_step: None,
            helper: None,
            turns: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn workflow_id(&self) -> Option<&WorkflowId> {
        self.workflow_id.as_ref()
    }

    pub fn current_step(&self) -> Option<&StepId> {
        self.current_step.as_ref()
    }

    /// The helper workflow currently running on top of the main one.
    pub fn helper(&self) -> Option<&HelperFrame> {
        self.helper.as_ref()
    }

    /// The transcript, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies one exchange: the user's message, the resulting transition and
    /// the agent's reply.
    ///
    /// Nothing is modified when an error is returned.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the session is terminal
    /// - `InvalidStateTransition` if the transition does not fit the status
    pub fn apply_turn(
        &mut self,
        user_text: impl Into<String>,
        transition: Transition,
        reply: impl Into<String>,
        at: Timestamp,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;

        let next_status = self.status_after(&transition)?;
        if next_status != self.status {
            self.status = self.status.transition_to(next_status)?;
        }

        match transition {
            Transition::Matched { workflow_id, root } => {
                self.workflow_id = Some(workflow_id);
                self.current_step = Some(root);
            }
            Transition::Advanced { step, .. } => {
                self.current_step = Some(step);
            }
            Transition::HelperOpened { workflow_id, root } => {
                self.helper = Some(HelperFrame {
                    workflow_id,
                    step: root,
                });
            }
            Transition::HelperAdvanced { step } => {
                if let Some(helper) = self.helper.as_mut() {
                    helper.step = step;
                }
            }
            Transition::HelperClosed => {
                self.helper = None;
            }
            Transition::Unmatched | Transition::Finished { .. } | Transition::Held => {}
        }

        self.push_turn(TurnRole::User, user_text.into(), at);
        self.push_turn(TurnRole::Agent, reply.into(), at);
        self.touch(at);
        Ok(())
    }

    /// Moves a non-terminal session to ABANDONED.
    ///
    /// Returns `false` without changing anything if it is already abandoned.
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the session is RESOLVED or ESCALATED
    pub fn abandon(&mut self, at: Timestamp) -> Result<bool, DomainError> {
        if self.status == SessionStatus::Abandoned {
            return Ok(false);
        }
        self.ensure_open()?;

        self.status = self.status.transition_to(SessionStatus::Abandoned)?;
        self.touch(at);
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionClosed,
                format!("Session {} is {}", self.id, self.status),
            ))
        }
    }

    fn status_after(&self, transition: &Transition) -> Result<SessionStatus, DomainError> {
        use SessionStatus::*;

        let in_helper = self.helper.is_some();
        let next = match (transition, self.status) {
            (Transition::Matched { .. }, New | Matching) => InProgress,
            (Transition::Unmatched, New | Matching) => Matching,
            (Transition::Advanced { outcome, .. }, InProgress) if !in_helper => {
                outcome.map(SessionStatus::for_outcome).unwrap_or(InProgress)
            }
            (Transition::Finished { outcome }, InProgress) if !in_helper => {
                SessionStatus::for_outcome(*outcome)
            }
            (Transition::Held, InProgress) => InProgress,
            (Transition::HelperOpened { .. }, InProgress) if !in_helper => InProgress,
            (Transition::HelperAdvanced { .. } | Transition::HelperClosed, InProgress)
                if in_helper =>
            {
                InProgress
            }
            (transition, status) => {
                return Err(DomainError::new(
                    ErrorCode::InvalidStateTransition,
                    format!("{:?} is not allowed while {}", transition, status),
                ))
            }
        };
        Ok(next)
    }

    fn push_turn(&mut self, role: TurnRole, text: String, at: Timestamp) {
        let sequence = self.turns.len() as u32 + 1;
        self.turns.push(Turn {
            sequence,
            role,
            text,
            at,
        });
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wf(id: &str) -> WorkflowId {
        WorkflowId::new(id).unwrap()
    }

    fn step(id: &str) -> StepId {
        StepId::new(id).unwrap()
    }

    fn matched_session() -> Session {
        let mut session = Session::new(SessionId::new(), Timestamp::now());
        session
            .apply_turn(
                "my water is lukewarm",
                Transition::Matched {
                    workflow_id: wf("lukewarm_water"),
                    root: step("check_thermostat"),
                },
                "What is the thermostat set to?",
                Timestamp::now(),
            )
            .unwrap();
        session
    }

    mod creation {
        use super::*;

        #[test]
        fn new_session_is_empty_and_new() {
            let session = Session::new(SessionId::new(), Timestamp::now());
            assert_eq!(session.status(), SessionStatus::New);
            assert!(session.workflow_id().is_none());
            assert!(session.current_step().is_none());
            assert!(session.turns().is_empty());
            assert_eq!(session.version(), 0);
        }
    }

    mod apply_turn {
        use super::*;

        #[test]
        fn match_sets_workflow_and_root() {
            let session = matched_session();
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.workflow_id(), Some(&wf("lukewarm_water")));
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
            assert_eq!(session.version(), 1);
        }

        #[test]
        fn appends_user_then_agent_turn() {
            let session = matched_session();
            let turns = session.turns();
            assert_eq!(turns.len(), 2);
            assert_eq!(turns[0].role, TurnRole::User);
            assert_eq!(turns[0].sequence, 1);
            assert_eq!(turns[1].role, TurnRole::Agent);
            assert_eq!(turns[1].sequence, 2);
        }

        #[test]
        fn unmatched_moves_new_to_matching_and_stays() {
            let mut session = Session::new(SessionId::new(), Timestamp::now());
            for _ in 0..2 {
                session
                    .apply_turn("hmm", Transition::Unmatched, "Say again?", Timestamp::now())
                    .unwrap();
                assert_eq!(session.status(), SessionStatus::Matching);
            }
            assert!(session.current_step().is_none());
            assert_eq!(session.turns().len(), 4);
        }

        #[test]
        fn advance_to_terminal_step_sets_outcome_status() {
            let mut session = matched_session();
            session
                .apply_turn(
                    "yes",
                    Transition::Advanced {
                        step: step("call_pro"),
                        outcome: Some(Outcome::Escalated),
                    },
                    "Call a plumber.",
                    Timestamp::now(),
                )
                .unwrap();
            assert_eq!(session.status(), SessionStatus::Escalated);
            assert_eq!(session.current_step(), Some(&step("call_pro")));
        }

        #[test]
        fn finished_keeps_step_and_resolves() {
            let mut session = matched_session();
            session
                .apply_turn(
                    "yes",
                    Transition::Finished {
                        outcome: Outcome::Resolved,
                    },
                    "Glad that worked.",
                    Timestamp::now(),
                )
                .unwrap();
            assert_eq!(session.status(), SessionStatus::Resolved);
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
        }

        #[test]
        fn held_changes_nothing_but_the_transcript() {
            let mut session = matched_session();
            session
                .apply_turn("purple", Transition::Held, "Sorry?", Timestamp::now())
                .unwrap();
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
            assert_eq!(session.turns().len(), 4);
        }

        #[test]
        fn rematching_mid_dialogue_is_rejected_without_changes() {
            let mut session = matched_session();
            let before = session.clone();
            let err = session
                .apply_turn(
                    "actually no hot water",
                    Transition::Matched {
                        workflow_id: wf("no_hot_water"),
                        root: step("heater_type"),
                    },
                    "Gas or electric?",
                    Timestamp::now(),
                )
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStateTransition);
            assert_eq!(session, before);
        }

        #[test]
        fn step_transitions_before_match_are_rejected() {
            let mut session = Session::new(SessionId::new(), Timestamp::now());
            let result = session.apply_turn("yes", Transition::Held, "?", Timestamp::now());
            assert!(result.is_err());
            assert!(session.turns().is_empty());
        }

        #[test]
        fn terminal_session_rejects_turns() {
            let mut session = matched_session();
            session
                .apply_turn(
                    "yes",
                    Transition::Finished {
                        outcome: Outcome::Resolved,
                    },
                    "Done.",
                    Timestamp::now(),
                )
                .unwrap();
            let before = session.clone();

            let err = session
                .apply_turn("hello?", Transition::Held, "?", Timestamp::now())
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::SessionClosed);
            assert_eq!(session, before);
        }
    }

    mod helper {
        use super::*;

        fn helper_session() -> Session {
            let mut session = matched_session();
            session
                .apply_turn(
                    "how do I drain it?",
                    Transition::HelperOpened {
                        workflow_id: wf("drain_water_heater"),
                        root: step("power_off"),
                    },
                    "Turn off the power.",
                    Timestamp::now(),
                )
                .unwrap();
            session
        }

        #[test]
        fn opening_keeps_main_workflow_and_step() {
            let session = helper_session();
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.workflow_id(), Some(&wf("lukewarm_water")));
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
            assert_eq!(
                session.helper(),
                Some(&HelperFrame {
                    workflow_id: wf("drain_water_heater"),
                    step: step("power_off"),
                })
            );
        }

        #[test]
        fn advancing_moves_only_the_helper() {
            let mut session = helper_session();
            session
                .apply_turn(
                    "done",
                    Transition::HelperAdvanced {
                        step: step("water_off"),
                    },
                    "Close the inlet valve.",
                    Timestamp::now(),
                )
                .unwrap();
            assert_eq!(session.helper().map(|h| h.step.as_str()), Some("water_off"));
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
        }

        #[test]
        fn closing_returns_to_the_linking_step() {
            let mut session = helper_session();
            session
                .apply_turn("done", Transition::HelperClosed, "Back to it.", Timestamp::now())
                .unwrap();
            assert!(session.helper().is_none());
            assert_eq!(session.status(), SessionStatus::InProgress);
            assert_eq!(session.current_step(), Some(&step("check_thermostat")));
            assert_eq!(session.turns().len(), 6);
        }

        #[test]
        fn main_workflow_cannot_move_while_helper_is_open() {
            let mut session = helper_session();
            let before = session.clone();
            let err = session
                .apply_turn(
                    "yes",
                    Transition::Finished {
                        outcome: Outcome::Resolved,
                    },
                    "Done.",
                    Timestamp::now(),
                )
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStateTransition);
            assert_eq!(session, before);
        }

        #[test]
        fn only_one_helper_at_a_time() {
            let mut session = helper_session();
            let err = session
                .apply_turn(
                    "again",
                    Transition::HelperOpened {
                        workflow_id: wf("drain_water_heater"),
                        root: step("power_off"),
                    },
                    "?",
                    Timestamp::now(),
                )
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        }

        #[test]
        fn helper_transitions_need_an_open_helper() {
            let mut session = matched_session();
            assert!(session
                .apply_turn("done", Transition::HelperClosed, "?", Timestamp::now())
                .is_err());
        }

        #[test]
        fn session_without_helper_field_still_deserializes() {
            let mut json = serde_json::to_value(matched_session()).unwrap();
            json.as_object_mut().unwrap().remove("helper");
            let back: Session = serde_json::from_value(json).unwrap();
            assert!(back.helper().is_none());
        }
    }

    mod abandon {
        use super::*;

        #[test]
        fn abandons_open_session_without_turns() {
            let mut session = matched_session();
            assert!(session.abandon(Timestamp::now()).unwrap());
            assert_eq!(session.status(), SessionStatus::Abandoned);
            assert_eq!(session.turns().len(), 2);
            assert_eq!(session.version(), 2);
        }

        #[test]
        fn abandon_is_idempotent() {
            let mut session = Session::new(SessionId::new(), Timestamp::now());
            assert!(session.abandon(Timestamp::now()).unwrap());
            let version = session.version();
            assert!(!session.abandon(Timestamp::now()).unwrap());
            assert_eq!(session.version(), version);
        }

        #[test]
        fn finished_session_cannot_be_abandoned() {
            let mut session = matched_session();
            session
                .apply_turn(
                    "yes",
                    Transition::Finished {
                        outcome: Outcome::Escalated,
                    },
                    "Call someone.",
                    Timestamp::now(),
                )
                .unwrap();
            let err = session.abandon(Timestamp::now()).unwrap_err();
            assert_eq!(err.code, ErrorCode::SessionClosed);
            assert_eq!(session.status(), SessionStatus::Escalated);
        }
    }

    #[test]
    fn serde_roundtrip_preserves_session() {
        let mut session = matched_session();
        session
            .apply_turn(
                "show me how",
                Transition::HelperOpened {
                    workflow_id: wf("drain_water_heater"),
                    root: step("power_off"),
                },
                "Turn off the power.",
                Timestamp::now(),
            )
            .unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
