//! ProcessMessageHandler - Advances a session by one user message.
//!
//! The handler serializes work per session, loads the aggregate, decides
//! the transition (intent matching before a workflow is chosen, step
//! interpretation afterwards, helper workflows on request), applies it and
//! saves exactly once.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::SessionLocks;
use crate::domain::dialogue;
use crate::domain::foundation::{SessionId, StepId, Timestamp, WorkflowId};
use crate::domain::interpretation::{requested_link, Decision, StepInterpreter};
use crate::domain::matching::{IntentMatcher, MatchResult};
use crate::domain::session::{HelperFrame, Session, SessionError, SessionStatus, Transition};
use crate::domain::workflow::{Branch, BranchTarget, Step, Workflow, WorkflowCatalogue};
use crate::ports::SessionStore;

/// Default upper bound on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 4000;

/// Command carrying one user message.
#[derive(Debug, Clone)]
pub struct ProcessMessageCommand {
    pub session_id: SessionId,
    pub text: String,
}

/// The agent's answer to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub session_id: SessionId,
    pub text: String,
    pub status: SessionStatus,
    pub terminal: bool,
    pub workflow_id: Option<WorkflowId>,
    pub current_step: Option<StepId>,
    /// Set while a helper workflow is open.
    pub helper: Option<HelperFrame>,
}

impl AgentReply {
    fn for_session(session: &Session, text: String) -> Self {
        Self {
            session_id: *session.id(),
            text,
            status: session.status(),
            terminal: session.is_terminal(),
            workflow_id: session.workflow_id().cloned(),
            current_step: session.current_step().cloned(),
            helper: session.helper().cloned(),
        }
    }
}

/// Handler for user messages.
pub struct ProcessMessageHandler {
    store: Arc<dyn SessionStore>,
    catalogue: Arc<WorkflowCatalogue>,
    matcher: Arc<dyn IntentMatcher>,
    interpreter: Arc<dyn StepInterpreter>,
    locks: SessionLocks,
    max_message_chars: usize,
}

impl ProcessMessageHandler {
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalogue: Arc<WorkflowCatalogue>,
        matcher: Arc<dyn IntentMatcher>,
        interpreter: Arc<dyn StepInterpreter>,
        locks: SessionLocks,
    ) -> Self {
        Self {
            store,
            catalogue,
            matcher,
            interpreter,
            locks,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    pub async fn handle(&self, cmd: ProcessMessageCommand) -> Result<AgentReply, SessionError> {
        let text = self.validate(&cmd.text)?;

        let _guard = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .store
            .load(&cmd.session_id)
            .await?
            .ok_or(SessionError::NotFound(cmd.session_id))?;

        if session.is_terminal() {
            let status = session.status();
            debug!(session_id = %cmd.session_id, %status, "Message to closed session rejected");
            return Err(SessionError::closed(
                status,
                dialogue::closing_message(status).unwrap_or_default(),
            ));
        }

        let (transition, reply) = self.plan(&session, text).await?;
        session.apply_turn(text, transition, reply.clone(), Timestamp::now())?;

        if let Err(err) = self.store.save(&session).await {
            warn!(session_id = %cmd.session_id, error = %err, "Failed to save session");
            return Err(err.into());
        }

        if session.is_terminal() {
            info!(
                session_id = %cmd.session_id,
                status = %session.status(),
                "Session finished"
            );
        }

        Ok(AgentReply::for_session(&session, reply))
    }

    /// Trims the message and enforces the length limits.
    fn validate<'a>(&self, text: &'a str) -> Result<&'a str, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::validation("text", "Message cannot be empty"));
        }
        let length = text.chars().count();
        if length > self.max_message_chars {
            return Err(SessionError::validation(
                "text",
                format!(
                    "Message is {} characters, the limit is {}",
                    length, self.max_message_chars
                ),
            ));
        }
        Ok(text)
    }

    /// Computes the transition and reply for `text` without touching the session.
    async fn plan(&self, session: &Session, text: &str) -> Result<(Transition, String), SessionError> {
        match session.status() {
            SessionStatus::New | SessionStatus::Matching => Ok(self.plan_match(session, text).await),
            SessionStatus::InProgress => self.plan_step(session, text).await,
            status => Err(SessionError::invalid_state(format!(
                "Cannot process a message while {}",
                status
            ))),
        }
    }

    async fn plan_match(&self, session: &Session, text: &str) -> (Transition, String) {
        let result = self.matcher.match_problem(text, &self.catalogue).await;

        let matched = match &result {
            MatchResult::Matched {
                workflow_id,
                confidence,
                method,
            } => match self.catalogue.find(workflow_id) {
                Ok(workflow) => {
                    info!(
                        session_id = %session.id(),
                        %workflow_id,
                        confidence,
                        ?method,
                        "Workflow matched"
                    );
                    Some(Arc::clone(workflow))
                }
                Err(err) => {
                    warn!(session_id = %session.id(), error = %err, "Matcher returned unknown workflow");
                    None
                }
            },
            MatchResult::NoMatch => None,
        };

        match matched {
            Some(workflow) => {
                let root = workflow.root();
                (
                    Transition::Matched {
                        workflow_id: workflow.id().clone(),
                        root: root.id.clone(),
                    },
                    dialogue::step_message(root),
                )
            }
            None => {
                debug!(session_id = %session.id(), "No workflow matched");
                (
                    Transition::Unmatched,
                    dialogue::no_match_message(&self.catalogue.titles()),
                )
            }
        }
    }

    async fn plan_step(&self, session: &Session, text: &str) -> Result<(Transition, String), SessionError> {
        let workflow = self.session_workflow(session)?;
        let step_id = session
            .current_step()
            .ok_or_else(|| SessionError::invalid_state("Session in progress without a current step"))?;
        let step = step_of(workflow, step_id)?;

        if let Some(frame) = session.helper() {
            return self.plan_helper_step(session, frame, step, text).await;
        }

        if let Some(link) = requested_link(step, text) {
            let helper = self.catalogue.find(&link.workflow).map_err(|_| {
                SessionError::invalid_state(format!(
                    "Linked workflow {} is no longer available",
                    link.workflow
                ))
            })?;
            info!(
                session_id = %session.id(),
                step_id = %step.id,
                helper = %helper.id(),
                "Helper workflow opened"
            );
            return Ok((
                Transition::HelperOpened {
                    workflow_id: helper.id().clone(),
                    root: helper.root().id.clone(),
                },
                dialogue::helper_opened_message(helper.title(), helper.root()),
            ));
        }

        let Some(branch) = self.select_branch(session, step, text).await else {
            return Ok((Transition::Held, dialogue::clarification_message(step)));
        };

        match &branch.target {
            BranchTarget::Step(next_id) => {
                let next = step_of(workflow, next_id)?;
                let reply = if next.is_terminal() {
                    dialogue::terminal_step_message(next)
                } else {
                    dialogue::step_message(next)
                };
                Ok((
                    Transition::Advanced {
                        step: next.id.clone(),
                        outcome: next.kind.outcome(),
                    },
                    reply,
                ))
            }
            BranchTarget::Outcome(outcome) => Ok((
                Transition::Finished { outcome: *outcome },
                dialogue::outcome_message(*outcome),
            )),
        }
    }

    /// Walks the open helper. Any ending of the helper, whatever its kind,
    /// returns to `origin` instead of closing the session. Links offered by
    /// helper steps are not followed.
    async fn plan_helper_step(
        &self,
        session: &Session,
        frame: &HelperFrame,
        origin: &Step,
        text: &str,
    ) -> Result<(Transition, String), SessionError> {
        let helper = self.catalogue.find(&frame.workflow_id).map_err(|_| {
            SessionError::invalid_state(format!(
                "Helper workflow {} is no longer available",
                frame.workflow_id
            ))
        })?;
        let step = step_of(helper, &frame.step)?;

        let Some(branch) = self.select_branch(session, step, text).await else {
            return Ok((Transition::Held, dialogue::clarification_message(step)));
        };

        let last = match &branch.target {
            BranchTarget::Step(next_id) => {
                let next = step_of(helper, next_id)?;
                if !next.is_terminal() {
                    return Ok((
                        Transition::HelperAdvanced {
                            step: next.id.clone(),
                        },
                        dialogue::step_message(next),
                    ));
                }
                Some(next)
            }
            BranchTarget::Outcome(_) => None,
        };

        info!(
            session_id = %session.id(),
            helper = %helper.id(),
            step_id = %origin.id,
            "Helper workflow finished"
        );
        Ok((
            Transition::HelperClosed,
            dialogue::helper_closed_message(last, origin),
        ))
    }

    /// Asks the interpreter which branch of `step` the reply selects.
    async fn select_branch<'s>(&self, session: &Session, step: &'s Step, text: &str) -> Option<&'s Branch> {
        let branch = match self.interpreter.interpret(step, text).await {
            Decision::Branch(label) => step.branch(&label),
            Decision::Unclear => None,
        };

        match branch {
            Some(branch) => debug!(
                session_id = %session.id(),
                step_id = %step.id,
                label = %branch.label,
                "Branch selected"
            ),
            None => debug!(session_id = %session.id(), step_id = %step.id, "Reply unclear, asking again"),
        }
        branch
    }

    fn session_workflow(&self, session: &Session) -> Result<&Arc<Workflow>, SessionError> {
        let workflow_id = session
            .workflow_id()
            .ok_or_else(|| SessionError::invalid_state("Session in progress without a workflow"))?;
        self.catalogue.find(workflow_id).map_err(|_| {
            SessionError::invalid_state(format!("Workflow {} is no longer available", workflow_id))
        })
    }
}

fn step_of<'w>(workflow: &'w Workflow, step_id: &StepId) -> Result<&'w Step, SessionError> {
    workflow.step(step_id).ok_or_else(|| {
        SessionError::invalid_state(format!(
            "Step {} is not part of workflow {}",
            step_id,
            workflow.id()
        ))
    })
}
