//! HTTP DTOs for session endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::{AgentReply, SessionView};
use crate::domain::session::{HelperFrame, SessionStatus, Turn, TurnRole};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request carrying one user message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Response for a newly created session.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub state: SessionStatus,
}

/// The agent's reply to a message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub session_id: String,
    pub reply: String,
    pub state: SessionStatus,
    pub terminal: bool,
    pub workflow: Option<String>,
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<HelperResponse>,
}

impl From<AgentReply> for MessageResponse {
    fn from(reply: AgentReply) -> Self {
        Self {
            session_id: reply.session_id.to_string(),
            reply: reply.text,
            state: reply.status,
            terminal: reply.terminal,
            workflow: reply.workflow_id.map(String::from),
            current_step: reply.current_step.map(String::from),
            helper: reply.helper.map(Into::into),
        }
    }
}

/// A guide running on top of the session's workflow.
#[derive(Debug, Clone, Serialize)]
pub struct HelperResponse {
    pub workflow: String,
    pub step: String,
}

impl From<HelperFrame> for HelperResponse {
    fn from(frame: HelperFrame) -> Self {
        Self {
            workflow: frame.workflow_id.into(),
            step: frame.step.into(),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub sequence: u32,
    pub role: TurnRole,
    pub text: String,
    pub at: String,
}

impl From<Turn> for TurnResponse {
    fn from(turn: Turn) -> Self {
        Self {
            sequence: turn.sequence,
            role: turn.role,
            text: turn.text,
            at: turn.at.as_datetime().to_rfc3339(),
        }
    }
}

/// Detailed session view for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub state: SessionStatus,
    pub terminal: bool,
    pub workflow: Option<String>,
    pub workflow_title: Option<String>,
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub helper: Option<HelperResponse>,
    pub turns: Vec<TurnResponse>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        Self {
            id: view.id.to_string(),
            state: view.status,
            terminal: view.terminal,
            workflow: view.workflow_id.map(String::from),
            workflow_title: view.workflow_title,
            current_step: view.current_step.map(String::from),
            helper: view.helper.map(Into::into),
            turns: view.turns.into_iter().map(Into::into).collect(),
            created_at: view.created_at.as_datetime().to_rfc3339(),
            updated_at: view.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for the abandon command.
#[derive(Debug, Clone, Serialize)]
pub struct AbandonSessionResponse {
    pub session_id: String,
    pub state: SessionStatus,
    pub changed: bool,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl ToString, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, StepId, Timestamp, WorkflowId};

    #[test]
    fn send_message_request_deserializes() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"text": "it is 120"}"#).unwrap();
        assert_eq!(req.text, "it is 120");
    }

    #[test]
    fn message_response_serializes_state_and_ids() {
        let reply = AgentReply {
            session_id: SessionId::new(),
            text: "Is the breaker tripped?".to_string(),
            status: SessionStatus::InProgress,
            terminal: false,
            workflow_id: Some(WorkflowId::new("lukewarm_water").unwrap()),
            current_step: Some(StepId::new("check_breaker").unwrap()),
            helper: None,
        };

        let json = serde_json::to_value(MessageResponse::from(reply)).unwrap();
        assert_eq!(json["state"], "IN_PROGRESS");
        assert_eq!(json["workflow"], "lukewarm_water");
        assert_eq!(json["current_step"], "check_breaker");
        assert_eq!(json["terminal"], false);
        assert!(json.get("helper").is_none());
    }

    #[test]
    fn message_response_includes_open_helper() {
        let reply = AgentReply {
            session_id: SessionId::new(),
            text: "Turn off the power.".to_string(),
            status: SessionStatus::InProgress,
            terminal: false,
            workflow_id: Some(WorkflowId::new("lukewarm_water").unwrap()),
            current_step: Some(StepId::new("check_sediment").unwrap()),
            helper: Some(HelperFrame {
                workflow_id: WorkflowId::new("drain_water_heater").unwrap(),
                step: StepId::new("power_off").unwrap(),
            }),
        };

        let json = serde_json::to_value(MessageResponse::from(reply)).unwrap();
        assert_eq!(json["current_step"], "check_sediment");
        assert_eq!(json["helper"]["workflow"], "drain_water_heater");
        assert_eq!(json["helper"]["step"], "power_off");
    }

    #[test]
    fn turn_response_uses_lowercase_role() {
        let turn = Turn {
            sequence: 1,
            role: TurnRole::User,
            text: "hi".to_string(),
            at: Timestamp::now(),
        };
        let json = serde_json::to_value(TurnResponse::from(turn)).unwrap();
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn error_response_bad_request_creates_correctly() {
        let error = ErrorResponse::bad_request("Invalid input");
        assert_eq!(error.code, "BAD_REQUEST");
        assert_eq!(error.message, "Invalid input");
    }
}
