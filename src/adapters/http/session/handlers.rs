//! HTTP handlers for session endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{
    AbandonSessionCommand, AbandonSessionHandler, CreateSessionHandler, GetSessionHandler,
    GetSessionQuery, ProcessMessageCommand, ProcessMessageHandler,
};
use crate::domain::foundation::SessionId;
use crate::domain::session::SessionError;

use super::dto::{
    AbandonSessionResponse, CreateSessionResponse, ErrorResponse, MessageResponse,
    SendMessageRequest, SessionResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    create_handler: Arc<CreateSessionHandler>,
    message_handler: Arc<ProcessMessageHandler>,
    get_handler: Arc<GetSessionHandler>,
    abandon_handler: Arc<AbandonSessionHandler>,
}

impl SessionHandlers {
    pub fn new(
        create_handler: Arc<CreateSessionHandler>,
        message_handler: Arc<ProcessMessageHandler>,
        get_handler: Arc<GetSessionHandler>,
        abandon_handler: Arc<AbandonSessionHandler>,
    ) -> Self {
        Self {
            create_handler,
            message_handler,
            get_handler,
            abandon_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/sessions - Start a new session
pub async fn create_session(State(handlers): State<SessionHandlers>) -> Response {
    match handlers.create_handler.handle().await {
        Ok(result) => {
            let response = CreateSessionResponse {
                session_id: result.session.id().to_string(),
                state: result.session.status(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_session_error(e),
    }
}

/// POST /api/sessions/:id/messages - Send a user message
pub async fn send_message(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = ProcessMessageCommand {
        session_id,
        text: req.text,
    };

    match handlers.message_handler.handle(cmd).await {
        Ok(reply) => (StatusCode::OK, Json(MessageResponse::from(reply))).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// GET /api/sessions/:id - Get session details and transcript
pub async fn get_session(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.get_handler.handle(GetSessionQuery { session_id }).await {
        Ok(view) => (StatusCode::OK, Json(SessionResponse::from(view))).into_response(),
        Err(e) => handle_session_error(e),
    }
}

/// POST /api/sessions/:id/abandon - Close an unfinished session
pub async fn abandon_session(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .abandon_handler
        .handle(AbandonSessionCommand { session_id })
        .await
    {
        Ok(result) => {
            let response = AbandonSessionResponse {
                session_id: session_id.to_string(),
                state: result.session.status(),
                changed: result.changed,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_session_error(e),
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse::<SessionId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid session ID")),
        )
            .into_response()
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn handle_session_error(error: SessionError) -> Response {
    let status = match &error {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Closed { .. } => StatusCode::CONFLICT,
        SessionError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        SessionError::InvalidState(_) | SessionError::StoreFailure(_) => {
            tracing::error!(error = %error, "Session request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ErrorResponse::new(error.code(), error.message()))).into_response()
}
