//! services/api/src/web/session_routes.rs
//!
//! Drives the two chat flows server side. A session is created by one of the start
//! endpoints and then advanced one user turn at a time.

use crate::error::HttpError;
use crate::web::protocol::{
    MessageView, PostMessageRequest, SessionQuery, SessionView, StartGuidanceRequest,
    StartMentorRequest,
};
use crate::web::state::{AppState, SessionSlot};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use issuezz_core::session::FlowContext;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Start a beginner mentor chat for a contributor and a target repository.
#[utoipa::path(
    post,
    path = "/sessions/mentor",
    request_body = StartMentorRequest,
    responses(
        (status = 201, description = "Session created with its greeting", body = SessionView),
        (status = 400, description = "Empty input or unparseable repository URL", body = crate::error::ErrorBody),
        (status = 404, description = "GitHub user or repository not found", body = crate::error::ErrorBody),
        (status = 429, description = "GitHub rate limit reached", body = crate::error::ErrorBody),
        (status = 502, description = "GitHub request failed", body = crate::error::ErrorBody)
    )
)]
pub async fn start_mentor_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartMentorRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let session = state
        .mentor
        .start(&request.username, &request.repo_url)
        .await?;
    let view_session = session.clone();
    let id = state.sessions.insert(session).await;
    info!("Started mentor session {}", id);
    Ok((StatusCode::CREATED, Json(SessionView::new(id, &view_session, None))))
}

/// Start an issue guidance chat for a GitHub issue URL.
#[utoipa::path(
    post,
    path = "/sessions/guidance",
    request_body = StartGuidanceRequest,
    responses(
        (status = 201, description = "Session created with the analysis summary", body = SessionView),
        (status = 400, description = "Unparseable issue URL", body = crate::error::ErrorBody)
    )
)]
pub async fn start_guidance_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartGuidanceRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let session = state.guidance.start(&request.issue_url).await?;
    let view_session = session.clone();
    let id = state.sessions.insert(session).await;
    info!("Started guidance session {}", id);
    Ok((StatusCode::CREATED, Json(SessionView::new(id, &view_session, None))))
}

/// Send a user message and receive the bot's answer.
#[utoipa::path(
    post,
    path = "/sessions/{id}/messages",
    request_body = PostMessageRequest,
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The bot message appended for this turn", body = MessageView),
        (status = 400, description = "Empty message", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody)
    )
)]
pub async fn post_message_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<PostMessageRequest>,
) -> Result<Json<MessageView>, HttpError> {
    let slot = find_session(&state, id).await?;

    // turns of one session never interleave; readers only see finished turns
    let _turn = slot.begin_turn().await;
    let mut session = slot.snapshot().await;
    let bot = if matches!(session.context, FlowContext::Mentor(_)) {
        state.mentor.reply(&mut session, &request.message).await?
    } else {
        state.guidance.reply(&mut session, &request.message).await?
    };
    slot.commit(session).await;
    Ok(Json(MessageView::new(&bot, None)))
}

/// Read a session's transcript, optionally rendered.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id"), SessionQuery),
    responses(
        (status = 200, description = "The session", body = SessionView),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody)
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionView>, HttpError> {
    let session = find_session(&state, id).await?.snapshot().await;
    Ok(Json(SessionView::new(id, &session, query.render)))
}

/// End a session and discard its transcript.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody)
    )
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, HttpError> {
    if state.sessions.remove(id).await {
        info!("Ended session {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: Uuid) -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, format!("Session {} not found", id))
}

async fn find_session(state: &AppState, id: Uuid) -> Result<Arc<SessionSlot>, HttpError> {
    state.sessions.get(id).await.ok_or_else(|| not_found(id))
}
