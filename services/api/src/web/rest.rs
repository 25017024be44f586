//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers and the master definition for the
//! OpenAPI specification.

use crate::error::ErrorBody;
use crate::web::{
    ai_routes,
    protocol::{
        HealthResponse, MessageView, PostMessageRequest, RenderFormat, SessionView,
        StartGuidanceRequest, StartMentorRequest,
    },
    session_routes,
    state::AppState,
};
use axum::{extract::State, response::Json};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        ai_routes::ai_suggest_handler,
        ai_routes::ai_reviewer_handler,
        ai_routes::chatone_followup_handler,
        ai_routes::chattwo_followup_handler,
        session_routes::start_mentor_handler,
        session_routes::start_guidance_handler,
        session_routes::post_message_handler,
        session_routes::get_session_handler,
        session_routes::delete_session_handler,
    ),
    components(
        schemas(
            ErrorBody,
            HealthResponse,
            MessageView,
            PostMessageRequest,
            RenderFormat,
            SessionView,
            StartGuidanceRequest,
            StartMentorRequest,
        )
    ),
    tags(
        (name = "Issuezz API", description = "Issue recommendations and guidance chats for open-source contributors.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Service Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running!".to_string(),
        sessions: state.sessions.len().await,
    })
}

pub async fn root_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Welcome to Issuezz API!"}))
}
