pub mod ai_routes;
pub mod protocol;
pub mod rest;
pub mod session_routes;
pub mod state;

#[cfg(test)]
mod test_fakes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::{health_handler, root_handler, ApiDoc};
pub use state::AppState;

/// Every API route, bound to the shared state.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/ai_suggest", post(ai_routes::ai_suggest_handler))
        .route("/api/ai_reviewer", post(ai_routes::ai_reviewer_handler))
        .route("/api/chatone_followup", post(ai_routes::chatone_followup_handler))
        .route("/api/chattwo_followup", post(ai_routes::chattwo_followup_handler))
        .route("/sessions/mentor", post(session_routes::start_mentor_handler))
        .route("/sessions/guidance", post(session_routes::start_guidance_handler))
        .route(
            "/sessions/{id}",
            get(session_routes::get_session_handler).delete(session_routes::delete_session_handler),
        )
        .route("/sessions/{id}/messages", post(session_routes::post_message_handler))
        .with_state(state)
}
