//! services/api/src/web/ai_routes.rs
//!
//! The four AI endpoints. Each accepts the JSON body the chat flows send and answers
//! `{reply: ...}`; every failure is reported as `500 {detail}`.

use crate::error::HttpError;
use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use issuezz_core::{
    domain::{
        AnalysisResult, FetchedData, GuidanceFollowUp, MentorFollowUp, Recommendations,
        ReviewRequest,
    },
    ports::PortError,
    Assistant,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct Reply<T> {
    pub reply: T,
}

fn ai_error(endpoint: &str, e: PortError) -> HttpError {
    error!("{} failed: {}", endpoint, e);
    HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn assistant(state: &AppState) -> Result<&Arc<Assistant>, HttpError> {
    state.assistant.as_ref().ok_or_else(|| {
        HttpError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "No completion provider is configured on this server",
        )
    })
}

/// Recommend beginner-friendly issues for a contributor.
#[utoipa::path(
    post,
    path = "/api/ai_suggest",
    request_body(content = Object, description = "Profile, repositories and issues of the target repository."),
    responses(
        (status = 200, description = "`{reply: {recommendations: [...]}}`, at most three entries"),
        (status = 500, description = "Completion failed", body = crate::error::ErrorBody)
    )
)]
pub async fn ai_suggest_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<FetchedData>,
) -> Result<Json<Reply<Recommendations>>, HttpError> {
    let recommendations = assistant(&state)?
        .suggest(&data)
        .await
        .map_err(|e| ai_error("ai_suggest", e))?;
    Ok(Json(Reply {
        reply: Recommendations { recommendations },
    }))
}

/// Analyze an issue against its candidate files.
#[utoipa::path(
    post,
    path = "/api/ai_reviewer",
    request_body(content = Object, description = "Candidate files and the issue to analyze."),
    responses(
        (status = 200, description = "`{reply: AnalysisResult}`"),
        (status = 500, description = "Completion failed", body = crate::error::ErrorBody)
    )
)]
pub async fn ai_reviewer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Reply<AnalysisResult>>, HttpError> {
    let analysis = assistant(&state)?
        .review(&request)
        .await
        .map_err(|e| ai_error("ai_reviewer", e))?;
    Ok(Json(Reply { reply: analysis }))
}

/// Answer a follow-up in the beginner mentor chat.
#[utoipa::path(
    post,
    path = "/api/chatone_followup",
    request_body(content = Object, description = "Profile, chat history and the new question."),
    responses(
        (status = 200, description = "`{reply: string}`"),
        (status = 500, description = "Completion failed", body = crate::error::ErrorBody)
    )
)]
pub async fn chatone_followup_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MentorFollowUp>,
) -> Result<Json<Reply<String>>, HttpError> {
    let reply = assistant(&state)?
        .mentor_reply(&request)
        .await
        .map_err(|e| ai_error("chatone_followup", e))?;
    Ok(Json(Reply { reply }))
}

/// Answer a follow-up in the issue guidance chat.
#[utoipa::path(
    post,
    path = "/api/chattwo_followup",
    request_body(content = Object, description = "Analysis, chat history, request type and the new question."),
    responses(
        (status = 200, description = "`{reply: string}`"),
        (status = 500, description = "Completion failed", body = crate::error::ErrorBody)
    )
)]
pub async fn chattwo_followup_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GuidanceFollowUp>,
) -> Result<Json<Reply<String>>, HttpError> {
    let reply = assistant(&state)?
        .guidance_reply(&request)
        .await
        .map_err(|e| ai_error("chattwo_followup", e))?;
    Ok(Json(Reply { reply }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::web::test_fakes::{body_json, state_with_replies};
    use issuezz_core::domain::{Issue, MentorFollowUp};

    #[tokio::test]
    async fn suggest_wraps_recommendations_in_reply() {
        let state = state_with_replies(&[
            r#"{"recommendations": [{"issue_title": "Found a bug", "difficulty_level": "Beginner"}]}"#,
        ]);
        let data = FetchedData {
            repoissues: vec![Issue {
                title: "Found a bug".to_string(),
                number: 1,
                ..Default::default()
            }],
            ..Default::default()
        };

        let (status, json) = body_json(ai_suggest_handler(State(state), Json(data)).await).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"]["recommendations"][0]["issue_title"], "Found a bug");
    }

    #[tokio::test]
    async fn completion_failure_is_a_500_with_detail() {
        let state = state_with_replies(&[]);
        let request = MentorFollowUp {
            current_query: "help".to_string(),
            ..Default::default()
        };
        let (status, json) =
            body_json(chatone_followup_handler(State(state), Json(request)).await).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].as_str().unwrap().contains("no completion available"));
    }

    #[tokio::test]
    async fn missing_assistant_is_reported() {
        let base = state_with_replies(&[]);
        let state = Arc::new(AppState {
            assistant: None,
            config: Arc::new(Config::default()),
            ..(*base).clone()
        });
        let (status, json) = body_json(
            chattwo_followup_handler(State(state), Json(GuidanceFollowUp::default())).await,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["detail"].is_string());
    }
}
