//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads of the session endpoints.

use chrono::{DateTime, Utc};
use issuezz_core::{
    domain::{Author, ChatMessage},
    render::RichContent,
    session::FlowContext,
    ChatSession, RenderMode, Renderer,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartMentorRequest {
    pub username: String,
    pub repo_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartGuidanceRequest {
    pub issue_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub message: String,
}

/// How message content is returned by `GET /sessions/{id}`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RenderFormat {
    /// Full markdown structure.
    Markdown,
    /// Inline formatting only.
    Inline,
    Html,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SessionQuery {
    /// Leave unset for raw text only.
    pub render: Option<RenderFormat>,
}

//=========================================================================================
// Responses
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageView {
    /// `bot` or `user`.
    #[serde(rename = "type")]
    pub author: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub rich: Option<RichContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl MessageView {
    pub fn new(message: &ChatMessage, render: Option<RenderFormat>) -> Self {
        let author = match message.author {
            Author::Bot => "bot",
            Author::User => "user",
        };
        let (rich, html) = match render {
            None => (None, None),
            Some(RenderFormat::Markdown) => {
                (Some(Renderer::new(RenderMode::Markdown).render(&message.content)), None)
            }
            Some(RenderFormat::Inline) => {
                (Some(Renderer::new(RenderMode::Inline).render(&message.content)), None)
            }
            Some(RenderFormat::Html) => (
                None,
                Some(Renderer::new(RenderMode::Markdown).to_html(&message.content)),
            ),
        };
        Self {
            author: author.to_string(),
            content: message.content.clone(),
            rich,
            html,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    /// `mentor` or `guidance`.
    pub flow: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<MessageView>,
    /// Flow state: fetched GitHub data and skills, or the issue analysis.
    #[schema(value_type = Object)]
    pub context: serde_json::Value,
}

impl SessionView {
    pub fn new(session_id: Uuid, session: &ChatSession, render: Option<RenderFormat>) -> Self {
        let flow = match session.context {
            FlowContext::Mentor(_) => "mentor",
            FlowContext::Guidance(_) => "guidance",
        };
        Self {
            session_id,
            flow: flow.to_string(),
            created_at: session.created_at,
            messages: session
                .transcript
                .messages()
                .iter()
                .map(|m| MessageView::new(m, render))
                .collect(),
            context: serde_json::to_value(&session.context).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_only_when_asked() {
        let message = ChatMessage::bot("See **this**");
        let plain = serde_json::to_value(MessageView::new(&message, None)).unwrap();
        assert_eq!(plain, serde_json::json!({"type": "bot", "content": "See **this**"}));

        let rich = MessageView::new(&message, Some(RenderFormat::Inline));
        assert!(rich.rich.is_some());
        let html = MessageView::new(&message, Some(RenderFormat::Html));
        assert!(html.html.unwrap().contains("<strong>this</strong>"));
    }
}
