//! crates/issuezz_core/src/session.rs
//!
//! The chat session: an append-only transcript plus whatever the owning flow needs
//! to keep answering follow-up questions. A session is an explicit value handed to
//! each flow operation; nothing here is global.

use crate::domain::{AnalysisResult, ChatMessage, FetchedData, FileContent, IssueRef};
use crate::ports::PortError;
use crate::skills::SkillsProfile;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

//=========================================================================================
// Context Window Policy
//=========================================================================================

/// How much of the transcript is forwarded to the AI on each follow-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextWindow {
    /// The whole transcript, however long it gets.
    #[default]
    Full,
    /// Only the most recent `turns` messages, behind a note counting the omitted ones.
    Recent { turns: usize },
}

impl FromStr for ContextWindow {
    type Err = PortError;

    /// Accepts `full` or `recent:<k>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "full" {
            return Ok(ContextWindow::Full);
        }
        let turns = s
            .strip_prefix("recent:")
            .and_then(|k| k.trim().parse::<usize>().ok())
            .filter(|k| *k > 0)
            .ok_or_else(|| {
                PortError::InvalidInput(format!(
                    "'{}' is not a context window (expected 'full' or 'recent:<k>')",
                    s
                ))
            })?;
        Ok(ContextWindow::Recent { turns })
    }
}

//=========================================================================================
// Transcript
//=========================================================================================

/// Ordered chat history. Messages can be appended but never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its position.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The slice of history an AI call should see under `policy`.
    pub fn window(&self, policy: ContextWindow) -> Vec<ChatMessage> {
        match policy {
            ContextWindow::Full => self.messages.clone(),
            ContextWindow::Recent { turns } if self.messages.len() <= turns => {
                self.messages.clone()
            }
            ContextWindow::Recent { turns } => {
                let omitted = self.messages.len() - turns;
                let mut window = Vec::with_capacity(turns + 1);
                window.push(ChatMessage::bot(format!(
                    "({} earlier messages omitted)",
                    omitted
                )));
                window.extend_from_slice(&self.messages[omitted..]);
                window
            }
        }
    }
}

//=========================================================================================
// Session
//=========================================================================================

/// State kept by the beginner-issue (mentor) flow.
#[derive(Debug, Clone, Serialize)]
pub struct MentorContext {
    pub data: FetchedData,
    pub skills: SkillsProfile,
}

/// State kept by the issue-guidance flow.
#[derive(Debug, Clone, Serialize)]
pub struct GuidanceContext {
    pub issue: IssueRef,
    /// Absent when the analysis call failed.
    pub analysis: Option<AnalysisResult>,
    pub file_contents: Vec<FileContent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum FlowContext {
    Mentor(MentorContext),
    Guidance(GuidanceContext),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    pub transcript: Transcript,
    pub context: FlowContext,
    #[serde(skip)]
    pub window: ContextWindow,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(context: FlowContext, window: ContextWindow) -> Self {
        Self {
            transcript: Transcript::new(),
            context,
            window,
            created_at: Utc::now(),
        }
    }

    /// History to forward with the next AI call, per the session's window policy.
    pub fn context_messages(&self) -> Vec<ChatMessage> {
        self.transcript.window(self.window)
    }
}
