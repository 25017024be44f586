//! crates/issuezz_core/src/guidance.rs
//!
//! The issue guidance flow: analyze one issue against the files most likely to be
//! involved, then answer questions about it with the analysis and file contents
//! as context.

use crate::classify::classify_request;
use crate::domain::{
    AnalysisResult, ChatMessage, FileContent, GuidanceFollowUp, RepoRef, RequestType,
    ReviewRequest, TechnicalContext,
};
use crate::matcher::FileMatcher;
use crate::ports::{AiGateway, GithubService, PortError, PortResult};
use crate::repo_url::parse_issue_url;
use crate::session::{ChatSession, ContextWindow, FlowContext, GuidanceContext};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const GREETING: &str = "# 👋 Hello! Let's solve this together! 🎉";
pub const UNAVAILABLE_FILE: &str = "Unable to fetch file content";
const ANALYSIS_APOLOGY: &str = "Sorry, I encountered an error while analyzing the repository. Please check the URL and try again.";
const FOLLOW_UP_APOLOGY: &str =
    "😅 Sorry, I encountered an error. Please try asking your question again.";

/// Marker put in front of each answer, by request type.
pub fn reply_marker(request_type: RequestType) -> &'static str {
    match request_type {
        RequestType::CodeExplanation => "💻",
        RequestType::Workflow => "🔄",
        RequestType::General => "💭",
    }
}

/// Markdown summary of an analysis, shown as the second message of the chat.
pub fn format_analysis(analysis: &AnalysisResult) -> String {
    let files = analysis
        .file_analysis
        .analyzed_files
        .iter()
        .map(|f| {
            format!(
                "### {} ({}% match)\n{}",
                f.file_name, f.combined_probability, f.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    let priority = analysis
        .recommendations
        .priority_order
        .iter()
        .enumerate()
        .map(|(i, file)| format!("{}. {}", i + 1, file))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# 📊 Repository Analysis Summary 🎉

## 🎯 Purpose
{}

## 🛠️ Tech Stack
{}

## 📁 Relevant Files Analysis
{}

## 🎯 Recommendations

### Priority Order:
{}

### 🔧 Specific Changes Needed:
{}

### 📚 Additional Context:
{}

💬 Feel free to ask me about:
- Code explanations for any file
- Detailed workflow for solving this issue
- Understanding specific parts of the code
- Best practices and recommendations",
        analysis.repository_analysis.purpose,
        analysis.repository_analysis.tech_stack.join(", "),
        files,
        priority,
        analysis.recommendations.specific_changes,
        analysis.recommendations.additional_context
    )
}

#[derive(Clone)]
pub struct GuidanceFlow {
    github: Arc<dyn GithubService>,
    matcher: FileMatcher,
    gateway: Arc<dyn AiGateway>,
    window: ContextWindow,
}

impl GuidanceFlow {
    pub fn new(
        github: Arc<dyn GithubService>,
        gateway: Arc<dyn AiGateway>,
        window: ContextWindow,
    ) -> Self {
        Self {
            matcher: FileMatcher::new(github.clone()),
            github,
            gateway,
            window,
        }
    }

    /// Opens a session for the issue at `issue_url`.
    ///
    /// Only an unparseable URL is an error; a failed lookup or analysis opens the
    /// session with an apology and no analysis.
    pub async fn start(&self, issue_url: &str) -> PortResult<ChatSession> {
        let issue_ref = parse_issue_url(issue_url.trim())?;
        let repo = issue_ref.repo.clone();

        let analyzed = match self.github.get_issue(&issue_ref).await {
            Ok(issue) => {
                let matched = self.matcher.find(&repo, &issue).await;
                let request = ReviewRequest {
                    content_matches: matched.content_matches,
                    filename_matches: matched.filename_matches,
                    owner: repo.owner.clone(),
                    repo: repo.name.clone(),
                    issue_url: issue_url.trim().to_string(),
                    issue_title: issue.title,
                    issue_body: issue.body,
                };
                self.gateway.analyze(&request).await
            }
            Err(e) => Err(e),
        };

        let (analysis, file_contents, messages) = match analyzed {
            Ok(analysis) => {
                let files = self.fetch_file_contents(&repo, &analysis).await;
                info!("Analysis of {} ready with {} files", issue_ref.html_url(), files.len());
                let messages = vec![
                    ChatMessage::bot(GREETING),
                    ChatMessage::bot(format_analysis(&analysis)),
                ];
                (Some(analysis), files, messages)
            }
            Err(e) => {
                error!("Could not analyze {}: {}", issue_ref.html_url(), e);
                (None, Vec::new(), vec![ChatMessage::bot(ANALYSIS_APOLOGY)])
            }
        };

        let mut session = ChatSession::new(
            FlowContext::Guidance(GuidanceContext {
                issue: issue_ref,
                analysis,
                file_contents,
            }),
            self.window,
        );
        for message in messages {
            session.transcript.push(message);
        }
        Ok(session)
    }

    /// Fetches every analyzed file concurrently; failures become a placeholder.
    pub async fn fetch_file_contents(
        &self,
        repo: &RepoRef,
        analysis: &AnalysisResult,
    ) -> Vec<FileContent> {
        let fetches = analysis.file_analysis.analyzed_files.iter().map(|file| async move {
            let content = match self.github.get_file_content(repo, &file.file_name).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to fetch {}: {}", file.file_name, e);
                    UNAVAILABLE_FILE.to_string()
                }
            };
            FileContent {
                name: file.file_name.clone(),
                content,
            }
        });
        join_all(fetches).await
    }

    /// Handles one user turn and returns the bot message appended for it.
    pub async fn reply(&self, session: &mut ChatSession, message: &str) -> PortResult<ChatMessage> {
        let (analysis, files) = match &session.context {
            FlowContext::Guidance(context) => (
                context.analysis.clone().unwrap_or_default(),
                context.file_contents.clone(),
            ),
            FlowContext::Mentor(_) => {
                return Err(PortError::InvalidInput(
                    "This session belongs to the beginner issue chat.".to_string(),
                ))
            }
        };
        let message = message.trim();
        if message.is_empty() {
            return Err(PortError::InvalidInput(
                "Message must not be empty.".to_string(),
            ));
        }

        let request_type = classify_request(message);
        let request = GuidanceFollowUp {
            previous_messages: session.context_messages(),
            current_query: message.to_string(),
            file_contents: (request_type == RequestType::CodeExplanation).then_some(files),
            technical_context: TechnicalContext {
                languages: analysis.repository_analysis.tech_stack.clone(),
                topics: Vec::new(),
            },
            analysis_context: analysis,
            request_type,
        };
        session.transcript.push(ChatMessage::user(message));

        let bot = match self.gateway.guidance_follow_up(&request).await {
            Ok(reply) => ChatMessage::bot(format!("{} {}", reply_marker(request_type), reply)),
            Err(e) => {
                error!("Guidance follow-up failed: {}", e);
                ChatMessage::bot(FOLLOW_UP_APOLOGY)
            }
        };
        session.transcript.push(bot.clone());
        Ok(bot)
    }
}
