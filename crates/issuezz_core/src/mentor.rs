//! crates/issuezz_core/src/mentor.rs
//!
//! The beginner flow: fetch a contributor's GitHub data, build their skills
//! profile, ask for matching issues, then keep a follow-up conversation going.

use crate::domain::{ChatMessage, MentorFollowUp, Recommendation};
use crate::fetcher::GithubFetcher;
use crate::ports::{AiGateway, PortError, PortResult};
use crate::session::{ChatSession, ContextWindow, FlowContext, MentorContext};
use crate::skills::{aggregate_skills, SkillsProfile};
use std::sync::Arc;
use tracing::{error, info};

const APOLOGY: &str =
    "Sorry, I couldn't generate issue recommendations right now. Please try again in a moment. 😅";
const FOLLOW_UP_APOLOGY: &str =
    "Sorry, I encountered an error. Please try asking your question again. 😅";

/// Greeting used when the recommender found nothing suitable.
pub fn fallback_message(skills: &SkillsProfile) -> String {
    format!(
        "Hi there! 👋 I've analyzed your GitHub profile but couldn't find perfectly matching issues.

🔍 Your Skills Profile:
{}

Here are some suggestions:
- Try exploring other beginner-friendly repositories
- Look for issues labeled with \"good-first-issue\" or \"beginner-friendly\"
- Consider contributing to documentation or testing

Would you like help finding other beginner-friendly repositories that match your skills? 😊",
        skills.summary_lines()
    )
}

/// Profile languages named by a recommendation's skills, summary or reasoning.
fn matched_skills<'a>(rec: &Recommendation, skills: &'a SkillsProfile) -> Vec<&'a str> {
    let text = format!(
        "{}\n{}\n{}",
        rec.key_skills_needed.join("\n"),
        rec.quick_summary.as_deref().unwrap_or_default(),
        rec.why_recommended
    );
    skills.mentioned_in(&text)
}

/// Greeting that presents the recommended issues.
pub fn initial_message(recommendations: &[Recommendation], skills: &SkillsProfile) -> String {
    if recommendations.is_empty() {
        return fallback_message(skills);
    }

    let formatted = recommendations
        .iter()
        .map(|rec| {
            let mut block = format!(
                "📌 {}\n🔗 {}\n📊 Difficulty: {}\n📚 Learning: {}\n💡 Why: {}",
                rec.issue_title,
                rec.issue_url,
                rec.difficulty_level,
                rec.learning_opportunities,
                rec.why_recommended
            );
            let matched = matched_skills(rec, skills);
            if !matched.is_empty() {
                block.push_str(&format!("\n🧩 Uses your skills: {}", matched.join(", ")));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Hi there! 👋 I've analyzed your GitHub profile and found some perfect issues that match your skills and experience level.

🔍 Your Skills Profile:
{}

Here are the recommended issues:

{}

I can help explain any of these recommendations in more detail or guide you through getting started. What would you like to know more about? 😊",
        skills.summary_lines(),
        formatted
    )
}

#[derive(Clone)]
pub struct MentorFlow {
    fetcher: GithubFetcher,
    gateway: Arc<dyn AiGateway>,
    window: ContextWindow,
}

impl MentorFlow {
    pub fn new(fetcher: GithubFetcher, gateway: Arc<dyn AiGateway>, window: ContextWindow) -> Self {
        Self {
            fetcher,
            gateway,
            window,
        }
    }

    /// Opens a session for `username` against the issues of `repo_url`.
    ///
    /// Fetch failures are returned as errors. A failed recommendation call still yields
    /// a session, opened with an apology.
    pub async fn start(&self, username: &str, repo_url: &str) -> PortResult<ChatSession> {
        let data = self.fetcher.fetch(username, repo_url).await?;
        let skills = aggregate_skills(&data.repositories);
        info!("Skills profile for {} covers {} languages", username, skills.len());

        let greeting = match self.gateway.recommend(&data).await {
            Ok(recommendations) => initial_message(&recommendations, &skills),
            Err(e) => {
                error!("Recommendation request failed: {}", e);
                APOLOGY.to_string()
            }
        };

        let mut session = ChatSession::new(
            FlowContext::Mentor(MentorContext { data, skills }),
            self.window,
        );
        session.transcript.push(ChatMessage::bot(greeting));
        Ok(session)
    }

    /// Handles one user turn and returns the bot message appended for it.
    ///
    /// Sessions of the other flow are rejected.
    pub async fn reply(&self, session: &mut ChatSession, message: &str) -> PortResult<ChatMessage> {
        let data = match &session.context {
            FlowContext::Mentor(context) => context.data.clone(),
            FlowContext::Guidance(_) => {
                return Err(PortError::InvalidInput(
                    "This session belongs to the issue guidance chat.".to_string(),
                ))
            }
        };
        let message = message.trim();
        if message.is_empty() {
            return Err(PortError::InvalidInput(
                "Message must not be empty.".to_string(),
            ));
        }

        let request = MentorFollowUp {
            technical_context: data.technical_context(),
            user_profile: data.profile,
            previous_messages: session.context_messages(),
            current_query: message.to_string(),
            user_repos: data.repositories,
        };
        session.transcript.push(ChatMessage::user(message));

        let bot = match self.gateway.mentor_follow_up(&request).await {
            Ok(reply) => ChatMessage::bot(reply),
            Err(e) => {
                error!("Mentor follow-up failed: {}", e);
                ChatMessage::bot(FOLLOW_UP_APOLOGY)
            }
        };
        session.transcript.push(bot.clone());
        Ok(bot)
    }
}
