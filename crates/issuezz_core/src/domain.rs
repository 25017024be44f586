//! crates/issuezz_core/src/domain.rs
//!
//! Defines the core data structures for the application: the normalized GitHub
//! shapes, the chat transcript entries, and the payloads exchanged with the AI
//! endpoints. Field names follow the JSON wire format used by those endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

//=========================================================================================
// GitHub Data
//=========================================================================================

/// A contributor's public GitHub profile, fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub hireable: bool,
}

/// A repository owned by the contributor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub stargazers_count: u32,
}

/// An issue from the target repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub number: u64,
    /// The issues endpoint also lists pull requests; they never count as issues.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_pull_request: bool,
}

/// Everything the mentor flow gathers before asking for recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedData {
    pub profile: Profile,
    pub repositories: Vec<Repository>,
    pub repoissues: Vec<Issue>,
    pub issue_owner: String,
    pub issue_repo: String,
}

impl FetchedData {
    /// Distinct languages and topics across the contributor's repositories.
    pub fn technical_context(&self) -> TechnicalContext {
        TechnicalContext::from_repositories(&self.repositories)
    }
}

/// A repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A single issue identified by its repository and number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub repo: RepoRef,
    pub number: u64,
}

impl IssueRef {
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/issues/{}", self.repo, self.number)
    }
}

/// A file path inside a repository, with a URL its raw text can be downloaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFile {
    pub path: String,
    pub download_url: String,
}

//=========================================================================================
// Chat Transcript
//=========================================================================================

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Bot,
    User,
}

/// A single transcript entry. Content is markdown-ish text meant for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "type")]
    pub author: Author,
    pub content: String,
}

impl ChatMessage {
    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            author: Author::Bot,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            content: content.into(),
        }
    }
}

//=========================================================================================
// AI Results
//=========================================================================================

/// One beginner-friendly issue suggested by the recommendation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub issue_title: String,
    #[serde(default)]
    pub issue_url: String,
    #[serde(default)]
    pub difficulty_level: String,
    #[serde(default)]
    pub learning_opportunities: String,
    #[serde(default)]
    pub why_recommended: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_skills_needed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub main_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
}

/// The body of a recommendation reply. A missing list is the same as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub issue_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedFile {
    pub file_name: String,
    #[serde(default)]
    pub combined_probability: f64,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(default)]
    pub analyzed_files: Vec<AnalyzedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecommendations {
    #[serde(default)]
    pub priority_order: Vec<String>,
    #[serde(default)]
    pub specific_changes: String,
    #[serde(default)]
    pub additional_context: String,
}

/// The structured review of an issue produced by the analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub repository_analysis: RepositoryAnalysis,
    #[serde(default)]
    pub file_analysis: FileAnalysis,
    #[serde(default)]
    pub recommendations: AnalysisRecommendations,
}

//=========================================================================================
// Gateway Payloads
//=========================================================================================

/// A candidate file for an issue, found by name or by content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMatch {
    pub file_name: String,
    pub download_url: String,
    pub match_score: f64,
}

/// Raw text of a repository file, kept for code explanation follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalContext {
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

impl TechnicalContext {
    /// Collects the distinct languages and topics of a repository list.
    pub fn from_repositories(repositories: &[Repository]) -> Self {
        let languages: BTreeSet<&str> = repositories
            .iter()
            .filter_map(|repo| repo.language.as_deref())
            .filter(|lang| !lang.is_empty())
            .collect();
        let topics: BTreeSet<&str> = repositories
            .iter()
            .flat_map(|repo| repo.topics.iter().map(String::as_str))
            .collect();

        Self {
            languages: languages.into_iter().map(str::to_string).collect(),
            topics: topics.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Request body of the analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub content_matches: Vec<FileMatch>,
    #[serde(default)]
    pub filename_matches: Vec<FileMatch>,
    pub owner: String,
    pub repo: String,
    pub issue_url: String,
    #[serde(default)]
    pub issue_title: String,
    #[serde(default)]
    pub issue_body: String,
}

/// What kind of answer a guidance follow-up asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    CodeExplanation,
    Workflow,
    #[default]
    #[serde(other)]
    General,
}

/// Request body of the mentor follow-up endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentorFollowUp {
    #[serde(default)]
    pub user_profile: Profile,
    #[serde(default)]
    pub previous_messages: Vec<ChatMessage>,
    pub current_query: String,
    #[serde(default)]
    pub user_repos: Vec<Repository>,
    #[serde(default)]
    pub technical_context: TechnicalContext,
}

/// Request body of the guidance follow-up endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceFollowUp {
    #[serde(default)]
    pub previous_messages: Vec<ChatMessage>,
    pub current_query: String,
    /// Only sent along with code explanation requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_contents: Option<Vec<FileContent>>,
    #[serde(default)]
    pub analysis_context: AnalysisResult,
    #[serde(default)]
    pub request_type: RequestType,
    #[serde(default)]
    pub technical_context: TechnicalContext,
}
