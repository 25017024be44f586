//! crates/issuezz_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the flows
//! independent of the concrete GitHub client, AI gateway, and completion provider.

use crate::domain::{
    AnalysisResult, FetchedData, FileMatch, GuidanceFollowUp, Issue, IssueRef,
    MentorFollowUp, Profile, Recommendation, RepoFile, RepoRef, Repository, ReviewRequest,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Rejected before any network call was attempted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Upstream request failed with status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// True for failures reported by a remote HTTP service.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PortError::NotFound(_) | PortError::RateLimited(_) | PortError::Upstream { .. }
        )
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait GithubService: Send + Sync {
    async fn get_user(&self, username: &str) -> PortResult<Profile>;

    async fn list_user_repos(&self, username: &str) -> PortResult<Vec<Repository>>;

    async fn list_issues(&self, repo: &RepoRef) -> PortResult<Vec<Issue>>;

    async fn get_issue(&self, issue: &IssueRef) -> PortResult<Issue>;

    /// Returns the decoded text of a file from the contents API.
    async fn get_file_content(&self, repo: &RepoRef, path: &str) -> PortResult<String>;

    /// Lists every file path in the default branch.
    async fn list_repo_files(&self, repo: &RepoRef) -> PortResult<Vec<RepoFile>>;

    /// Finds files whose content mentions any of the terms.
    async fn search_code(&self, repo: &RepoRef, terms: &[String]) -> PortResult<Vec<FileMatch>>;

    /// Downloads raw text from an absolute URL (e.g. a file's `download_url`).
    async fn fetch_raw(&self, url: &str) -> PortResult<String>;
}

#[async_trait]
pub trait RecommendationGateway: Send + Sync {
    /// Suggests beginner-friendly issues. An empty list is a valid answer.
    async fn recommend(&self, data: &FetchedData) -> PortResult<Vec<Recommendation>>;
}

#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, request: &ReviewRequest) -> PortResult<AnalysisResult>;
}

#[async_trait]
pub trait FollowUpGateway: Send + Sync {
    async fn mentor_follow_up(&self, request: &MentorFollowUp) -> PortResult<String>;

    async fn guidance_follow_up(&self, request: &GuidanceFollowUp) -> PortResult<String>;
}

/// Everything the flows need from the AI side, behind one object.
pub trait AiGateway: RecommendationGateway + AnalysisGateway + FollowUpGateway {}

impl<T> AiGateway for T where T: RecommendationGateway + AnalysisGateway + FollowUpGateway {}

/// Which AI endpoint a completion serves; adapters pick a model per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPurpose {
    Suggest,
    Review,
    FollowUp,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub purpose: CompletionPurpose,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Produces the model's text reply for a single prompt.
    async fn complete(&self, request: CompletionRequest) -> PortResult<String>;
}
