//! In-memory fakes of the ports, shared by the unit tests.

use crate::domain::{
    AnalysisResult, FetchedData, FileMatch, GuidanceFollowUp, Issue, IssueRef, MentorFollowUp,
    Profile, Recommendation, RepoFile, RepoRef, Repository, ReviewRequest,
};
use crate::ports::{
    AnalysisGateway, CompletionRequest, CompletionService, FollowUpGateway, GithubService,
    PortError, PortResult, RecommendationGateway,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn upstream(what: &str) -> PortError {
    PortError::Upstream {
        status: 500,
        message: format!("{what} unavailable"),
    }
}

#[derive(Default)]
pub struct FakeGithub {
    pub profile: Profile,
    pub repos: Vec<Repository>,
    pub issues: Vec<Issue>,
    pub files: HashMap<String, String>,
    pub tree: Vec<RepoFile>,
    pub search_hits: Vec<FileMatch>,
    pub raw: HashMap<String, String>,
    pub fail_user: bool,
    pub fail_repos: bool,
    pub fail_issues: bool,
    pub fail_search: bool,
    pub calls: AtomicUsize,
}

impl FakeGithub {
    /// One JavaScript repository and one open issue, as in GitHub's docs.
    pub fn octocat() -> Self {
        Self {
            profile: Profile {
                name: "The Octocat".to_string(),
                bio: String::new(),
                public_repos: 8,
                hireable: false,
            },
            repos: vec![Repository {
                name: "Hello-World".to_string(),
                description: Some("My first repository on GitHub!".to_string()),
                language: Some("JavaScript".to_string()),
                topics: vec!["demo".to_string()],
                forks_count: 9,
                stargazers_count: 80,
            }],
            issues: vec![Issue {
                title: "Found a bug".to_string(),
                body: "I'm having a problem with this.".to_string(),
                state: "open".to_string(),
                labels: vec!["bug".to_string()],
                html_url: "https://github.com/octocat/Hello-World/issues/1347".to_string(),
                created_at: None,
                number: 1347,
                is_pull_request: false,
            }],
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GithubService for FakeGithub {
    async fn get_user(&self, username: &str) -> PortResult<Profile> {
        self.record();
        if self.fail_user {
            return Err(PortError::NotFound(format!("user {username}")));
        }
        Ok(self.profile.clone())
    }

    async fn list_user_repos(&self, _username: &str) -> PortResult<Vec<Repository>> {
        self.record();
        if self.fail_repos {
            return Err(upstream("repos"));
        }
        Ok(self.repos.clone())
    }

    async fn list_issues(&self, _repo: &RepoRef) -> PortResult<Vec<Issue>> {
        self.record();
        if self.fail_issues {
            return Err(upstream("issues"));
        }
        Ok(self.issues.clone())
    }

    async fn get_issue(&self, issue: &IssueRef) -> PortResult<Issue> {
        self.record();
        self.issues
            .iter()
            .find(|i| i.number == issue.number)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("issue {}", issue.number)))
    }

    async fn get_file_content(&self, _repo: &RepoRef, path: &str) -> PortResult<String> {
        self.record();
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| PortError::NotFound(path.to_string()))
    }

    async fn list_repo_files(&self, _repo: &RepoRef) -> PortResult<Vec<RepoFile>> {
        self.record();
        Ok(self.tree.clone())
    }

    async fn search_code(&self, _repo: &RepoRef, _terms: &[String]) -> PortResult<Vec<FileMatch>> {
        self.record();
        if self.fail_search {
            return Err(PortError::RateLimited("search".to_string()));
        }
        Ok(self.search_hits.clone())
    }

    async fn fetch_raw(&self, url: &str) -> PortResult<String> {
        self.record();
        self.raw
            .get(url)
            .cloned()
            .ok_or_else(|| PortError::NotFound(url.to_string()))
    }
}

/// Scripted AI gateway. `None` replies make the corresponding call fail.
#[derive(Default)]
pub struct FakeGateway {
    pub recommendations: Option<Vec<Recommendation>>,
    pub analysis: Option<AnalysisResult>,
    pub reply: Option<String>,
    pub recommend_calls: Mutex<Vec<FetchedData>>,
    pub review_calls: Mutex<Vec<ReviewRequest>>,
    pub mentor_calls: Mutex<Vec<MentorFollowUp>>,
    pub guidance_calls: Mutex<Vec<GuidanceFollowUp>>,
}

#[async_trait]
impl RecommendationGateway for FakeGateway {
    async fn recommend(&self, data: &FetchedData) -> PortResult<Vec<Recommendation>> {
        self.recommend_calls.lock().unwrap().push(data.clone());
        self.recommendations.clone().ok_or_else(|| upstream("ai_suggest"))
    }
}

#[async_trait]
impl AnalysisGateway for FakeGateway {
    async fn analyze(&self, request: &ReviewRequest) -> PortResult<AnalysisResult> {
        self.review_calls.lock().unwrap().push(request.clone());
        self.analysis.clone().ok_or_else(|| upstream("ai_reviewer"))
    }
}

#[async_trait]
impl FollowUpGateway for FakeGateway {
    async fn mentor_follow_up(&self, request: &MentorFollowUp) -> PortResult<String> {
        self.mentor_calls.lock().unwrap().push(request.clone());
        self.reply.clone().ok_or_else(|| upstream("chatone_followup"))
    }

    async fn guidance_follow_up(&self, request: &GuidanceFollowUp) -> PortResult<String> {
        self.guidance_calls.lock().unwrap().push(request.clone());
        self.reply.clone().ok_or_else(|| upstream("chattwo_followup"))
    }
}

/// Completion service that pops scripted replies and records every request.
#[derive(Default)]
pub struct FakeCompletion {
    pub replies: Mutex<VecDeque<String>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PortError::Unexpected("no scripted reply".to_string()))
    }
}
