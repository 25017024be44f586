//! Port fakes and state builders for the handler tests.

use crate::config::Config;
use crate::web::state::AppState;
use async_trait::async_trait;
use axum::response::{IntoResponse, Response};
use issuezz_core::{
    domain::{FileMatch, Issue, IssueRef, Profile, RepoFile, RepoRef, Repository},
    ports::{CompletionRequest, CompletionService, GithubService, PortError, PortResult},
    Assistant, CacheSettings,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct StubGithub;

#[async_trait]
impl GithubService for StubGithub {
    async fn get_user(&self, username: &str) -> PortResult<Profile> {
        if username == "ghost" {
            return Err(PortError::NotFound(format!("user {username}")));
        }
        Ok(Profile {
            name: "The Octocat".to_string(),
            public_repos: 8,
            ..Default::default()
        })
    }

    async fn list_user_repos(&self, _username: &str) -> PortResult<Vec<Repository>> {
        Ok(vec![Repository {
            name: "Hello-World".to_string(),
            language: Some("JavaScript".to_string()),
            ..Default::default()
        }])
    }

    async fn list_issues(&self, repo: &RepoRef) -> PortResult<Vec<Issue>> {
        Ok(vec![Issue {
            title: "Found a bug".to_string(),
            body: "I'm having a problem with this.".to_string(),
            state: "open".to_string(),
            html_url: format!("https://github.com/{}/issues/1347", repo),
            number: 1347,
            ..Default::default()
        }])
    }

    async fn get_issue(&self, issue: &IssueRef) -> PortResult<Issue> {
        Ok(Issue {
            title: "Found a bug".to_string(),
            number: issue.number,
            ..Default::default()
        })
    }

    async fn get_file_content(&self, _repo: &RepoRef, path: &str) -> PortResult<String> {
        Ok(format!("// {path}"))
    }

    async fn list_repo_files(&self, _repo: &RepoRef) -> PortResult<Vec<RepoFile>> {
        Ok(Vec::new())
    }

    async fn search_code(&self, _repo: &RepoRef, _terms: &[String]) -> PortResult<Vec<FileMatch>> {
        Ok(Vec::new())
    }

    async fn fetch_raw(&self, url: &str) -> PortResult<String> {
        Err(PortError::NotFound(url.to_string()))
    }
}

/// Pops one scripted reply per completion.
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, _request: CompletionRequest) -> PortResult<String> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| PortError::Upstream {
                status: 503,
                message: "no completion available".to_string(),
            })
    }
}

/// State running the in-process assistant over scripted completions.
pub fn state_with_replies(replies: &[&str]) -> Arc<AppState> {
    let github: Arc<dyn GithubService> = Arc::new(StubGithub);
    let assistant = Arc::new(Assistant::new(
        Arc::new(ScriptedCompletion::new(replies)),
        github.clone(),
        CacheSettings {
            ttl: Duration::ZERO,
            capacity: 1,
        },
    ));
    Arc::new(AppState::new(
        Arc::new(Config::default()),
        github,
        Some(assistant.clone()),
        assistant,
    ))
}

pub async fn body_json(response: impl IntoResponse) -> (axum::http::StatusCode, serde_json::Value) {
    let response: Response = response.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}
