//! services/api/src/adapters/github.rs
//!
//! This module contains the adapter for GitHub's public REST API.
//! It implements the `GithubService` port from the `core` crate, normalizing the raw
//! JSON records into the core's compact domain shapes.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use issuezz_core::{
    domain::{FileMatch, Issue, IssueRef, Profile, RepoFile, RepoRef, Repository},
    ports::{GithubService, PortError, PortResult},
};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
const MAX_ERROR_BODY: usize = 300;
const MAX_LOGIN_LEN: usize = 39;

/// GitHub logins are ASCII letters, digits and hyphens; anything else would leak into
/// the request path.
fn checked_login(username: &str) -> PortResult<&str> {
    let valid = !username.is_empty()
        && username.len() <= MAX_LOGIN_LEN
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(username)
    } else {
        Err(PortError::InvalidInput(format!(
            "'{}' is not a valid GitHub username.",
            username
        )))
    }
}

//=========================================================================================
// Raw API Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    name: Option<String>,
    bio: Option<String>,
    #[serde(default)]
    public_repos: u32,
    hireable: Option<bool>,
}

#[derive(Deserialize)]
struct RepoRecord {
    name: String,
    description: Option<String>,
    language: Option<String>,
    topics: Option<Vec<String>>,
    #[serde(default)]
    forks_count: u32,
    #[serde(default)]
    stargazers_count: u32,
}

#[derive(Deserialize)]
struct LabelRecord {
    name: String,
}

#[derive(Deserialize)]
struct IssueRecord {
    title: String,
    body: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    labels: Vec<LabelRecord>,
    html_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    number: u64,
    pull_request: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ContentRecord {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TreeRecord {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct SearchItem {
    path: String,
}

#[derive(Deserialize)]
struct SearchRecord {
    #[serde(default)]
    items: Vec<SearchItem>,
}

impl From<UserRecord> for Profile {
    fn from(record: UserRecord) -> Self {
        Self {
            name: record.name.unwrap_or_default(),
            bio: record.bio.unwrap_or_default(),
            public_repos: record.public_repos,
            hireable: record.hireable.unwrap_or(false),
        }
    }
}

impl From<RepoRecord> for Repository {
    fn from(record: RepoRecord) -> Self {
        Self {
            name: record.name,
            description: record.description,
            language: record.language,
            topics: record.topics.unwrap_or_default(),
            forks_count: record.forks_count,
            stargazers_count: record.stargazers_count,
        }
    }
}

fn normalize_issue(record: IssueRecord, repo: &RepoRef) -> Issue {
    let html_url = record.html_url.unwrap_or_else(|| {
        IssueRef {
            repo: repo.clone(),
            number: record.number,
        }
        .html_url()
    });
    Issue {
        title: record.title,
        body: record.body.unwrap_or_default(),
        state: record.state,
        labels: record.labels.into_iter().map(|l| l.name).collect(),
        html_url,
        created_at: record.created_at,
        number: record.number,
        is_pull_request: record.pull_request.is_some(),
    }
}

/// Maps a non-success response onto the port's error taxonomy.
fn error_for_status(status: StatusCode, headers: &HeaderMap, body: &str, operation: &str) -> PortError {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();

    match status {
        StatusCode::NOT_FOUND => PortError::NotFound(operation.to_string()),
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited(operation.to_string()),
        StatusCode::FORBIDDEN if exhausted => PortError::RateLimited(operation.to_string()),
        _ => PortError::Upstream {
            status: status.as_u16(),
            message: format!("github {} failed: {}", operation, snippet),
        },
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GithubService` over GitHub's REST API.
#[derive(Clone)]
pub struct GithubAdapter {
    http: reqwest::Client,
    /// Client without credentials, for downloads from `raw_base`.
    raw_http: reqwest::Client,
    api_base: String,
    raw_base: String,
    has_token: bool,
}

impl GithubAdapter {
    /// Creates a new `GithubAdapter`. A token, when given, is sent as a bearer token.
    pub fn new(api_base: &str, token: Option<&str>, timeout: Duration) -> PortResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("issuezz"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| PortError::InvalidInput(format!("invalid GitHub token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to create GitHub client: {}", e)))?;
        let raw_http = reqwest::Client::builder()
            .user_agent("issuezz")
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to create download client: {}", e)))?;

        Ok(Self {
            http,
            raw_http,
            api_base: api_base.trim_end_matches('/').to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            has_token: token.is_some(),
        })
    }

    /// Overrides the raw-content host: where download URLs point, and the only host
    /// `fetch_raw` will download from.
    pub fn with_raw_base(mut self, raw_base: &str) -> Self {
        self.raw_base = raw_base.trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn raw_url(&self, repo: &RepoRef, path: &str) -> String {
        format!("{}/{}/{}/HEAD/{}", self.raw_base, repo.owner, repo.name, path)
    }

    fn check_raw_url(&self, url: &str) -> PortResult<()> {
        let prefix = format!("{}/", self.raw_base);
        if url.starts_with(&prefix) {
            Ok(())
        } else {
            Err(PortError::InvalidInput(format!(
                "refusing to download {}: not under {}",
                url, self.raw_base
            )))
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> PortResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("github {} request failed: {}", operation, e)))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        warn!("GitHub {} returned {}", operation, status);
        Err(error_for_status(status, &headers, &body, operation))
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> PortResult<T> {
        self.send(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PortError::Malformed(format!("failed to decode github {}: {}", operation, e)))
    }
}

//=========================================================================================
// `GithubService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GithubService for GithubAdapter {
    async fn get_user(&self, username: &str) -> PortResult<Profile> {
        let url = self.url(&format!("/users/{}", checked_login(username)?));
        let record: UserRecord = self.get_json("user profile", self.http.get(url)).await?;
        Ok(record.into())
    }

    async fn list_user_repos(&self, username: &str) -> PortResult<Vec<Repository>> {
        let request = self
            .http
            .get(self.url(&format!("/users/{}/repos", checked_login(username)?)))
            .query(&[("per_page", "100")]);
        let records: Vec<RepoRecord> = self.get_json("repository list", request).await?;
        Ok(records.into_iter().map(Repository::from).collect())
    }

    async fn list_issues(&self, repo: &RepoRef) -> PortResult<Vec<Issue>> {
        let request = self
            .http
            .get(self.url(&format!("/repos/{}/{}/issues", repo.owner, repo.name)))
            .query(&[("state", "open"), ("per_page", "100")]);
        let records: Vec<IssueRecord> = self.get_json("issue list", request).await?;
        Ok(records
            .into_iter()
            .map(|record| normalize_issue(record, repo))
            .collect())
    }

    async fn get_issue(&self, issue: &IssueRef) -> PortResult<Issue> {
        let request = self.http.get(self.url(&format!(
            "/repos/{}/{}/issues/{}",
            issue.repo.owner, issue.repo.name, issue.number
        )));
        let record: IssueRecord = self.get_json("issue", request).await?;
        Ok(normalize_issue(record, &issue.repo))
    }

    async fn get_file_content(&self, repo: &RepoRef, path: &str) -> PortResult<String> {
        let request = self.http.get(self.url(&format!(
            "/repos/{}/{}/contents/{}",
            repo.owner,
            repo.name,
            path.trim_start_matches('/')
        )));
        let record: ContentRecord = self.get_json("file content", request).await?;
        let encoded: String = record
            .content
            .ok_or_else(|| PortError::Malformed(format!("{} has no inline content", path)))?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| PortError::Malformed(format!("{} is not valid base64: {}", path, e)))?;
        String::from_utf8(bytes)
            .map_err(|_| PortError::Malformed(format!("{} is not a text file", path)))
    }

    async fn list_repo_files(&self, repo: &RepoRef) -> PortResult<Vec<RepoFile>> {
        let request = self
            .http
            .get(self.url(&format!("/repos/{}/{}/git/trees/HEAD", repo.owner, repo.name)))
            .query(&[("recursive", "1")]);
        let record: TreeRecord = self.get_json("file tree", request).await?;
        Ok(record
            .tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| RepoFile {
                download_url: self.raw_url(repo, &entry.path),
                path: entry.path,
            })
            .collect())
    }

    async fn search_code(&self, repo: &RepoRef, terms: &[String]) -> PortResult<Vec<FileMatch>> {
        if !self.has_token {
            return Err(PortError::InvalidInput(
                "code search requires GITHUB_TOKEN".to_string(),
            ));
        }
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("{} repo:{}/{}", terms.join(" OR "), repo.owner, repo.name);
        let request = self
            .http
            .get(self.url("/search/code"))
            .query(&[("q", query.as_str()), ("per_page", "10")]);
        let record: SearchRecord = self.get_json("code search", request).await?;

        // results arrive best first; score them by rank
        let total = record.items.len();
        debug!("Code search in {} returned {} hits", repo, total);
        Ok(record
            .items
            .into_iter()
            .enumerate()
            .map(|(rank, item)| FileMatch {
                download_url: self.raw_url(repo, &item.path),
                file_name: item.path,
                match_score: 1.0 - rank as f64 / total as f64,
            })
            .collect())
    }

    async fn fetch_raw(&self, url: &str) -> PortResult<String> {
        self.check_raw_url(url)?;
        self.send("raw download", self.raw_http.get(url))
            .await?
            .text()
            .await
            .map_err(|e| PortError::Malformed(format!("failed to read {}: {}", url, e)))
    }
}
