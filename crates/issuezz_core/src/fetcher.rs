//! crates/issuezz_core/src/fetcher.rs
//!
//! Gathers a contributor's profile, repositories, and the issues of a target
//! repository into one `FetchedData` record.

use crate::domain::FetchedData;
use crate::ports::{GithubService, PortError, PortResult};
use crate::repo_url::parse_repo_url;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

/// What happens when listing the target repository's issues fails.
///
/// Profile and repository failures always abort; the issue list is allowed to
/// degrade to empty unless the policy says otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueFetchPolicy {
    /// Log the failure and continue with no issues.
    #[default]
    SoftDegrade,
    /// Abort the whole fetch, like the profile and repository calls.
    Strict,
}

impl FromStr for IssueFetchPolicy {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soft" | "soft_degrade" | "soft-degrade" => Ok(IssueFetchPolicy::SoftDegrade),
            "strict" => Ok(IssueFetchPolicy::Strict),
            other => Err(PortError::InvalidInput(format!(
                "'{}' is not an issue fetch policy (expected 'soft' or 'strict')",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct GithubFetcher {
    github: Arc<dyn GithubService>,
    policy: IssueFetchPolicy,
}

impl GithubFetcher {
    pub fn new(github: Arc<dyn GithubService>, policy: IssueFetchPolicy) -> Self {
        Self { github, policy }
    }

    pub fn policy(&self) -> IssueFetchPolicy {
        self.policy
    }

    /// Fetches everything the mentor flow needs for `username` and `repo_url`.
    pub async fn fetch(&self, username: &str, repo_url: &str) -> PortResult<FetchedData> {
        let username = username.trim();
        let repo_url = repo_url.trim();
        if username.is_empty() {
            return Err(PortError::InvalidInput(
                "Please enter a valid GitHub username.".to_string(),
            ));
        }
        if repo_url.is_empty() {
            return Err(PortError::InvalidInput(
                "Please enter a valid repository URL.".to_string(),
            ));
        }

        let profile = self.github.get_user(username).await?;
        let repositories = self.github.list_user_repos(username).await?;
        info!("Fetched {} repositories for {}", repositories.len(), username);

        let target = parse_repo_url(repo_url)?;
        let repoissues = match self.github.list_issues(&target).await {
            Ok(issues) => issues,
            Err(e) if self.policy == IssueFetchPolicy::SoftDegrade => {
                warn!("Failed to fetch issues for {}: {}. Continuing without issues.", target, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(FetchedData {
            profile,
            repositories,
            repoissues,
            issue_owner: target.owner,
            issue_repo: target.name,
        })
    }
}
