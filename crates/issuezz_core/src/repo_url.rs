//! Extracts repository and issue coordinates from user-supplied GitHub URLs.

use crate::domain::{IssueRef, RepoRef};
use crate::ports::{PortError, PortResult};
use once_cell::sync::Lazy;
use regex::Regex;

static REPO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"github\.com/([^/\s?#]+)/([^/\s?#]+)").expect("valid regex"));

static ISSUE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"github\.com/([^/\s?#]+)/([^/\s?#]+)/issues/(\d+)").expect("valid regex")
});

/// Finds `github.com/<owner>/<repo>` anywhere in the input.
pub fn parse_repo_url(url: &str) -> PortResult<RepoRef> {
    let caps = REPO_PATTERN.captures(url).ok_or_else(|| {
        PortError::InvalidRepoUrl(format!(
            "'{}' does not look like https://github.com/<owner>/<repo>",
            url.trim()
        ))
    })?;
    Ok(RepoRef::new(&caps[1], trim_git_suffix(&caps[2])))
}

/// Finds `github.com/<owner>/<repo>/issues/<number>` anywhere in the input.
pub fn parse_issue_url(url: &str) -> PortResult<IssueRef> {
    let caps = ISSUE_PATTERN.captures(url).ok_or_else(|| {
        PortError::InvalidRepoUrl(format!(
            "'{}' does not look like https://github.com/<owner>/<repo>/issues/<number>",
            url.trim()
        ))
    })?;
    let number = caps[3]
        .parse::<u64>()
        .map_err(|e| PortError::InvalidRepoUrl(format!("bad issue number: {}", e)))?;
    Ok(IssueRef {
        repo: RepoRef::new(&caps[1], trim_git_suffix(&caps[2])),
        number,
    })
}

fn trim_git_suffix(name: &str) -> &str {
    match name.strip_suffix(".git") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_owner_and_repo() {
        let repo = parse_repo_url("https://github.com/octocat/Hello-World").unwrap();
        assert_eq!(repo, RepoRef::new("octocat", "Hello-World"));
    }

    #[test]
    fn tolerates_surrounding_text_and_trailing_segments() {
        let repo =
            parse_repo_url("see github.com/rust-lang/rust/issues?q=is%3Aopen please").unwrap();
        assert_eq!(repo, RepoRef::new("rust-lang", "rust"));

        let repo = parse_repo_url("git clone https://github.com/tokio-rs/axum.git").unwrap();
        assert_eq!(repo, RepoRef::new("tokio-rs", "axum"));
    }

    #[test]
    fn too_few_segments_is_a_url_error() {
        for input in ["https://github.com/octocat", "https://github.com/", "octocat/repo", ""] {
            let err = parse_repo_url(input).unwrap_err();
            assert!(matches!(err, PortError::InvalidRepoUrl(_)), "{input}");
            assert!(!err.is_upstream());
        }
    }

    #[test]
    fn parses_issue_urls() {
        let issue = parse_issue_url("https://github.com/octocat/Hello-World/issues/42").unwrap();
        assert_eq!(issue.repo, RepoRef::new("octocat", "Hello-World"));
        assert_eq!(issue.number, 42);
        assert_eq!(issue.html_url(), "https://github.com/octocat/Hello-World/issues/42");
    }

    #[test]
    fn rejects_repo_url_without_issue_number() {
        let err = parse_issue_url("https://github.com/octocat/Hello-World/pulls/1").unwrap_err();
        assert!(matches!(err, PortError::InvalidRepoUrl(_)));
    }
}
