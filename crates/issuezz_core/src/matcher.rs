//! crates/issuezz_core/src/matcher.rs
//!
//! Picks candidate files for an issue before it is sent for analysis: files whose
//! path mentions the issue's keywords, and files whose content does (via code search).

use crate::domain::{FileMatch, Issue, RepoRef};
use crate::ports::GithubService;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const STOPWORDS: &[&str] = &[
    "the", "and", "that", "with", "have", "this", "from", "there", "would", "could", "should",
    "about", "into", "while", "where", "which", "their", "them", "they", "been", "after",
    "before", "because", "when", "what", "does", "not", "are", "for", "but", "can", "will",
    "bug", "issue", "error", "please", "also", "some", "any", "like", "just", "using", "use",
    "http", "https", "www", "com", "github",
];

const MAX_KEYWORDS: usize = 8;
const MAX_FILENAME_MATCHES: usize = 10;
const SEARCH_TERMS: usize = 3;

/// Ranks the words of an issue by how often they appear; title words count double.
pub fn issue_keywords(title: &str, body: &str) -> Vec<String> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    let mut count = |text: &str, weight: usize| {
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let cleaned = word.to_lowercase();
            if cleaned.len() < 3
                || cleaned.chars().all(|c| c.is_ascii_digit())
                || STOPWORDS.contains(&cleaned.as_str())
            {
                continue;
            }
            *frequencies.entry(cleaned).or_insert(0) += weight;
        }
    };
    count(title, 2);
    count(body, 1);

    let mut items: Vec<(String, usize)> = frequencies.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    items
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(word, _)| word)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedFiles {
    pub filename_matches: Vec<FileMatch>,
    pub content_matches: Vec<FileMatch>,
}

#[derive(Clone)]
pub struct FileMatcher {
    github: Arc<dyn GithubService>,
}

impl FileMatcher {
    pub fn new(github: Arc<dyn GithubService>) -> Self {
        Self { github }
    }

    /// Never fails: lookups that error out just contribute no matches.
    pub async fn find(&self, repo: &RepoRef, issue: &Issue) -> MatchedFiles {
        let keywords = issue_keywords(&issue.title, &issue.body);
        if keywords.is_empty() {
            return MatchedFiles::default();
        }

        let filename_matches = match self.github.list_repo_files(repo).await {
            Ok(files) => {
                let mut scored: Vec<FileMatch> = files
                    .into_iter()
                    .filter_map(|file| {
                        let path = file.path.to_lowercase();
                        let hits = keywords.iter().filter(|k| path.contains(k.as_str())).count();
                        (hits > 0).then(|| FileMatch {
                            file_name: file.path,
                            download_url: file.download_url,
                            match_score: hits as f64 / keywords.len() as f64,
                        })
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    b.match_score
                        .total_cmp(&a.match_score)
                        .then_with(|| a.file_name.cmp(&b.file_name))
                });
                scored.truncate(MAX_FILENAME_MATCHES);
                scored
            }
            Err(e) => {
                warn!("Could not list files of {}: {}", repo, e);
                Vec::new()
            }
        };

        let terms: Vec<String> = keywords.iter().take(SEARCH_TERMS).cloned().collect();
        let content_matches = match self.github.search_code(repo, &terms).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Code search in {} unavailable: {}", repo, e);
                Vec::new()
            }
        };

        info!(
            "Matched {} files by name and {} by content in {}",
            filename_matches.len(),
            content_matches.len(),
            repo
        );
        MatchedFiles {
            filename_matches,
            content_matches,
        }
    }
}
