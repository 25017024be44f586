//! crates/issuezz_core/src/assistant.rs
//!
//! The logic behind the four AI endpoints: assemble a prompt from the request, ask
//! the completion service, and turn the reply into structured data. The assistant
//! also implements the gateway ports, so flows can use it in-process.

use crate::cache::{CacheSettings, ResponseCache};
use crate::classify::{extract_issue_context, guidance_categories};
use crate::domain::{
    AnalysisResult, FetchedData, FileMatch, GuidanceFollowUp, MentorFollowUp, Recommendation,
    Recommendations, RequestType, ReviewRequest,
};
use crate::ports::{
    AnalysisGateway, CompletionPurpose, CompletionRequest, CompletionService, FollowUpGateway,
    GithubService, PortError, PortResult, RecommendationGateway,
};
use crate::prompts::{self, MentorPromptInput, ReviewFile};
use async_trait::async_trait;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, info};

pub const MAX_RECOMMENDATIONS: usize = 3;
const MAX_REVIEW_FILES: usize = 3;
const MAX_CHARS_PER_FILE: usize = 1000;
const MAX_ISSUE_BODY_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = "... (truncated)";

//=========================================================================================
// Reply Parsing Helpers
//=========================================================================================

/// Cuts `text` to at most `max` characters, reporting whether anything was dropped.
pub fn truncate_chars(text: &str, max: usize) -> (&str, bool) {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

/// Finds the JSON object in a model reply that may be wrapped in prose or code fences.
pub fn extract_json_block(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

fn parse_reply<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    serde_json::from_str(extract_json_block(raw)).map_err(|e| {
        error!("Model reply was not the expected JSON: {}", e);
        PortError::Malformed(format!("model reply was not valid JSON: {}", e))
    })
}

//=========================================================================================
// The Assistant
//=========================================================================================

pub struct Assistant {
    completion: Arc<dyn CompletionService>,
    github: Arc<dyn GithubService>,
    recommendation_cache: ResponseCache<Vec<Recommendation>>,
    analysis_cache: ResponseCache<AnalysisResult>,
}

impl Assistant {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        github: Arc<dyn GithubService>,
        cache: CacheSettings,
    ) -> Self {
        Self {
            completion,
            github,
            recommendation_cache: ResponseCache::new(cache),
            analysis_cache: ResponseCache::new(cache),
        }
    }

    /// Picks at most three beginner-friendly issues out of `data.repoissues`.
    pub async fn suggest(&self, data: &FetchedData) -> PortResult<Vec<Recommendation>> {
        let issues: Vec<_> = data.repoissues.iter().filter(|i| !i.is_pull_request).collect();
        if issues.is_empty() {
            info!("No open issues to recommend from {}/{}", data.issue_owner, data.issue_repo);
            return Ok(Vec::new());
        }

        let key = ResponseCache::<Vec<Recommendation>>::key_for(data);
        if let Some(hit) = self.cached(&self.recommendation_cache, &key).await {
            return Ok(hit);
        }

        let prompt = prompts::suggest_prompt(
            &data.technical_context(),
            &issues,
            &data.issue_owner,
            &data.issue_repo,
        );
        let raw = self
            .completion
            .complete(CompletionRequest {
                purpose: CompletionPurpose::Suggest,
                system: None,
                prompt,
                max_tokens: 1000,
                temperature: 0.7,
            })
            .await?;

        let mut parsed: Recommendations = parse_reply(&raw)?;
        parsed.recommendations.truncate(MAX_RECOMMENDATIONS);
        info!("Model recommended {} issues", parsed.recommendations.len());

        if let Some(key) = key {
            self.recommendation_cache
                .insert(key, parsed.recommendations.clone())
                .await;
        }
        Ok(parsed.recommendations)
    }

    /// Reviews an issue against its best-matching files.
    pub async fn review(&self, request: &ReviewRequest) -> PortResult<AnalysisResult> {
        let key = ResponseCache::<AnalysisResult>::key_for(request);
        if let Some(hit) = self.cached(&self.analysis_cache, &key).await {
            return Ok(hit);
        }

        let mut candidates: Vec<&FileMatch> = request
            .content_matches
            .iter()
            .chain(request.filename_matches.iter())
            .collect();
        candidates.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        candidates.truncate(MAX_REVIEW_FILES);

        let contents = join_all(
            candidates
                .iter()
                .map(|f| self.fetch_excerpt(&f.download_url)),
        )
        .await;
        let files: Vec<ReviewFile<'_>> = candidates
            .iter()
            .zip(contents)
            .map(|(f, content)| ReviewFile {
                file_name: &f.file_name,
                match_score: f.match_score,
                content,
            })
            .collect();

        let (body, cut) = truncate_chars(&request.issue_body, MAX_ISSUE_BODY_CHARS);
        let body = if cut {
            format!("{}{}", body, TRUNCATION_MARKER)
        } else {
            body.to_string()
        };

        let prompt = prompts::review_prompt(
            &request.owner,
            &request.repo,
            &request.issue_title,
            &body,
            &files,
        );
        let raw = self
            .completion
            .complete(CompletionRequest {
                purpose: CompletionPurpose::Review,
                system: None,
                prompt,
                max_tokens: 2000,
                temperature: 0.3,
            })
            .await?;

        let analysis: AnalysisResult = parse_reply(&raw)?;
        info!(
            "Analysis of {} names {} files",
            request.issue_url,
            analysis.file_analysis.analyzed_files.len()
        );
        if let Some(key) = key {
            self.analysis_cache.insert(key, analysis.clone()).await;
        }
        Ok(analysis)
    }

    /// Answers a follow-up in the beginner mentor conversation.
    pub async fn mentor_reply(&self, request: &MentorFollowUp) -> PortResult<String> {
        let categories = guidance_categories(&request.current_query);
        let issue_context = extract_issue_context(&request.previous_messages);
        let prompt = prompts::mentor_prompt(&MentorPromptInput {
            technical: &request.technical_context,
            public_repos: request.user_profile.public_repos,
            categories: &categories,
            issue_context: &issue_context,
            history: &request.previous_messages,
            question: &request.current_query,
        });

        let reply = self
            .completion
            .complete(CompletionRequest {
                purpose: CompletionPurpose::FollowUp,
                system: None,
                prompt,
                max_tokens: 1000,
                temperature: 0.7,
            })
            .await?;
        Ok(reply.trim().to_string())
    }

    /// Answers a follow-up in the issue guidance conversation.
    pub async fn guidance_reply(&self, request: &GuidanceFollowUp) -> PortResult<String> {
        let analysis = &request.analysis_context;
        let prompt = match request.request_type {
            RequestType::CodeExplanation => prompts::code_explanation_prompt(
                analysis,
                request.file_contents.as_deref().unwrap_or_default(),
                &request.current_query,
            ),
            RequestType::Workflow => prompts::workflow_prompt(
                analysis,
                &request.previous_messages,
                &request.current_query,
            ),
            RequestType::General => prompts::general_prompt(
                analysis,
                &request.previous_messages,
                &request.current_query,
            ),
        };
        let system = prompts::guidance_system_prompt(
            &request.technical_context.languages,
            request.request_type == RequestType::CodeExplanation,
        );

        let reply = self
            .completion
            .complete(CompletionRequest {
                purpose: CompletionPurpose::FollowUp,
                system: Some(system),
                prompt,
                max_tokens: 2000,
                temperature: 0.7,
            })
            .await?;
        Ok(reply.trim().to_string())
    }

    async fn cached<V: Clone>(&self, cache: &ResponseCache<V>, key: &Option<String>) -> Option<V> {
        match key {
            Some(key) => cache.get(key).await,
            None => None,
        }
    }

    async fn fetch_excerpt(&self, url: &str) -> String {
        match self.github.fetch_raw(url).await {
            Ok(text) => match truncate_chars(&text, MAX_CHARS_PER_FILE) {
                (excerpt, true) => format!("{}\n{}", excerpt, TRUNCATION_MARKER),
                (excerpt, false) => excerpt.to_string(),
            },
            Err(e) => {
                error!("Failed to fetch file content from {}: {}", url, e);
                "Error fetching file.".to_string()
            }
        }
    }
}

//=========================================================================================
// Gateway Trait Implementations
//=========================================================================================

#[async_trait]
impl RecommendationGateway for Assistant {
    async fn recommend(&self, data: &FetchedData) -> PortResult<Vec<Recommendation>> {
        self.suggest(data).await
    }
}

#[async_trait]
impl AnalysisGateway for Assistant {
    async fn analyze(&self, request: &ReviewRequest) -> PortResult<AnalysisResult> {
        self.review(request).await
    }
}

#[async_trait]
impl FollowUpGateway for Assistant {
    async fn mentor_follow_up(&self, request: &MentorFollowUp) -> PortResult<String> {
        self.mentor_reply(request).await
    }

    async fn guidance_follow_up(&self, request: &GuidanceFollowUp) -> PortResult<String> {
        self.guidance_reply(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatMessage, FileContent, Issue};
    use crate::test_support::{FakeCompletion, FakeGithub};

    fn assistant(completion: Arc<FakeCompletion>, github: FakeGithub) -> Assistant {
        Assistant::new(
            completion,
            Arc::new(github),
            CacheSettings {
                ttl: std::time::Duration::from_secs(60),
                capacity: 16,
            },
        )
    }

    fn data_with_issues(issues: Vec<Issue>) -> FetchedData {
        FetchedData {
            repoissues: issues,
            issue_owner: "octocat".to_string(),
            issue_repo: "Hello-World".to_string(),
            ..Default::default()
        }
    }

    fn issue(number: u64, pr: bool) -> Issue {
        Issue {
            title: format!("Issue {number}"),
            number,
            is_pull_request: pr,
            ..Default::default()
        }
    }

    #[test]
    fn extracts_fenced_json() {
        assert_eq!(extract_json_block("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json_block("Sure! {\"a\": {\"b\": 2}} hope it helps"), "{\"a\": {\"b\": 2}}");
        assert_eq!(extract_json_block("no json"), "no json");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("hi", 5), ("hi", false));
    }

    #[tokio::test]
    async fn suggest_skips_model_without_issues() {
        let completion = Arc::new(FakeCompletion::default());
        let assistant = assistant(completion.clone(), FakeGithub::default());
        let recs = assistant
            .suggest(&data_with_issues(vec![issue(1, true)]))
            .await
            .unwrap();
        assert!(recs.is_empty());
        assert_eq!(completion.request_count(), 0);
    }

    #[tokio::test]
    async fn suggest_caps_recommendations_and_caches() {
        let reply = r#"```json
{"recommendations": [
  {"issue_title": "a", "issue_url": "u1", "difficulty_level": "Beginner", "why_recommended": "x"},
  {"issue_title": "b"}, {"issue_title": "c"}, {"issue_title": "d"}
]}
```"#;
        let completion = Arc::new(FakeCompletion::with_replies(&[reply]));
        let assistant = assistant(completion.clone(), FakeGithub::default());
        let data = data_with_issues(vec![issue(1, false), issue(2, true)]);

        let recs = assistant.suggest(&data).await.unwrap();
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(recs[0].issue_url, "u1");
        let prompt = completion.requests.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains("Issue 1"));
        assert!(!prompt.contains("Issue 2"));

        // second call is served from the cache
        let again = assistant.suggest(&data).await.unwrap();
        assert_eq!(again, recs);
        assert_eq!(completion.request_count(), 1);
    }

    #[tokio::test]
    async fn suggest_reports_unparseable_reply() {
        let completion = Arc::new(FakeCompletion::with_replies(&["I cannot help with that"]));
        let assistant = assistant(completion, FakeGithub::default());
        let err = assistant
            .suggest(&data_with_issues(vec![issue(1, false)]))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Malformed(_)));
    }

    #[tokio::test]
    async fn review_uses_top_files_and_placeholders() {
        let reply = r#"{"repository_analysis": {"purpose": "demo", "tech_stack": ["Rust"]},
            "file_analysis": {"analyzed_files": [{"file_name": "src/a.rs", "combined_probability": 80, "reason": "r"}]},
            "recommendations": {"priority_order": ["src/a.rs"], "specific_changes": "c", "additional_context": "x"}}"#;
        let completion = Arc::new(FakeCompletion::with_replies(&[reply]));
        let mut github = FakeGithub::default();
        github
            .raw
            .insert("https://raw/a".to_string(), "a".repeat(1500));
        let assistant = assistant(completion.clone(), github);

        let file = |name: &str, url: &str, score: f64| FileMatch {
            file_name: name.to_string(),
            download_url: url.to_string(),
            match_score: score,
        };
        let request = ReviewRequest {
            content_matches: vec![file("src/a.rs", "https://raw/a", 0.9), file("low.rs", "u", 0.1)],
            filename_matches: vec![
                file("src/b.rs", "https://raw/missing", 0.5),
                file("src/c.rs", "https://raw/missing", 0.4),
            ],
            owner: "o".to_string(),
            repo: "r".to_string(),
            issue_url: "https://github.com/o/r/issues/1".to_string(),
            issue_title: "t".to_string(),
            issue_body: "b".repeat(600),
        };

        let analysis = assistant.review(&request).await.unwrap();
        assert_eq!(analysis.repository_analysis.tech_stack, vec!["Rust"]);
        assert_eq!(analysis.file_analysis.analyzed_files[0].combined_probability, 80.0);

        let prompt = completion.requests.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains("File: src/a.rs"));
        assert!(prompt.contains("File: src/c.rs"));
        assert!(!prompt.contains("low.rs"));
        assert!(prompt.contains("Error fetching file."));
        assert!(prompt.contains(&format!("{}\n... (truncated)", "a".repeat(1000))));
        assert!(prompt.contains(&format!("{}... (truncated)", "b".repeat(500))));
    }

    #[tokio::test]
    async fn guidance_reply_attaches_files_only_for_explanations() {
        let completion = Arc::new(FakeCompletion::with_replies(&["  It parses tokens.  "]));
        let assistant = assistant(completion.clone(), FakeGithub::default());
        let request = GuidanceFollowUp {
            previous_messages: vec![ChatMessage::bot("analysis")],
            current_query: "explain lexer.rs".to_string(),
            file_contents: Some(vec![FileContent {
                name: "lexer.rs".to_string(),
                content: "fn lex() {}".to_string(),
            }]),
            request_type: RequestType::CodeExplanation,
            technical_context: crate::domain::TechnicalContext {
                languages: vec!["Rust".to_string()],
                topics: vec![],
            },
            ..Default::default()
        };

        let reply = assistant.guidance_reply(&request).await.unwrap();
        assert_eq!(reply, "It parses tokens.");
        let sent = completion.requests.lock().unwrap()[0].clone();
        assert!(sent.prompt.contains("File: lexer.rs\nContent:\nfn lex() {}"));
        assert!(sent.system.unwrap().starts_with("You are an expert Rust developer"));
    }

    #[tokio::test]
    async fn mentor_reply_includes_categories_and_history() {
        let completion = Arc::new(FakeCompletion::with_replies(&["Start by forking."]));
        let assistant = assistant(completion.clone(), FakeGithub::default());
        let request = MentorFollowUp {
            previous_messages: vec![ChatMessage::bot("Here are the recommended issues:")],
            current_query: "How do I submit my fix?".to_string(),
            ..Default::default()
        };
        assistant.mentor_reply(&request).await.unwrap();
        let prompt = completion.requests.lock().unwrap()[0].prompt.clone();
        assert!(prompt.contains("GUIDANCE CATEGORIES NEEDED: workflow, submission"));
        assert!(prompt.contains("BOT: Here are the recommended issues:"));
        assert!(prompt.contains("CURRENT QUESTION:\nHow do I submit my fix?"));
    }
}
