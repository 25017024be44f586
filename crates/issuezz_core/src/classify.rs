//! Best-effort heuristics that sniff what a follow-up question is asking for.
//! Ambiguous phrasing falls through to the general bucket.

use crate::domain::{Author, ChatMessage, RequestType};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::fmt;

const EXPLANATION_CUES: &[&str] = &["explain", "what does", "how does"];
const WORKFLOW_CUES: &[&str] = &["workflow", "where should i start", "what should i read first"];

/// Picks the request type for a guidance follow-up from the user's wording.
pub fn classify_request(message: &str) -> RequestType {
    let lowered = message.to_lowercase();
    if EXPLANATION_CUES.iter().any(|cue| lowered.contains(cue)) {
        RequestType::CodeExplanation
    } else if WORKFLOW_CUES.iter().any(|cue| lowered.contains(cue)) {
        RequestType::Workflow
    } else {
        RequestType::General
    }
}

//=========================================================================================
// Mentor Guidance Categories
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidanceCategory {
    Setup,
    Files,
    Workflow,
    Testing,
    Submission,
    Explanation,
    Error,
    Conceptual,
    General,
}

impl GuidanceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuidanceCategory::Setup => "setup",
            GuidanceCategory::Files => "files",
            GuidanceCategory::Workflow => "workflow",
            GuidanceCategory::Testing => "testing",
            GuidanceCategory::Submission => "submission",
            GuidanceCategory::Explanation => "explanation",
            GuidanceCategory::Error => "error",
            GuidanceCategory::Conceptual => "conceptual",
            GuidanceCategory::General => "general",
        }
    }
}

impl fmt::Display for GuidanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CATEGORY_PATTERNS: Lazy<Vec<(GuidanceCategory, Regex)>> = Lazy::new(|| {
    [
        (
            GuidanceCategory::Setup,
            r"(how to|help|can you|where do i) (start|begin|setup|set up|initialize)",
        ),
        (GuidanceCategory::Files, r"(which|what|where) (files?|code|changes|modify)"),
        (
            GuidanceCategory::Workflow,
            r"(steps|process|workflow|how do i|what should i)",
        ),
        (GuidanceCategory::Testing, r"(test|verify|check|validate)"),
        (GuidanceCategory::Submission, r"(submit|pr|pull request|contribute)"),
        (
            GuidanceCategory::Explanation,
            r"(explain|understand|what does|mean|confused|unclear)",
        ),
        (GuidanceCategory::Error, r"(error|problem|issue|not working|failed)"),
        (
            GuidanceCategory::Conceptual,
            r"(concept|theory|principle|how does|why does)",
        ),
    ]
    .into_iter()
    .filter_map(|(category, pattern)| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .ok()
            .map(|re| (category, re))
    })
    .collect()
});

/// Every category the mentor question touches, or just `General`.
pub fn guidance_categories(query: &str) -> Vec<GuidanceCategory> {
    let categories: Vec<_> = CATEGORY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(query))
        .map(|(category, _)| *category)
        .collect();
    if categories.is_empty() {
        vec![GuidanceCategory::General]
    } else {
        categories
    }
}

static ISSUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Issue Title: (.*?)\nURL: (.*?)(?:\n|$)").expect("valid regex"));

/// Finds which issue the mentor conversation is about, from the first bot message
/// that presented recommended issues.
pub fn extract_issue_context(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .find(|m| m.author == Author::Bot && m.content.contains("recommended issues"))
        .map(|m| match ISSUE_LINE.captures(&m.content) {
            Some(caps) => format!("Working on issue: {}\nURL: {}", &caps[1], &caps[2]),
            None => m.content.clone(),
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explanation_cues() {
        assert_eq!(classify_request("Can you EXPLAIN parser.rs?"), RequestType::CodeExplanation);
        assert_eq!(classify_request("what does this function do"), RequestType::CodeExplanation);
        assert_eq!(classify_request("How does routing work"), RequestType::CodeExplanation);
    }

    #[test]
    fn workflow_cues() {
        assert_eq!(classify_request("describe the workflow"), RequestType::Workflow);
        assert_eq!(classify_request("Where should I start?"), RequestType::Workflow);
    }

    #[test]
    fn explanation_wins_over_workflow() {
        assert_eq!(
            classify_request("explain the workflow"),
            RequestType::CodeExplanation
        );
    }

    #[test]
    fn everything_else_is_general() {
        assert_eq!(classify_request("thanks!"), RequestType::General);
        assert_eq!(classify_request(""), RequestType::General);
    }

    #[test]
    fn mentor_categories() {
        let categories = guidance_categories("How do I submit a pull request after I test it?");
        assert!(categories.contains(&GuidanceCategory::Workflow));
        assert!(categories.contains(&GuidanceCategory::Submission));
        assert!(categories.contains(&GuidanceCategory::Testing));
        assert_eq!(guidance_categories("hello there"), vec![GuidanceCategory::General]);
    }

    #[test]
    fn issue_context_from_recommendation_message() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::bot(
                "Here are the recommended issues:\nIssue Title: Fix typo\nURL: https://x/1\nmore",
            ),
        ];
        assert_eq!(
            extract_issue_context(&messages),
            "Working on issue: Fix typo\nURL: https://x/1"
        );
        assert_eq!(extract_issue_context(&[ChatMessage::bot("hello")]), "");
    }
}
