//! crates/issuezz_core/src/prompts.rs
//!
//! Prompt builders for the four AI endpoints. Issue and chat text is embedded
//! verbatim; every template is filled in a single `format!` pass.

use crate::classify::GuidanceCategory;
use crate::domain::{AnalysisResult, ChatMessage, FileContent, Issue, TechnicalContext};

/// Each message on its own line as `BOT: ...` / `USER: ...`.
pub fn format_history(messages: &[ChatMessage], separator: &str) -> String {
    messages
        .iter()
        .map(|m| {
            let author = match m.author {
                crate::domain::Author::Bot => "BOT",
                crate::domain::Author::User => "USER",
            };
            format!("{}: {}", author, m.content)
        })
        .collect::<Vec<_>>()
        .join(separator)
}

pub fn suggest_prompt(
    technical: &TechnicalContext,
    issues: &[&Issue],
    owner: &str,
    repo: &str,
) -> String {
    let issue_descriptions = issues
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            format!(
                "Issue #{}:\n- Title: {}\n- Repository: {}/{}\n- Description: {}\n- Labels: {}\n- URL: https://github.com/{}/{}/issues/{}",
                i + 1,
                issue.title,
                owner,
                repo,
                issue.body,
                issue.labels.join(", "),
                owner,
                repo,
                issue.number
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"OPEN-SOURCE CONTRIBUTION MATCHER

## DEVELOPER PROFILE
- Programming Languages: {languages}
- Technical Interests: {topics}
- Experience Level: Beginner

## AVAILABLE ISSUES (Total: {issue_count})
{issues}

## RECOMMENDATION OBJECTIVE
Analyze the available issues and recommend the most suitable ones for a beginner developer.
For each recommended issue, provide:
1. Clear difficulty assessment
2. What the contributor will learn by working on it
3. Brief summary of required changes
4. Key files that need modification
5. Essential skills needed
6. Estimated time commitment

Important constraints:
- Recommend MAX 3 issues that best match the developer's skills
- Focus on beginner-friendly issues
- Keep initial descriptions concise but informative
- If no suitable issues exist, return empty recommendations

FORMAT YOUR RESPONSE AS JSON following the structure below:
{{
  "recommendations": [
    {{
      "issue_title": "Exact Issue Title",
      "issue_url": "Full GitHub Issue URL",
      "difficulty_level": "Beginner/Intermediate/Advanced",
      "learning_opportunities": "What the developer will learn",
      "quick_summary": "One-sentence overview of what needs to be done",
      "key_skills_needed": ["2-3 main skills required"],
      "main_files": ["2-3 key files to modify"],
      "estimated_time": "Rough time estimate for beginners",
      "why_recommended": "Brief explanation of why this matches their skills"
    }}
  ]
}}"#,
        languages = technical.languages.join(", "),
        topics = technical.topics.join(", "),
        issue_count = issues.len(),
        issues = issue_descriptions,
    )
}

/// One entry of the review prompt's file list.
pub struct ReviewFile<'a> {
    pub file_name: &'a str,
    pub match_score: f64,
    pub content: String,
}

pub fn review_prompt(
    owner: &str,
    repo: &str,
    title: &str,
    body: &str,
    files: &[ReviewFile<'_>],
) -> String {
    let files_text = files
        .iter()
        .map(|f| {
            format!(
                "File: {}\nMatch Score: {}\nKey Content:\n{}\n",
                f.file_name, f.match_score, f.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this GitHub issue and relevant files:

Repository: {owner}/{repo}
Issue Title: {title}
Issue Description: {body}

Relevant Files:
{files}

Provide analysis in JSON format:
{{
  "repository_analysis": {{
    "purpose": "...",
    "tech_stack": ["..."],
    "issue_summary": "..."
  }},
  "file_analysis": {{
    "analyzed_files": [
      {{"file_name": "...", "combined_probability": 0.0, "reason": "..."}}
    ]
  }},
  "recommendations": {{
    "priority_order": ["..."],
    "specific_changes": "...",
    "additional_context": "..."
  }}
}}"#,
        files = files_text,
    )
}

pub struct MentorPromptInput<'a> {
    pub technical: &'a TechnicalContext,
    pub public_repos: u32,
    pub categories: &'a [GuidanceCategory],
    pub issue_context: &'a str,
    pub history: &'a [ChatMessage],
    pub question: &'a str,
}

pub fn mentor_prompt(input: &MentorPromptInput<'_>) -> String {
    let categories = input
        .categories
        .iter()
        .map(GuidanceCategory::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"As an experienced open source mentor helping a beginner developer, provide detailed guidance based on their question.

DEVELOPER CONTEXT:
- Experience Level: Beginner
- Known Languages: {languages}
- Interests/Topics: {topics}
- Public Repos: {public_repos}

GUIDANCE CATEGORIES NEEDED: {categories}

ISSUE CONTEXT:
{issue_context}

CHAT HISTORY:
{history}

CURRENT QUESTION:
{question}

Based on their question, provide:
1. Clear, direct answer to their specific question
2. Step-by-step instructions appropriate for beginners
3. Explanation of any technical terms or concepts
4. Specific file locations and code areas to work with
5. Common pitfalls and how to avoid them
6. Testing and verification steps
7. Relevant documentation or learning resources

RESPONSE GUIDELINES:
1. Use simple, clear language suitable for beginners
2. Break down complex tasks into small, manageable steps
3. Provide examples using their known programming languages
4. Include error handling and debugging guidance
5. Suggest ways to verify work
6. Be encouraging and supportive
7. Use a friendly tone with occasional emojis
8. Address potential confusion points proactively

Remember: Keep explanations beginner-friendly and maintain an encouraging tone throughout."#,
        languages = input.technical.languages.join(", "),
        topics = input.technical.topics.join(", "),
        public_repos = input.public_repos,
        issue_context = input.issue_context,
        history = format_history(input.history, "\n\n"),
        question = input.question,
    )
}

pub fn code_explanation_prompt(
    analysis: &AnalysisResult,
    files: &[FileContent],
    question: &str,
) -> String {
    let files_text = files
        .iter()
        .map(|f| format!("File: {}\nContent:\n{}", f.name, f.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"As a developer experienced in {tech_stack}, explain the following code in the context of {purpose}.

User Question: {question}

Relevant Files:
{files}

Provide a detailed explanation that:
1. Addresses the specific question about the code
2. Explains the purpose and functionality of relevant code sections
3. Highlights any important patterns or practices used
4. Connects the code to the overall project context
5. Suggests any potential improvements or considerations"#,
        tech_stack = analysis.repository_analysis.tech_stack.join(", "),
        purpose = analysis.repository_analysis.purpose,
        files = files_text,
    )
}

pub fn workflow_prompt(analysis: &AnalysisResult, history: &[ChatMessage], question: &str) -> String {
    format!(
        r#"As a technical advisor familiar with {tech_stack}, help understand the workflow of this project.

Project Context:
{purpose}

Current Question: {question}

Previous Discussion Context:
{history}

Provide guidance that:
1. Explains the relevant workflow aspects
2. Connects to the project's overall architecture
3. References specific recommendations: {specific_changes}
4. Suggests next steps or areas to focus on
5. Highlights best practices and potential improvements"#,
        tech_stack = analysis.repository_analysis.tech_stack.join(", "),
        purpose = analysis.repository_analysis.purpose,
        history = format_history(history, "\n"),
        specific_changes = analysis.recommendations.specific_changes,
    )
}

pub fn general_prompt(analysis: &AnalysisResult, history: &[ChatMessage], question: &str) -> String {
    format!(
        r#"As a technical advisor for this {tech_stack} project, address the following question.

Project Context:
{purpose}

Current Question: {question}

Previous Discussion Context:
{history}

Provide a response that:
1. Directly addresses the question
2. Connects to the project context
3. References relevant technical aspects
4. Suggests practical next steps
5. Maintains consistency with previous answers"#,
        tech_stack = analysis.repository_analysis.tech_stack.join(", "),
        purpose = analysis.repository_analysis.purpose,
        history = format_history(history, "\n"),
    )
}

pub fn guidance_system_prompt(languages: &[String], code_explanation: bool) -> String {
    let focus = if code_explanation {
        "Provide detailed, educational code explanations with examples and best practices."
    } else {
        "Offer clear, actionable guidance while maintaining context from previous messages."
    };
    format!(
        "You are an expert {} developer and technical advisor. {}",
        languages.join(", "),
        focus
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_prompt_lists_issue_urls() {
        let issue = Issue {
            title: "Fix typo".to_string(),
            body: "README has a typo".to_string(),
            labels: vec!["good first issue".to_string(), "docs".to_string()],
            number: 7,
            ..Default::default()
        };
        let technical = TechnicalContext {
            languages: vec!["Rust".to_string()],
            topics: vec![],
        };
        let prompt = suggest_prompt(&technical, &[&issue], "octocat", "Hello-World");
        assert!(prompt.contains("Programming Languages: Rust"));
        assert!(prompt.contains("AVAILABLE ISSUES (Total: 1)"));
        assert!(prompt.contains("- Labels: good first issue, docs"));
        assert!(prompt.contains("https://github.com/octocat/Hello-World/issues/7"));
    }

    #[test]
    fn history_is_tagged_by_author() {
        let history = vec![ChatMessage::bot("hello"), ChatMessage::user("hi")];
        assert_eq!(format_history(&history, "\n"), "BOT: hello\nUSER: hi");
    }

    #[test]
    fn workflow_prompt_references_specific_changes() {
        let mut analysis = AnalysisResult::default();
        analysis.recommendations.specific_changes = "Update the lexer".to_string();
        analysis.repository_analysis.tech_stack = vec!["Rust".to_string(), "Tokio".to_string()];
        let prompt = workflow_prompt(&analysis, &[], "where should I start?");
        assert!(prompt.contains("familiar with Rust, Tokio"));
        assert!(prompt.contains("References specific recommendations: Update the lexer"));
    }

    #[test]
    fn braces_in_issue_text_are_not_expanded() {
        let prompt = review_prompt("o", "r", "Fix {body} parsing", "SECRET_BODY {files}", &[]);
        assert!(prompt.contains("Issue Title: Fix {body} parsing"));
        assert!(prompt.contains("Issue Description: SECRET_BODY {files}"));
        assert_eq!(prompt.matches("SECRET_BODY").count(), 1);
    }

    #[test]
    fn braces_in_questions_and_history_are_not_expanded() {
        let mut analysis = AnalysisResult::default();
        analysis.recommendations.specific_changes = "HIDDEN".to_string();
        let history = vec![ChatMessage::user("what is {purpose}?")];
        let prompt = general_prompt(&analysis, &history, "tell me {specific_changes} and {history}");
        assert!(prompt.contains("Current Question: tell me {specific_changes} and {history}"));
        assert!(prompt.contains("USER: what is {purpose}?"));
        assert!(!prompt.contains("HIDDEN"));

        let technical = TechnicalContext::default();
        let mentor = mentor_prompt(&MentorPromptInput {
            technical: &technical,
            public_repos: 2,
            categories: &[],
            issue_context: "Issue Title: {question}",
            history: &[],
            question: "why?",
        });
        assert!(mentor.contains("Issue Title: {question}"));
        assert_eq!(mentor.matches("why?").count(), 1);
    }
}
