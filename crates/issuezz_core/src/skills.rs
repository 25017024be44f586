//! crates/issuezz_core/src/skills.rs
//!
//! Derives a contributor's skills profile from the languages of their repositories.

use crate::domain::Repository;
use regex::{Regex, RegexBuilder};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

/// Display names for language spellings GitHub users commonly type in lowercase.
const SKILL_ALIASES: &[(&str, &str)] = &[
    ("c++", "C++"),
    ("c#", "C#"),
    ("f#", "F#"),
    ("typescript", "TypeScript"),
    ("javascript", "JavaScript"),
];

/// Maps a language name onto its canonical display name; unknown names pass through.
pub fn normalize_skill_name(skill: &str) -> String {
    let lowered = skill.to_lowercase();
    SKILL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| skill.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    pub language: String,
    pub repositories: Vec<String>,
}

/// Language → repositories demonstrating it, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillsProfile {
    skills: Vec<Skill>,
}

impl SkillsProfile {
    /// Records `repository` under `language`. Inserting the same pair twice is a no-op.
    pub fn insert(&mut self, language: &str, repository: &str) {
        let index = match self.skills.iter().position(|s| s.language == language) {
            Some(index) => index,
            None => {
                self.skills.push(Skill {
                    language: language.to_string(),
                    repositories: Vec::new(),
                });
                self.skills.len() - 1
            }
        };
        let repos = &mut self.skills[index].repositories;
        if !repos.iter().any(|r| r == repository) {
            repos.push(repository.to_string());
        }
    }

    pub fn get(&self, language: &str) -> Option<&[String]> {
        self.skills
            .iter()
            .find(|s| s.language == language)
            .map(|s| s.repositories.as_slice())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(|s| s.language.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Languages of this profile that `text` mentions, case-insensitively.
    pub fn mentioned_in(&self, text: &str) -> Vec<&str> {
        self.skills
            .iter()
            .filter(|s| SkillMatcher::new(&s.language).is_match(text))
            .map(|s| s.language.as_str())
            .collect()
    }

    /// One bullet per language, e.g. `• Rust: Demonstrated in a, b`.
    pub fn summary_lines(&self) -> String {
        self.skills
            .iter()
            .map(|s| format!("• {}: Demonstrated in {}", s.language, s.repositories.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Serialize for SkillsProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.skills.len()))?;
        for skill in &self.skills {
            map.serialize_entry(&skill.language, &skill.repositories)?;
        }
        map.end()
    }
}

/// Builds the skills profile for a repository list.
///
/// Repositories without a language carry no skill signal and are skipped.
pub fn aggregate_skills(repositories: &[Repository]) -> SkillsProfile {
    let mut profile = SkillsProfile::default();
    for repo in repositories {
        if let Some(language) = repo.language.as_deref().filter(|l| !l.trim().is_empty()) {
            profile.insert(&normalize_skill_name(language), &repo.name);
        }
    }
    profile
}

//=========================================================================================
// Term Matching
//=========================================================================================

enum TermMatcher {
    Pattern(Regex),
    Substring(String),
}

/// Case-insensitive search for a skill name inside free text. The name must stand
/// on its own: `Java` does not match inside `JavaScript`.
pub struct SkillMatcher {
    inner: TermMatcher,
}

impl SkillMatcher {
    pub fn new(term: &str) -> Self {
        let pattern = format!(r"(?:^|[^\w+#]){}(?:$|[^\w+#])", regex::escape(term));
        let inner = match RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .size_limit(1 << 16)
            .build()
        {
            Ok(pattern) => TermMatcher::Pattern(pattern),
            Err(e) => {
                warn!("Falling back to substring matching for '{}': {}", term, e);
                TermMatcher::Substring(term.to_lowercase())
            }
        };
        Self { inner }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.inner {
            TermMatcher::Pattern(pattern) => pattern.is_match(text),
            TermMatcher::Substring(term) => text.to_lowercase().contains(term.as_str()),
        }
    }
}
