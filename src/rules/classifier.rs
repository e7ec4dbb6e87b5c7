// * Rule-based exclusion of candidate items
// * Ordered, short-circuiting: cheap substring checks first, regex checks after.

use regex::{Regex, RegexBuilder};

use crate::config::{ConfigError, RuleSettings};

// * Extracurricular and non-graded groups that never need a generated response.
// * Matched as plain substrings, so short names also hit inside words ("DECA" in "decade").
pub const DEFAULT_EXCLUDED_COURSES: &[&str] = &[
    "FBLA",
    "DECA",
    "Speech and Debate",
    "Speech & Debate",
    "Honor Society",
    "NHS",
    "SAT Prep",
    "SAT Math Boot Camp",
    "Applicants",
    "Math Honor",
];

// * AP U.S. History in all its spellings: APUSH, AP US History, AP U.S. History, AP U. S. History
pub const DEFAULT_SUBJECT_PATTERNS: &[&str] =
    &[r"\bapush\b|\ba\.?p\.?\s*u\.?\s*s\.?\s*history\b"];

// * Exam-style task acronyms
pub const DEFAULT_EXCLUDED_TYPE_TOKENS: &[&str] = &["DBQ", "LEQ", "SAQ", "FRQ", "MCQ"];

// * Words that make a card line look like a course label
pub const DEFAULT_COURSE_KEYWORDS: &[&str] = &[
    "English",
    "Literature",
    "History",
    "Biology",
    "Chemistry",
    "Physics",
    "Science",
    "Math",
    "Algebra",
    "Geometry",
    "Calculus",
    "Statistics",
    "Spanish",
    "French",
    "German",
    "Latin",
    "Government",
    "Economics",
    "Psychology",
    "Art",
    "Music",
    "Health",
    "Civics",
];

/// Why an item was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Title or group contains an excluded course name
    Course(String),
    /// Title or group matches an excluded subject pattern
    Subject(String),
    /// Title contains an excluded assignment-type token
    AssignmentType(String),
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::Course(c) => write!(f, "excluded course '{}'", c),
            ExclusionReason::Subject(p) => write!(f, "excluded subject /{}/", p),
            ExclusionReason::AssignmentType(t) => write!(f, "excluded type '{}'", t),
        }
    }
}

/// Compiled exclusion policy. Pure and deterministic once built.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    // * Lowercased for case-insensitive containment
    excluded_courses: Vec<String>,
    subject_patterns: Vec<Regex>,
    // * One alternation over all tokens, wrapped in word boundaries
    type_tokens: Option<Regex>,
}

impl ClassificationRules {
    /// Compiles the configured lists. Invalid subject patterns are a config error.
    pub fn new(settings: &RuleSettings) -> Result<Self, ConfigError> {
        let excluded_courses = settings
            .excluded_courses
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        let subject_patterns = settings
            .excluded_subject_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tokens: Vec<String> = settings
            .excluded_type_tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();
        let type_tokens = if tokens.is_empty() {
            None
        } else {
            let pattern = format!(r"\b(?:{})\b", tokens.join("|"));
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern { pattern, source })?,
            )
        };

        Ok(Self {
            excluded_courses,
            subject_patterns,
            type_tokens,
        })
    }

    /// Returns true when the item should be dropped before generation
    pub fn should_exclude(&self, title: &str, group: &str) -> bool {
        self.evaluate(title, group).is_some()
    }

    /// Returns the first rule that fires, in policy order
    pub fn evaluate(&self, title: &str, group: &str) -> Option<ExclusionReason> {
        // * Rule 1: excluded course substring anywhere in title + group
        let combined = format!("{} {}", title, group).to_lowercase();
        if let Some(course) = self
            .excluded_courses
            .iter()
            .find(|c| combined.contains(c.as_str()))
        {
            return Some(ExclusionReason::Course(course.clone()));
        }

        // * Rule 2: excluded subject pattern on title or group
        if let Some(pattern) = self
            .subject_patterns
            .iter()
            .find(|re| re.is_match(title) || re.is_match(group))
        {
            return Some(ExclusionReason::Subject(pattern.as_str().to_string()));
        }

        // * Rule 3: whole-word assignment-type token in the title
        if let Some(m) = self.type_tokens.as_ref().and_then(|re| re.find(title)) {
            return Some(ExclusionReason::AssignmentType(m.as_str().to_uppercase()));
        }

        None
    }
}
