// * Prompt construction and generated-text cleanup

use regex::Regex;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::constants::MAX_CONTEXT_CHARS;
use crate::extractor::CandidateRecord;

static REPEATED_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!{2,}|\?{2,}|\.{2,}|,{2,}").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const VOICE_RULES: &str = "\
You are writing a homework response in a student's personal voice.

RULES:
- Match the writing style and punctuation of the examples as closely as possible
- Keep punctuation simple (mostly periods and commas), no semicolons, no em dashes, no formal transitions
- Do not add slang that the examples do not use
- Never sound robotic, formal or machine-written
- Keep the wording natural, like real student writing with normal imperfections
- Answer the assignment accurately and completely
- If there are numbered questions, answer each one separately under its own number
- Keep the length right for this assignment";

const OUTPUT_RULES: &str = "\
OUTPUT:
- Numbered questions are answered as \"1. answer\", \"2. answer\" and so on
- Plain text only, no markdown, no bold, no headers
- No placeholder text like <text> or [insert]

Write the complete response now. Output only the response text.";

/// Cuts `text` to at most `max` grapheme clusters
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.graphemes(true).take(max).collect()
}

/// Assembles prompts from fixed rules, voice samples and one record
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    examples: Vec<String>,
}

impl PromptBuilder {
    pub fn new(examples: Vec<String>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Context is the detail description when one was fetched, else the card text
    pub fn build(&self, record: &CandidateRecord, detail: Option<&str>) -> String {
        let context = detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| record.raw_text());
        let context = truncate_chars(context.trim(), MAX_CONTEXT_CHARS);

        let mut prompt = String::with_capacity(VOICE_RULES.len() + OUTPUT_RULES.len() + context.len() + 512);
        prompt.push_str(VOICE_RULES);

        if !self.examples.is_empty() {
            prompt.push_str("\n\nSTUDENT'S WRITING STYLE EXAMPLES:\n");
            for (i, example) in self.examples.iter().enumerate() {
                prompt.push_str(&format!("\n--- Example {} ---\n{}\n", i + 1, example.trim()));
            }
        }

        prompt.push_str("\nASSIGNMENT:\n");
        prompt.push_str(&format!("Title: {}\n", record.title()));
        if !record.group().is_empty() {
            prompt.push_str(&format!("Course: {}\n", record.group()));
        }
        prompt.push_str(&format!("Instructions: {}\n\n", context));
        prompt.push_str(OUTPUT_RULES);
        prompt
    }
}

/// Normalizes model output toward plain student punctuation
pub fn clean_generated_text(text: &str) -> String {
    let cleaned = text
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace(['\u{2014}', '\u{2013}'], "-")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(';', ",");

    let cleaned = REPEATED_PUNCT.replace_all(&cleaned, |caps: &regex::Captures| caps[0][..1].to_string());
    let cleaned = SPACE_RUNS.replace_all(&cleaned, " ");
    let cleaned = BLANK_RUNS.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: &str) -> CandidateRecord {
        CandidateRecord::new("Lab report", "AP Biology", "https://x.test/c/1/a/2", raw).unwrap()
    }

    #[test]
    fn test_truncate_counts_graphemes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_prompt_prefers_detail_over_raw_text() {
        let builder = PromptBuilder::new(vec!["I like dogs.".into()]);
        let prompt = builder.build(&record("card text"), Some("Write about cells."));
        assert!(prompt.contains("Instructions: Write about cells."));
        assert!(!prompt.contains("card text"));
        assert!(prompt.contains("--- Example 1 ---\nI like dogs."));
        assert!(prompt.contains("Course: AP Biology"));
    }

    #[test]
    fn test_prompt_context_is_truncated() {
        let long = "a".repeat(MAX_CONTEXT_CHARS + 500);
        let prompt = PromptBuilder::default().build(&record(&long), None);
        let expected = format!("Instructions: {}\n", "a".repeat(MAX_CONTEXT_CHARS));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"a".repeat(MAX_CONTEXT_CHARS + 1)));
    }

    #[test]
    fn test_clean_generated_text() {
        let raw = "Well\u{2014}I think; it\u{2019}s \u{201C}fine\u{201D}!!!\r\n\r\n\r\n\r\nNext   part..";
        assert_eq!(clean_generated_text(raw), "Well-I think, it's \"fine\"!\n\nNext part.");
    }
}
