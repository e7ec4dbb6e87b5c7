use serde::{Deserialize, Serialize};

/// One discovered unit of work. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    title: String,
    group: String,
    reference: String,
    raw_text: String,
}

impl CandidateRecord {
    /// Builds a record, or `None` when the title is blank or the reference is missing
    pub fn new(
        title: impl Into<String>,
        group: impl Into<String>,
        reference: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let reference = reference.into().trim().to_string();
        if title.is_empty() || reference.is_empty() {
            return None;
        }

        Some(Self {
            title,
            group: group.into().trim().to_string(),
            reference,
            raw_text: raw_text.into(),
        })
    }

    /// First non-trivial line of the item's card
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Course or class-period label; empty when none was recognized
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Absolute locator of the item's detail view; the dedup key
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Every visible line of the card, newline-joined
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_title_or_reference() {
        assert!(CandidateRecord::new("  ", "g", "https://x.test/a", "").is_none());
        assert!(CandidateRecord::new("Title", "g", "", "").is_none());
    }

    #[test]
    fn test_trims_fields() {
        let r = CandidateRecord::new(" Essay ", " English 9 ", " https://x.test/a ", "Essay\nEnglish 9")
            .unwrap();
        assert_eq!(r.title(), "Essay");
        assert_eq!(r.group(), "English 9");
        assert_eq!(r.reference(), "https://x.test/a");
        assert_eq!(r.raw_text(), "Essay\nEnglish 9");
    }
}
