use std::sync::Arc;

use crate::extractor::CandidateRecord;
use crate::generation::client::Generated;

/// Result of generating for one record. Built once, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    record: Arc<CandidateRecord>,
    text: Option<String>,
    provider_used: Option<String>,
}

impl GenerationOutcome {
    pub fn success(record: Arc<CandidateRecord>, generated: Generated) -> Self {
        Self {
            record,
            text: Some(generated.text),
            provider_used: Some(generated.endpoint),
        }
    }

    pub fn failure(record: Arc<CandidateRecord>) -> Self {
        Self {
            record,
            text: None,
            provider_used: None,
        }
    }

    /// Success when generation returned something, failure otherwise
    pub fn from_generated(record: Arc<CandidateRecord>, generated: Option<Generated>) -> Self {
        match generated {
            Some(g) => Self::success(record, g),
            None => Self::failure(record),
        }
    }

    pub fn record(&self) -> &CandidateRecord {
        &self.record
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn provider_used(&self) -> Option<&str> {
        self.provider_used.as_deref()
    }

    pub fn failed(&self) -> bool {
        self.text.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_tracks_text_presence() {
        let record = Arc::new(CandidateRecord::new("t", "", "https://x.test/r", "").unwrap());
        let ok = GenerationOutcome::from_generated(
            record.clone(),
            Some(Generated {
                text: "done".into(),
                endpoint: "B".into(),
            }),
        );
        assert!(!ok.failed());
        assert_eq!(ok.provider_used(), Some("B"));

        let bad = GenerationOutcome::from_generated(record, None);
        assert!(bad.failed());
        assert_eq!(bad.text(), None);
        assert_eq!(bad.provider_used(), None);
    }
}
