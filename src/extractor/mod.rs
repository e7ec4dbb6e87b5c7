// * Record Extractor
// * Turns a page snapshot into a deduplicated, ordered list of candidate records.
// * Heuristic by nature: markup changes degrade results, they never fail the run.

pub mod card;
pub mod detail;
pub mod record;
pub mod selectors;

pub use card::GroupMatcher;
pub use detail::extract_detail_description;
pub use record::CandidateRecord;
pub use selectors::{Candidate, DetailLinkTier, SelectorTier, StreamItemTier};

use scraper::Html;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::{ConfigError, RuleSettings};
use crate::engine::normalization::{is_listing_view, reference_key};
use crate::engine::page_source::PageSnapshot;

/// Result of one extraction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// The snapshot is not a listing view; the operator has to be sent elsewhere first
    NotReady { location: String },
    /// Records found (possibly none), with the tier that produced them
    Records {
        records: Vec<CandidateRecord>,
        tier: Option<&'static str>,
    },
}

/// Tiered extractor. Tiers are tried in order until one yields records.
pub struct RecordExtractor {
    tiers: Vec<Box<dyn SelectorTier>>,
    groups: GroupMatcher,
}

impl RecordExtractor {
    /// Default tiers: detail links, then stream-item containers
    pub fn new(rules: &RuleSettings) -> Result<Self, ConfigError> {
        Ok(Self::with_tiers(
            vec![Box::new(DetailLinkTier), Box::new(StreamItemTier)],
            GroupMatcher::new(&rules.course_keywords)?,
        ))
    }

    pub fn with_tiers(tiers: Vec<Box<dyn SelectorTier>>, groups: GroupMatcher) -> Self {
        Self { tiers, groups }
    }

    /// Checks the location, then extracts. Reads only; never touches the page.
    pub fn discover(&self, snapshot: &PageSnapshot) -> Discovery {
        if !is_listing_view(&snapshot.url) {
            info!(location = %snapshot.url, "Current page is not a listing view");
            return Discovery::NotReady {
                location: snapshot.url.clone(),
            };
        }

        let (records, tier) = self.extract(&snapshot.html, &snapshot.url);
        Discovery::Records { records, tier }
    }

    /// Runs the tiers against `html`, resolving relative links against `base_url`
    pub fn extract(&self, html: &str, base_url: &str) -> (Vec<CandidateRecord>, Option<&'static str>) {
        let document = Html::parse_document(html);

        for tier in &self.tiers {
            let records = self.build_records(tier.candidates(&document, base_url));
            debug!(tier = tier.name(), count = records.len(), "Selector tier finished");
            if !records.is_empty() {
                info!(tier = tier.name(), count = records.len(), "Records extracted");
                return (records, Some(tier.name()));
            }
        }

        info!("No records found by any selector tier");
        (Vec::new(), None)
    }

    // * Dedup by reference, resolve title/group from card lines, drop unusable cards
    fn build_records(&self, candidates: Vec<Candidate<'_>>) -> Vec<CandidateRecord> {
        let mut seen: HashSet<u64> = HashSet::new();
        let mut records = Vec::new();

        for candidate in candidates {
            if !seen.insert(reference_key(&candidate.reference)) {
                continue;
            }

            let lines = card::visible_lines(candidate.card);
            let Some((title, title_idx)) = card::resolve_title(candidate.anchor, &lines) else {
                debug!(reference = %candidate.reference, "Card has no usable title");
                continue;
            };
            let group = self.groups.find_group(&lines, title_idx).unwrap_or_default();

            if let Some(record) = CandidateRecord::new(
                title,
                group,
                candidate.reference,
                lines.join("\n"),
            ) {
                records.push(record);
            }
        }

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> RecordExtractor {
        RecordExtractor::new(&RuleSettings::default()).unwrap()
    }

    #[test]
    fn test_not_ready_off_listing() {
        let snap = PageSnapshot::new("https://classroom.google.com/c/A/a/B/details", "<html></html>");
        assert!(matches!(extractor().discover(&snap), Discovery::NotReady { .. }));
    }

    #[test]
    fn test_empty_listing_is_zero_records_not_not_ready() {
        let snap = PageSnapshot::new("https://classroom.google.com/u/0/a/not-turned-in/all", "<html></html>");
        assert_eq!(
            extractor().discover(&snap),
            Discovery::Records {
                records: vec![],
                tier: None
            }
        );
    }

    #[test]
    fn test_card_without_title_is_dropped() {
        let (records, _) = extractor().extract(
            r#"<ul><li><a href="/c/A/a/B">Due Monday</a></li></ul>"#,
            "https://classroom.google.com/a/not-turned-in/all",
        );
        assert!(records.is_empty());
    }
}
