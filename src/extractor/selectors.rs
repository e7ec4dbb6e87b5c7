// * Tiered selector strategy
// * A precise primary tier (item detail links) and a broader fallback tier (stream/assignment
// * containers). Both hand back (reference, card) pairs; everything downstream is shared.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::engine::normalization::{is_detail_reference, is_listing_reference, normalize_reference};
use crate::extractor::card::resolve_card;

static SELECTOR_LINKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

static SELECTOR_STREAM_ITEMS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"[data-item-id], [data-stream-item-id],
           [class*="assignment"], [class*="Assignment"],
           [class*="stream-item"], [class*="streamItem"]"#,
    )
    .unwrap()
});

/// One link found by a tier: normalized absolute reference plus the card describing it
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub reference: String,
    pub card: ElementRef<'a>,
    /// The item link itself, when its text names the item
    pub anchor: Option<ElementRef<'a>>,
}

/// A way of finding item candidates in a document
pub trait SelectorTier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Candidates in document order; duplicates are allowed, dedup happens later
    fn candidates<'a>(&self, document: &'a Html, base_url: &str) -> Vec<Candidate<'a>>;
}

/// Primary tier: every anchor whose path is an item detail page
#[derive(Debug, Default, Clone, Copy)]
pub struct DetailLinkTier;

impl SelectorTier for DetailLinkTier {
    fn name(&self) -> &'static str {
        "detail_links"
    }

    fn candidates<'a>(&self, document: &'a Html, base_url: &str) -> Vec<Candidate<'a>> {
        document
            .select(&SELECTOR_LINKS)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let reference = normalize_reference(href, base_url)?;
                if !is_detail_reference(&reference) {
                    return None;
                }
                Some(Candidate {
                    reference,
                    card: resolve_card(link),
                    anchor: Some(link),
                })
            })
            .collect()
    }
}

/// Fallback tier: containers that look like stream items or assignments.
/// The container is the card; its first non-listing link is the reference.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamItemTier;

impl SelectorTier for StreamItemTier {
    fn name(&self) -> &'static str {
        "stream_items"
    }

    fn candidates<'a>(&self, document: &'a Html, base_url: &str) -> Vec<Candidate<'a>> {
        document
            .select(&SELECTOR_STREAM_ITEMS)
            .filter_map(|container| {
                let own_href = (container.value().name() == "a")
                    .then(|| container.value().attr("href"))
                    .flatten();

                let reference = own_href
                    .into_iter()
                    .chain(
                        container
                            .select(&SELECTOR_LINKS)
                            .filter_map(|a| a.value().attr("href")),
                    )
                    .filter_map(|href| normalize_reference(href, base_url))
                    .find(|reference| !is_listing_reference(reference))?;

                // * Stream links read "Open post" and the like, so the card text decides the title
                Some(Candidate {
                    reference,
                    card: container,
                    anchor: None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://classroom.google.com/u/0/a/not-turned-in/all";

    #[test]
    fn test_detail_tier_skips_listing_and_foreign_links() {
        let doc = Html::parse_document(
            r#"<ul>
                <li><a href="/c/AAA/a/111/details">Essay</a></li>
                <li><a href="/u/0/a/not-turned-in/all">View all</a></li>
                <li><a href="https://example.com/elsewhere">Other</a></li>
                <li><a href="mailto:teacher@school.test">Mail</a></li>
            </ul>"#,
        );
        let found = DetailLinkTier.candidates(&doc, BASE);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reference, "https://classroom.google.com/c/AAA/a/111/details");
        assert_eq!(found[0].card.value().name(), "li");
    }

    #[test]
    fn test_stream_tier_uses_container_as_card() {
        let doc = Html::parse_document(
            r#"<div class="streamItem-x" id="card">
                   <span>Lab report</span>
                   <a href="/u/0/a/missing/all">Missing</a>
                   <a href="/c/AAA/p/222">Open</a>
               </div>"#,
        );
        let found = StreamItemTier.candidates(&doc, BASE);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].reference, "https://classroom.google.com/c/AAA/p/222");
        assert_eq!(found[0].card.value().attr("id"), Some("card"));
    }

    #[test]
    fn test_stream_tier_container_without_links() {
        let doc = Html::parse_document(r#"<div data-item-id="9"><span>No link here</span></div>"#);
        assert!(StreamItemTier.candidates(&doc, BASE).is_empty());
    }
}
