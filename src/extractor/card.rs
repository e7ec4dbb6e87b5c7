// * Card resolution and text lines
// * A "card" is the smallest container whose visible text describes one item.

use regex::{Regex, RegexBuilder};
use scraper::ElementRef;
use std::sync::LazyLock;

use crate::config::constants::CARD_PARENT_HOPS;
use crate::config::ConfigError;

// * Attributes Classroom puts on per-item containers
const ITEM_ID_ATTRS: &[&str] = &["data-item-id", "data-stream-item-id", "data-assignment-id"];

// * Elements whose text is never visible
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

// * Elements that start a new rendered line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

// * Longest line still accepted as a group label
const MAX_GROUP_CHARS: usize = 100;

// * Class-period style labels: "Period 3", "Per. 2", "Pd 4", "Block 1A", "3rd Period"
static PERIOD_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:period|per\.|pd\.?|block|blk\.?)\s*#?\s*\d{1,2}[a-z]?\b|\b\d{1,2}(?:st|nd|rd|th)\s+(?:period|block)\b",
    )
    .unwrap()
});

// * Status, date and time lines that never serve as a title.
// * Weekdays and "Due"/"Posted" only count when a date or time follows, so "Satire analysis"
// * or "Due Process Clause" stay titles.
static TRIVIAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    const WEEKDAY: &str = r"(?:mon|tues?|wed(?:nes)?|thu(?:rs?)?|fri|sat(?:ur)?|sun)(?:day)?";
    const MONTH: &str = r"(?:jan|feb|mar|apr|may|jun|jul|aug|sept?|oct|nov|dec)[a-z]*";
    let when = format!(r"(?:\d|today\b|tomorrow\b|tonight\b|yesterday\b|{WEEKDAY}\b|{MONTH}\.?\s+\d)");
    Regex::new(&format!(
        r"(?i)^(?:due(?::|\s+(?:by\s+|on\s+|at\s+)?{when})|(?:posted|edited)(?::|\s+(?:on\s+|at\s+)?{when})|missing$|assigned$|turned in$|no due date$|{WEEKDAY}\.?(?:$|,?\s+{when})|\d{{1,2}}:\d{{2}})"
    ))
    .unwrap()
});

/// Smallest enclosing card for an item link: identified ancestor, else list item, else fixed hops
pub fn resolve_card(link: ElementRef<'_>) -> ElementRef<'_> {
    let ancestors: Vec<ElementRef<'_>> = link.ancestors().filter_map(ElementRef::wrap).collect();

    // * Tier 1: ancestor carrying an item identifier (the link itself may carry it too)
    if ITEM_ID_ATTRS.iter().any(|a| link.value().attr(a).is_some()) {
        return link;
    }
    if let Some(card) = ancestors
        .iter()
        .find(|el| ITEM_ID_ATTRS.iter().any(|a| el.value().attr(a).is_some()))
    {
        return *card;
    }

    // * Tier 2: nearest list item
    if let Some(card) = ancestors
        .iter()
        .find(|el| el.value().name() == "li" || el.value().attr("role") == Some("listitem"))
    {
        return *card;
    }

    // * Tier 3: fixed number of parent hops, never past <body>
    let mut card = link;
    for parent in ancestors.iter().take(CARD_PARENT_HOPS) {
        if matches!(parent.value().name(), "body" | "html") {
            break;
        }
        card = *parent;
    }
    card
}

/// Visible text of `card` split into trimmed, non-empty rendered lines
pub fn visible_lines(card: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    walk(card, &mut current, &mut lines);
    flush(&mut current, &mut lines);
    lines
}

fn walk(el: ElementRef<'_>, current: &mut String, lines: &mut Vec<String>) {
    let element = el.value();
    if SKIPPED_TAGS.contains(&element.name())
        || element.attr("hidden").is_some()
        || element.attr("aria-hidden") == Some("true")
    {
        return;
    }

    let block = BLOCK_TAGS.contains(&element.name());
    if block {
        flush(current, lines);
    }

    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            walk(child_el, current, lines);
        } else if let Some(text) = child.value().as_text() {
            current.push_str(text);
        }
    }

    if block {
        flush(current, lines);
    }
}

fn flush(current: &mut String, lines: &mut Vec<String>) {
    let line = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// Index of the first line that can serve as a title
pub fn title_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| is_title_line(line))
}

pub fn is_title_line(line: &str) -> bool {
    line.chars().count() >= 2 && !TRIVIAL_LINE.is_match(line)
}

/// Title of a card: the link's own first usable line when there is one, else the first usable card line.
/// Returns the title and the index of the card line it came from, if any.
pub fn resolve_title(anchor: Option<ElementRef<'_>>, lines: &[String]) -> Option<(String, Option<usize>)> {
    let own = anchor.and_then(|a| visible_lines(a).into_iter().find(|line| is_title_line(line)));

    match own {
        Some(title) => {
            let idx = lines
                .iter()
                .position(|line| *line == title)
                .or_else(|| lines.iter().position(|line| line.contains(title.as_str())));
            Some((title, idx))
        }
        None => title_index(lines).map(|idx| (lines[idx].clone(), Some(idx))),
    }
}

/// Recognizes course labels among card lines
#[derive(Debug, Clone)]
pub struct GroupMatcher {
    keywords: Option<Regex>,
}

impl GroupMatcher {
    pub fn new(course_keywords: &[String]) -> Result<Self, ConfigError> {
        let escaped: Vec<String> = course_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        let keywords = if escaped.is_empty() {
            None
        } else {
            let pattern = format!(r"\b(?:{})\b", escaped.join("|"));
            Some(
                RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern { pattern, source })?,
            )
        };

        Ok(Self { keywords })
    }

    /// True when the line looks like a course name or a class-period label
    pub fn is_group_line(&self, line: &str) -> bool {
        if line.chars().count() > MAX_GROUP_CHARS {
            return false;
        }
        PERIOD_MARKER.is_match(line) || self.keywords.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// First matching line other than the title line
    pub fn find_group<'l>(&self, lines: &'l [String], title_idx: Option<usize>) -> Option<&'l str> {
        lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != title_idx)
            .map(|(_, line)| line.as_str())
            .find(|line| self.is_group_line(line))
    }
}
