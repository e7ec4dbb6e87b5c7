// * Detail page description extraction
// * Picks the longest plausible instruction block from an item's detail view.

use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::config::constants::MAX_DETAIL_CHARS;
use crate::generation::prompt::truncate_chars;

// * Instruction containers, most specific first. Stop at the first tier that yields text.
static DESCRIPTION_TIERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        r#"[class*="z3vRcc"]"#,
        r#"[dir="ltr"]"#,
        r#"[class*="tLDEHd"]"#,
        r#"[role="main"] div"#,
    ]
    .iter()
    .map(|css| Selector::parse(css).unwrap())
    .collect()
});

// * Shorter blocks are labels, longer ones are whole-page wrappers
const MIN_DESCRIPTION_CHARS: usize = 21;
const MAX_BLOCK_CHARS: usize = 5_000;

/// Longest instruction block on a detail page, cut to the detail ceiling
pub fn extract_detail_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for selector in DESCRIPTION_TIERS.iter() {
        let best = document
            .select(selector)
            .map(|el| {
                el.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|t| {
                let n = t.chars().count();
                (MIN_DESCRIPTION_CHARS..MAX_BLOCK_CHARS).contains(&n)
            })
            .max_by_key(|t| t.chars().count());

        if let Some(text) = best {
            return Some(truncate_chars(&text, MAX_DETAIL_CHARS));
        }
    }

    None
}
