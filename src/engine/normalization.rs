use regex::Regex;
use std::sync::LazyLock;
use url::Url;
use xxhash_rust::xxh64::xxh64;

// * Item detail pages: /c/<course>/a/<item>, optionally /u/<n> prefixed and /details suffixed.
// * sa = short answer, mc = multiple choice question items.
static DETAIL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/u/\d+)?/c/[^/]+/(?:a|sa|mc)/[^/]+(?:/details)?$").unwrap()
});

// * Listing pages that merely look like detail links (to-do buckets, "view all")
static LISTING_LINK_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:/u/\d+)?/a/(?:not-turned-in|missing|turned-in|reviewed)(?:/|$)|/all$").unwrap()
});

// * Views the operator can start a run from: to-do buckets, a course stream, classwork
static LISTING_VIEW_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:/u/\d+)?/(?:a/(?:not-turned-in|missing|turned-in|reviewed)(?:/[^/]+)?|c/[^/]+|w/[^/]+(?:/t/[^/]+)?)$",
    )
    .unwrap()
});

// * Normalizes an item link into its absolute, deterministic reference.
// * The result is the record's locator and its dedup key.
// *
// * Logic:
// * 1. Join href with the snapshot URL.
// * 2. Keep http(s) only (drops javascript:, mailto:, ...).
// * 3. Strip Fragment and Query (session and view parameters never identify an item).
// * 4. Lowercase Hostname.
// * 5. Drop a trailing slash.
pub fn normalize_reference(href: &str, base_url: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    // * Step 1: Parse Base and Join
    let base = Url::parse(base_url).ok()?;
    let mut url = base.join(href).ok()?;

    // * Step 2: Scheme filter
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // * Step 3: Strip Fragment and Query
    url.set_fragment(None);
    url.set_query(None);

    // * Step 4: Lowercase Hostname
    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        if url.set_host(Some(&lower_host)).is_err() {
            return None;
        }
    }

    // * Step 5: Trailing slash (but never the root path itself)
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

// * Stable 64-bit dedup key of an already normalized reference
pub fn reference_key(reference: &str) -> u64 {
    xxh64(reference.as_bytes(), 0)
}

// * True when the normalized reference points at a single item's detail view
pub fn is_detail_reference(reference: &str) -> bool {
    match Url::parse(reference) {
        Ok(url) => !LISTING_LINK_PATH.is_match(url.path()) && DETAIL_PATH.is_match(url.path()),
        Err(_) => false,
    }
}

// * True when the normalized reference points at a listing/index page
pub fn is_listing_reference(reference: &str) -> bool {
    match Url::parse(reference) {
        Ok(url) => LISTING_LINK_PATH.is_match(url.path()),
        Err(_) => false,
    }
}

// * True when the operator's current location is a view items can be discovered from
pub fn is_listing_view(location: &str) -> bool {
    let Ok(url) = Url::parse(location) else {
        return false;
    };
    let path = url.path();
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    LISTING_VIEW_PATH.is_match(path)
}
