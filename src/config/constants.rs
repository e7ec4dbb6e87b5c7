// * Configuration Constants
// * Central location for every fixed delay, ceiling and size limit of the pipeline

// * Wait after navigation before the page is read (client-rendered content)
pub const SETTLE_DELAY_MS: u64 = 3_000;

// * Fixed pause between two generation calls
pub const PACING_INTERVAL_MS: u64 = 5_000;

// * Ceiling for a single generation request before the endpoint counts as failed
pub const GENERATION_TIMEOUT_SECS: u64 = 60;

// * Ceiling for reading the current page snapshot
pub const SNAPSHOT_TIMEOUT_MS: u64 = 30_000;

// * Ceiling for fetching an item's detail description
pub const DETAIL_TIMEOUT_MS: u64 = 20_000;

// * Ceiling for the one-shot paste into a detail page
pub const PASTE_TIMEOUT_MS: u64 = 55_000;

// * Part of the detail/paste ceiling kept back for closing the tab before the caller gives up
pub const TAB_CLOSE_RESERVE_MS: u64 = 2_000;

// * Context text handed to the generator is cut at this many characters
pub const MAX_CONTEXT_CHARS: usize = 3_000;

// * Detail descriptions are cut at this many characters
pub const MAX_DETAIL_CHARS: usize = 2_000;

// * Style examples: count, per-file cut and minimum useful size
pub const STYLE_EXAMPLE_COUNT: usize = 6;
pub const STYLE_EXAMPLE_MAX_CHARS: usize = 2_000;
pub const STYLE_EXAMPLE_MIN_CHARS: usize = 50;

// * Parent hops used when a link has no identifiable card ancestor
pub const CARD_PARENT_HOPS: usize = 3;

// * Default sampling parameters
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4_096;

// * Listing view the operator is redirected to when the current location is unusable
pub const DEFAULT_LISTING_URL: &str = "https://classroom.google.com/u/0/a/not-turned-in/all";

// * How much of a failed response body is kept for logging
pub const ERROR_BODY_PREVIEW_CHARS: usize = 500;
