// * Voice samples
// * Past writing read from a directory and handed to the prompt as style examples.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::constants::{STYLE_EXAMPLE_COUNT, STYLE_EXAMPLE_MAX_CHARS, STYLE_EXAMPLE_MIN_CHARS};
use crate::generation::prompt::truncate_chars;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

// * Used when no samples directory is configured or it holds nothing usable
pub const BUILTIN_EXAMPLES: &[&str] = &[
    "Hope, because it keeps going and is the reason why I continue to do the stuff that I do. Honor because I was born with respect to my duty and my loved ones. Integrity, because I was raised to not cheat people. Fairness because I believe in helping everyone and keeping them to the same standard.",
    "With a lot of my projects I had to choose between being honest with people about the progress of the work, and sometimes I would have a lot of other stuff to focus on too, so sometimes progress gets delayed, but I would try to stay honest with them about it and then quickly finish it.",
];

/// Up to `STYLE_EXAMPLE_COUNT` samples from `dir`, in file-name order.
/// Unreadable or too-short files are skipped; a missing directory yields nothing.
pub fn load_style_examples(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Samples directory not readable");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    files.sort();

    let mut examples = Vec::new();
    for path in files {
        if examples.len() >= STYLE_EXAMPLE_COUNT {
            break;
        }
        let text = match std::fs::read(&path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable sample");
                continue;
            }
        };
        if text.chars().count() <= STYLE_EXAMPLE_MIN_CHARS {
            continue;
        }
        let trimmed = truncate_chars(&text, STYLE_EXAMPLE_MAX_CHARS);
        info!(file = %path.display(), chars = trimmed.chars().count(), "Loaded style example");
        examples.push(trimmed);
    }

    info!(count = examples.len(), "Style examples loaded");
    examples
}

/// Samples from `dir` when given and non-empty, else the built-in pair
pub fn resolve_style_examples(dir: Option<&Path>) -> Vec<String> {
    let loaded = dir.map(load_style_examples).unwrap_or_default();
    if loaded.is_empty() {
        BUILTIN_EXAMPLES.iter().map(|s| s.to_string()).collect()
    } else {
        loaded
    }
}
