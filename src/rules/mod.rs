// * Classification Rules
// * Pure exclusion policy applied between discovery and generation

pub mod classifier;

pub use classifier::{ClassificationRules, ExclusionReason};
