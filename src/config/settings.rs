// * Runtime Settings
// * Loaded once at process start from an optional TOML file, then overlaid with env vars.
// * Nothing here is mutated during a run.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::constants::{
    DEFAULT_LISTING_URL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, DETAIL_TIMEOUT_MS,
    GENERATION_TIMEOUT_SECS, PACING_INTERVAL_MS, PASTE_TIMEOUT_MS, SETTLE_DELAY_MS,
    SNAPSHOT_TIMEOUT_MS,
};
use crate::rules::classifier::{
    DEFAULT_COURSE_KEYWORDS, DEFAULT_EXCLUDED_COURSES, DEFAULT_EXCLUDED_TYPE_TOKENS,
    DEFAULT_SUBJECT_PATTERNS,
};

// * Environment variables consulted for the provider credential, in order
pub const API_KEY_ENV_VARS: &[&str] = &["STUDYFLOW_API_KEY", "GEMINI_API_KEY"];

// * Values that mean "somebody forgot to fill this in"
const PLACEHOLDER_KEYS: &[&str] = &[
    "%%gemini_key%%",
    "your_api_key",
    "your-api-key",
    "changeme",
    "placeholder",
    "xxx",
];

static ENV_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("No provider access key configured (set api_key or STUDYFLOW_API_KEY)")]
    MissingCredential,

    #[error("Provider access key is still a placeholder value")]
    PlaceholderCredential,

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Provider has no models configured")]
    NoEndpoints,

    #[error("Invalid provider base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Which provider family the run talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Direct Gemini `generateContent` API
    #[default]
    Gemini,
    /// Any proxy exposing an OpenAI-style `/chat/completions`
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Primary model, tried first
    pub model: String,
    /// Lighter models tried in order after the primary
    pub fallback_models: Vec<String>,
    /// Overrides the provider's default base URL
    pub base_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            fallback_models: vec!["gemma-3-1b-it".to_string()],
            base_url: None,
        }
    }
}

impl ProviderSettings {
    /// Primary + fallbacks with blanks and repeats removed, order kept
    pub fn candidate_models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for model in std::iter::once(&self.model).chain(self.fallback_models.iter()) {
            let model = model.trim();
            if !model.is_empty() && !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        models
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            request_timeout_secs: GENERATION_TIMEOUT_SECS,
        }
    }
}

impl GenerationSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub settle_delay_ms: u64,
    pub pacing_interval_ms: u64,
    pub snapshot_timeout_ms: u64,
    pub detail_timeout_ms: u64,
    pub paste_timeout_ms: u64,
    /// Where the operator is sent when the current page is not a listing view
    pub listing_url: String,
    /// Fetch each item's detail description before generating
    pub enrich_details: bool,
    /// Best-effort paste of generated text into the item's answer field
    pub paste_drafts: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: SETTLE_DELAY_MS,
            pacing_interval_ms: PACING_INTERVAL_MS,
            snapshot_timeout_ms: SNAPSHOT_TIMEOUT_MS,
            detail_timeout_ms: DETAIL_TIMEOUT_MS,
            paste_timeout_ms: PASTE_TIMEOUT_MS,
            listing_url: DEFAULT_LISTING_URL.to_string(),
            enrich_details: true,
            paste_drafts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    /// Substrings of title + group that drop an item
    pub excluded_courses: Vec<String>,
    /// Case-insensitive regexes matched against title and group separately
    pub excluded_subject_patterns: Vec<String>,
    /// Whole-word tokens that drop an item when found in its title
    pub excluded_type_tokens: Vec<String>,
    /// Words that mark a card line as the item's course label
    pub course_keywords: Vec<String>,
}

impl Default for RuleSettings {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            excluded_courses: owned(DEFAULT_EXCLUDED_COURSES),
            excluded_subject_patterns: owned(DEFAULT_SUBJECT_PATTERNS),
            excluded_type_tokens: owned(DEFAULT_EXCLUDED_TYPE_TOKENS),
            course_keywords: owned(DEFAULT_COURSE_KEYWORDS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StyleSettings {
    /// Directory of past writing samples used as voice examples
    pub samples_dir: Option<PathBuf>,
}

/// Top-level settings document
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub provider: ProviderSettings,
    pub generation: GenerationSettings,
    pub pipeline: PipelineSettings,
    pub rules: RuleSettings,
    pub style: StyleSettings,
}

impl Settings {
    /// Loads settings from a TOML file, expanding `${VAR}` references
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses settings from TOML text, expanding `${VAR}` references
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Loads from `path` if given, otherwise defaults; then applies env overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        Ok(settings.with_env_overrides())
    }

    /// Fills an empty `api_key` from the first credential env var that is set
    pub fn with_env_overrides(mut self) -> Self {
        if self.api_key.trim().is_empty() {
            if let Some(key) = API_KEY_ENV_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .find(|v| !v.trim().is_empty())
            {
                self.api_key = key;
            }
        }
        self
    }

    /// Fatal precondition: a usable credential must be present before any work starts
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        check_credential(&self.api_key)
    }
}

/// Rejects empty and placeholder credentials
pub fn check_credential(key: &str) -> Result<(), ConfigError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::MissingCredential);
    }

    let lower = key.to_lowercase();
    let looks_templated = (lower.starts_with('<') && lower.ends_with('>'))
        || (lower.starts_with("%%") && lower.ends_with("%%"))
        || lower.starts_with("your-")
        || lower.starts_with("your_");
    if looks_templated || PLACEHOLDER_KEYS.contains(&lower.as_str()) {
        return Err(ConfigError::PlaceholderCredential);
    }

    Ok(())
}

// * Replaces every `${VAR}` with its value; unset variables are an error
fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();
    for cap in ENV_VAR_REGEX.captures_iter(content) {
        let var_name = &cap[1];
        let value = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }
    Ok(result)
}
