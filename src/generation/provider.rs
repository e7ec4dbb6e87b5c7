// * Provider specifications
// * A provider is an ordered list of endpoints. The list is fixed at startup and
// * walked front to back on every call.

use url::Url;

use crate::config::{ConfigError, ProviderKind, ProviderSettings};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const OPENAI_COMPATIBLE_BASE_URL: &str = "https://api.openai.com/v1";

/// Request/response shape spoken by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFamily {
    /// `generateContent`: text under `candidates[0].content.parts[*].text`
    GeminiGenerateContent,
    /// `chat/completions`: text under `choices[0].message.content`
    OpenAiChat,
}

/// How the access key travels with the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStyle {
    /// `?key=<access key>` query parameter
    QueryKey,
    /// `Authorization: Bearer <access key>`
    Bearer,
}

/// One concrete network target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    /// Reported as `provider_used` and in logs
    pub label: String,
    /// Absolute URL without credentials
    pub url: String,
    pub model: String,
    pub family: ResponseFamily,
    pub auth: AuthStyle,
}

impl EndpointSpec {
    /// Final request URL, with the key attached when the endpoint wants it in the query
    pub fn request_url(&self, api_key: &str) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.url).map_err(|_| ConfigError::InvalidBaseUrl(self.url.clone()))?;
        if self.auth == AuthStyle::QueryKey {
            url.query_pairs_mut().append_pair("key", api_key);
        }
        Ok(url)
    }
}

/// A logical provider: name plus ordered endpoints, immutable after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    name: String,
    endpoints: Vec<EndpointSpec>,
}

impl ProviderSpec {
    pub fn new(name: impl Into<String>, endpoints: Vec<EndpointSpec>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        Ok(Self {
            name: name.into(),
            endpoints,
        })
    }

    /// Direct Gemini API, one endpoint per model
    pub fn gemini(base_url: &str, models: &[String]) -> Result<Self, ConfigError> {
        let base = checked_base(base_url)?;
        let endpoints = models
            .iter()
            .map(|model| EndpointSpec {
                label: model.clone(),
                url: format!("{}/v1beta/models/{}:generateContent", base, model),
                model: model.clone(),
                family: ResponseFamily::GeminiGenerateContent,
                auth: AuthStyle::QueryKey,
            })
            .collect();
        Self::new("gemini", endpoints)
    }

    /// OpenAI-style proxy; every model shares the same URL
    pub fn openai_compatible(base_url: &str, models: &[String]) -> Result<Self, ConfigError> {
        let base = checked_base(base_url)?;
        let endpoints = models
            .iter()
            .map(|model| EndpointSpec {
                label: model.clone(),
                url: format!("{}/chat/completions", base),
                model: model.clone(),
                family: ResponseFamily::OpenAiChat,
                auth: AuthStyle::Bearer,
            })
            .collect();
        Self::new("openai_compatible", endpoints)
    }

    /// Builds the configured provider; selection happens once, here
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ConfigError> {
        let models = settings.candidate_models();
        match settings.kind {
            ProviderKind::Gemini => Self::gemini(
                settings.base_url.as_deref().unwrap_or(GEMINI_BASE_URL),
                &models,
            ),
            ProviderKind::OpenaiCompatible => Self::openai_compatible(
                settings.base_url.as_deref().unwrap_or(OPENAI_COMPATIBLE_BASE_URL),
                &models,
            ),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> &[EndpointSpec] {
        &self.endpoints
    }
}

// * Base must be absolute http(s); stored without trailing slash
fn checked_base(base_url: &str) -> Result<String, ConfigError> {
    let trimmed = base_url.trim().trim_end_matches('/');
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidBaseUrl(base_url.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_settings_give_two_gemini_endpoints() {
        let spec = ProviderSpec::from_settings(&ProviderSettings::default()).unwrap();
        assert_eq!(spec.name(), "gemini");
        let labels: Vec<&str> = spec.endpoints().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["gemini-2.0-flash", "gemma-3-1b-it"]);
        assert_eq!(
            spec.endpoints()[0].url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_query_key_is_attached_only_for_query_auth() {
        let gemini = ProviderSpec::gemini("https://g.test/", &models(&["m"])).unwrap();
        let url = gemini.endpoints()[0].request_url("k1").unwrap();
        assert_eq!(url.as_str(), "https://g.test/v1beta/models/m:generateContent?key=k1");

        let proxy = ProviderSpec::openai_compatible("https://p.test/v1", &models(&["m"])).unwrap();
        let url = proxy.endpoints()[0].request_url("k1").unwrap();
        assert_eq!(url.as_str(), "https://p.test/v1/chat/completions");
        assert_eq!(proxy.endpoints()[0].auth, AuthStyle::Bearer);
    }

    #[test]
    fn test_rejects_empty_models_and_bad_base() {
        assert!(matches!(ProviderSpec::gemini(GEMINI_BASE_URL, &[]), Err(ConfigError::NoEndpoints)));
        assert!(matches!(
            ProviderSpec::openai_compatible("ftp://nope", &models(&["m"])),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
