// * Generation Client
// * Walks the provider's endpoints in order, one request each, and returns the first
// * non-empty text. Endpoint failures are logged and absorbed here; the caller only
// * ever sees text or nothing.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::generation::adapters::{adapter_for, GenerationParams};
use crate::generation::errors::EndpointError;
use crate::generation::provider::{AuthStyle, EndpointSpec, ProviderSpec};
use crate::network::{HttpClient, NetworkError};

/// Successful generation and the endpoint that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub endpoint: String,
}

/// Type alias for a boxed generation future
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Option<Generated>> + Send + 'a>>;

/// Anything that turns a prompt into text. `None` means every endpoint failed.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}

pub struct GenerationClient {
    http: HttpClient,
    spec: ProviderSpec,
    api_key: String,
    params: GenerationParams,
}

impl GenerationClient {
    pub fn new(http: HttpClient, spec: ProviderSpec, api_key: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            http,
            spec,
            api_key: api_key.into(),
            params,
        }
    }

    pub fn spec(&self) -> &ProviderSpec {
        &self.spec
    }

    /// Tries each endpoint once, in order
    pub async fn generate_text(&self, prompt: &str) -> Option<Generated> {
        for endpoint in self.spec.endpoints() {
            let started = Instant::now();
            match self.call_endpoint(endpoint, prompt).await {
                Ok(text) => {
                    info!(
                        endpoint = %endpoint.label,
                        chars = text.chars().count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Generation succeeded"
                    );
                    return Some(Generated {
                        text,
                        endpoint: endpoint.label.clone(),
                    });
                }
                Err(e) => {
                    let status = match &e {
                        EndpointError::Network(n) => n.status_code(),
                        _ => None,
                    };
                    warn!(
                        endpoint = %endpoint.label,
                        status = ?status,
                        error = %e,
                        "Endpoint failed, trying next"
                    );
                }
            }
        }

        warn!(provider = self.spec.name(), "All endpoints failed");
        None
    }

    async fn call_endpoint(&self, endpoint: &EndpointSpec, prompt: &str) -> Result<String, EndpointError> {
        let adapter = adapter_for(endpoint.family);
        let body = adapter.request_body(&endpoint.model, prompt, &self.params)?;
        let url = endpoint.request_url(&self.api_key)?;
        let bearer = (endpoint.auth == AuthStyle::Bearer).then_some(self.api_key.as_str());

        debug!(endpoint = %endpoint.label, "Calling endpoint");

        // * Outer bound in case the transport timeout never fires
        let response: Value = tokio::time::timeout(
            self.http.timeout(),
            self.http.post_json(url.as_str(), bearer, &body),
        )
        .await
        .map_err(|_| NetworkError::Timeout(self.http.timeout().as_secs()))??;

        adapter.extract_text(response)
    }
}

impl TextGenerator for GenerationClient {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(self.generate_text(prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::provider::ResponseFamily;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_endpoints_yield_none() {
        let endpoint = EndpointSpec {
            label: "dead".into(),
            url: "http://127.0.0.1:9/v1beta/models/m:generateContent".into(),
            model: "m".into(),
            family: ResponseFamily::GeminiGenerateContent,
            auth: AuthStyle::QueryKey,
        };
        let client = GenerationClient::new(
            HttpClient::new(Duration::from_secs(2)).unwrap(),
            ProviderSpec::new("test", vec![endpoint]).unwrap(),
            "key",
            GenerationParams {
                temperature: 0.5,
                max_output_tokens: 16,
            },
        );
        assert_eq!(client.generate("hello").await, None);
    }
}
