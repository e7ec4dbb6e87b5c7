use crate::config::constants::ERROR_BODY_PREVIEW_CHARS;
use crate::network::errors::NetworkError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

// * The single HTTP engine used for provider calls.
// * One request per call; retries and fallback belong to the caller.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    // * @param timeout - ceiling for one whole request/response exchange
    pub fn new(timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // * POSTs `body` as JSON and decodes a JSON answer.
    // * Non-2xx answers become `Status` with a short body preview.
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<R, NetworkError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let parsed = Url::parse(url).map_err(|_| NetworkError::InvalidUrl(redact(url)))?;

        let mut request = self.inner.post(parsed).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(NetworkError::Status {
                code: status.as_u16(),
                body: text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            });
        }

        resp.json::<R>().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, err: reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout(self.timeout.as_secs())
        } else {
            NetworkError::Request(err.without_url())
        }
    }
}

// * Keeps API keys passed as query parameters out of logs
pub fn redact(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.query().is_some() {
                parsed.set_query(Some("redacted"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparseable url>".to_string(),
    }
}
