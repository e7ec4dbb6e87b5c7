// * Response adapters
// * One adapter per response family. Everything family-specific about the wire format
// * lives here; the client only sees JSON in and text out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationSettings;
use crate::generation::errors::EndpointError;
use crate::generation::provider::ResponseFamily;

/// Sampling options forwarded to every endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl From<&GenerationSettings> for GenerationParams {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

pub trait ResponseAdapter: Send + Sync {
    /// JSON body for one request
    fn request_body(&self, model: &str, prompt: &str, params: &GenerationParams) -> Result<Value, EndpointError>;

    /// Generated text from a success body; whitespace-only text is `EmptyText`
    fn extract_text(&self, body: Value) -> Result<String, EndpointError>;
}

static GEMINI: GeminiAdapter = GeminiAdapter;
static OPENAI_CHAT: OpenAiChatAdapter = OpenAiChatAdapter;

pub fn adapter_for(family: ResponseFamily) -> &'static dyn ResponseAdapter {
    match family {
        ResponseFamily::GeminiGenerateContent => &GEMINI,
        ResponseFamily::OpenAiChat => &OPENAI_CHAT,
    }
}

fn non_empty(text: String) -> Result<String, EndpointError> {
    if text.trim().is_empty() {
        Err(EndpointError::EmptyText)
    } else {
        Ok(text)
    }
}

// * ---- Gemini generateContent ----

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiAdapter;

impl ResponseAdapter for GeminiAdapter {
    fn request_body(&self, _model: &str, prompt: &str, params: &GenerationParams) -> Result<Value, EndpointError> {
        // * Model travels in the URL path for this family
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };
        Ok(serde_json::to_value(request)?)
    }

    fn extract_text(&self, body: Value) -> Result<String, EndpointError> {
        let response: GeminiResponse = serde_json::from_value(body)?;
        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        non_empty(text)
    }
}

// * ---- OpenAI-style chat/completions ----

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiChatAdapter;

impl ResponseAdapter for OpenAiChatAdapter {
    fn request_body(&self, model: &str, prompt: &str, params: &GenerationParams) -> Result<Value, EndpointError> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };
        Ok(serde_json::to_value(request)?)
    }

    fn extract_text(&self, body: Value) -> Result<String, EndpointError> {
        let response: ChatResponse = serde_json::from_value(body)?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(text)
    }
}
