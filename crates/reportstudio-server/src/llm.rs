//! Outbound LLM provider client.
//!
//! Every provider except Ollama speaks the OpenAI-compatible chat API;
//! Ollama has its own generate/tags endpoints. Calls are a single attempt
//! with a hard timeout: no retry, no backoff. Failures are typed by the
//! upstream HTTP status so the API layer can map them faithfully.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const CHAT_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Mistral,
    OpenAi,
    DeepSeek,
    Gemini,
    Ollama,
}

impl Provider {
    pub fn parse(value: &str) -> Option<Provider> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mistral" => Some(Provider::Mistral),
            "openai" => Some(Provider::OpenAi),
            "deepseek" => Some(Provider::DeepSeek),
            "gemini" => Some(Provider::Gemini),
            "ollama" => Some(Provider::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Mistral => "mistral",
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
            Provider::Gemini => "gemini",
            Provider::Ollama => "ollama",
        }
    }

    /// Key prefix in the settings store (`MISTRAL_BASE_URL` etc.).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Provider::Mistral => "MISTRAL",
            Provider::OpenAi => "OPENAI",
            Provider::DeepSeek => "DEEPSEEK",
            Provider::Gemini => "GEMINI",
            Provider::Ollama => "OLLAMA",
        }
    }

    /// Default base URL including the API version segment, so endpoint
    /// paths are plain `chat/completions` / `models` joins.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Mistral => "https://api.mistral.ai/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Mistral => "mistral-medium-latest",
            Provider::OpenAi => "gpt-4-turbo-preview",
            Provider::DeepSeek => "deepseek-chat",
            Provider::Gemini => "gemini-pro",
            Provider::Ollama => "llama3",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama)
    }

    /// Base for OpenAI-compatible calls. Ollama exposes the compatible
    /// surface under `/v1` next to its native API.
    pub fn chat_base(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Provider::Ollama => format!("{base}/v1"),
            _ => base.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider {0} is not configured")]
    NotConfigured(&'static str),

    #[error("missing API key for provider {0}")]
    MissingApiKey(&'static str),

    #[error("provider did not respond in time")]
    Timeout,

    #[error("invalid or expired API credentials")]
    InvalidCredentials,

    #[error("access forbidden by provider")]
    Forbidden,

    #[error("provider rate limit reached")]
    RateLimited,

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("provider unreachable: {0}")]
    Unavailable(String),

    #[error("provider error: HTTP {0}")]
    Upstream(u16),
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// One chat completion request.
#[derive(Debug, Clone, Copy)]
pub struct ChatParams<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

// OpenAI-compatible wire shapes.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        LlmClient { http }
    }

    /// One chat completion against an OpenAI-compatible endpoint.
    pub async fn chat(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        params: ChatParams<'_>,
    ) -> LlmResult<String> {
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: params.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: params.system,
                },
                ChatMessage {
                    role: "user",
                    content: params.user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| LlmError::MalformedResponse("empty choices".to_string()))
    }

    /// Ollama's native non-streaming generate endpoint.
    pub async fn generate_ollama(
        &self,
        base_url: &str,
        model: &str,
        prompt: &str,
    ) -> LlmResult<String> {
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
        let body = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
        Ok(parsed.response.trim().to_string())
    }

    /// Lists available model identifiers for a provider.
    pub async fn list_models(
        &self,
        provider: Provider,
        base_url: &str,
        api_key: Option<&str>,
    ) -> LlmResult<Vec<String>> {
        let base = base_url.trim_end_matches('/');
        let url = match provider {
            Provider::Ollama => format!("{base}/api/tags"),
            _ => format!("{base}/models"),
        };

        let mut request = self.http.get(&url).timeout(PROBE_TIMEOUT);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        match provider {
            Provider::Ollama => {
                let parsed: OllamaTagsResponse = response
                    .json()
                    .await
                    .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
                Ok(parsed.models.into_iter().map(|m| m.name).collect())
            }
            _ => {
                let parsed: ModelsResponse = response
                    .json()
                    .await
                    .map_err(|err| LlmError::MalformedResponse(err.to_string()))?;
                Ok(parsed.data.into_iter().map(|m| m.id).collect())
            }
        }
    }
}

fn classify_transport(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else if err.is_connect() {
        LlmError::Unavailable("connection refused".to_string())
    } else {
        LlmError::Unavailable(err.to_string())
    }
}

fn classify_status(code: u16) -> LlmError {
    match code {
        401 => LlmError::InvalidCredentials,
        403 => LlmError::Forbidden,
        429 => LlmError::RateLimited,
        other => LlmError::Upstream(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_known_providers() {
        assert_eq!(Provider::parse("Mistral"), Some(Provider::Mistral));
        assert_eq!(Provider::parse(" ollama "), Some(Provider::Ollama));
        assert_eq!(Provider::parse("claude"), None);
    }

    #[test]
    fn only_ollama_skips_api_keys() {
        assert!(!Provider::Ollama.requires_api_key());
        assert!(Provider::Mistral.requires_api_key());
    }

    #[test]
    fn ollama_chat_base_gains_version_segment() {
        assert_eq!(
            Provider::Ollama.chat_base("http://localhost:11434/"),
            "http://localhost:11434/v1"
        );
        assert_eq!(
            Provider::Mistral.chat_base("https://api.mistral.ai/v1"),
            "https://api.mistral.ai/v1"
        );
    }

    #[test]
    fn status_classification_matches_error_contract() {
        assert!(matches!(classify_status(401), LlmError::InvalidCredentials));
        assert!(matches!(classify_status(403), LlmError::Forbidden));
        assert!(matches!(classify_status(429), LlmError::RateLimited));
        assert!(matches!(classify_status(500), LlmError::Upstream(500)));
    }
}
