//! Completion backends
//!
//! Three HTTP backends (Ollama, OpenAI-compatible, Gemini) plus an offline
//! provider that only tidies the text it is given. HTTP backends read their
//! endpoint and model from `FELT_*` variables.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// A source of completions
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Short display name, also used in error messages
    fn name(&self) -> &'static str;

    fn kind(&self) -> ProviderKind;

    /// Cheap reachability probe
    async fn is_available(&self) -> bool;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

/// Send a prepared request and decode a JSON body, mapping each failure
/// stage onto its own error variant.
async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T> {
    let response = request.send().await.map_err(|e| LLMError::Unreachable {
        provider,
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LLMError::Http {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response.json::<T>().await.map_err(|e| LLMError::Malformed {
        provider,
        message: e.to_string(),
    })
}

/// Chat turn as both Ollama and OpenAI-style servers expect it
#[derive(Debug, Serialize, Deserialize)]
struct ChatTurn {
    role: String,
    content: String,
}

impl From<Message> for ChatTurn {
    fn from(message: Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content,
        }
    }
}

// ----------------------------------------------------------------------------
// Ollama
// ----------------------------------------------------------------------------

/// Where to reach a local Ollama daemon
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("FELT_OLLAMA_URL", "http://localhost:11434"),
            model: env_or("FELT_OLLAMA_MODEL", "llama3.1:8b"),
        }
    }
}

pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaConfig::from_env())
    }
}

#[derive(Serialize)]
struct OllamaChatBody {
    model: String,
    messages: Vec<ChatTurn>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaChatReply {
    message: ChatTurn,
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/api/tags", self.config.base_url))
            .send()
            .await
            .is_ok()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = OllamaChatBody {
            model: self.config.model.clone(),
            messages: request.chat_turns().into_iter().map(ChatTurn::from).collect(),
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let post = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&body);
        let reply: OllamaChatReply = send_json(self.name(), post).await?;

        Ok(CompletionResponse::new(
            reply.message.content.trim(),
            &self.config.model,
        ))
    }
}

// ----------------------------------------------------------------------------
// OpenAI-compatible
// ----------------------------------------------------------------------------

/// Any `/chat/completions` server: OpenAI itself, vLLM, llama.cpp
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl OpenAICompatConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("FELT_OPENAI_COMPAT_BASE_URL", "http://localhost:8000/v1"),
            api_key: std::env::var("FELT_OPENAI_COMPAT_API_KEY").ok(),
            model: env_or("FELT_OPENAI_COMPAT_MODEL", "default"),
        }
    }
}

pub struct OpenAICompatProvider {
    config: OpenAICompatConfig,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(config: OpenAICompatConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(OpenAICompatConfig::from_env())
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionBody {
    model: String,
    messages: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatCompletionReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatTurn,
}

#[async_trait]
impl LLMProvider for OpenAICompatProvider {
    fn name(&self) -> &'static str {
        "OpenAI-Compatible"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAICompat
    }

    async fn is_available(&self) -> bool {
        self.authorized(self.client.get(format!("{}/models", self.config.base_url)))
            .send()
            .await
            .is_ok()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatCompletionBody {
            model: self.config.model.clone(),
            messages: request.chat_turns().into_iter().map(ChatTurn::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let post = self.authorized(
            self.client
                .post(format!("{}/chat/completions", self.config.base_url))
                .json(&body),
        );
        let reply: ChatCompletionReply = send_json(self.name(), post).await?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(CompletionResponse::new(content.trim(), &self.config.model))
    }
}

// ----------------------------------------------------------------------------
// Gemini
// ----------------------------------------------------------------------------

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini. Requires `GEMINI_API_KEY`.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    /// `None` when no API key is set
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        Some(Self {
            api_key,
            model: env_or("FELT_GEMINI_MODEL", "gemini-2.5-flash"),
        })
    }
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        GeminiConfig::from_env().map(Self::new)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![GeminiPart { text }],
        }
    }
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GenerateBody {
    fn from_request(request: CompletionRequest) -> Self {
        let contents = request
            .messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = if m.role == Role::Assistant { "model" } else { "user" };
                GeminiContent::text(Some(role), m.content)
            })
            .collect();

        Self {
            contents,
            system_instruction: request.system.map(|s| GeminiContent::text(None, s)),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn is_available(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            GEMINI_ENDPOINT, self.config.model
        );
        let post = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&GenerateBody::from_request(request));
        let reply: GenerateReply = send_json(self.name(), post).await?;

        let content: String = reply
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(CompletionResponse::new(content.trim(), &self.config.model))
    }
}

// ----------------------------------------------------------------------------
// Offline
// ----------------------------------------------------------------------------

/// Offline provider. Returns the last user turn run through [`tidy_text`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicProvider;

impl DeterministicProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Collapse whitespace runs, capitalize the first letter and make sure the
/// text ends with terminal punctuation.
pub fn tidy_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let mut tidy = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    if !tidy.ends_with(['.', '!', '?']) {
        tidy.push('.');
    }
    tidy
}

#[async_trait]
impl LLMProvider for DeterministicProvider {
    fn name(&self) -> &'static str {
        "Deterministic"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Deterministic
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let source = request.last_user_content().unwrap_or_default();
        Ok(CompletionResponse::new(tidy_text(source), "deterministic"))
    }
}
