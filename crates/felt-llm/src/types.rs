//! Prompt, completion and error types shared by every provider

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider-level failures
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("{provider} is unreachable: {message}")]
    Unreachable {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} answered HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} sent an unreadable response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },

    #[error("Unknown LLM provider '{name}'")]
    UnknownProvider { name: String },
}

pub type Result<T> = std::result::Result<T, LLMError>;

/// Speaker of a prompt turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A prompt to complete. The model comes from the provider's configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The system prompt followed by the conversation turns, in chat order
    pub fn chat_turns(&self) -> Vec<Message> {
        self.system
            .iter()
            .map(Message::system)
            .chain(self.messages.iter().cloned())
            .collect()
    }

    /// Text of the last user turn, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Generated text plus the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}

impl CompletionResponse {
    pub fn new(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
        }
    }
}

/// Which provider backs text enhancement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local Ollama daemon
    Ollama,
    /// Any server speaking the OpenAI chat completions API
    #[serde(rename = "openai_compat")]
    OpenAICompat,
    /// Google Gemini
    Gemini,
    /// Offline text tidying, no model
    Deterministic,
}

impl FromStr for ProviderKind {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compat" | "openai-compat" | "openai" => Ok(Self::OpenAICompat),
            "gemini" | "google" => Ok(Self::Gemini),
            "deterministic" | "none" | "offline" => Ok(Self::Deterministic),
            _ => Err(LLMError::UnknownProvider {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAICompat => write!(f, "openai_compat"),
            Self::Gemini => write!(f, "gemini"),
            Self::Deterministic => write!(f, "deterministic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAICompat);
        assert_eq!(" none ".parse::<ProviderKind>().unwrap(), ProviderKind::Deterministic);
        assert!(matches!(
            "grok".parse::<ProviderKind>(),
            Err(LLMError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn test_kind_round_trips_through_display() {
        for kind in [
            ProviderKind::Ollama,
            ProviderKind::OpenAICompat,
            ProviderKind::Gemini,
            ProviderKind::Deterministic,
        ] {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::Value::String(kind.to_string())
            );
        }
    }

    #[test]
    fn test_chat_turns_put_system_first() {
        let req = CompletionRequest::new(vec![Message::user("first"), Message::user("second")])
            .with_system("be brief");
        let turns = req.chat_turns();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], Message::system("be brief"));
        assert_eq!(req.last_user_content(), Some("second"));
    }
}
