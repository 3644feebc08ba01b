//! Provider selection

use std::sync::Arc;

use crate::providers::*;
use crate::types::*;

/// Holds the provider chosen at startup.
///
/// `kind()` reports the provider actually in use, which is
/// [`ProviderKind::Deterministic`] when a keyed provider was asked for but
/// its key is missing.
#[derive(Clone)]
pub struct LLMRouter {
    provider: Arc<dyn LLMProvider>,
}

impl LLMRouter {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Choose from `FELT_LLM_PROVIDER`, defaulting to Ollama. A `.env` file
    /// is read first when present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let kind = match std::env::var("FELT_LLM_PROVIDER") {
            Ok(name) => name.parse().unwrap_or_else(|e: LLMError| {
                tracing::warn!(error = %e, "Falling back to ollama");
                ProviderKind::Ollama
            }),
            Err(_) => ProviderKind::Ollama,
        };

        Self::from_kind(kind)
    }

    pub fn from_kind(kind: ProviderKind) -> Self {
        let provider: Arc<dyn LLMProvider> = match kind {
            ProviderKind::Ollama => Arc::new(OllamaProvider::from_env()),
            ProviderKind::OpenAICompat => Arc::new(OpenAICompatProvider::from_env()),
            ProviderKind::Gemini => match GeminiProvider::from_env() {
                Some(gemini) => Arc::new(gemini),
                None => {
                    tracing::warn!("GEMINI_API_KEY not set, enhancement runs offline");
                    Arc::new(DeterministicProvider::new())
                }
            },
            ProviderKind::Deterministic => Arc::new(DeterministicProvider::new()),
        };

        tracing::debug!(provider = provider.name(), "LLM provider selected");
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub async fn is_available(&self) -> bool {
        self.provider.is_available().await
    }

    pub async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.provider.complete(request).await
    }
}

impl Default for LLMRouter {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_deterministic() {
        let router = LLMRouter::from_kind(ProviderKind::Deterministic);
        assert_eq!(router.kind(), ProviderKind::Deterministic);
        assert_eq!(router.provider().name(), "Deterministic");
    }

    #[tokio::test]
    async fn test_router_completes_through_provider() {
        let router = LLMRouter::new(Arc::new(DeterministicProvider::new()));
        let response = router
            .complete(CompletionRequest::new(vec![Message::user("hello there")]))
            .await
            .unwrap();
        assert_eq!(response.content, "Hello there.");
    }
}
