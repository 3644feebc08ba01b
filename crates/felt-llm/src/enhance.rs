//! Listing text enhancement
//!
//! Enhancement is optional enrichment for listing descriptions. A failure
//! here is reported to the caller and never touches marketplace state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use felt_types::{FeltError, ListingType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::LLMProvider;
use crate::types::{CompletionRequest, Message};

const BASE_PROMPT: &str = "You are an expert copywriter for a poker marketplace. \
Enhance the following listing description to be more appealing, professional, and clear \
for potential buyers and students. Highlight key benefits and unique selling points. \
Keep the tone engaging and trustworthy, concise but informative. \
Reply with the improved description text only, no intro or outro.";

const STAKING_FOCUS: &str = "Focus on what a backer wants to know: the player's confidence, \
the significance of the tournament, potential ROI and reporting transparency.";

const COACHING_FOCUS: &str = "Focus on what a student will gain: skill improvement, \
results-oriented coaching, teaching methods and value for money.";

/// Which kind of listing the text describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementCategory {
    Staking,
    Coaching,
}

impl EnhancementCategory {
    fn focus(&self) -> &'static str {
        match self {
            Self::Staking => STAKING_FOCUS,
            Self::Coaching => COACHING_FOCUS,
        }
    }

    /// System prompt sent to the provider
    pub fn system_prompt(&self) -> String {
        format!("{}\n{}", BASE_PROMPT, self.focus())
    }
}

impl From<ListingType> for EnhancementCategory {
    fn from(listing_type: ListingType) -> Self {
        match listing_type {
            ListingType::Staking => Self::Staking,
            ListingType::Coaching => Self::Coaching,
        }
    }
}

/// Enhancement failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnhanceError {
    #[error("Nothing to enhance: input text is empty")]
    EmptyInput,

    #[error("Input text exceeds {max} characters")]
    InputTooLong { max: usize },

    #[error("Enhancement service unavailable: {reason}")]
    ServiceUnavailable { reason: String },
}

impl From<EnhanceError> for FeltError {
    fn from(err: EnhanceError) -> Self {
        match err {
            EnhanceError::EmptyInput => FeltError::validation("text", "input text is empty"),
            EnhanceError::InputTooLong { max } => {
                FeltError::validation("text", format!("longer than {} characters", max))
            }
            EnhanceError::ServiceUnavailable { reason } => FeltError::service_unavailable(reason),
        }
    }
}

/// A collaborator that rewrites listing text
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(
        &self,
        text: &str,
        category: EnhancementCategory,
    ) -> std::result::Result<String, EnhanceError>;
}

/// [`TextEnhancer`] backed by an LLM provider
pub struct LlmTextEnhancer {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
    max_input_chars: usize,
}

impl LlmTextEnhancer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(20),
            max_input_chars: 4_000,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

#[async_trait]
impl TextEnhancer for LlmTextEnhancer {
    async fn enhance(
        &self,
        text: &str,
        category: EnhancementCategory,
    ) -> std::result::Result<String, EnhanceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EnhanceError::EmptyInput);
        }
        if text.chars().count() > self.max_input_chars {
            return Err(EnhanceError::InputTooLong {
                max: self.max_input_chars,
            });
        }

        let request = CompletionRequest::new(vec![Message::user(text)])
            .with_system(category.system_prompt())
            .with_temperature(0.7);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                tracing::warn!(
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Enhancement timed out"
                );
                EnhanceError::ServiceUnavailable {
                    reason: format!("{} timed out", self.provider.name()),
                }
            })?
            .map_err(|e| {
                tracing::warn!(provider = self.provider.name(), error = %e, "Enhancement failed");
                EnhanceError::ServiceUnavailable {
                    reason: e.to_string(),
                }
            })?;

        let enhanced = response.content.trim();
        if enhanced.is_empty() {
            return Err(EnhanceError::ServiceUnavailable {
                reason: format!("{} returned an empty response", self.provider.name()),
            });
        }

        tracing::debug!(
            provider = self.provider.name(),
            ?category,
            input_chars = text.len(),
            output_chars = enhanced.len(),
            "Text enhanced"
        );
        Ok(enhanced.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::DeterministicProvider;
    use crate::types::{CompletionResponse, LLMError, ProviderKind, Result};

    struct FailingProvider;

    #[async_trait]
    impl LLMProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn is_available(&self) -> bool {
            false
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            Err(LLMError::Unreachable {
                provider: "Failing",
                message: "connection refused".to_string(),
            })
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl LLMProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "Slow"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::new("late", "slow"))
        }
    }

    struct BlankProvider;

    #[async_trait]
    impl LLMProvider for BlankProvider {
        fn name(&self) -> &'static str {
            "Blank"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            Ok(CompletionResponse::new("   \n", "blank"))
        }
    }

    #[tokio::test]
    async fn test_enhance_with_deterministic_provider() {
        let enhancer = LlmTextEnhancer::new(Arc::new(DeterministicProvider::new()));
        let out = enhancer
            .enhance("  selling 20% of my  main event ", EnhancementCategory::Staking)
            .await
            .unwrap();
        assert_eq!(out, "Selling 20% of my main event.");
    }

    #[tokio::test]
    async fn test_empty_input_never_reaches_provider() {
        let enhancer = LlmTextEnhancer::new(Arc::new(FailingProvider));
        let err = enhancer
            .enhance("   ", EnhancementCategory::Coaching)
            .await
            .unwrap_err();
        assert_eq!(err, EnhanceError::EmptyInput);
    }

    #[tokio::test]
    async fn test_provider_failure_is_service_unavailable() {
        let enhancer = LlmTextEnhancer::new(Arc::new(FailingProvider));
        let err = enhancer
            .enhance("plo coaching", EnhancementCategory::Coaching)
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::ServiceUnavailable { .. }));
        assert!(FeltError::from(err).is_retriable());
    }

    #[tokio::test]
    async fn test_timeout_is_service_unavailable() {
        let enhancer =
            LlmTextEnhancer::new(Arc::new(SlowProvider)).with_timeout(Duration::from_millis(20));
        let err = enhancer
            .enhance("plo coaching", EnhancementCategory::Coaching)
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::ServiceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_blank_response_is_service_unavailable() {
        let enhancer = LlmTextEnhancer::new(Arc::new(BlankProvider));
        let err = enhancer
            .enhance("plo coaching", EnhancementCategory::Coaching)
            .await
            .unwrap_err();
        assert!(matches!(err, EnhanceError::ServiceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_input_length_limit() {
        let enhancer =
            LlmTextEnhancer::new(Arc::new(DeterministicProvider::new())).with_max_input_chars(5);
        let err = enhancer
            .enhance("too long for this", EnhancementCategory::Staking)
            .await
            .unwrap_err();
        assert_eq!(err, EnhanceError::InputTooLong { max: 5 });
        assert!(matches!(FeltError::from(err), FeltError::Validation { .. }));
    }

    #[test]
    fn test_category_prompts_differ() {
        assert!(EnhancementCategory::Staking.system_prompt().contains("backer"));
        assert!(EnhancementCategory::Coaching.system_prompt().contains("student"));
        assert_eq!(
            EnhancementCategory::from(ListingType::Coaching),
            EnhancementCategory::Coaching
        );
    }
}
