//! Marketplace configuration

use felt_llm::ProviderKind;
use serde::{Deserialize, Serialize};

/// Marketplace settings. Every field has a default, so partial config
/// files deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
    /// Listing text enhancement
    pub enhancement: EnhancementConfig,
    /// Load the demo users, listings and conversations on startup
    pub seed_demo_data: bool,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            enhancement: EnhancementConfig::default(),
            seed_demo_data: true,
        }
    }
}

/// Text enhancement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Disable to run without any enhancer; calls then fail with
    /// `ServiceUnavailable`
    pub enabled: bool,
    pub provider: ProviderKind,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: ProviderKind::Deterministic,
            timeout_secs: 20,
            max_input_chars: 4_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MarketplaceConfig =
            serde_json::from_str(r#"{"enhancement": {"provider": "gemini"}}"#).unwrap();
        assert_eq!(config.event_capacity, 1024);
        assert_eq!(config.enhancement.provider, ProviderKind::Gemini);
        assert_eq!(config.enhancement.timeout_secs, 20);
        assert!(config.seed_demo_data);
    }
}
