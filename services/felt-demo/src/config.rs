//! Demo configuration
//!
//! Sources in increasing priority: an explicit file, `config/default`,
//! `config/local`, then `FELT__SECTION__KEY` environment variables.

use config::{Config, Environment, File};
use felt_marketplace::MarketplaceConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub marketplace: MarketplaceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output shape of the log subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl DemoConfig {
    /// Read every source. A document that fails to deserialize is logged and
    /// replaced by the defaults; a source that fails to load is an error.
    pub fn load(explicit_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let files = explicit_path
            .into_iter()
            .chain(["config/default", "config/local"]);

        let merged = files
            .fold(Config::builder(), |builder, path| {
                builder.add_source(File::with_name(path).required(false))
            })
            .add_source(
                Environment::with_prefix("FELT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(merged.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Configuration unreadable, using defaults");
            DemoConfig::default()
        }))
    }
}
