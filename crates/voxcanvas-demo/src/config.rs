//! Demo configuration

use crate::cli::Overrides;
use serde::{Deserialize, Serialize};
use std::path::Path;
use voxcanvas_classifiers::ModerationConfig;
use voxcanvas_pipeline::PipelineConfig;

/// Everything the demo needs to build a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default)]
    pub moderation: ModerationConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub mock: MockConfig,
}

/// Behavior of the mock providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_true")]
    pub text_classifier_available: bool,

    #[serde(default = "default_true")]
    pub image_classifier_available: bool,

    /// Generator calls that fail before the first success
    #[serde(default)]
    pub transient_failures: u32,

    /// Upper bound of the simulated generation delay
    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            text_classifier_available: true,
            image_classifier_available: true,
            transient_failures: 0,
            max_latency_ms: default_max_latency_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_latency_ms() -> u64 {
    250
}

impl DemoConfig {
    /// Load configuration from file and CLI overrides.
    ///
    /// A missing file at the default path falls back to defaults; an explicit
    /// path must exist.
    pub fn load(config_path: Option<&str>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e))?;
                serde_yaml::from_str(&content)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                let content = std::fs::read_to_string(DEFAULT_CONFIG_PATH)?;
                serde_yaml::from_str(&content)?
            }
            None => Self::default(),
        };

        config.apply(overrides);
        config.moderation.validate()?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides
    pub fn apply(&mut self, overrides: &Overrides) {
        if overrides.text_offline {
            self.mock.text_classifier_available = false;
        }
        if overrides.image_offline {
            self.mock.image_classifier_available = false;
        }
        if let Some(failures) = overrides.fail_generations {
            self.mock.transient_failures = failures;
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.pipeline.retry.max_attempts = max_attempts;
        }
        self.moderation
            .blocked_terms
            .extend(overrides.block_terms.iter().cloned());
    }
}

/// Path probed when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "voxcanvas.yaml";
