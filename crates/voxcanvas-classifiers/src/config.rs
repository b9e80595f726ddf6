//! Configuration for the moderation stages

use crate::thresholds::ThresholdTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use voxcanvas_core::{Error, Result};

/// Configuration for text moderation and image rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModerationConfig {
    /// Severity buckets for prompt text
    #[serde(default = "default_text_thresholds")]
    pub text_thresholds: ThresholdTable,

    /// Severity buckets for generated images
    #[serde(default = "default_image_thresholds")]
    pub image_thresholds: ThresholdTable,

    /// Terms blocked in addition to the curated high-severity set
    #[serde(default)]
    pub blocked_terms: Vec<String>,
}

impl ModerationConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid moderation config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Validate both threshold tables
    pub fn validate(&self) -> Result<()> {
        self.text_thresholds
            .validate()
            .map_err(|e| Error::config(format!("text_thresholds: {}", e)))?;
        self.image_thresholds
            .validate()
            .map_err(|e| Error::config(format!("image_thresholds: {}", e)))?;
        Ok(())
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            text_thresholds: default_text_thresholds(),
            image_thresholds: default_image_thresholds(),
            blocked_terms: Vec::new(),
        }
    }
}

fn default_text_thresholds() -> ThresholdTable {
    ThresholdTable::TEXT
}

fn default_image_thresholds() -> ThresholdTable {
    ThresholdTable::IMAGE
}
