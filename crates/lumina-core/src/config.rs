//! Pipeline configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file is a
//! valid configuration.
//!
//! ```toml
//! fallback_concept = "A modern design focused on comfort and aesthetics."
//! min_shopping_items = 3
//! max_shopping_items = 6
//! generation_concurrency = 4
//!
//! [logging]
//! level = "debug"
//! json = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Concept used when curation fails
pub const DEFAULT_FALLBACK_CONCEPT: &str = "A modern design focused on comfort and aesthetics.";

/// Analysis used when the analyzer answers with no text
pub const DEFAULT_FALLBACK_ANALYSIS: &str = "The room structure could not be described.";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concept returned with an empty shopping list when curation fails
    pub fallback_concept: String,
    /// Structural description used when the analyzer returns blank text
    pub fallback_analysis: String,
    /// Fewest shopping items a well-formed curation may return
    pub min_shopping_items: usize,
    /// Most shopping items kept from a curation
    pub max_shopping_items: usize,
    /// Cap on in-flight generation calls; `None` issues all at once
    pub generation_concurrency: Option<usize>,
    /// Log output
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With fallback concept
    #[inline]
    #[must_use]
    pub fn with_fallback_concept(mut self, concept: impl Into<String>) -> Self {
        self.fallback_concept = concept.into();
        self
    }

    /// With generation concurrency cap
    #[inline]
    #[must_use]
    pub fn with_generation_concurrency(mut self, limit: usize) -> Self {
        self.generation_concurrency = Some(limit);
        self
    }

    /// With shopping item bounds
    #[inline]
    #[must_use]
    pub fn with_item_bounds(mut self, min: usize, max: usize) -> Self {
        self.min_shopping_items = min;
        self.max_shopping_items = max;
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value constraints
    ///
    /// # Errors
    /// `ConfigError::Invalid` describing the first violated constraint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fallback_concept.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fallback_concept must not be empty".to_string(),
            ));
        }

        if self.fallback_analysis.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fallback_analysis must not be empty".to_string(),
            ));
        }

        if self.min_shopping_items == 0 {
            return Err(ConfigError::Invalid(
                "min_shopping_items must be > 0".to_string(),
            ));
        }

        if self.min_shopping_items > self.max_shopping_items {
            return Err(ConfigError::Invalid(format!(
                "min_shopping_items ({}) exceeds max_shopping_items ({})",
                self.min_shopping_items, self.max_shopping_items
            )));
        }

        if self.generation_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "generation_concurrency must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fallback_concept: DEFAULT_FALLBACK_CONCEPT.to_string(),
            fallback_analysis: DEFAULT_FALLBACK_ANALYSIS.to_string(),
            min_shopping_items: 3,
            max_shopping_items: 6,
            generation_concurrency: None,
            logging: LoggingConfig::default(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback level when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load pipeline configuration from a TOML file
///
/// # Errors
/// `ConfigError::Io`, `ConfigError::Parse` or `ConfigError::Invalid`
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = PipelineConfig::from_toml_str(&content)?;
    tracing::debug!(path = %path.display(), "loaded pipeline config");
    Ok(config)
}
