//! Curation output parsing and the local-recovery boundary
//!
//! Curation never aborts a run that already has images to show:
//! [`curate_or_fallback`] turns every curator failure into the configured
//! fallback concept with an empty shopping list.

use crate::capability::ConceptCurator;
use crate::config::PipelineConfig;
use crate::error::CurationError;
use crate::preferences::Preferences;
use crate::types::{CuratedConcept, ShoppingItem, Variation};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawConcept {
    concept: String,
    #[serde(default)]
    items: Vec<ShoppingItem>,
}

impl CuratedConcept {
    /// Parse a curator's JSON answer
    ///
    /// Markdown code fences around the JSON are tolerated. The concept must
    /// be non-blank and every item must carry all four fields.
    ///
    /// # Errors
    /// `CurationError::Malformed` if the text is not the expected shape
    pub fn from_model_output(text: &str) -> Result<Self, CurationError> {
        let cleaned = strip_code_fence(text);
        if cleaned.is_empty() {
            return Err(CurationError::Malformed("empty response".to_string()));
        }

        let raw: RawConcept = serde_json::from_str(cleaned)?;
        let concept = raw.concept.trim().to_string();
        if concept.is_empty() {
            return Err(CurationError::Malformed("concept is empty".to_string()));
        }

        Ok(Self {
            concept,
            items: raw.items,
        })
    }

    /// Enforce the item-count window
    ///
    /// Items past `max` are dropped; fewer than `min` is malformed.
    ///
    /// # Errors
    /// `CurationError::Malformed` for a blank concept or too few items
    pub fn normalized(mut self, min: usize, max: usize) -> Result<Self, CurationError> {
        if self.concept.trim().is_empty() {
            return Err(CurationError::Malformed("concept is empty".to_string()));
        }
        // A short list voids the whole answer, concept included
        if self.items.len() < min {
            return Err(CurationError::Malformed(format!(
                "expected at least {min} items, got {}",
                self.items.len()
            )));
        }
        self.items.truncate(max);
        Ok(self)
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Curate one variation, absorbing every failure
///
/// `variation` must carry a generated image; without one the fallback is
/// returned without calling the curator.
pub async fn curate_or_fallback(
    curator: &dyn ConceptCurator,
    variation: &Variation,
    preferences: &Preferences,
    config: &PipelineConfig,
) -> CuratedConcept {
    let Some(generated) = variation.generated.as_ref() else {
        tracing::warn!(variation = %variation.id, "no generated image to curate");
        return CuratedConcept::fallback(&config.fallback_concept);
    };

    let outcome = curator
        .curate(&variation.original, generated, preferences)
        .await
        .and_then(|c| c.normalized(config.min_shopping_items, config.max_shopping_items));

    match outcome {
        Ok(curated) => {
            tracing::info!(
                variation = %variation.id,
                items = curated.items.len(),
                "curation completed"
            );
            curated
        }
        Err(err) => {
            tracing::warn!(variation = %variation.id, error = %err, "curation failed, using fallback concept");
            CuratedConcept::fallback(&config.fallback_concept)
        }
    }
}
