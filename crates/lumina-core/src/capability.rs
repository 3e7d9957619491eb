//! External AI capabilities consumed by the pipeline
//!
//! Transport, authentication and timeouts belong to the implementations; the
//! orchestrator only sees these traits. Each call is one suspension point of
//! a run.

use crate::error::{AnalysisError, CurationError, GenerationError};
use crate::media::EncodedImage;
use crate::preferences::Preferences;
use crate::types::CuratedConcept;
use async_trait::async_trait;
use std::sync::Arc;

/// Describes the fixed structure of a room from one image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StructuralAnalyzer: Send + Sync {
    /// Layout, openings and fixed constraints, as free text
    async fn analyze(&self, image: &EncodedImage) -> Result<String, AnalysisError>;
}

/// Produces a redecorated rendition of a room
///
/// Implementations build their instruction with
/// [`crate::directive::GenerationDirective::build`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DecorationGenerator: Send + Sync {
    /// New image of the same space, decorated per the preferences
    async fn generate(
        &self,
        image: &EncodedImage,
        preferences: &Preferences,
        analysis: &str,
    ) -> Result<EncodedImage, GenerationError>;
}

/// Writes the design narrative and shopping list for one decorated pair
///
/// Implementations parse provider output with
/// [`CuratedConcept::from_model_output`](crate::types::CuratedConcept::from_model_output).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConceptCurator: Send + Sync {
    /// Concept and items for `generated`, the redecoration of `original`
    async fn curate(
        &self,
        original: &EncodedImage,
        generated: &EncodedImage,
        preferences: &Preferences,
    ) -> Result<CuratedConcept, CurationError>;
}

/// The three capabilities a pipeline needs
#[derive(Clone)]
pub struct Capabilities {
    /// Structural analyzer
    pub analyzer: Arc<dyn StructuralAnalyzer>,
    /// Decoration generator
    pub generator: Arc<dyn DecorationGenerator>,
    /// Concept curator
    pub curator: Arc<dyn ConceptCurator>,
}

impl Capabilities {
    /// Bundle three capability implementations
    #[must_use]
    pub fn new(
        analyzer: impl StructuralAnalyzer + 'static,
        generator: impl DecorationGenerator + 'static,
        curator: impl ConceptCurator + 'static,
    ) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            generator: Arc::new(generator),
            curator: Arc::new(curator),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
