//! Lumina Core - room redecoration pipeline
//!
//! Turns one or more photos of a room into:
//! - A structural description of the space (from the first photo)
//! - A redecorated rendition of every photo (per-photo failures tolerated)
//! - A design concept and shopping list for the first successful rendition
//!
//! The three AI calls are abstract capabilities ([`StructuralAnalyzer`],
//! [`DecorationGenerator`], [`ConceptCurator`]); transport and provider
//! details live in their implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumina_core::prelude::*;
//!
//! # async fn example(capabilities: Capabilities, photos: Vec<EncodedImage>) -> Result<(), PipelineError> {
//! let orchestrator = PipelineOrchestrator::new(capabilities, PipelineConfig::default());
//!
//! let mut session = DesignSession::new(
//!     Preferences::new()
//!         .with_room_type("Living room")
//!         .with_style("Japandi")
//!         .with_functionality("Reading and tea")
//!         .with_colors(ColorDirective::Automatic),
//! );
//! session.add_images(photos);
//! session.finalize_images()?;
//!
//! if let Some(result) = session.run(&orchestrator).await? {
//!     println!("{} of {} rooms redecorated", result.successful_count(), result.variations.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod capability;
pub mod config;
pub mod curation;
pub mod directive;
pub mod error;
pub mod media;
pub mod orchestrator;
pub mod preferences;
pub mod session;
pub mod stage;
pub mod telemetry;
pub mod types;

// Re-exports for convenience
pub use capability::{Capabilities, ConceptCurator, DecorationGenerator, StructuralAnalyzer};
pub use config::{load_config, LoggingConfig, PipelineConfig};
pub use curation::curate_or_fallback;
pub use directive::GenerationDirective;
pub use error::{
    AnalysisError, ConfigError, CurationError, GenerationError, InputError, PipelineError,
};
pub use media::{ContentHash, EncodedImage, ImageMime};
pub use orchestrator::PipelineOrchestrator;
pub use preferences::{BudgetTier, ColorDirective, Preferences};
pub use session::{DesignSession, SessionId};
pub use stage::{PipelineStage, ProgressSink, ResumePoint, StageKind};
pub use telemetry::init_tracing;
pub use types::{CuratedConcept, PipelineResult, ShoppingItem, Variation, VariationId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Lumina Core
    pub use crate::{
        Capabilities, ColorDirective, ConceptCurator, DecorationGenerator, DesignSession,
        EncodedImage, PipelineConfig, PipelineError, PipelineOrchestrator, PipelineResult,
        PipelineStage, Preferences, StructuralAnalyzer, Variation,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
