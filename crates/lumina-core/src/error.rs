//! Error types for Lumina Core
//!
//! Provides error handling for:
//! - Malformed images and incomplete preferences
//! - Capability (analyzer, generator, curator) failures
//! - Fatal pipeline aborts and the stage they happened in
//! - Configuration loading

use crate::stage::StageKind;

/// Main pipeline error type
///
/// Only fatal conditions reach the caller. Per-image generation failures and
/// curation failures are absorbed inside the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Malformed image or incomplete preferences
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Structural analysis of the representative image failed
    #[error("analysis failed: {0}")]
    AnalysisFailed(#[source] AnalysisError),

    /// Every generation call of the fan-out failed
    #[error("all {attempted} generations failed")]
    AllGenerationsFailed {
        /// Number of variations that were attempted
        attempted: usize,
    },
}

impl PipelineError {
    /// Stage in which the run aborted
    #[inline]
    #[must_use]
    pub fn stage(&self) -> StageKind {
        match self {
            Self::InvalidInput(_) => StageKind::Idle,
            Self::AnalysisFailed(_) => StageKind::Analyzing,
            Self::AllGenerationsFailed { .. } => StageKind::Generating,
        }
    }

    /// Check if repeating the run with the same input may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidInput(_) => false,
            Self::AnalysisFailed(e) => e.is_transient(),
            Self::AllGenerationsFailed { .. } => true,
        }
    }
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Image payload has no bytes
    #[error("image payload is empty")]
    EmptyImage,

    /// MIME type is not one of the supported encodings
    #[error("unsupported image encoding: {0}")]
    UnsupportedEncoding(String),

    /// Payload could not be decoded
    #[error("malformed image payload: {0}")]
    MalformedPayload(String),

    /// No images were selected
    #[error("no images selected")]
    NoImages,

    /// A required preference is missing
    #[error("preference not set: {0}")]
    IncompletePreferences(&'static str),

    /// Variation index out of range
    #[error("no image at index {0}")]
    IndexOutOfRange(usize),
}

/// Structural analyzer errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalysisError {
    /// Provider rejected or failed the request
    #[error("provider error: {0}")]
    Provider(String),

    /// Transport failure reaching the provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Call exceeded the capability's deadline
    #[error("analysis timed out after {duration_secs}s")]
    Timeout {
        /// Elapsed seconds
        duration_secs: u64,
    },
}

impl AnalysisError {
    /// Transport hiccups and timeouts are worth retrying
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }
}

/// Decoration generator errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerationError {
    /// Provider rejected or failed the request
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider answered without an image
    #[error("no image in provider response")]
    NoImage,

    /// Provider echoed the input image back
    #[error("generated image is identical to the original")]
    Unchanged,

    /// Image handed to the generator was invalid
    #[error(transparent)]
    InvalidInput(#[from] InputError),

    /// Call exceeded the capability's deadline
    #[error("generation timed out after {duration_secs}s")]
    Timeout {
        /// Elapsed seconds
        duration_secs: u64,
    },
}

/// Concept curator errors
///
/// Never surfaced to pipeline callers; see [`crate::curation::curate_or_fallback`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum CurationError {
    /// Provider rejected or failed the request
    #[error("provider error: {0}")]
    Provider(String),

    /// Provider output did not match the expected shape
    #[error("malformed curation output: {0}")]
    Malformed(String),

    /// Call exceeded the capability's deadline
    #[error("curation timed out after {duration_secs}s")]
    Timeout {
        /// Elapsed seconds
        duration_secs: u64,
    },
}

impl From<serde_json::Error> for CurationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid TOML for the schema
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parsed but violate a constraint
    #[error("invalid config: {0}")]
    Invalid(String),
}
