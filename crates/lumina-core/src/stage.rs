//! Pipeline stages and progress reporting
//!
//! A run moves through `Idle → Analyzing → Generating → Curating → Completed`,
//! with `Failed` reachable only from the stages that have fatal conditions.
//! The current stage is published through a [`tokio::sync::watch`] channel:
//! each update overwrites the previous one, observers only ever see the
//! latest stage.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;

/// Stage discriminant, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// No run in progress
    Idle,
    /// Structural analysis of the first image
    Analyzing,
    /// Decoration fan-out
    Generating,
    /// Concept and shopping curation
    Curating,
    /// Result available
    Completed,
    /// Fatal failure
    Failed,
}

impl StageKind {
    /// Lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Curating => "curating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editable step the caller returns to after a fatal failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumePoint {
    /// Image selection
    Upload,
    /// Room type and functional intent
    RoomDetails,
    /// Style, colors and budget
    #[default]
    StylePreferences,
}

/// Current pipeline stage with its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineStage {
    /// No run in progress
    #[default]
    Idle,
    /// Structural analysis of the first image
    Analyzing,
    /// Decoration fan-out over `images` variations
    Generating {
        /// Number of generation calls issued
        images: usize,
    },
    /// Concept and shopping curation
    Curating,
    /// Result available
    Completed,
    /// Fatal failure
    Failed {
        /// Stage that failed
        stage: StageKind,
        /// Where the caller should send the user back to
        resume_at: ResumePoint,
    },
}

impl PipelineStage {
    /// Discriminant
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Idle => StageKind::Idle,
            Self::Analyzing => StageKind::Analyzing,
            Self::Generating { .. } => StageKind::Generating,
            Self::Curating => StageKind::Curating,
            Self::Completed => StageKind::Completed,
            Self::Failed { .. } => StageKind::Failed,
        }
    }

    /// Machine-readable label: `analyzing`, `generating:<n>`, `curating`, ...
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Generating { images } => format!("generating:{images}"),
            Self::Failed { stage, .. } => format!("failed:{stage}"),
            other => other.kind().as_str().to_string(),
        }
    }

    /// Whether a run is in flight
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Analyzing | Self::Generating { .. } | Self::Curating
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Illegal stage change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal stage transition: {from} -> {to}")]
pub struct TransitionError {
    /// Stage being left
    pub from: StageKind,
    /// Stage requested
    pub to: StageKind,
}

/// Stages reachable from `from`
#[must_use]
pub fn allowed_transitions(from: StageKind) -> Vec<StageKind> {
    use StageKind::{Analyzing, Completed, Curating, Failed, Generating, Idle};
    match from {
        Idle => vec![Analyzing, Failed],
        Analyzing => vec![Generating, Failed],
        Generating => vec![Curating, Failed],
        Curating => vec![Completed],
        Completed | Failed => vec![Idle, Analyzing],
    }
}

/// Validate a stage transition
///
/// # Errors
/// `TransitionError` if `to` is not reachable from `from`
pub fn validate_transition(from: StageKind, to: StageKind) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Publisher side of the progress channel
///
/// Owned by the session; the orchestrator borrows it for one run.
#[derive(Debug)]
pub struct ProgressSink {
    tx: watch::Sender<PipelineStage>,
}

impl ProgressSink {
    /// New sink starting at `Idle`, with a first observer
    #[must_use]
    pub fn channel() -> (Self, watch::Receiver<PipelineStage>) {
        let (tx, rx) = watch::channel(PipelineStage::Idle);
        (Self { tx }, rx)
    }

    /// Additional observer
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineStage> {
        self.tx.subscribe()
    }

    /// Latest published stage
    #[inline]
    #[must_use]
    pub fn current(&self) -> PipelineStage {
        *self.tx.borrow()
    }

    /// Publish the next stage of a run
    ///
    /// Stored even when nobody is subscribed. Illegal transitions are a bug in
    /// the orchestrator and panic in debug builds.
    pub fn advance(&self, next: PipelineStage) {
        let from = self.current().kind();
        let checked = validate_transition(from, next.kind());
        debug_assert!(checked.is_ok(), "{checked:?}");
        if let Err(err) = checked {
            tracing::error!(%err, "publishing out-of-order stage");
        }

        tracing::debug!(stage = %next, "pipeline stage");
        self.tx.send_replace(next);
    }

    /// Return to `Idle` unconditionally
    pub fn reset(&self) {
        self.tx.send_replace(PipelineStage::Idle);
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::channel().0
    }
}
