//! Design session
//!
//! The session-scoped value object a presentation layer holds for one user:
//! the pending image selection, the finalized variations, the preferences,
//! the latest result and the progress channel.
//!
//! [`DesignSession::run`] borrows the session mutably for the whole run, so
//! two runs on the same session cannot be in flight at once.

use crate::error::{InputError, PipelineError};
use crate::media::EncodedImage;
use crate::orchestrator::PipelineOrchestrator;
use crate::preferences::Preferences;
use crate::stage::{PipelineStage, ProgressSink};
use crate::types::{PipelineResult, Variation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::Instrument;
use ulid::Ulid;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one user's redecoration session
#[derive(Debug)]
pub struct DesignSession {
    id: SessionId,
    preferences: Preferences,
    pending: Vec<EncodedImage>,
    variations: Vec<Variation>,
    result: Option<PipelineResult>,
    progress: ProgressSink,
}

impl DesignSession {
    /// New session with the given starting preferences
    #[must_use]
    pub fn new(preferences: Preferences) -> Self {
        Self {
            id: SessionId::new(),
            preferences,
            pending: Vec::new(),
            variations: Vec::new(),
            result: None,
            progress: ProgressSink::default(),
        }
    }

    /// Session ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Append images to the pending selection
    pub fn add_images(&mut self, images: impl IntoIterator<Item = EncodedImage>) {
        self.pending.extend(images);
    }

    /// Remove one image from the pending selection
    ///
    /// # Errors
    /// `InputError::IndexOutOfRange` if there is no image at `index`
    pub fn remove_image(&mut self, index: usize) -> Result<EncodedImage, InputError> {
        if index >= self.pending.len() {
            return Err(InputError::IndexOutOfRange(index));
        }
        Ok(self.pending.remove(index))
    }

    /// Drop the whole pending selection
    pub fn clear_images(&mut self) {
        self.pending.clear();
    }

    /// Pending selection
    #[inline]
    #[must_use]
    pub fn pending_images(&self) -> &[EncodedImage] {
        &self.pending
    }

    /// Turn the pending selection into variations with fresh ids
    ///
    /// Replaces any previous variations and result. The pending selection is
    /// kept so the user can come back and edit it.
    ///
    /// # Errors
    /// `InputError::NoImages` if nothing is selected
    pub fn finalize_images(&mut self) -> Result<&[Variation], InputError> {
        if self.pending.is_empty() {
            return Err(InputError::NoImages);
        }

        self.variations = self.pending.iter().cloned().map(Variation::new).collect();
        self.result = None;
        tracing::debug!(session = %self.id, variations = self.variations.len(), "images finalized");
        Ok(&self.variations)
    }

    /// Finalized variations, updated after each successful run
    #[inline]
    #[must_use]
    pub fn variations(&self) -> &[Variation] {
        &self.variations
    }

    /// Current preferences
    #[inline]
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Edit preferences
    #[inline]
    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    /// Latest published stage
    #[inline]
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.progress.current()
    }

    /// Observe stage changes
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineStage> {
        self.progress.subscribe()
    }

    /// Result of the last completed run
    #[inline]
    #[must_use]
    pub fn result(&self) -> Option<&PipelineResult> {
        self.result.as_ref()
    }

    /// Run the pipeline over the finalized variations
    ///
    /// Starting a run discards the previous result, including the generated
    /// images stored on the variations. On a fatal failure the stage becomes
    /// `Failed` with the orchestrator's resume point, the preferences are
    /// kept and every variation is left without a generated image.
    ///
    /// # Returns
    /// `Ok(None)` without any state change if no variations are finalized
    ///
    /// # Errors
    /// See [`PipelineOrchestrator::run_pipeline`]
    pub async fn run(
        &mut self,
        orchestrator: &PipelineOrchestrator,
    ) -> Result<Option<&PipelineResult>, PipelineError> {
        if self.variations.is_empty() {
            return Ok(None);
        }

        self.result = None;
        for variation in &mut self.variations {
            variation.generated = None;
        }
        let span = tracing::info_span!("session", id = %self.id);
        let outcome = orchestrator
            .run_pipeline(&self.variations, &self.preferences, &self.progress)
            .instrument(span)
            .await?;

        if let Some(result) = outcome {
            self.variations.clone_from(&result.variations);
            self.result = Some(result);
        }
        Ok(self.result.as_ref())
    }

    /// Start over: no images, default preferences, `Idle`
    pub fn restart(&mut self) {
        self.pending.clear();
        self.variations.clear();
        self.result = None;
        self.preferences = Preferences::default();
        self.progress.reset();
        tracing::debug!(session = %self.id, "session restarted");
    }
}

impl Default for DesignSession {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}
