//! Pipeline Orchestrator
//!
//! Sequences one run:
//! 1. Analyze the first image (fatal on failure)
//! 2. Generate a decoration for every image concurrently (per-image failures
//!    are absorbed; fatal only if every image fails)
//! 3. Curate the lowest-index success (never fatal)
//! 4. Assemble the result
//!
//! The orchestrator holds no per-run state. Everything a run produces is
//! returned to the caller, which owns it.

use crate::capability::Capabilities;
use crate::config::PipelineConfig;
use crate::curation::curate_or_fallback;
use crate::error::{GenerationError, PipelineError};
use crate::preferences::Preferences;
use crate::stage::{PipelineStage, ProgressSink, ResumePoint};
use crate::types::{PipelineResult, Variation};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::Instrument;

/// Runs the analyze → generate → curate pipeline
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    capabilities: Capabilities,
    config: PipelineConfig,
    resume_at: ResumePoint,
}

impl PipelineOrchestrator {
    /// Create orchestrator over the given capabilities
    #[inline]
    #[must_use]
    pub fn new(capabilities: Capabilities, config: PipelineConfig) -> Self {
        Self {
            capabilities,
            config,
            resume_at: ResumePoint::default(),
        }
    }

    /// Step the caller is sent back to after a fatal failure
    #[inline]
    #[must_use]
    pub fn with_resume_point(mut self, resume_at: ResumePoint) -> Self {
        self.resume_at = resume_at;
        self
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get resume point
    #[inline]
    #[must_use]
    pub fn resume_point(&self) -> ResumePoint {
        self.resume_at
    }

    /// Run the pipeline over `variations`
    ///
    /// Publishes `analyzing`, `generating:<n>` and `curating` on entry to
    /// each stage, then `completed` or `failed`. The returned variations keep
    /// the input order and ids; the input slice is never modified.
    ///
    /// # Returns
    /// `Ok(None)` without touching `progress` when `variations` is empty
    ///
    /// # Errors
    /// - `PipelineError::InvalidInput` for incomplete preferences
    /// - `PipelineError::AnalysisFailed` if the first image cannot be analyzed
    /// - `PipelineError::AllGenerationsFailed` if no image was generated
    pub async fn run_pipeline(
        &self,
        variations: &[Variation],
        preferences: &Preferences,
        progress: &ProgressSink,
    ) -> Result<Option<PipelineResult>, PipelineError> {
        if variations.is_empty() {
            tracing::debug!("no variations, nothing to run");
            return Ok(None);
        }

        let span = tracing::info_span!("pipeline_run", images = variations.len());
        self.run_stages(variations, preferences, progress)
            .instrument(span)
            .await
            .map(Some)
    }

    async fn run_stages(
        &self,
        variations: &[Variation],
        preferences: &Preferences,
        progress: &ProgressSink,
    ) -> Result<PipelineResult, PipelineError> {
        let start_time = Instant::now();
        progress.reset();

        if let Err(err) = preferences.validate() {
            return Err(self.fail(progress, err.into()));
        }

        // 1. One representative image establishes the shared structure
        progress.advance(PipelineStage::Analyzing);
        tracing::info!("analyzing room structure");
        let structural_analysis = match self.analyze(&variations[0]).await {
            Ok(text) => text,
            Err(err) => return Err(self.fail(progress, err)),
        };

        // 2. Fan-out, index-stable
        progress.advance(PipelineStage::Generating {
            images: variations.len(),
        });
        tracing::info!(images = variations.len(), "generating decorated variations");
        let generated = self
            .generate_all(variations, preferences, &structural_analysis)
            .await;

        let Some(first_success) = generated.iter().position(Variation::is_generated) else {
            return Err(self.fail(
                progress,
                PipelineError::AllGenerationsFailed {
                    attempted: generated.len(),
                },
            ));
        };
        let successes = generated.iter().filter(|v| v.is_generated()).count();
        tracing::info!(successes, failures = generated.len() - successes, "generation finished");

        // 3. Curation is absorbed locally
        progress.advance(PipelineStage::Curating);
        tracing::info!(representative = first_success, "curating design concept");
        let curated = curate_or_fallback(
            self.capabilities.curator.as_ref(),
            &generated[first_success],
            preferences,
            &self.config,
        )
        .await;

        progress.advance(PipelineStage::Completed);
        tracing::info!(
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "pipeline completed"
        );

        Ok(PipelineResult {
            variations: generated,
            structural_analysis,
            design_concept: curated.concept,
            shopping_list: curated.items,
        })
    }

    async fn analyze(&self, variation: &Variation) -> Result<String, PipelineError> {
        let text = self
            .capabilities
            .analyzer
            .analyze(&variation.original)
            .await
            .map_err(PipelineError::AnalysisFailed)?;

        let text = text.trim();
        if text.is_empty() {
            tracing::warn!("analyzer returned no text, using fallback description");
            return Ok(self.config.fallback_analysis.clone());
        }
        Ok(text.to_string())
    }

    /// Generate every variation and wait for all of them
    async fn generate_all(
        &self,
        variations: &[Variation],
        preferences: &Preferences,
        analysis: &str,
    ) -> Vec<Variation> {
        let calls = variations
            .iter()
            .enumerate()
            .map(|(index, variation)| self.generate_one(index, variation, preferences, analysis));

        match self.config.generation_concurrency {
            Some(limit) => stream::iter(calls).buffered(limit).collect::<Vec<_>>().await,
            None => join_all(calls).await,
        }
    }

    /// One generation call; failures become an absent image
    async fn generate_one(
        &self,
        index: usize,
        variation: &Variation,
        preferences: &Preferences,
        analysis: &str,
    ) -> Variation {
        let span = tracing::debug_span!("generate", variation = %variation.id, index);
        let outcome = self
            .capabilities
            .generator
            .generate(&variation.original, preferences, analysis)
            .instrument(span)
            .await
            .and_then(|image| {
                if image == variation.original {
                    Err(GenerationError::Unchanged)
                } else {
                    Ok(image)
                }
            });

        let generated = match outcome {
            Ok(image) => {
                tracing::debug!(variation = %variation.id, index, bytes = image.len(), "variation generated");
                Some(image)
            }
            Err(err) => {
                tracing::warn!(variation = %variation.id, index, error = %err, "failed to generate variation, keeping original");
                None
            }
        };

        Variation {
            id: variation.id,
            original: variation.original.clone(),
            generated,
        }
    }

    fn fail(&self, progress: &ProgressSink, error: PipelineError) -> PipelineError {
        tracing::error!(stage = %error.stage(), error = %error, "pipeline run failed");
        progress.advance(PipelineStage::Failed {
            stage: error.stage(),
            resume_at: self.resume_at,
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{MockConceptCurator, MockDecorationGenerator, MockStructuralAnalyzer};
    use crate::error::{AnalysisError, CurationError, InputError};
    use crate::media::EncodedImage;
    use crate::preferences::ColorDirective;
    use crate::stage::StageKind;
    use crate::types::{CuratedConcept, ShoppingItem};

    fn png(tag: &[u8]) -> EncodedImage {
        let bytes = [&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A][..], tag].concat();
        EncodedImage::from_bytes(bytes).unwrap()
    }

    fn prefs() -> Preferences {
        Preferences::new()
            .with_room_type("Living room")
            .with_style("Scandinavian")
            .with_functionality("Hosting friends for dinner")
            .with_colors(ColorDirective::Automatic)
    }

    fn items(n: usize) -> Vec<ShoppingItem> {
        (0..n)
            .map(|i| ShoppingItem {
                name: format!("Item {i}"),
                description: "desc".into(),
                estimated_price: "$ 10".into(),
                query_term: format!("item {i}"),
            })
            .collect()
    }

    fn analyzer_ok(text: &'static str) -> MockStructuralAnalyzer {
        let mut analyzer = MockStructuralAnalyzer::new();
        analyzer
            .expect_analyze()
            .times(1)
            .returning(move |_| Ok(text.to_string()));
        analyzer
    }

    fn curator_ok() -> MockConceptCurator {
        let mut curator = MockConceptCurator::new();
        curator.expect_curate().returning(|_, _, _| {
            Ok(CuratedConcept {
                concept: "Light woods and linen.".into(),
                items: items(4),
            })
        });
        curator
    }

    /// Generator that succeeds unless the original's payload ends with `fail`
    fn generator_by_tag() -> MockDecorationGenerator {
        let mut generator = MockDecorationGenerator::new();
        generator.expect_generate().returning(|image, _, _| {
            if image.bytes().ends_with(b"fail") {
                Err(GenerationError::Provider("content filtered".into()))
            } else {
                let mut bytes = image.bytes().to_vec();
                bytes.extend_from_slice(b"-decorated");
                Ok(EncodedImage::from_bytes(bytes).unwrap())
            }
        });
        generator
    }

    #[tokio::test]
    async fn mixed_outcomes_complete() {
        let a = Variation::new(png(b"A"));
        let b = Variation::new(png(b"B-fail"));
        let variations = vec![a.clone(), b.clone()];

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(
                analyzer_ok("bright room with one window"),
                generator_by_tag(),
                curator_ok(),
            ),
            PipelineConfig::default(),
        );
        let (sink, _rx) = ProgressSink::channel();

        let result = orchestrator
            .run_pipeline(&variations, &prefs(), &sink)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.structural_analysis, "bright room with one window");
        assert_eq!(result.variations.len(), 2);
        assert_eq!(result.variations[0].id, a.id);
        assert!(result.variations[0].is_generated());
        assert_eq!(result.variations[1].id, b.id);
        assert_eq!(result.variations[1].generated, None);
        assert_eq!(result.design_concept, "Light woods and linen.");
        assert_eq!(result.shopping_list.len(), 4);
        assert_eq!(sink.current(), PipelineStage::Completed);

        // Input untouched
        assert_eq!(variations[0].generated, None);
    }

    #[tokio::test]
    async fn empty_variations_is_a_no_op() {
        let mut analyzer = MockStructuralAnalyzer::new();
        analyzer.expect_analyze().never();
        let mut generator = MockDecorationGenerator::new();
        generator.expect_generate().never();
        let mut curator = MockConceptCurator::new();
        curator.expect_curate().never();

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer, generator, curator),
            PipelineConfig::default(),
        );
        let (sink, _rx) = ProgressSink::channel();

        let result = orchestrator.run_pipeline(&[], &prefs(), &sink).await.unwrap();
        assert!(result.is_none());
        assert_eq!(sink.current(), PipelineStage::Idle);
    }

    #[tokio::test]
    async fn analysis_failure_skips_generation() {
        let mut analyzer = MockStructuralAnalyzer::new();
        analyzer
            .expect_analyze()
            .times(1)
            .returning(|_| Err(AnalysisError::Provider("quota exceeded".into())));
        let mut generator = MockDecorationGenerator::new();
        generator.expect_generate().never();
        let mut curator = MockConceptCurator::new();
        curator.expect_curate().never();

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer, generator, curator),
            PipelineConfig::default(),
        )
        .with_resume_point(ResumePoint::RoomDetails);
        let (sink, _rx) = ProgressSink::channel();

        let err = orchestrator
            .run_pipeline(&[Variation::new(png(b"A"))], &prefs(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::AnalysisFailed(_)));
        assert_eq!(
            sink.current(),
            PipelineStage::Failed {
                stage: StageKind::Analyzing,
                resume_at: ResumePoint::RoomDetails,
            }
        );
    }

    #[tokio::test]
    async fn only_first_image_is_analyzed() {
        let first = png(b"first");
        let expected = first.clone();

        let mut analyzer = MockStructuralAnalyzer::new();
        analyzer
            .expect_analyze()
            .withf(move |image| *image == expected)
            .times(1)
            .returning(|_| Ok("open plan".into()));

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer, generator_by_tag(), curator_ok()),
            PipelineConfig::default(),
        );
        let variations = vec![
            Variation::new(first),
            Variation::new(png(b"second")),
            Variation::new(png(b"third")),
        ];

        let result = orchestrator
            .run_pipeline(&variations, &prefs(), &ProgressSink::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.successful_count(), 3);
    }

    #[tokio::test]
    async fn all_generations_failed() {
        let mut curator = MockConceptCurator::new();
        curator.expect_curate().never();

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer_ok("small room"), generator_by_tag(), curator),
            PipelineConfig::default(),
        );
        let (sink, _rx) = ProgressSink::channel();
        let variations = vec![
            Variation::new(png(b"1-fail")),
            Variation::new(png(b"2-fail")),
        ];

        let err = orchestrator
            .run_pipeline(&variations, &prefs(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::AllGenerationsFailed { attempted: 2 }));
        assert_eq!(sink.current().kind(), StageKind::Failed);
    }

    #[tokio::test]
    async fn echoed_image_counts_as_failure() {
        let mut generator = MockDecorationGenerator::new();
        generator
            .expect_generate()
            .returning(|image, _, _| Ok(image.clone()));
        let mut curator = MockConceptCurator::new();
        curator.expect_curate().never();

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer_ok("room"), generator, curator),
            PipelineConfig::default(),
        );

        let err = orchestrator
            .run_pipeline(&[Variation::new(png(b"A"))], &prefs(), &ProgressSink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::AllGenerationsFailed { attempted: 1 }));
    }

    #[tokio::test]
    async fn curation_failure_still_completes() {
        let mut curator = MockConceptCurator::new();
        curator
            .expect_curate()
            .times(1)
            .returning(|_, _, _| Err(CurationError::Malformed("no JSON".into())));

        let config = PipelineConfig::default().with_fallback_concept("Fallback concept.");
        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer_ok("room"), generator_by_tag(), curator),
            config,
        );
        let (sink, _rx) = ProgressSink::channel();

        let result = orchestrator
            .run_pipeline(&[Variation::new(png(b"A"))], &prefs(), &sink)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.design_concept, "Fallback concept.");
        assert!(result.shopping_list.is_empty());
        assert_eq!(sink.current(), PipelineStage::Completed);
    }

    #[tokio::test]
    async fn blank_analysis_uses_fallback_text() {
        let config = PipelineConfig::default();
        let fallback = config.fallback_analysis.clone();
        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer_ok("   "), generator_by_tag(), curator_ok()),
            config,
        );

        let result = orchestrator
            .run_pipeline(&[Variation::new(png(b"A"))], &prefs(), &ProgressSink::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.structural_analysis, fallback);
    }

    #[tokio::test]
    async fn incomplete_preferences_are_rejected_before_analysis() {
        let mut analyzer = MockStructuralAnalyzer::new();
        analyzer.expect_analyze().never();
        let mut generator = MockDecorationGenerator::new();
        generator.expect_generate().never();

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer, generator, MockConceptCurator::new()),
            PipelineConfig::default(),
        );
        let (sink, _rx) = ProgressSink::channel();

        let err = orchestrator
            .run_pipeline(
                &[Variation::new(png(b"A"))],
                &prefs().with_colors(ColorDirective::Unset),
                &sink,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::InvalidInput(InputError::IncompletePreferences("colors"))
        ));
        assert_eq!(sink.current().label(), "failed:idle");
    }

    #[tokio::test]
    async fn analysis_text_reaches_generator() {
        let mut generator = MockDecorationGenerator::new();
        generator
            .expect_generate()
            .withf(|_, prefs, analysis| {
                analysis == "two doors, wooden floor" && prefs.style == "Scandinavian"
            })
            .times(2)
            .returning(|image, _, _| {
                let mut bytes = image.bytes().to_vec();
                bytes.push(b'!');
                Ok(EncodedImage::from_bytes(bytes).unwrap())
            });

        let orchestrator = PipelineOrchestrator::new(
            Capabilities::new(analyzer_ok("two doors, wooden floor"), generator, curator_ok()),
            PipelineConfig::default().with_generation_concurrency(1),
        );

        let result = orchestrator
            .run_pipeline(
                &[Variation::new(png(b"A")), Variation::new(png(b"B"))],
                &prefs(),
                &ProgressSink::default(),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.successful_count(), 2);
    }
}
