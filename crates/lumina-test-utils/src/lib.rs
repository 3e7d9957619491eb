//! Testing utilities for the Lumina workspace
//!
//! Image fixtures, ready-made preferences and scripted capability doubles.
//! Every double is `Clone` and shares its script and call log between
//! clones: keep one clone in the test, hand the other to the orchestrator.

#![allow(missing_docs)]

use async_trait::async_trait;
use lumina_core::{
    AnalysisError, Capabilities, ColorDirective, ConceptCurator, CuratedConcept, CurationError,
    DecorationGenerator, EncodedImage, GenerationError, PipelineConfig, PipelineOrchestrator,
    Preferences, ShoppingItem, StructuralAnalyzer, Variation,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
const DECORATED_SUFFIX: &[u8] = b"#decorated";

pub fn png_fixture(tag: &str) -> EncodedImage {
    let bytes = [&PNG_MAGIC[..], tag.as_bytes()].concat();
    EncodedImage::from_bytes(bytes).unwrap()
}

pub fn jpeg_fixture(tag: &str) -> EncodedImage {
    let bytes = [&JPEG_MAGIC[..], tag.as_bytes()].concat();
    EncodedImage::from_bytes(bytes).unwrap()
}

/// Image the scripted generator produces for `original`
pub fn decorated(original: &EncodedImage) -> EncodedImage {
    let bytes = [original.bytes(), DECORATED_SUFFIX].concat();
    EncodedImage::from_bytes(bytes).unwrap()
}

/// `n` fresh variations over distinct fixtures `room-0`, `room-1`, ...
pub fn variations(n: usize) -> Vec<Variation> {
    (0..n)
        .map(|i| Variation::new(png_fixture(&format!("room-{i}"))))
        .collect()
}

pub fn complete_preferences() -> Preferences {
    Preferences::new()
        .with_room_type("Living room")
        .with_style("Scandinavian")
        .with_functionality("Relaxing after work")
        .with_colors(ColorDirective::Automatic)
}

pub fn shopping_items(n: usize) -> Vec<ShoppingItem> {
    (0..n)
        .map(|i| ShoppingItem {
            name: format!("Item {i}"),
            description: format!("Description {i}"),
            estimated_price: format!("$ {}", (i + 1) * 100),
            query_term: format!("item {i}"),
        })
        .collect()
}

pub fn orchestrator(
    analyzer: impl StructuralAnalyzer + 'static,
    generator: impl DecorationGenerator + 'static,
    curator: impl ConceptCurator + 'static,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        Capabilities::new(analyzer, generator, curator),
        PipelineConfig::default(),
    )
}

/// Analyzer answering with fixed text, or failing
#[derive(Debug, Clone)]
pub struct ScriptedAnalyzer {
    outcome: Result<String, AnalysisError>,
    seen: Arc<Mutex<Vec<EncodedImage>>>,
}

impl ScriptedAnalyzer {
    pub fn answering(text: impl Into<String>) -> Self {
        Self {
            outcome: Ok(text.into()),
            seen: Arc::default(),
        }
    }

    pub fn failing(error: AnalysisError) -> Self {
        Self {
            outcome: Err(error),
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn seen(&self) -> Vec<EncodedImage> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl StructuralAnalyzer for ScriptedAnalyzer {
    async fn analyze(&self, image: &EncodedImage) -> Result<String, AnalysisError> {
        self.seen.lock().push(image.clone());
        self.outcome.clone()
    }
}

#[derive(Debug, Default)]
struct GeneratorScript {
    failures: HashSet<EncodedImage>,
    delays: HashMap<EncodedImage, Duration>,
}

#[derive(Debug, Default)]
struct GeneratorLog {
    started: Vec<EncodedImage>,
    completed: Vec<EncodedImage>,
    analyses: Vec<String>,
}

/// Generator that fails or stalls on chosen originals
///
/// Successful calls return [`decorated`] of the original.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<GeneratorScript>>,
    log: Arc<Mutex<GeneratorLog>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fail_on(self, original: &EncodedImage) -> Self {
        self.script.lock().failures.insert(original.clone());
        self
    }

    #[must_use]
    pub fn delay_on(self, original: &EncodedImage, delay: Duration) -> Self {
        self.script.lock().delays.insert(original.clone(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.log.lock().started.len()
    }

    /// Originals in the order their calls finished
    pub fn completion_order(&self) -> Vec<EncodedImage> {
        self.log.lock().completed.clone()
    }

    pub fn analyses(&self) -> Vec<String> {
        self.log.lock().analyses.clone()
    }
}

#[async_trait]
impl DecorationGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        image: &EncodedImage,
        _preferences: &Preferences,
        analysis: &str,
    ) -> Result<EncodedImage, GenerationError> {
        {
            let mut log = self.log.lock();
            log.started.push(image.clone());
            log.analyses.push(analysis.to_string());
        }

        let (fails, delay) = {
            let script = self.script.lock();
            (
                script.failures.contains(image),
                script.delays.get(image).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.log.lock().completed.push(image.clone());
        if fails {
            Err(GenerationError::Provider("scripted failure".to_string()))
        } else {
            Ok(decorated(image))
        }
    }
}

/// Curator returning a fixed outcome and recording the pairs it saw
#[derive(Debug, Clone)]
pub struct RecordingCurator {
    outcome: Result<CuratedConcept, CurationError>,
    seen: Arc<Mutex<Vec<(EncodedImage, EncodedImage)>>>,
}

impl RecordingCurator {
    /// Succeeds with `items` shopping items
    pub fn answering(concept: impl Into<String>, items: usize) -> Self {
        Self {
            outcome: Ok(CuratedConcept {
                concept: concept.into(),
                items: shopping_items(items),
            }),
            seen: Arc::default(),
        }
    }

    pub fn failing(error: CurationError) -> Self {
        Self {
            outcome: Err(error),
            seen: Arc::default(),
        }
    }

    /// Curator whose provider answers with unparsable text
    pub fn garbled() -> Self {
        let outcome = CuratedConcept::from_model_output("Sure! Here is your design: a cozy room.");
        Self {
            outcome,
            seen: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// `(original, generated)` pairs received
    pub fn seen(&self) -> Vec<(EncodedImage, EncodedImage)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ConceptCurator for RecordingCurator {
    async fn curate(
        &self,
        original: &EncodedImage,
        generated: &EncodedImage,
        _preferences: &Preferences,
    ) -> Result<CuratedConcept, CurationError> {
        self.seen.lock().push((original.clone(), generated.clone()));
        self.outcome.clone()
    }
}
