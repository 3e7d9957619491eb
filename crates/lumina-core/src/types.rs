//! Core types for Lumina
//!
//! Defines the values that flow through a pipeline run:
//! - Variations (an input image and its optional generated counterpart)
//! - Shopping items and the curated concept
//! - The aggregated pipeline result

use crate::media::EncodedImage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Unique variation identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariationId(pub Ulid);

impl VariationId {
    /// Generate new variation ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for VariationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var-{}", self.0)
    }
}

/// One input image and at most one generated output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Stable id assigned at intake
    pub id: VariationId,
    /// Image supplied by the user
    pub original: EncodedImage,
    /// Redecorated image, absent until (and unless) generation succeeds
    pub generated: Option<EncodedImage>,
}

impl Variation {
    /// New variation with no generated image
    #[inline]
    #[must_use]
    pub fn new(original: EncodedImage) -> Self {
        Self {
            id: VariationId::new(),
            original,
            generated: None,
        }
    }

    /// Whether generation succeeded
    #[inline]
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.generated.is_some()
    }

    /// Image to show: the generated one when present, else the original
    #[inline]
    #[must_use]
    pub fn display_image(&self) -> &EncodedImage {
        self.generated.as_ref().unwrap_or(&self.original)
    }
}

/// A product suggested for the redecorated room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    /// Product name
    pub name: String,
    /// Short description
    pub description: String,
    /// Price estimate, currency formatted by the curator
    pub estimated_price: String,
    /// Search term to find the product online
    pub query_term: String,
}

impl ShoppingItem {
    /// Shopping search link for this item
    #[must_use]
    pub fn search_url(&self) -> String {
        format!(
            "https://www.google.com/search?q={}&tbm=shop",
            encode_query(&self.query_term)
        )
    }
}

/// Percent-encode a query component (unreserved characters kept as is)
fn encode_query(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for byte in term.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(byte));
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Design narrative plus shopping list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CuratedConcept {
    /// Short design narrative
    pub concept: String,
    /// Shoppable items visible in the generated image
    pub items: Vec<ShoppingItem>,
}

impl CuratedConcept {
    /// Concept with no shopping items
    #[inline]
    #[must_use]
    pub fn fallback(concept: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            items: Vec::new(),
        }
    }
}

/// The sole externally visible output of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    /// All variations in input order, successful or not
    pub variations: Vec<Variation>,
    /// Structural analysis of the first image
    pub structural_analysis: String,
    /// Curated design narrative
    pub design_concept: String,
    /// Curated shopping list (may be empty)
    pub shopping_list: Vec<ShoppingItem>,
}

impl PipelineResult {
    /// Number of variations with a generated image
    #[must_use]
    pub fn successful_count(&self) -> usize {
        self.variations.iter().filter(|v| v.is_generated()).count()
    }

    /// Lowest-index variation with a generated image
    #[must_use]
    pub fn representative(&self) -> Option<&Variation> {
        self.variations.iter().find(|v| v.is_generated())
    }

    /// File name for downloading a generated image
    #[must_use]
    pub fn download_file_name(variation: &Variation, at: DateTime<Utc>) -> String {
        format!(
            "lumina-design-{}.{}",
            at.timestamp_millis(),
            variation.display_image().mime().extension()
        )
    }
}
