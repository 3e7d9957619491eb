//! Instruction texts for the three capabilities
//!
//! Capability adapters send these alongside the image payloads. Keeping them
//! here means every provider adapter phrases the request the same way.

use crate::preferences::{ColorDirective, Preferences};
use std::fmt::Write as _;

/// Instruction for the structural analyzer
pub const ANALYSIS_PROMPT: &str = "You are an architecture expert. Analyze this image of a room. \
Identify and objectively describe ONLY the visible structural elements:\n\
1. Windows and natural light.\n\
2. Doors and passages.\n\
3. Apparent shape of the space.\n\
4. Floor and ceiling (visible materials).\n\
5. Physical constraints (pillars, beams).\n\
Be concise. Do not suggest decoration yet.";

/// Color sentence used when the user left the palette to the generator
pub const AUTOMATIC_COLORS: &str = "AUTOMATIC COLOR CHOICE: select the most harmonious, \
professional palette that matches the chosen style and the room's lighting.";

/// Rendered instruction for one decoration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationDirective {
    text: String,
}

impl GenerationDirective {
    /// Build the directive from preferences and the shared structural analysis
    ///
    /// Style, functional intent, budget tier and analysis are embedded
    /// verbatim.
    #[must_use]
    pub fn build(preferences: &Preferences, analysis: &str) -> Self {
        let mut text = String::from("Transform this interior image.\n");
        let _ = writeln!(text, "Room type: {}.", preferences.room_type);
        let _ = writeln!(text, "Style: {}.", preferences.style);
        let _ = writeln!(text, "{}", color_sentence(&preferences.colors));
        let _ = writeln!(text, "Purpose of the space: {}.", preferences.functionality);
        let _ = writeln!(text, "Visual budget: {}.", preferences.budget);
        let _ = writeln!(text, "Respect this existing structure: {analysis}");
        text.push_str(
            "The image must be photorealistic and high resolution, keeping the exact \
             perspective of the original room, fully decorated and furnished in the requested \
             style. Warm, cinematic lighting.",
        );
        Self { text }
    }

    /// Directive text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume into the text
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

fn color_sentence(colors: &ColorDirective) -> String {
    match colors {
        ColorDirective::Automatic | ColorDirective::Unset => AUTOMATIC_COLORS.to_string(),
        ColorDirective::Palettes(names) => format!("Main colors: {}.", names.join(", ")),
    }
}

/// Instruction for the concept and shopping curator
///
/// Asks for JSON with a `concept` string and `items` carrying `name`,
/// `description`, `estimatedPrice` and `queryTerm`.
#[must_use]
pub fn curation_prompt(preferences: &Preferences, min_items: usize, max_items: usize) -> String {
    format!(
        "Act as a high-end interior designer. Analyze this freshly decorated image.\n\
         Applied style: {style}.\n\
         1. Write a short, inspiring paragraph about the design concept (harmony, textures, \
         furniture choices).\n\
         2. List {min_items} to {max_items} main items visible in the image that can be bought.\n\
         3. Every item has name, description, estimatedPrice and queryTerm.\n\
         Answer EXCLUSIVELY with a JSON object of the form \
         {{\"concept\": string, \"items\": [{{\"name\": string, \"description\": string, \
         \"estimatedPrice\": string, \"queryTerm\": string}}]}}.",
        style = preferences.style,
    )
}
