//! User design preferences
//!
//! The color directive is an enum, so an explicit palette set and the
//! automatic sentinel can never be present at the same time.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset room types offered to the user (freeform values are also allowed)
pub const ROOM_TYPES: &[&str] = &[
    "Living room",
    "Bedroom",
    "Kitchen",
    "Office",
    "Bathroom",
    "Balcony",
];

/// Preset decoration styles (freeform values are also allowed)
pub const STYLES: &[&str] = &[
    "Scandinavian",
    "Industrial",
    "Minimalist",
    "Boho",
    "Classic",
    "Modern",
    "Rustic",
    "Japandi",
];

/// A named palette with its swatch color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PalettePreset {
    /// Palette name as sent to the generator
    pub name: &'static str,
    /// Swatch color (`#rrggbb`)
    pub hex: &'static str,
}

/// Preset palettes
pub const PALETTES: &[PalettePreset] = &[
    PalettePreset { name: "Neutrals", hex: "#e5e5e5" },
    PalettePreset { name: "Earthy", hex: "#a05a2c" },
    PalettePreset { name: "Dark", hex: "#1a1a1a" },
    PalettePreset { name: "Pastels", hex: "#bfdbfe" },
    PalettePreset { name: "Vibrant", hex: "#ef4444" },
    PalettePreset { name: "Greens", hex: "#15803d" },
];

/// Color choice for the redecoration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "palettes", rename_all = "snake_case")]
pub enum ColorDirective {
    /// Nothing chosen yet
    #[default]
    Unset,
    /// Let the generator pick a harmonious palette
    Automatic,
    /// Explicit palette names, in selection order, never empty
    Palettes(Vec<String>),
}

impl ColorDirective {
    /// Whether the automatic sentinel is selected
    #[inline]
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::Automatic)
    }

    /// Whether a choice has been made
    #[inline]
    #[must_use]
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Explicit palettes, empty unless `Palettes`
    #[must_use]
    pub fn palettes(&self) -> &[String] {
        match self {
            Self::Palettes(names) => names,
            Self::Unset | Self::Automatic => &[],
        }
    }

    /// Whether the palette is part of the explicit selection
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.palettes().iter().any(|p| p == name)
    }

    /// Add or remove one palette
    ///
    /// Always clears the automatic sentinel. Removing the last palette leaves
    /// the directive unset. Blank names are ignored.
    pub fn toggle_palette(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let mut names = match std::mem::take(self) {
            Self::Palettes(names) => names,
            Self::Unset | Self::Automatic => Vec::new(),
        };

        if let Some(pos) = names.iter().position(|p| p == name) {
            names.remove(pos);
        } else {
            names.push(name.to_string());
        }

        *self = if names.is_empty() {
            Self::Unset
        } else {
            Self::Palettes(names)
        };
    }

    /// Toggle the automatic sentinel
    ///
    /// Selecting it clears any explicit palettes; toggling it off leaves the
    /// directive unset.
    pub fn toggle_automatic(&mut self) {
        *self = if self.is_automatic() {
            Self::Unset
        } else {
            Self::Automatic
        };
    }

    /// Select the automatic sentinel
    pub fn select_automatic(&mut self) {
        *self = Self::Automatic;
    }
}

impl fmt::Display for ColorDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("unset"),
            Self::Automatic => f.write_str("automatic"),
            Self::Palettes(names) => f.write_str(&names.join(", ")),
        }
    }
}

/// Budget tier for the redecoration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    /// Economy
    Economy,
    /// Mid-range
    #[default]
    Mid,
    /// High-end
    HighEnd,
}

impl BudgetTier {
    /// All tiers, cheapest first
    pub const ALL: [BudgetTier; 3] = [Self::Economy, Self::Mid, Self::HighEnd];

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Mid => "Mid-range",
            Self::HighEnd => "High-end",
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the user told us about the room and the desired look
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Room type, preset or freeform
    pub room_type: String,
    /// Decoration style, preset or freeform
    pub style: String,
    /// Color choice
    pub colors: ColorDirective,
    /// What the space is for
    pub functionality: String,
    /// Budget tier
    pub budget: BudgetTier,
}

impl Preferences {
    /// Empty preferences with the default budget
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With room type
    #[inline]
    #[must_use]
    pub fn with_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = room_type.into();
        self
    }

    /// With style
    #[inline]
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// With functional intent
    #[inline]
    #[must_use]
    pub fn with_functionality(mut self, functionality: impl Into<String>) -> Self {
        self.functionality = functionality.into();
        self
    }

    /// With budget tier
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetTier) -> Self {
        self.budget = budget;
        self
    }

    /// With color directive
    #[inline]
    #[must_use]
    pub fn with_colors(mut self, colors: ColorDirective) -> Self {
        self.colors = colors;
        self
    }

    /// Check that every field needed for generation is filled in
    ///
    /// # Errors
    /// `InputError::IncompletePreferences` naming the first missing field
    pub fn validate(&self) -> Result<(), InputError> {
        if self.room_type.trim().is_empty() {
            return Err(InputError::IncompletePreferences("room_type"));
        }
        if self.style.trim().is_empty() {
            return Err(InputError::IncompletePreferences("style"));
        }
        if self.functionality.trim().is_empty() {
            return Err(InputError::IncompletePreferences("functionality"));
        }
        if !self.colors.is_set() {
            return Err(InputError::IncompletePreferences("colors"));
        }
        Ok(())
    }
}
