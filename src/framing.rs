//! Per-state framing rules.
//!
//! Both the viewport padding and the basemap extent buffer depend on which
//! state is drawn. The set of special cases is closed (Alaska and Hawaii), so
//! it lives in one lookup table and every other state gets the default rule.

use serde::{Deserialize, Serialize};

/// A geographic box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeoBounds {
    pub const fn new(lat_min: f64, lat_max: f64, lng_min: f64, lng_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        }
    }

    /// Scale each edge by a fixed factor: latitudes shrink/grow by 1%,
    /// longitudes grow/shrink by 1%.
    ///
    /// The factors only move edges outward for negative longitudes and
    /// positive latitudes (the contiguous U.S.). Elsewhere the box can shrink
    /// or invert; callers get exactly what the factors produce.
    pub fn scaled(&self) -> Self {
        Self {
            lat_min: self.lat_min * 0.99,
            lat_max: self.lat_max * 1.01,
            lng_min: self.lng_min * 1.01,
            lng_max: self.lng_max * 0.99,
        }
    }
}

/// How a state's raw bounding box becomes its framed box
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddingRule {
    /// Multiply the table values by the default factors, see [`GeoBounds::scaled`]
    Scaled,
    /// Ignore the table and use a literal box
    Fixed(GeoBounds),
}

impl PaddingRule {
    /// Apply the rule. `raw` is only consulted by [`PaddingRule::Scaled`].
    pub fn apply(&self, raw: Option<&GeoBounds>) -> Option<GeoBounds> {
        match self {
            PaddingRule::Scaled => raw.map(GeoBounds::scaled),
            PaddingRule::Fixed(bounds) => Some(*bounds),
        }
    }

    /// Whether the rule needs a row from the bounding-box table
    pub fn needs_table_row(&self) -> bool {
        matches!(self, PaddingRule::Scaled)
    }
}

/// Everything that varies per state when framing a map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateFraming {
    /// Viewport padding rule
    pub padding: PaddingRule,
    /// Basemap extent buffer, in percent of the state's projected width/height
    pub extent_buffer: f64,
}

/// Framing for every state without an entry in [`OVERRIDES`]
pub const DEFAULT_FRAMING: StateFraming = StateFraming {
    padding: PaddingRule::Scaled,
    extent_buffer: 20.0,
};

/// Far-flung states whose table extents are unusable for framing
pub const OVERRIDES: &[(&str, StateFraming)] = &[
    (
        "Alaska",
        StateFraming {
            padding: PaddingRule::Fixed(GeoBounds::new(50.0, 72.0, -179.9, -125.0)),
            extent_buffer: 0.01,
        },
    ),
    (
        "Hawaii",
        StateFraming {
            padding: PaddingRule::Fixed(GeoBounds::new(18.0, 23.0, -162.0, -154.0)),
            extent_buffer: 0.01,
        },
    ),
];

/// Look up the framing for a state name (exact match)
pub fn framing_for(state: &str) -> &'static StateFraming {
    OVERRIDES
        .iter()
        .find(|(name, _)| *name == state)
        .map(|(_, framing)| framing)
        .unwrap_or(&DEFAULT_FRAMING)
}
