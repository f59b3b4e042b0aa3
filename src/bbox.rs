//! State bounding boxes and the projected viewport derived from them.
//!
//! The reference table is a comma-separated file with columns
//! `NAME, xmin, xmax, ymin, ymax` in degrees (x = longitude, y = latitude).

use geo::coord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, StatemapError};
use crate::framing::{framing_for, GeoBounds};
use crate::logging::log_data_load_stats;
use crate::projection::{parse_degrees, to_web_mercator};

/// One row of the bounding-box table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateBoundingBox {
    pub state_name: String,
    pub bounds: GeoBounds,
}

/// Raw CSV row; numbers are parsed on lookup so a malformed row only
/// affects its own state
#[derive(Debug, Clone, Deserialize)]
struct BoundsRow {
    #[serde(rename = "NAME")]
    name: String,
    xmin: String,
    xmax: String,
    ymin: String,
    ymax: String,
}

impl BoundsRow {
    fn parse(&self, line: usize) -> Result<StateBoundingBox> {
        let context = format!("bounding-box row {} ({})", line, self.name);
        let bounds = GeoBounds {
            lat_min: parse_degrees("ymin", &self.ymin, &context)?,
            lat_max: parse_degrees("ymax", &self.ymax, &context)?,
            lng_min: parse_degrees("xmin", &self.xmin, &context)?,
            lng_max: parse_degrees("xmax", &self.xmax, &context)?,
        };
        Ok(StateBoundingBox {
            state_name: self.name.clone(),
            bounds,
        })
    }
}

impl From<&StateBoundingBox> for BoundsRow {
    fn from(row: &StateBoundingBox) -> Self {
        Self {
            name: row.state_name.clone(),
            xmin: row.bounds.lng_min.to_string(),
            xmax: row.bounds.lng_max.to_string(),
            ymin: row.bounds.lat_min.to_string(),
            ymax: row.bounds.lat_max.to_string(),
        }
    }
}

/// An axis-aligned rectangle in EPSG:3857 meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Viewport {
    /// Project the two corners `(lng_min, lat_min)` and `(lng_max, lat_max)`
    pub fn from_geo_bounds(bounds: &GeoBounds) -> Result<Self> {
        let min = to_web_mercator(coord! { x: bounds.lng_min, y: bounds.lat_min })?;
        let max = to_web_mercator(coord! { x: bounds.lng_max, y: bounds.lat_max })?;
        Ok(Self {
            x_min: min.x,
            x_max: max.x,
            y_min: min.y,
            y_max: max.y,
        })
    }

    /// Flat `[x_min, x_max, y_min, y_max]`, the order axis limits are set in
    pub fn as_array(&self) -> [f64; 4] {
        [self.x_min, self.x_max, self.y_min, self.y_max]
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// True when both spans are positive and finite
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite()) && self.width() > 0.0 && self.height() > 0.0
    }
}

/// The per-state bounding-box reference table
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxTable {
    /// File line number and raw row
    rows: Vec<(usize, BoundsRow)>,
}

impl BoundingBoxTable {
    pub fn new(rows: Vec<StateBoundingBox>) -> Self {
        Self {
            rows: rows
                .iter()
                .enumerate()
                .map(|(index, row)| (index + 2, BoundsRow::from(row)))
                .collect(),
        }
    }

    /// Read the table from a comma-delimited CSV file.
    ///
    /// Coordinates are not validated here; see [`BoundingBoxTable::get`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b',')
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = Vec::new();
        for (index, row) in reader.deserialize::<BoundsRow>().enumerate() {
            // Header is line 1
            rows.push((index + 2, row?));
        }

        log_data_load_stats(&path.display().to_string(), rows.len(), rows.len(), None);
        Ok(Self { rows })
    }

    /// First row whose name equals `state`, parsed.
    ///
    /// Fails with `InvalidCoordinates` only when that row is malformed.
    pub fn get(&self, state: &str) -> Result<Option<StateBoundingBox>> {
        self.rows
            .iter()
            .find(|(_, row)| row.name == state)
            .map(|(line, row)| row.parse(*line))
            .transpose()
    }

    pub fn contains(&self, state: &str) -> bool {
        self.rows.iter().any(|(_, row)| row.name == state)
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(_, row)| row.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Framed viewport for a state, in projected coordinates
    pub fn viewport_for(&self, state: &str) -> Result<Viewport> {
        let framing = framing_for(state);
        let raw = if framing.padding.needs_table_row() {
            self.get(state)?
        } else {
            None
        };

        let bounds = framing
            .padding
            .apply(raw.as_ref().map(|row| &row.bounds))
            .ok_or_else(|| StatemapError::unknown_state(state, "bounding-box table"))?;

        let viewport = Viewport::from_geo_bounds(&bounds)?;
        debug!(
            state = state,
            rule = ?framing.padding,
            viewport = ?viewport.as_array(),
            "Computed state viewport"
        );
        Ok(viewport)
    }
}

/// Load the bounding-box table and compute the framed viewport for `state`
pub fn get_bounding_box(state: &str, table_path: &Path) -> Result<Viewport> {
    BoundingBoxTable::load(table_path)?.viewport_for(state)
}
