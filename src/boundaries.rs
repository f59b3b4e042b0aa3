//! State boundary polygons from a national shapefile.
//!
//! The expected layout is the Census cartographic boundary file
//! (`gz_2010_us_040_00_500k.shp`): one polygon feature per state or
//! territory with the state name in the `NAME` attribute.

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use shapefile::dbase::{FieldValue, Record};
use shapefile::PolygonRing;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, StatemapError};
use crate::logging::log_data_load_stats;
use crate::projection::{transform_multipolygon, Crs};

/// Attribute holding the state name
pub const NAME_FIELD: &str = "NAME";

/// A state's boundary tagged with its reference system
#[derive(Debug, Clone, PartialEq)]
pub struct StatePolygon {
    pub state_name: String,
    pub crs: Crs,
    pub boundary: MultiPolygon<f64>,
}

impl StatePolygon {
    /// Reproject the boundary
    pub fn to_crs(&self, target: Crs) -> Result<Self> {
        Ok(Self {
            state_name: self.state_name.clone(),
            crs: target,
            boundary: transform_multipolygon(&self.boundary, self.crs, target)?,
        })
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.boundary.bounding_rect()
    }
}

/// Text value of a character attribute, if present
fn record_name(record: &Record) -> Option<String> {
    match record.get(NAME_FIELD) {
        Some(FieldValue::Character(Some(name))) => Some(name.trim().to_string()),
        _ => None,
    }
}

/// Convert shapefile rings to geo polygons. Each outer ring starts a new
/// polygon; inner rings become holes of the polygon before them.
fn to_multipolygon(shape: &shapefile::Polygon) -> MultiPolygon<f64> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in shape.rings() {
        let line: LineString<f64> = ring
            .points()
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect();

        match ring {
            PolygonRing::Outer(_) => polygons.push((line, Vec::new())),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(line),
                // Hole without a shell: keep the ring rather than drop area
                None => polygons.push((line, Vec::new())),
            },
        }
    }

    polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect()
}

/// Every named feature in the shapefile, in geographic coordinates
pub fn load_state_polygons(path: &Path) -> Result<Vec<StatePolygon>> {
    let features = shapefile::read_as::<_, shapefile::Polygon, Record>(path)?;
    let total = features.len();

    let mut states = Vec::with_capacity(total);
    for (shape, record) in features {
        match record_name(&record) {
            Some(state_name) => states.push(StatePolygon {
                state_name,
                crs: Crs::Geographic,
                boundary: to_multipolygon(&shape),
            }),
            None => warn!(path = %path.display(), "Skipping feature without a {} attribute", NAME_FIELD),
        }
    }

    log_data_load_stats(&path.display().to_string(), total, states.len(), None);
    Ok(states)
}

/// Merge the features named `state` into one polygon
pub fn select_state(polygons: Vec<StatePolygon>, state: &str) -> Result<StatePolygon> {
    let mut matches = polygons.into_iter().filter(|p| p.state_name == state);

    let mut selected = matches
        .next()
        .ok_or_else(|| StatemapError::unknown_state(state, "state boundary shapefile"))?;

    for extra in matches {
        debug!(state = state, "Merging additional boundary feature");
        selected.boundary.0.extend(extra.boundary.0);
    }

    Ok(selected)
}

/// Load the shapefile and return the boundary for `state`
pub fn load_state_polygon(state: &str, path: &Path) -> Result<StatePolygon> {
    select_state(load_state_polygons(path)?, state)
}
